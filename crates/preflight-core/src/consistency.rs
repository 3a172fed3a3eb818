//! Page-size consistency analysis.
//!
//! Determines the dominant page geometry (mode across pages, ties
//! broken by first occurrence) and records every page and section that
//! diverges from it.

use shared_types::{ExtractedProperties, PageGeometry, PageSize, SectionGeometry};

/// Two page sizes within this distance count as the same format.
pub const SIZE_CONSISTENCY_TOLERANCE_CM: f64 = 0.1;

/// Fill the consistency fields of freshly extracted properties.
///
/// Sections are maximal runs of consecutive same-size pages; the
/// analyzable form is always PDF, which has no native section breaks.
pub fn annotate(props: &mut ExtractedProperties, pages: &[PageGeometry]) {
    let Some(dominant) = dominant_size(pages) else {
        return;
    };

    props.inconsistent_pages = pages
        .iter()
        .filter(|p| !p.size.approx_eq(&dominant, SIZE_CONSISTENCY_TOLERANCE_CM))
        .cloned()
        .collect();

    let sections = section_runs(pages);
    if sections.len() > 1 {
        props.inconsistent_sections = sections
            .into_iter()
            .filter(|s| !s.size.approx_eq(&dominant, SIZE_CONSISTENCY_TOLERANCE_CM))
            .collect();
    }
}

/// Most frequent page size; on a tie the size seen first wins.
pub fn dominant_size(pages: &[PageGeometry]) -> Option<PageSize> {
    let mut tally: Vec<(PageSize, u32)> = Vec::new();
    for page in pages {
        match tally
            .iter_mut()
            .find(|(size, _)| size.approx_eq(&page.size, SIZE_CONSISTENCY_TOLERANCE_CM))
        {
            Some((_, count)) => *count += 1,
            None => tally.push((page.size, 1)),
        }
    }

    let mut best: Option<(PageSize, u32)> = None;
    for (size, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((size, count));
        }
    }
    best.map(|(size, _)| size)
}

/// Group consecutive pages sharing one geometry into numbered sections.
pub fn section_runs(pages: &[PageGeometry]) -> Vec<SectionGeometry> {
    let mut sections: Vec<SectionGeometry> = Vec::new();
    for page in pages {
        match sections.last_mut() {
            Some(current)
                if current
                    .size
                    .approx_eq(&page.size, SIZE_CONSISTENCY_TOLERANCE_CM) =>
            {
                current.last_page = page.page;
            }
            _ => sections.push(SectionGeometry {
                section: sections.len() as u32 + 1,
                size: page.size,
                first_page: page.page,
                last_page: page.page,
            }),
        }
    }
    sections
}
