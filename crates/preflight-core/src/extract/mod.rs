//! Property extraction from a normalized PDF.
//!
//! A single pass over the page tree scans each content stream
//! ([`content::scan_page`]) and then aggregates the raw measurements
//! into an [`ExtractedProperties`] record: geometry, margins, fonts,
//! color, images, TOC, running headers/footers, and page numbering.

pub mod content;

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use lopdf::{Document, Object, ObjectId};
use regex::Regex;
use tracing::debug;

use shared_types::{
    DetailedAnalysis, ExtractedProperties, FontInfo, ImageStats, Margins, PageGeometry,
    PageNumberPosition, PageSize,
};

use crate::error::EngineError;
use content::{decode_pdf_string, deref_dict, scan_page, BoundingBox, PageScan, TextRun};

/// Points to centimeters (1 pt = 1/72 inch).
pub const CM_PER_PT: f64 = 2.54 / 72.0;

/// Font sizes are bucketed to this precision to absorb float noise.
pub const FONT_SIZE_ROUND_PT: f64 = 0.5;

/// Fraction of the page height treated as the header/footer band.
/// Running furniture (headers, footers, folios) lives inside it and is
/// excluded from the content box used for margin measurement.
pub const EDGE_BAND_RATIO: f64 = 0.06;

/// A banded string recurring on more than this fraction of pages is a
/// running header or footer.
pub const RECURRENCE_RATIO: f64 = 0.5;

/// Horizontal tolerance for "centered" tokens, fraction of page width.
const CENTER_TOLERANCE_RATIO: f64 = 0.15;

lazy_static! {
    static ref TOC_HEADING_RE: Regex =
        Regex::new(r"(?i)\b(indice|sommario|table of contents|contents|toc)\b").unwrap();
    static ref DOTTED_LEADER_RE: Regex = Regex::new(r"\.{3,}\s*\d+\s*$").unwrap();
}

/// Page box in PDF points, y growing upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    const LETTER: Rect = Rect {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    fn size_cm(&self) -> PageSize {
        PageSize {
            width_cm: self.width() * CM_PER_PT,
            height_cm: self.height() * CM_PER_PT,
        }
    }
}

/// Extract measurable properties from PDF bytes.
///
/// Returns the properties (consistency fields still empty, see
/// [`crate::consistency::annotate`]) together with the per-page
/// geometry list the consistency checker needs.
pub fn extract_properties(
    pdf_bytes: &[u8],
) -> Result<(ExtractedProperties, Vec<PageGeometry>), EngineError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| EngineError::CorruptDocument(e.to_string()))?;
    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(EngineError::CorruptDocument("PDF has no pages".to_string()));
    }

    let mut warnings = Vec::new();
    let mut geometries = Vec::new();
    let mut scanned: Vec<(u32, Rect, Option<PageScan>)> = Vec::new();

    for (&page_no, &page_id) in pages.iter() {
        let rect = page_box(&doc, page_id);
        geometries.push(PageGeometry {
            page: page_no,
            size: rect.size_cm(),
        });

        match scan_page(&doc, page_id) {
            Ok(scan) => scanned.push((page_no, rect, Some(scan))),
            Err(reason) => {
                warnings.push(format!("page {page_no}: {reason}"));
                scanned.push((page_no, rect, None));
            }
        }
    }

    let page_count = geometries.len() as u32;
    let page_size = geometries[0].size;

    let margins = aggregate_margins(&scanned, &mut warnings);
    let (fonts, detailed) = aggregate_details(&doc, &scanned);
    let (headers, footnotes) = recurring_edge_text(&scanned);
    let page_num_positions = page_number_positions(&scanned);

    let mut headings = outline_titles(&doc);
    let structural_toc = !headings.is_empty();
    if !structural_toc {
        headings = heuristic_toc_headings(&scanned);
    }
    let has_toc = structural_toc || !headings.is_empty();

    debug!(
        page_count,
        has_toc,
        fonts = fonts.len(),
        "extracted document properties"
    );

    let props = ExtractedProperties {
        page_count,
        page_size,
        margins,
        has_toc,
        headings,
        headers,
        footnotes,
        page_num_positions,
        inconsistent_pages: Vec::new(),
        inconsistent_sections: Vec::new(),
        detailed_analysis: DetailedAnalysis { fonts, ..detailed },
        warnings,
    };

    Ok((props, geometries))
}

// ------------------------------------------------------------------ //
// geometry
// ------------------------------------------------------------------ //

/// Prefer TrimBox (the intended final page), then CropBox, then
/// MediaBox, inheriting from parent page-tree nodes where needed.
fn page_box(doc: &Document, page_id: ObjectId) -> Rect {
    let Ok(dict) = doc.get_dictionary(page_id) else {
        return Rect::LETTER;
    };
    for key in [
        b"TrimBox".as_slice(),
        b"CropBox".as_slice(),
        b"MediaBox".as_slice(),
    ] {
        if let Some(rect) = lookup_box(doc, dict, key, 0) {
            return rect;
        }
    }
    Rect::LETTER
}

fn lookup_box(doc: &Document, dict: &lopdf::Dictionary, key: &[u8], depth: u8) -> Option<Rect> {
    if depth > 8 {
        return None;
    }
    if let Ok(value) = dict.get(key) {
        if let Ok(array) = content::deref(doc, value).as_array() {
            if let Some(rect) = parse_box(array) {
                return Some(rect);
            }
        }
    }
    let parent = dict.get(b"Parent").ok()?;
    lookup_box(doc, deref_dict(doc, parent)?, key, depth + 1)
}

fn parse_box(array: &[Object]) -> Option<Rect> {
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0_f64; 4];
    for (slot, object) in values.iter_mut().zip(array) {
        *slot = object.as_float().ok()? as f64;
    }
    Some(Rect {
        x0: values[0].min(values[2]),
        y0: values[1].min(values[3]),
        x1: values[0].max(values[2]),
        y1: values[1].max(values[3]),
    })
}

// ------------------------------------------------------------------ //
// margins
// ------------------------------------------------------------------ //

/// Per-side median of content-box offsets across pages with content.
///
/// Text in the edge bands (running furniture) is excluded so folios and
/// headers do not masquerade as the text block's edge.
fn aggregate_margins(scanned: &[(u32, Rect, Option<PageScan>)], warnings: &mut Vec<String>) -> Margins {
    let mut tops = Vec::new();
    let mut bottoms = Vec::new();
    let mut lefts = Vec::new();
    let mut rights = Vec::new();

    for (_, rect, scan) in scanned {
        let Some(scan) = scan else { continue };
        let Some(bbox) = page_content_box(rect, scan) else {
            continue;
        };
        tops.push(((rect.y1 - bbox.max_y) * CM_PER_PT).max(0.0));
        bottoms.push(((bbox.min_y - rect.y0) * CM_PER_PT).max(0.0));
        lefts.push(((bbox.min_x - rect.x0) * CM_PER_PT).max(0.0));
        rights.push(((rect.x1 - bbox.max_x) * CM_PER_PT).max(0.0));
    }

    if tops.is_empty() {
        warnings.push("no measurable page content; margins left at zero".to_string());
        return Margins::default();
    }

    Margins {
        top_cm: median(&mut tops),
        bottom_cm: median(&mut bottoms),
        left_cm: median(&mut lefts),
        right_cm: median(&mut rights),
    }
}

fn page_content_box(rect: &Rect, scan: &PageScan) -> Option<BoundingBox> {
    let band = rect.height() * EDGE_BAND_RATIO;
    let mut bbox = scan.path_box;

    for run in &scan.text_runs {
        if in_bottom_band(run, rect, band) || in_top_band(run, rect, band) {
            continue;
        }
        match &mut bbox {
            Some(b) => {
                b.extend(run.x, run.y);
                b.extend(run.x + run.approx_width(), run.y + run.size_pt);
            }
            None => {
                let mut b = BoundingBox::from_point(run.x, run.y);
                b.extend(run.x + run.approx_width(), run.y + run.size_pt);
                bbox = Some(b);
            }
        }
    }
    bbox
}

fn in_bottom_band(run: &TextRun, rect: &Rect, band: f64) -> bool {
    run.y <= rect.y0 + band
}

fn in_top_band(run: &TextRun, rect: &Rect, band: f64) -> bool {
    run.y >= rect.y1 - band
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    }
}

// ------------------------------------------------------------------ //
// fonts, color, images, metadata
// ------------------------------------------------------------------ //

fn aggregate_details(
    doc: &Document,
    scanned: &[(u32, Rect, Option<PageScan>)],
) -> (BTreeMap<String, FontInfo>, DetailedAnalysis) {
    let mut fonts: BTreeMap<String, FontInfo> = BTreeMap::new();
    let mut has_color_pages = false;
    let mut has_color_text = false;
    let mut colored_elements_count = 0;
    let mut image_count = 0;
    let mut image_bytes = 0_u64;

    for (_, _, scan) in scanned {
        let Some(scan) = scan else { continue };
        for run in &scan.text_runs {
            fonts
                .entry(run.font.clone())
                .or_default()
                .record(size_key(run.size_pt));
        }
        has_color_text |= scan.has_color_text;
        colored_elements_count += scan.colored_elements + scan.image_count;
        image_count += scan.image_count;
        image_bytes += scan.image_bytes;
        // An image placement makes the page a color page.
        has_color_pages |= scan.colored_elements > 0 || scan.image_count > 0;
    }

    let images = if image_count > 0 {
        let avg_kb = image_bytes as f64 / image_count as f64 / 1024.0;
        Some(ImageStats {
            count: image_count,
            avg_size_kb: (avg_kb * 100.0).round() / 100.0,
        })
    } else {
        None
    };

    let details = DetailedAnalysis {
        fonts: BTreeMap::new(),
        images,
        has_color_pages,
        has_color_text,
        colored_elements_count,
        metadata: document_metadata(doc),
    };
    (fonts, details)
}

/// Round a point size to the bucket precision and render it as a map
/// key ("12", "10.5").
pub(crate) fn size_key(size_pt: f64) -> String {
    let rounded = (size_pt / FONT_SIZE_ROUND_PT).round() * FONT_SIZE_ROUND_PT;
    if (rounded - rounded.trunc()).abs() < 1e-9 {
        format!("{}", rounded.trunc() as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

fn document_metadata(doc: &Document) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    let Ok(info) = doc.trailer.get(b"Info") else {
        return metadata;
    };
    let Some(info) = deref_dict(doc, info) else {
        return metadata;
    };
    for key in ["Title", "Author", "Subject", "Keywords", "Creator", "Producer"] {
        if let Ok(Object::String(bytes, _)) = info.get(key.as_bytes()) {
            let value = decode_pdf_string(bytes);
            if !value.trim().is_empty() {
                metadata.insert(key.to_ascii_lowercase(), value);
            }
        }
    }
    metadata
}

// ------------------------------------------------------------------ //
// running headers / footers
// ------------------------------------------------------------------ //

/// Distinct strings recurring in the top (headers) or bottom
/// (footnotes) band across more than `RECURRENCE_RATIO` of the pages.
fn recurring_edge_text(scanned: &[(u32, Rect, Option<PageScan>)]) -> (Vec<String>, Vec<String>) {
    let page_count = scanned.len();
    let mut top_lines: Vec<Vec<(String, String)>> = Vec::new();
    let mut bottom_lines: Vec<Vec<(String, String)>> = Vec::new();

    for (_, rect, scan) in scanned {
        let Some(scan) = scan else { continue };
        let band = rect.height() * EDGE_BAND_RATIO;
        let top: Vec<&TextRun> = scan
            .text_runs
            .iter()
            .filter(|r| in_top_band(r, rect, band))
            .collect();
        let bottom: Vec<&TextRun> = scan
            .text_runs
            .iter()
            .filter(|r| in_bottom_band(r, rect, band))
            .collect();
        top_lines.push(normalized_lines(&top));
        bottom_lines.push(normalized_lines(&bottom));
    }

    (
        recurring_strings(&top_lines, page_count),
        recurring_strings(&bottom_lines, page_count),
    )
}

/// Group band runs into lines by baseline, normalize each line.
fn normalized_lines(runs: &[&TextRun]) -> Vec<(String, String)> {
    let mut by_line: BTreeMap<i64, Vec<&TextRun>> = BTreeMap::new();
    for run in runs {
        by_line.entry(run.y.round() as i64).or_default().push(run);
    }

    let mut lines = Vec::new();
    for (_, mut line_runs) in by_line {
        line_runs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let original = line_runs
            .iter()
            .map(|r| r.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = normalize_recurring(&original);
        // Pure page-number lines are handled by the folio detector.
        if !normalized.is_empty() && normalized.chars().any(|c| c != '#' && c != ' ') {
            lines.push((normalized, original));
        }
    }
    lines
}

/// Lowercase, digit runs collapsed to `#`, whitespace collapsed, so
/// "Chapter 1" and "Chapter 2" count as the same running header.
fn normalize_recurring(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_digit = false;
    let mut last_space = false;
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            if !last_digit {
                out.push('#');
            }
            last_digit = true;
            last_space = false;
        } else if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
            last_digit = false;
        } else {
            out.extend(ch.to_lowercase());
            last_digit = false;
            last_space = false;
        }
    }
    out.trim().to_string()
}

fn recurring_strings(per_page: &[Vec<(String, String)>], page_count: usize) -> Vec<String> {
    let threshold = page_count as f64 * RECURRENCE_RATIO;
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for page in per_page {
        let mut seen_on_page: Vec<&str> = Vec::new();
        for (normalized, _) in page {
            if !seen_on_page.contains(&normalized.as_str()) {
                seen_on_page.push(normalized);
                *counts.entry(normalized).or_insert(0) += 1;
            }
        }
    }

    let mut result = Vec::new();
    let mut reported: Vec<&str> = Vec::new();
    for page in per_page {
        for (normalized, original) in page {
            if reported.contains(&normalized.as_str()) {
                continue;
            }
            if counts.get(normalized.as_str()).copied().unwrap_or(0) as f64 > threshold {
                reported.push(normalized);
                result.push(original.clone());
            }
        }
    }
    result
}

// ------------------------------------------------------------------ //
// page numbers
// ------------------------------------------------------------------ //

fn page_number_positions(scanned: &[(u32, Rect, Option<PageScan>)]) -> Vec<PageNumberPosition> {
    scanned
        .iter()
        .map(|(page_no, rect, scan)| match scan {
            Some(scan) => detect_page_number(*page_no, rect, scan),
            None => PageNumberPosition::Missing,
        })
        .collect()
}

/// A standalone token equal to the 1-based page index, sitting in an
/// edge band. Bottom band is preferred over top.
fn detect_page_number(page_no: u32, rect: &Rect, scan: &PageScan) -> PageNumberPosition {
    let band = rect.height() * EDGE_BAND_RATIO;

    let candidate = |top: bool| -> Option<PageNumberPosition> {
        scan.text_runs
            .iter()
            .filter(|r| {
                if top {
                    in_top_band(r, rect, band)
                } else {
                    in_bottom_band(r, rect, band)
                }
            })
            .find(|r| r.text.trim().parse::<u32>() == Ok(page_no))
            .map(|r| zone(top, r.center_x(), rect))
    };

    candidate(false)
        .or_else(|| candidate(true))
        .unwrap_or(PageNumberPosition::Missing)
}

fn zone(top: bool, center_x: f64, rect: &Rect) -> PageNumberPosition {
    let width = rect.width();
    let offset = center_x - rect.x0;
    let centered = (offset - width / 2.0).abs() <= width * CENTER_TOLERANCE_RATIO;
    match (top, centered) {
        (false, true) => PageNumberPosition::BottomCenter,
        (true, true) => PageNumberPosition::TopCenter,
        (false, false) if offset < width * 0.25 => PageNumberPosition::BottomLeft,
        (true, false) if offset < width * 0.25 => PageNumberPosition::TopLeft,
        (false, false) if offset > width * 0.75 => PageNumberPosition::BottomRight,
        (true, false) if offset > width * 0.75 => PageNumberPosition::TopRight,
        _ => PageNumberPosition::Missing,
    }
}

// ------------------------------------------------------------------ //
// table of contents
// ------------------------------------------------------------------ //

/// Titles of the document outline (bookmark) chain, first level only.
fn outline_titles(doc: &Document) -> Vec<String> {
    let mut titles = Vec::new();
    let Ok(catalog) = doc.catalog() else {
        return titles;
    };
    let Some(outlines) = catalog.get(b"Outlines").ok().and_then(|o| deref_dict(doc, o)) else {
        return titles;
    };
    let mut current = outlines.get(b"First").ok().and_then(|o| deref_dict(doc, o));
    let mut guard = 0;
    while let Some(item) = current {
        if guard >= 256 {
            break;
        }
        guard += 1;
        if let Ok(Object::String(bytes, _)) = item.get(b"Title") {
            titles.push(decode_pdf_string(bytes));
        }
        current = item.get(b"Next").ok().and_then(|o| deref_dict(doc, o));
    }
    titles
}

/// Fallback heuristic: a page with a contents heading followed further
/// down by a dotted-leader line ending in a page number.
fn heuristic_toc_headings(scanned: &[(u32, Rect, Option<PageScan>)]) -> Vec<String> {
    for (_, _, scan) in scanned {
        let Some(scan) = scan else { continue };
        let lines = page_lines(&scan.text_runs);
        let heading = lines
            .iter()
            .position(|(_, text)| TOC_HEADING_RE.is_match(text));
        if let Some(at) = heading {
            let has_leader = lines[at + 1..]
                .iter()
                .any(|(_, text)| DOTTED_LEADER_RE.is_match(text));
            if has_leader {
                return vec![lines[at].1.trim().to_string()];
            }
        }
    }
    Vec::new()
}

/// All runs of a page grouped into lines, top to bottom.
fn page_lines(runs: &[TextRun]) -> Vec<(i64, String)> {
    let mut by_line: BTreeMap<i64, Vec<&TextRun>> = BTreeMap::new();
    for run in runs {
        by_line.entry(run.y.round() as i64).or_default().push(run);
    }

    let mut lines = Vec::new();
    for (y, mut line_runs) in by_line {
        line_runs.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        let text = line_runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        lines.push((y, text));
    }
    lines.reverse(); // BTreeMap ascending y → reverse for top-down order
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(text: &str, x: f64, y: f64) -> TextRun {
        TextRun {
            text: text.to_string(),
            x,
            y,
            font: "Times-Roman".to_string(),
            size_pt: 12.0,
        }
    }

    #[test]
    fn test_size_key_buckets_to_half_points() {
        assert_eq!(size_key(12.0), "12");
        assert_eq!(size_key(12.04), "12");
        assert_eq!(size_key(10.3), "10.5");
        assert_eq!(size_key(10.74), "10.5");
        assert_eq!(size_key(10.76), "11");
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(&mut []), 0.0);
    }

    #[test]
    fn test_normalize_recurring_folds_digits_and_case() {
        assert_eq!(normalize_recurring("Capitolo  1"), "capitolo #");
        assert_eq!(normalize_recurring("Capitolo 12"), "capitolo #");
        assert_eq!(normalize_recurring("  "), "");
    }

    #[test]
    fn test_recurring_strings_majority_threshold() {
        let pages = vec![
            vec![(
                "storia della stampa".to_string(),
                "Storia della stampa".to_string(),
            )],
            vec![(
                "storia della stampa".to_string(),
                "Storia della stampa".to_string(),
            )],
            vec![("altro".to_string(), "Altro".to_string())],
        ];
        let recurring = recurring_strings(&pages, 3);
        assert_eq!(recurring, vec!["Storia della stampa".to_string()]);
    }

    #[test]
    fn test_zone_classification() {
        let rect = Rect {
            x0: 0.0,
            y0: 0.0,
            x1: 500.0,
            y1: 700.0,
        };
        assert_eq!(zone(false, 250.0, &rect), PageNumberPosition::BottomCenter);
        assert_eq!(zone(false, 60.0, &rect), PageNumberPosition::BottomLeft);
        assert_eq!(zone(true, 450.0, &rect), PageNumberPosition::TopRight);
        // Dead zone between "left" and "center"
        assert_eq!(zone(false, 140.0, &rect), PageNumberPosition::Missing);
    }

    #[test]
    fn test_page_content_box_ignores_edge_band_text() {
        let rect = Rect {
            x0: 0.0,
            y0: 0.0,
            x1: 500.0,
            y1: 700.0,
        };
        let mut scan = PageScan::default();
        scan.text_runs.push(run("body", 100.0, 350.0));
        scan.text_runs.push(run("7", 250.0, 20.0)); // folio inside the band

        let bbox = page_content_box(&rect, &scan).unwrap();
        assert_eq!(bbox.min_y, 350.0);
    }

    #[test]
    fn test_page_lines_orders_top_down() {
        let runs = vec![run("bottom", 10.0, 50.0), run("top", 10.0, 650.0)];
        let lines = page_lines(&runs);
        assert_eq!(lines[0].1, "top");
        assert_eq!(lines[1].1, "bottom");
    }
}
