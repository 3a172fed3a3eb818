//! Atomic validation rules.
//!
//! Each rule is a pure function of the extracted properties, the
//! specification, and the purchased services, so every rule is easy to
//! test on its own. The registry in [`crate::validator`] fixes the
//! evaluation order and the report keys.

use shared_types::{ExtractedProperties, Services, Specification};

/// Tolerance on page width/height against the specification.
pub const PAGE_SIZE_TOLERANCE_CM: f64 = 0.3;

/// Tolerance on each of the four margins against the specification.
pub const MARGIN_TOLERANCE_CM: f64 = 0.5;

pub fn page_size(props: &ExtractedProperties, spec: &Specification, services: &Services) -> bool {
    if services.layout_service {
        return true;
    }
    (props.page_size.width_cm - spec.page_width_cm).abs() <= PAGE_SIZE_TOLERANCE_CM
        && (props.page_size.height_cm - spec.page_height_cm).abs() <= PAGE_SIZE_TOLERANCE_CM
}

pub fn format_consistency(
    props: &ExtractedProperties,
    _spec: &Specification,
    _services: &Services,
) -> bool {
    props.inconsistent_pages.is_empty() && props.inconsistent_sections.is_empty()
}

pub fn margins(props: &ExtractedProperties, spec: &Specification, services: &Services) -> bool {
    if services.layout_service {
        return true;
    }
    let m = &props.margins;
    (m.top_cm - spec.top_margin_cm).abs() <= MARGIN_TOLERANCE_CM
        && (m.bottom_cm - spec.bottom_margin_cm).abs() <= MARGIN_TOLERANCE_CM
        && (m.left_cm - spec.left_margin_cm).abs() <= MARGIN_TOLERANCE_CM
        && (m.right_cm - spec.right_margin_cm).abs() <= MARGIN_TOLERANCE_CM
}

pub fn has_toc(props: &ExtractedProperties, spec: &Specification, _services: &Services) -> bool {
    !spec.requires_toc || props.has_toc
}

pub fn no_color_pages(
    props: &ExtractedProperties,
    spec: &Specification,
    _services: &Services,
) -> bool {
    if !spec.no_color_pages {
        return true;
    }
    let analysis = &props.detailed_analysis;
    !(analysis.has_color_pages || analysis.has_color_text)
}

pub fn no_images(props: &ExtractedProperties, spec: &Specification, _services: &Services) -> bool {
    if !spec.no_images {
        return true;
    }
    props
        .detailed_analysis
        .images
        .as_ref()
        .map_or(true, |images| images.count == 0)
}

pub fn has_header(props: &ExtractedProperties, spec: &Specification, _services: &Services) -> bool {
    !spec.requires_header || !props.headers.is_empty()
}

pub fn has_footnotes(
    props: &ExtractedProperties,
    spec: &Specification,
    _services: &Services,
) -> bool {
    !spec.requires_footnotes || !props.footnotes.is_empty()
}

pub fn min_page_count(
    props: &ExtractedProperties,
    spec: &Specification,
    _services: &Services,
) -> bool {
    props.page_count >= spec.min_page_count
}

/// All pages carry a number in a recognized zone. Reporting only; the
/// verdict never depends on this rule.
pub fn page_numbers_position(
    props: &ExtractedProperties,
    _spec: &Specification,
    _services: &Services,
) -> bool {
    !props.page_num_positions.is_empty()
        && props.page_num_positions.iter().all(|p| !p.is_missing())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ImageStats, Margins, PageNumberPosition, PageSize};

    fn props_with_size(width_cm: f64, height_cm: f64) -> ExtractedProperties {
        ExtractedProperties {
            page_count: 10,
            page_size: PageSize {
                width_cm,
                height_cm,
            },
            margins: Margins {
                top_cm: 2.0,
                bottom_cm: 2.0,
                left_cm: 2.0,
                right_cm: 2.0,
            },
            has_toc: false,
            headings: vec![],
            headers: vec![],
            footnotes: vec![],
            page_num_positions: vec![],
            inconsistent_pages: vec![],
            inconsistent_sections: vec![],
            detailed_analysis: Default::default(),
            warnings: vec![],
        }
    }

    fn spec_17x24() -> Specification {
        Specification::with_format("Test", 17.0, 24.0)
    }

    #[test]
    fn test_page_size_within_tolerance_passes() {
        let services = Services::default();
        assert!(page_size(&props_with_size(17.2, 24.0), &spec_17x24(), &services));
        assert!(!page_size(&props_with_size(17.5, 24.0), &spec_17x24(), &services));
    }

    #[test]
    fn test_layout_service_waives_geometry_checks() {
        let services = Services {
            layout_service: true,
        };
        let props = props_with_size(10.0, 10.0);
        assert!(page_size(&props, &spec_17x24(), &services));
        assert!(margins(&props, &spec_17x24(), &services));
    }

    #[test]
    fn test_margins_each_side_checked() {
        let mut props = props_with_size(17.0, 24.0);
        props.margins.left_cm = 2.4; // within 0.5
        assert!(margins(&props, &spec_17x24(), &Services::default()));

        props.margins.left_cm = 2.6; // off by more than 0.5
        assert!(!margins(&props, &spec_17x24(), &Services::default()));
    }

    #[test]
    fn test_no_images_only_gates_when_required() {
        let mut spec = spec_17x24();
        let mut props = props_with_size(17.0, 24.0);
        props.detailed_analysis.images = Some(ImageStats {
            count: 1,
            avg_size_kb: 10.0,
        });

        assert!(no_images(&props, &spec, &Services::default()));
        spec.no_images = true;
        assert!(!no_images(&props, &spec, &Services::default()));

        props.detailed_analysis.images = None;
        assert!(no_images(&props, &spec, &Services::default()));
    }

    #[test]
    fn test_no_color_pages_counts_colored_text_too() {
        let mut spec = spec_17x24();
        spec.no_color_pages = true;
        let mut props = props_with_size(17.0, 24.0);
        assert!(no_color_pages(&props, &spec, &Services::default()));

        props.detailed_analysis.has_color_text = true;
        assert!(!no_color_pages(&props, &spec, &Services::default()));
    }

    #[test]
    fn test_has_toc_requirement() {
        let mut spec = spec_17x24();
        let mut props = props_with_size(17.0, 24.0);
        assert!(has_toc(&props, &spec, &Services::default()));

        spec.requires_toc = true;
        assert!(!has_toc(&props, &spec, &Services::default()));
        props.has_toc = true;
        assert!(has_toc(&props, &spec, &Services::default()));
    }

    #[test]
    fn test_min_page_count() {
        let mut spec = spec_17x24();
        spec.min_page_count = 10;
        assert!(min_page_count(&props_with_size(17.0, 24.0), &spec, &Services::default()));
        spec.min_page_count = 11;
        assert!(!min_page_count(&props_with_size(17.0, 24.0), &spec, &Services::default()));
    }

    #[test]
    fn test_page_numbers_position_requires_every_page() {
        let mut props = props_with_size(17.0, 24.0);
        assert!(!page_numbers_position(&props, &spec_17x24(), &Services::default()));

        props.page_num_positions =
            vec![PageNumberPosition::BottomCenter, PageNumberPosition::BottomCenter];
        assert!(page_numbers_position(&props, &spec_17x24(), &Services::default()));

        props.page_num_positions.push(PageNumberPosition::Missing);
        assert!(!page_numbers_position(&props, &spec_17x24(), &Services::default()));
    }
}
