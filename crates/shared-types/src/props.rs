//! Measured facts about an actual document.

use std::collections::BTreeMap;

/// Page geometry in centimeters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PageSize {
    pub width_cm: f64,
    pub height_cm: f64,
}

impl PageSize {
    /// Whether both dimensions match within `tolerance_cm`.
    pub fn approx_eq(&self, other: &PageSize, tolerance_cm: f64) -> bool {
        (self.width_cm - other.width_cm).abs() <= tolerance_cm
            && (self.height_cm - other.height_cm).abs() <= tolerance_cm
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", fmt_cm(self.width_cm), fmt_cm(self.height_cm))
    }
}

/// Format a centimeter value to one decimal, dropping a trailing ".0"
/// so that A4 renders as "21x29.7".
fn fmt_cm(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if (rounded - rounded.trunc()).abs() < 1e-9 {
        format!("{}", rounded.trunc() as i64)
    } else {
        format!("{:.1}", rounded)
    }
}

/// Page margins in centimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Margins {
    pub top_cm: f64,
    pub bottom_cm: f64,
    pub left_cm: f64,
    pub right_cm: f64,
}

/// Geometry of a single page, used both for the per-page record and for
/// inconsistency reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PageGeometry {
    /// 1-indexed page number
    pub page: u32,
    pub size: PageSize,
}

/// A run of consecutive pages sharing one geometry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SectionGeometry {
    /// 1-indexed section number
    pub section: u32,
    pub size: PageSize,
    pub first_page: u32,
    pub last_page: u32,
}

/// Zone where a page-number token was found. Reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageNumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    Missing,
}

impl PageNumberPosition {
    pub fn is_missing(&self) -> bool {
        matches!(self, PageNumberPosition::Missing)
    }
}

/// Usage counters for one font family.
///
/// Keys of `size_counts` are point sizes already bucketed by the
/// extractor (e.g. "12" or "10.5"); `count` equals the sum of the
/// bucket values.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct FontInfo {
    pub count: u32,
    pub size_counts: BTreeMap<String, u32>,
}

impl FontInfo {
    /// Record one usage of this font at the given (pre-bucketed) size.
    pub fn record(&mut self, size_key: String) {
        self.count += 1;
        *self.size_counts.entry(size_key).or_insert(0) += 1;
    }
}

/// Embedded image statistics.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ImageStats {
    pub count: u32,
    pub avg_size_kb: f64,
}

/// Typography, color, and media findings for the whole document.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DetailedAnalysis {
    pub fonts: BTreeMap<String, FontInfo>,
    pub images: Option<ImageStats>,
    pub has_color_pages: bool,
    pub has_color_text: bool,
    pub colored_elements_count: u32,
    pub metadata: BTreeMap<String, String>,
}

/// Everything the extractor measured about one document.
///
/// Built incrementally by the extractor and consistency checker, then
/// never mutated again.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractedProperties {
    pub page_count: u32,
    /// Size of the reference page (page 1), independent of any
    /// inconsistencies found later.
    pub page_size: PageSize,
    /// Per-side median of content-box offsets across pages.
    pub margins: Margins,
    pub has_toc: bool,
    pub headings: Vec<String>,
    pub headers: Vec<String>,
    pub footnotes: Vec<String>,
    pub page_num_positions: Vec<PageNumberPosition>,
    pub inconsistent_pages: Vec<PageGeometry>,
    pub inconsistent_sections: Vec<SectionGeometry>,
    pub detailed_analysis: DetailedAnalysis,
    /// Non-fatal extraction problems (e.g. a page that could not be
    /// scanned); reported, never retried.
    pub warnings: Vec<String>,
}
