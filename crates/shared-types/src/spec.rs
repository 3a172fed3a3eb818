//! Formatting profiles a document is validated against.

use chrono::{DateTime, Utc};

/// Uniform margin applied when an order text does not state one.
pub const DEFAULT_MARGIN_CM: f64 = 2.0;

/// Target formatting profile for one validation run.
///
/// Immutable once handed to the engine; built either from a stored
/// profile or from parsed order text.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Specification {
    pub id: String,
    pub name: String,

    // Page dimensions (cm)
    pub page_width_cm: f64,
    pub page_height_cm: f64,

    // Margins (cm)
    pub top_margin_cm: f64,
    pub bottom_margin_cm: f64,
    pub left_margin_cm: f64,
    pub right_margin_cm: f64,

    // Optional requirements
    #[serde(default)]
    pub requires_toc: bool,
    #[serde(default)]
    pub no_color_pages: bool,
    #[serde(default)]
    pub no_images: bool,
    #[serde(default)]
    pub requires_header: bool,
    #[serde(default)]
    pub requires_footnotes: bool,
    #[serde(default)]
    pub min_page_count: u32,

    pub created_at: DateTime<Utc>,
}

impl Specification {
    /// Build a specification with the given page format and every other
    /// field at its documented default (2 cm margins, no requirements).
    pub fn with_format(name: impl Into<String>, width_cm: f64, height_cm: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            page_width_cm: width_cm,
            page_height_cm: height_cm,
            top_margin_cm: DEFAULT_MARGIN_CM,
            bottom_margin_cm: DEFAULT_MARGIN_CM,
            left_margin_cm: DEFAULT_MARGIN_CM,
            right_margin_cm: DEFAULT_MARGIN_CM,
            requires_toc: false,
            no_color_pages: false,
            no_images: false,
            requires_header: false,
            requires_footnotes: false,
            min_page_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Set all four margins at once.
    pub fn set_uniform_margins(&mut self, margin_cm: f64) {
        self.top_margin_cm = margin_cm;
        self.bottom_margin_cm = margin_cm;
        self.left_margin_cm = margin_cm;
        self.right_margin_cm = margin_cm;
    }
}

/// Services the customer purchased with the order.
///
/// A purchased layout service means the shop re-lays-out the document,
/// so geometry checks against the uploaded file are moot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Services {
    #[serde(default)]
    pub layout_service: bool,
}
