//! Request/response models for the Preflight API

use serde::{Deserialize, Serialize};
use shared_types::{Specification, ValidationResult};

/// Body of `POST /api/specs`. Same fields as [`Specification`] minus
/// the server-assigned ones.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSpecRequest {
    pub name: String,
    pub page_width_cm: f64,
    pub page_height_cm: f64,
    pub top_margin_cm: f64,
    pub bottom_margin_cm: f64,
    pub left_margin_cm: f64,
    pub right_margin_cm: f64,
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
}

impl CreateSpecRequest {
    pub fn into_spec(self) -> Specification {
        let mut spec = Specification::with_format(self.name, self.page_width_cm, self.page_height_cm);
        spec.top_margin_cm = self.top_margin_cm;
        spec.bottom_margin_cm = self.bottom_margin_cm;
        spec.left_margin_cm = self.left_margin_cm;
        spec.right_margin_cm = self.right_margin_cm;
        spec.requires_toc = self.requires_toc;
        spec.no_color_pages = self.no_color_pages;
        spec.no_images = self.no_images;
        spec.requires_header = self.requires_header;
        spec.requires_footnotes = self.requires_footnotes;
        spec.min_page_count = self.min_page_count;
        spec
    }
}

/// Body of `POST /api/orders/parse`.
#[derive(Debug, Clone, Deserialize)]
pub struct ParseOrderRequest {
    pub text: String,
}

/// Body of `POST /api/validate`.
///
/// The target specification comes either from a stored profile
/// (`spec_id`) or ad hoc from `order_text`; exactly one is required.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateRequest {
    pub file_name: String,
    pub document_base64: String,
    #[serde(default)]
    pub spec_id: Option<String>,
    #[serde(default)]
    pub order_text: Option<String>,
}

/// Response of `GET /api/results/:id`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultEnvelope {
    pub result: ValidationResult,
    pub spec: Specification,
}
