//! Order-text parsing.
//!
//! Turns the free-form text of a print order into a [`Specification`]:
//! detects the purchased services by keyword and extracts the target
//! page format (width × height in centimeters).

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{Services, Specification};

use crate::error::EngineError;

lazy_static! {
    /// `Formato: <W><sep><H>` with a case-insensitive keyword, optional
    /// colon, separator one of x / × / *, decimal comma or dot.
    static ref FORMAT_RE: Regex = Regex::new(
        r"(?i)formato\s*:?\s*([0-9]+(?:[.,][0-9]+)?)\s*[x×*]\s*([0-9]+(?:[.,][0-9]+)?)"
    )
    .unwrap();

    /// `Margini: <N> cm`, a uniform margin override.
    static ref MARGIN_RE: Regex =
        Regex::new(r"(?i)margin[ei]\s*:?\s*([0-9]+(?:[.,][0-9]+)?)\s*cm").unwrap();

    /// Phrases requesting a table of contents.
    static ref TOC_RE: Regex = Regex::new(
        r"(?i)\b(con\s+indice|indice\s+richiesto|con\s+sommario|table\s+of\s+contents)\b"
    )
    .unwrap();

    /// Keyword → purchased layout service.
    static ref LAYOUT_SERVICE_RE: Regex = Regex::new(r"(?i)impaginazione").unwrap();
}

/// Parsed order: target specification, purchased services, and any
/// non-fatal findings (e.g. conflicting format declarations).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ParsedOrder {
    pub spec: Specification,
    pub services: Services,
    pub warnings: Vec<String>,
}

/// Parse free-form order text.
///
/// The first `Formato:` declaration wins; later conflicting ones are
/// reported as warnings, never errors. Margins and TOC phrases override
/// the defaults baked into [`Specification::with_format`]. Fails only
/// when no format declaration is found at all.
pub fn parse_order(text: &str) -> Result<ParsedOrder, EngineError> {
    let text = normalize(text);

    let mut declarations = FORMAT_RE.captures_iter(&text);
    let first = declarations.next().ok_or(EngineError::MissingFormatLine)?;
    let width_cm = parse_number(&first[1]);
    let height_cm = parse_number(&first[2]);

    let mut warnings = Vec::new();
    for extra in declarations {
        let (w, h) = (parse_number(&extra[1]), parse_number(&extra[2]));
        if (w - width_cm).abs() > f64::EPSILON || (h - height_cm).abs() > f64::EPSILON {
            warnings.push(format!(
                "conflicting format declaration '{}x{}' ignored; first declaration '{}x{}' wins",
                w, h, width_cm, height_cm
            ));
        }
    }

    let mut spec = Specification::with_format("Ordine", width_cm, height_cm);
    if let Some(margin) = MARGIN_RE.captures(&text) {
        spec.set_uniform_margins(parse_number(&margin[1]));
    }
    if TOC_RE.is_match(&text) {
        spec.requires_toc = true;
    }

    let services = Services {
        layout_service: LAYOUT_SERVICE_RE.is_match(&text),
    };

    Ok(ParsedOrder {
        spec,
        services,
        warnings,
    })
}

/// Collapse whitespace runs and non-breaking spaces to single spaces.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() || ch == '\u{00A0}' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

fn parse_number(raw: &str) -> f64 {
    raw.replace(',', ".").parse().unwrap_or(0.0)
}
