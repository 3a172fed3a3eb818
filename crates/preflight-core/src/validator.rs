//! Validation orchestrator.
//!
//! Runs every rule from [`crate::rules`] over one extraction record and
//! derives the overall verdict from the fixed mandatory set.

use std::collections::BTreeMap;

use shared_types::{ExtractedProperties, Services, Specification};

use crate::rules;

type RuleFn = fn(&ExtractedProperties, &Specification, &Services) -> bool;

/// Rule registry, stable order. The names are the report keys.
const RULES: &[(&str, RuleFn)] = &[
    ("page_size", rules::page_size),
    ("format_consistency", rules::format_consistency),
    ("margins", rules::margins),
    ("has_toc", rules::has_toc),
    ("no_color_pages", rules::no_color_pages),
    ("no_images", rules::no_images),
    ("has_header", rules::has_header),
    ("has_footnotes", rules::has_footnotes),
    ("min_page_count", rules::min_page_count),
    ("page_numbers_position", rules::page_numbers_position),
];

/// Checks whose outcome always gates the verdict.
///
/// `has_header` and `has_footnotes` gate only through their
/// `requires_*` flags (their rules auto-pass otherwise);
/// `page_numbers_position` is reported but never gates.
pub const MANDATORY_CHECKS: &[&str] = &[
    "page_size",
    "margins",
    "format_consistency",
    "no_color_pages",
    "no_images",
    "has_toc",
    "min_page_count",
];

/// Per-check outcomes plus the derived verdict.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub validations: BTreeMap<String, bool>,
    pub is_valid: bool,
}

/// Evaluate every rule. Pure: identical inputs always produce the
/// identical outcome.
pub fn validate_document(
    props: &ExtractedProperties,
    spec: &Specification,
    services: &Services,
) -> ValidationOutcome {
    let mut validations = BTreeMap::new();
    for (name, rule) in RULES {
        validations.insert((*name).to_string(), rule(props, spec, services));
    }

    let mandatory_ok = MANDATORY_CHECKS
        .iter()
        .all(|name| validations.get(*name).copied().unwrap_or(false));
    // Conditionally required presence checks; auto-true unless the spec
    // asks for them.
    let required_ok = validations["has_header"] && validations["has_footnotes"];

    ValidationOutcome {
        is_valid: mandatory_ok && required_ok,
        validations,
    }
}
