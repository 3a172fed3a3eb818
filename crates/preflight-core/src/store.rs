//! Validation result storage.
//!
//! A narrow repository trait with an in-memory implementation; callers
//! inject it, so tests and future durable backends swap in freely.
//! Lifetime of the in-memory store is the process; the engine assumes
//! no durability.

use std::collections::HashMap;
use std::sync::RwLock;

use shared_types::{Specification, ValidationResult};

/// Keyed storage for finished validation runs and the specification
/// each was judged against.
pub trait ResultStore: Send + Sync {
    fn put(&self, result: ValidationResult, spec: Specification);
    fn get(&self, id: &str) -> Option<(ValidationResult, Specification)>;
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (ValidationResult, Specification)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryStore {
    fn put(&self, result: ValidationResult, spec: Specification) {
        let mut entries = self.entries.write().expect("result store lock poisoned");
        entries.insert(result.id.clone(), (result, spec));
    }

    fn get(&self, id: &str) -> Option<(ValidationResult, Specification)> {
        let entries = self.entries.read().expect("result store lock poisoned");
        entries.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_result() -> ValidationResult {
        let props = shared_types::ExtractedProperties {
            page_count: 1,
            page_size: shared_types::PageSize {
                width_cm: 17.0,
                height_cm: 24.0,
            },
            margins: Default::default(),
            has_toc: false,
            headings: vec![],
            headers: vec![],
            footnotes: vec![],
            page_num_positions: vec![],
            inconsistent_pages: vec![],
            inconsistent_sections: vec![],
            detailed_analysis: Default::default(),
            warnings: vec![],
        };
        ValidationResult::new("tesi.pdf", "pdf", "Spec", BTreeMap::new(), true, props)
    }

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::new();
        let result = sample_result();
        let id = result.id.clone();
        let spec = Specification::with_format("Spec", 17.0, 24.0);

        store.put(result, spec);
        let (found, found_spec) = store.get(&id).expect("entry should exist");
        assert_eq!(found.id, id);
        assert_eq!(found_spec.page_width_cm, 17.0);
    }

    #[test]
    fn test_unknown_id_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let store = MemoryStore::new();
        let mut result = sample_result();
        result.id = "fixed".to_string();
        let mut newer = sample_result();
        newer.id = "fixed".to_string();
        newer.document_name = "tesi-v2.pdf".to_string();

        store.put(result, Specification::with_format("A", 17.0, 24.0));
        store.put(newer, Specification::with_format("B", 17.0, 24.0));

        let (found, spec) = store.get("fixed").unwrap();
        assert_eq!(found.document_name, "tesi-v2.pdf");
        assert_eq!(spec.name, "B");
    }
}
