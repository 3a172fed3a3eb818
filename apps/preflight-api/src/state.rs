//! Application state for the Preflight API

use std::collections::HashMap;
use std::sync::RwLock;

use preflight_core::{MemoryStore, PreflightEngine};
use shared_types::Specification;

pub struct AppState {
    pub engine: PreflightEngine,
    pub specs: RwLock<HashMap<String, Specification>>,
    pub results: MemoryStore,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_engine(PreflightEngine::new())
    }

    /// Build state around a custom engine (tests inject fakes here).
    pub fn with_engine(engine: PreflightEngine) -> Self {
        Self {
            engine,
            specs: RwLock::new(HashMap::new()),
            results: MemoryStore::new(),
        }
    }

    pub fn insert_spec(&self, spec: Specification) {
        let mut specs = self.specs.write().expect("spec store lock poisoned");
        specs.insert(spec.id.clone(), spec);
    }

    pub fn find_spec(&self, id: &str) -> Option<Specification> {
        let specs = self.specs.read().expect("spec store lock poisoned");
        specs.get(id).cloned()
    }

    pub fn all_specs(&self) -> Vec<Specification> {
        let specs = self.specs.read().expect("spec store lock poisoned");
        let mut all: Vec<Specification> = specs.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }
}
