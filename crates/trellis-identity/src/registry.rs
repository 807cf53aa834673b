use std::sync::Arc;

use dashmap::DashMap;

use crate::method::DidMethod;

/// Table of DID methods keyed by method name.
///
/// Registering a method under a name that is already taken replaces the
/// previous entry; the last registration wins.
#[derive(Default)]
pub struct DidMethodRegistry {
    methods: DashMap<String, Arc<dyn DidMethod>>,
}

impl DidMethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `method` under its own name.
    pub fn register(&self, method: Arc<dyn DidMethod>) {
        let name = method.name().to_string();
        if self.methods.insert(name.clone(), method).is_some() {
            tracing::debug!(method = %name, "replaced registered DID method");
        } else {
            tracing::debug!(method = %name, "registered DID method");
        }
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn DidMethod>> {
        self.methods.remove(name).map(|(_, method)| method)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DidMethod>> {
        self.methods.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
