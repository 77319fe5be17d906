//! Named byte resources (icons, images) shared by every widget.

use std::collections::HashMap;
use std::sync::Arc;

/// Resource store keyed by `name` or `scope:name`.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: HashMap<String, Arc<Vec<u8>>>,
}

impl ResourceCache {
    pub fn register(&mut self, name: impl Into<String>, data: Vec<u8>) {
        self.entries.insert(name.into(), Arc::new(data));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Exact lookup, then `scope:name` falls back to the unscoped `name`.
    pub fn resolve(&self, name: &str) -> Option<Arc<Vec<u8>>> {
        if let Some(data) = self.entries.get(name) {
            return Some(Arc::clone(data));
        }
        let (_, bare) = name.split_once(':')?;
        self.entries.get(bare).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
