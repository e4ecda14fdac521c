// src/adapter/registry.rs
// Exchange lookup table, built once at startup

use crate::exchange::client::Exchange;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct Registry {
    exchanges: BTreeMap<String, Arc<dyn Exchange>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration, keyed by `Exchange::id`
    pub fn with<E: Exchange + 'static>(mut self, exchange: E) -> Self {
        self.insert(Arc::new(exchange));
        self
    }

    pub fn insert(&mut self, exchange: Arc<dyn Exchange>) {
        let id = exchange.id().to_string();
        if self.exchanges.insert(id.clone(), exchange).is_some() {
            log::warn!("Exchange {} registered twice, keeping the latest", id);
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Exchange>> {
        self.exchanges.get(id).cloned()
    }

    /// Registered identifiers in lexicographic order
    pub fn ids(&self) -> Vec<String> {
        self.exchanges.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }
}
