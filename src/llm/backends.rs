//! Backend registry — maps backend identifiers to completion clients.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::client::OpenAiClient;
use crate::llm::completion::{CompletionApi, CompletionError};

/// Lookup table from backend identifier (`"openai"`, `"akash"`, …) to a
/// shared client.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn CompletionApi>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`OpenAiClient`] per configured backend.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        for (id, backend) in &config.backends {
            log::info!("registering backend {id} at {}", backend.base_url);
            registry.register(id.clone(), Arc::new(OpenAiClient::from_config(backend)));
        }
        registry
    }

    /// Add or replace the client for `id`.
    pub fn register(&mut self, id: impl Into<String>, api: Arc<dyn CompletionApi>) {
        self.backends.insert(id.into(), api);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, id: impl Into<String>, api: Arc<dyn CompletionApi>) -> Self {
        self.register(id, api);
        self
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn CompletionApi>, CompletionError> {
        self.backends
            .get(id)
            .cloned()
            .ok_or_else(|| CompletionError::UnknownBackend(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
