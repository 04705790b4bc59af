//! Offline backend
//!
//! Refuses every completion, so every memory operation takes its degraded
//! path. The CLI uses it for dry runs without network access.

use super::{Backend, BackendFactory, BackendSpec, CompletionOptions};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Backend that fails every call with a provider error.
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    provider: String,
    model: String,
}

impl OfflineBackend {
    pub fn new(spec: &BackendSpec) -> Self {
        Self {
            provider: spec.provider.clone(),
            model: spec.model.clone(),
        }
    }
}

#[async_trait]
impl Backend for OfflineBackend {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
        Err(Error::provider(&self.provider, "offline mode: no network calls are made"))
    }
}

/// Factory producing [`OfflineBackend`]s for any provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFactory;

#[async_trait]
impl BackendFactory for OfflineFactory {
    async fn create(&self, spec: &BackendSpec) -> Result<Arc<dyn Backend>> {
        Ok(Arc::new(OfflineBackend::new(spec)))
    }
}
