//! Backend contract: the completion providers this crate routes between
//!
//! Concrete network clients live outside this crate. They implement
//! [`Backend`] and are built by a [`BackendFactory`] from a [`BackendSpec`].
//!
//! Optional provider features are explicit accessors rather than runtime
//! probing: [`Backend::embeddings`] returns `None` when a backend has no
//! embedding endpoint, and [`Backend::count_tokens`] returns `None` when it
//! has no tokenizer.

pub mod credentials;
pub mod offline;

pub use credentials::{CredentialSource, EnvCredentials, StaticCredentials};
pub use offline::{OfflineBackend, OfflineFactory};

use crate::capability::LengthParam;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Per-call completion options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Output length cap
    pub max_tokens: u32,

    /// Provider parameter name carrying `max_tokens`
    #[serde(default)]
    pub length_param: LengthParam,

    /// Sampling temperature; `None` when the model rejects it
    #[serde(default)]
    pub temperature: Option<f32>,

    /// Nucleus sampling; `None` when the model rejects it
    #[serde(default)]
    pub top_p: Option<f32>,

    /// System prompt
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Extra context prepended by the provider client
    #[serde(default)]
    pub context: Option<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            length_param: LengthParam::MaxTokens,
            temperature: None,
            top_p: None,
            system_prompt: None,
            context: None,
        }
    }
}

/// A ready-to-call completion backend bound to one provider, model and credential.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Provider identity (e.g. "anthropic", "openai", "ollama")
    fn provider(&self) -> &str;

    /// Model this backend calls
    fn model(&self) -> &str;

    /// Complete a prompt. An empty string is a valid (if unhelpful) answer.
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;

    /// Embedding endpoint, when the backend has one.
    fn embeddings(&self) -> Option<&dyn EmbeddingBackend> {
        None
    }

    /// Exact token count, when the backend has a tokenizer.
    fn count_tokens(&self, _text: &str) -> Option<usize> {
        None
    }
}

/// Embedding endpoint of a backend.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed `text`, optionally requesting a vector size.
    async fn embed(&self, text: &str, dimensions: Option<usize>) -> Result<Vec<f32>>;
}

/// Everything needed to construct one backend.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Provider identity
    pub provider: String,

    /// Model name
    pub model: String,

    /// Resolved credential, if any
    #[serde(default, skip_serializing)]
    pub credential: Option<String>,

    /// Provider-specific options (base URL, timeouts, ...)
    #[serde(default)]
    pub options: HashMap<String, serde_json::Value>,
}

impl BackendSpec {
    /// Spec with no credential and no options.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            credential: None,
            options: HashMap::new(),
        }
    }

    /// Attach a credential (builder style).
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

// Credentials never reach logs.
impl fmt::Debug for BackendSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSpec")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .finish()
    }
}

/// Builds backends from specs.
///
/// Construction may fail for a missing credential, an unsupported provider
/// or malformed options; the router turns such failures into warnings.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create(&self, spec: &BackendSpec) -> Result<Arc<dyn Backend>>;
}

/// Coarse token estimate used when a backend has no tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * 1.3).ceil() as usize
}
