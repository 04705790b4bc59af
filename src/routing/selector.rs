//! Per-operation backend selectors
//!
//! In configuration a selector is either a bare model name, reusing the
//! default backend's provider and credential:
//!
//! ```toml
//! [operations]
//! similarity = "gpt-4o-mini"
//! ```
//!
//! or a full table naming its own provider, credential and options:
//!
//! ```toml
//! [operations.embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//! options = { base_url = "https://api.openai.com/v1" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Override of the backend serving one operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackendSelector {
    /// Same provider and credential as the default backend, different model
    Model(String),
    /// Full backend description
    Full(SelectorSpec),
}

/// Full backend description for one operation.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorSpec {
    /// Provider identity; defaults to the default backend's provider
    #[serde(default)]
    pub provider: Option<String>,

    /// Model name
    pub model: String,

    /// Dedicated credential for this operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider-specific options
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, serde_json::Value>,
}

impl fmt::Debug for SelectorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorSpec")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .finish()
    }
}

impl BackendSelector {
    /// Selector for a model on the default provider.
    pub fn model(model: impl Into<String>) -> Self {
        BackendSelector::Model(model.into())
    }

    /// Selector for a model on a specific provider.
    pub fn provider(provider: impl Into<String>, model: impl Into<String>) -> Self {
        BackendSelector::Full(SelectorSpec {
            provider: Some(provider.into()),
            model: model.into(),
            api_key: None,
            options: HashMap::new(),
        })
    }

    /// Model this selector asks for.
    pub fn model_name(&self) -> &str {
        match self {
            BackendSelector::Model(model) => model,
            BackendSelector::Full(spec) => &spec.model,
        }
    }

    /// Provider named by the selector, if any.
    pub fn provider_name(&self) -> Option<&str> {
        match self {
            BackendSelector::Model(_) => None,
            BackendSelector::Full(spec) => spec
                .provider
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty()),
        }
    }

    /// The selector's own credential, if non-empty.
    pub fn own_credential(&self) -> Option<&str> {
        match self {
            BackendSelector::Model(_) => None,
            BackendSelector::Full(spec) => spec.api_key.as_deref().filter(|k| !k.trim().is_empty()),
        }
    }

    /// Provider options, when the selector carries its own.
    pub fn options(&self) -> Option<&HashMap<String, serde_json::Value>> {
        match self {
            BackendSelector::Model(_) => None,
            BackendSelector::Full(spec) => Some(&spec.options),
        }
    }
}
