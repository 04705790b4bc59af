//! Mnemoroute configuration management
//!
//! ```toml
//! [backend]
//! provider = "anthropic"
//! model = "claude-sonnet-4"
//! api_key_ref = "anthropic_api_key"
//!
//! [operations]
//! similarity = "claude-3-5-haiku"
//!
//! [operations.embedding]
//! provider = "openai"
//! model = "text-embedding-3-small"
//!
//! [catalog."house-model-7b"]
//! supports_temperature = true
//! supports_top_p = true
//! supports_embeddings = false
//! supports_memory_style_completions = true
//! supports_reliable_numeric_rating = false
//! max_context_size = 32768
//! ```

use crate::backend::{BackendSpec, CredentialSource};
use crate::capability::{CapabilityCatalog, CapabilityDescriptor, OperationKind};
use crate::error::{Error, Result};
use crate::routing::BackendSelector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Main Mnemoroute configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MnemoConfig {
    /// Default backend
    #[serde(default)]
    pub backend: BackendConfig,

    /// Per-operation backend overrides, keyed by operation name
    #[serde(default)]
    pub operations: BTreeMap<String, BackendSelector>,

    /// Extra model capabilities, consulted before the built-in table
    #[serde(default)]
    pub catalog: BTreeMap<String, CapabilityDescriptor>,
}

/// Default backend configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Provider identity
    pub provider: String,

    /// Model name
    pub model: String,

    /// Inline API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_ref: Option<String>,

    /// Provider-specific options
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, serde_json::Value>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4".to_string(),
            api_key: None,
            api_key_ref: Some("anthropic_api_key".to_string()),
            options: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_ref", &self.api_key_ref)
            .field("options", &self.options)
            .finish()
    }
}

impl MnemoConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load the file at `path` if given, else the default location if it
    /// exists, else built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `$XDG_CONFIG_HOME/mnemoroute/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("mnemoroute").join("config.toml"))
    }

    /// Check required fields and operation names.
    pub fn validate(&self) -> Result<()> {
        if self.backend.provider.trim().is_empty() {
            return Err(Error::Config("backend.provider must not be empty".to_string()));
        }
        if self.backend.model.trim().is_empty() {
            return Err(Error::Config("backend.model must not be empty".to_string()));
        }
        for (name, selector) in &self.operations {
            if OperationKind::parse(name).is_none() {
                return Err(Error::Config(format!("unknown operation '{name}'")));
            }
            if selector.model_name().trim().is_empty() {
                return Err(Error::Config(format!(
                    "operations.{name}: model must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Operation overrides keyed by [`OperationKind`].
    pub fn operation_selectors(&self) -> Result<HashMap<OperationKind, BackendSelector>> {
        self.operations
            .iter()
            .map(|(name, selector)| {
                OperationKind::parse(name)
                    .map(|kind| (kind, selector.clone()))
                    .ok_or_else(|| Error::Config(format!("unknown operation '{name}'")))
            })
            .collect()
    }

    /// Built-in catalog extended with the configured entries.
    pub fn capability_catalog(&self) -> CapabilityCatalog {
        self.catalog
            .iter()
            .fold(CapabilityCatalog::new(), |catalog, (model, caps)| {
                catalog.with_entry(model.clone(), *caps)
            })
    }

    /// Spec for the default backend.
    ///
    /// Credential order: inline `api_key`, then the `api_key_ref` variable
    /// (as given, then upper-cased), then `credentials` for the provider.
    pub fn backend_spec(&self, credentials: &dyn CredentialSource) -> BackendSpec {
        let credential = self
            .backend
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.backend.api_key_ref.as_deref().and_then(env_ref))
            .or_else(|| credentials.lookup(&self.backend.provider));

        BackendSpec {
            provider: self.backend.provider.trim().to_string(),
            model: self.backend.model.trim().to_string(),
            credential,
            options: self.backend.options.clone(),
        }
    }
}

/// Read an API key reference: exact name first, then UPPER_CASE.
fn env_ref(name: &str) -> Option<String> {
    std::env::var(name)
        .or_else(|_| std::env::var(name.to_uppercase()))
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::StaticCredentials;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [backend]
        provider = "anthropic"
        model = "claude-sonnet-4"
        api_key = "sk-inline"

        [operations]
        similarity = "claude-3-5-haiku"

        [operations.embedding]
        provider = "openai"
        model = "text-embedding-3-small"

        [catalog."house-model-7b"]
        supports_temperature = true
        supports_top_p = false
        supports_embeddings = false
        supports_memory_style_completions = true
        supports_reliable_numeric_rating = true
        max_context_size = 32768
        length_param = "num_predict"
    "#;

    #[test]
    fn test_default_config() {
        let config = MnemoConfig::default();
        assert_eq!(config.backend.provider, "anthropic");
        assert_eq!(config.backend.model, "claude-sonnet-4");
        assert!(config.operations.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sample() {
        let config = MnemoConfig::from_toml_str(SAMPLE).unwrap();
        let selectors = config.operation_selectors().unwrap();
        assert_eq!(selectors.len(), 2);
        assert_eq!(
            selectors[&OperationKind::Similarity],
            BackendSelector::model("claude-3-5-haiku")
        );
        assert_eq!(
            selectors[&OperationKind::Embedding].provider_name(),
            Some("openai")
        );

        let catalog = config.capability_catalog();
        assert_eq!(catalog.registered_len(), 1);
        let caps = catalog.lookup("house-model-7b").unwrap();
        assert!(caps.supports_reliable_numeric_rating);
        assert_eq!(caps.length_param, crate::capability::LengthParam::NumPredict);
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let err = MnemoConfig::from_toml_str(
            r#"
            [operations]
            dreaming = "gpt-4o"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("dreaming"));
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = MnemoConfig::from_toml_str(
            r#"
            [backend]
            provider = "openai"
            model = ""
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_operation_names_are_case_insensitive() {
        let config = MnemoConfig::from_toml_str(
            r#"
            [operations]
            Clustering = "gpt-4o"
            "#,
        )
        .unwrap();
        let selectors = config.operation_selectors().unwrap();
        assert!(selectors.contains_key(&OperationKind::Clustering));
    }

    #[test]
    fn test_toml_roundtrip_keeps_selectors() {
        let config = MnemoConfig::from_toml_str(SAMPLE).unwrap();
        let rendered = config.to_toml_string().unwrap();
        let reparsed = MnemoConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.operations, config.operations);
        assert_eq!(reparsed.backend.api_key.as_deref(), Some("sk-inline"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = MnemoConfig::load(file.path()).unwrap();
        assert_eq!(config.backend.model, "claude-sonnet-4");

        let via_option = MnemoConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(via_option.operations.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MnemoConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_backend_spec_credential_order() {
        let credentials = StaticCredentials::new().with("anthropic", "sk-source");

        let inline = MnemoConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            inline.backend_spec(&credentials).credential.as_deref(),
            Some("sk-inline")
        );

        std::env::set_var("MNEMOROUTE_TEST_REF_KEY", "sk-ref");
        let mut by_ref = MnemoConfig::default();
        by_ref.backend.api_key_ref = Some("mnemoroute_test_ref_key".to_string());
        assert_eq!(
            by_ref.backend_spec(&credentials).credential.as_deref(),
            Some("sk-ref")
        );

        let mut from_source = MnemoConfig::default();
        from_source.backend.api_key_ref = Some("mnemoroute_test_unset_ref".to_string());
        let spec = from_source.backend_spec(&credentials);
        assert_eq!(spec.credential.as_deref(), Some("sk-source"));
        assert_eq!(spec.provider, "anthropic");
    }
}
