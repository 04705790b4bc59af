//! Credential lookup keyed by provider identity

use std::collections::HashMap;

/// Source of provider credentials.
///
/// Absence is a normal outcome; the router decides what to do about it.
pub trait CredentialSource: Send + Sync {
    /// Credential for `provider`, or `None`. Empty values count as absent.
    fn lookup(&self, provider: &str) -> Option<String>;
}

/// Reads `<PROVIDER>_API_KEY` from the process environment.
///
/// `openai` → `$OPENAI_API_KEY`, `azure-openai` → `$AZURE_OPENAI_API_KEY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Environment variable name consulted for `provider`.
    pub fn variable_for(provider: &str) -> String {
        let normalized: String = provider
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{normalized}_API_KEY")
    }
}

impl CredentialSource for EnvCredentials {
    fn lookup(&self, provider: &str) -> Option<String> {
        std::env::var(Self::variable_for(provider))
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

/// Fixed provider → credential map.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    keys: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential (builder style).
    pub fn with(mut self, provider: impl Into<String>, credential: impl Into<String>) -> Self {
        self.keys.insert(provider.into(), credential.into());
        self
    }
}

impl CredentialSource for StaticCredentials {
    fn lookup(&self, provider: &str) -> Option<String> {
        self.keys
            .get(provider)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }
}
