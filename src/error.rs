//! Mnemoroute error types

use thiserror::Error;

/// Mnemoroute error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider rejected or failed a call
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider identity that failed
        provider: String,
        /// Provider-supplied failure detail
        message: String,
    },

    /// No credential could be resolved for a provider
    #[error("Missing credential for provider '{provider}'")]
    MissingCredential {
        /// Provider identity lacking a credential
        provider: String,
    },

    /// Backend factory does not know this provider identity
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Provider-specific options could not be interpreted
    #[error("Invalid backend options: {0}")]
    InvalidOptions(String),

    /// No backend can serve a capability that has no local substitute
    #[error("Capability unavailable: {operation} requires {capability}, but {provider}/{model} does not provide it")]
    CapabilityUnavailable {
        /// Operation that was requested
        operation: String,
        /// Capability that is missing
        capability: String,
        /// Provider of the resolved backend
        provider: String,
        /// Model of the resolved backend
        model: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Shorthand for a provider-side failure.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Mnemoroute operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        fn read(path: &str) -> Result<String> {
            Ok(std::fs::read_to_string(path)?)
        }
        let err = read("/nonexistent/mnemoroute/config.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }

    #[test]
    fn test_provider_shorthand() {
        let err = Error::provider("openai", "rate limited");
        assert_eq!(err.to_string(), "Provider error (openai): rate limited");
    }
}
