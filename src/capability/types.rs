//! Operation and capability types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic request type, independent of the backend that serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    General,
    Similarity,
    Importance,
    Summarization,
    Abstraction,
    Clustering,
    Embedding,
}

impl OperationKind {
    /// All operation kinds in declaration order.
    pub const ALL: [OperationKind; 7] = [
        OperationKind::General,
        OperationKind::Similarity,
        OperationKind::Importance,
        OperationKind::Summarization,
        OperationKind::Abstraction,
        OperationKind::Clustering,
        OperationKind::Embedding,
    ];

    /// Capability the resolved backend must have to serve this operation.
    ///
    /// `None` means any backend will do.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            OperationKind::General => None,
            OperationKind::Similarity | OperationKind::Importance => {
                Some(Capability::ReliableNumericRating)
            }
            OperationKind::Summarization
            | OperationKind::Abstraction
            | OperationKind::Clustering => Some(Capability::MemoryStyleCompletions),
            OperationKind::Embedding => Some(Capability::Embeddings),
        }
    }

    /// Lowercase name used in config keys and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::General => "general",
            OperationKind::Similarity => "similarity",
            OperationKind::Importance => "importance",
            OperationKind::Summarization => "summarization",
            OperationKind::Abstraction => "abstraction",
            OperationKind::Clustering => "clustering",
            OperationKind::Embedding => "embedding",
        }
    }

    /// Parse a lowercase operation name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A capability an operation may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Produces a trustworthy bare number when asked to rate something
    ReliableNumericRating,
    /// Produces free-form multi-sentence reasoning
    MemoryStyleCompletions,
    /// Exposes an embedding endpoint
    Embeddings,
}

impl Capability {
    /// Whether a model absent from the catalog is trusted with this capability.
    ///
    /// Unknown models are assumed capable, except for numeric rating: a number
    /// feeds automated decisions, so it is never trusted blindly.
    pub fn assumed_for_unknown_model(self) -> bool {
        !matches!(self, Capability::ReliableNumericRating)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::ReliableNumericRating => "reliable numeric rating",
            Capability::MemoryStyleCompletions => "memory-style completions",
            Capability::Embeddings => "embeddings",
        };
        f.write_str(name)
    }
}

/// Name of the request parameter a provider uses to cap output length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthParam {
    #[default]
    MaxTokens,
    MaxCompletionTokens,
    MaxOutputTokens,
    NumPredict,
}

impl LengthParam {
    /// Wire name of the parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            LengthParam::MaxTokens => "max_tokens",
            LengthParam::MaxCompletionTokens => "max_completion_tokens",
            LengthParam::MaxOutputTokens => "max_output_tokens",
            LengthParam::NumPredict => "num_predict",
        }
    }
}

/// Per-model capability record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Accepts a temperature parameter
    pub supports_temperature: bool,

    /// Accepts a top-p parameter
    pub supports_top_p: bool,

    /// Exposes embeddings
    pub supports_embeddings: bool,

    /// Produces free-form multi-sentence reasoning
    pub supports_memory_style_completions: bool,

    /// Produces a parseable number on request
    pub supports_reliable_numeric_rating: bool,

    /// Context window in tokens
    pub max_context_size: u32,

    /// Preferred length-limit parameter name
    #[serde(default)]
    pub length_param: LengthParam,
}

impl CapabilityDescriptor {
    /// Whether this descriptor grants a capability.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::ReliableNumericRating => self.supports_reliable_numeric_rating,
            Capability::MemoryStyleCompletions => self.supports_memory_style_completions,
            Capability::Embeddings => self.supports_embeddings,
        }
    }
}

/// Whether an optional descriptor grants a capability, applying the
/// unknown-model policy when the descriptor is absent.
pub fn grants(descriptor: Option<&CapabilityDescriptor>, capability: Capability) -> bool {
    match descriptor {
        Some(caps) => caps.supports(capability),
        None => capability.assumed_for_unknown_model(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_capabilities() {
        assert_eq!(OperationKind::General.required_capability(), None);
        assert_eq!(
            OperationKind::Similarity.required_capability(),
            Some(Capability::ReliableNumericRating)
        );
        assert_eq!(
            OperationKind::Importance.required_capability(),
            Some(Capability::ReliableNumericRating)
        );
        assert_eq!(
            OperationKind::Clustering.required_capability(),
            Some(Capability::MemoryStyleCompletions)
        );
        assert_eq!(
            OperationKind::Embedding.required_capability(),
            Some(Capability::Embeddings)
        );
    }

    #[test]
    fn test_unknown_model_policy() {
        assert!(!grants(None, Capability::ReliableNumericRating));
        assert!(grants(None, Capability::MemoryStyleCompletions));
        assert!(grants(None, Capability::Embeddings));
    }

    #[test]
    fn test_parse_operation_kind() {
        assert_eq!(OperationKind::parse("Clustering"), Some(OperationKind::Clustering));
        assert_eq!(OperationKind::parse(" similarity "), Some(OperationKind::Similarity));
        assert_eq!(OperationKind::parse("ranking"), None);
    }

    #[test]
    fn test_operation_kind_serde() {
        let json = serde_json::to_string(&OperationKind::Summarization).unwrap();
        assert_eq!(json, "\"summarization\"");
        let parsed: OperationKind = serde_json::from_str("\"embedding\"").unwrap();
        assert_eq!(parsed, OperationKind::Embedding);
    }

    #[test]
    fn test_length_param_names() {
        assert_eq!(LengthParam::default().as_str(), "max_tokens");
        assert_eq!(LengthParam::MaxCompletionTokens.as_str(), "max_completion_tokens");
    }
}
