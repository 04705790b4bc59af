//! Model capability catalog
//!
//! Maps a model identifier to the capabilities the routing layer relies on.
//!
//! Resolution order:
//!   1. Exact match (registered entries first, then the built-in table)
//!   2. Prefix match on the first two dash-delimited tokens of the id
//!      (handles unlisted dated ids like `gpt-4-1106-preview`)
//!   3. Family fallback: a conservative descriptor for a known family keyword
//!   4. `None`: unknown model, which callers treat per [`grants`](super::grants)

use super::types::{CapabilityDescriptor, LengthParam};
use serde::Serialize;

/// How a lookup was satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum CatalogMatch {
    Exact(String),
    Prefix(String),
    Family(String),
}

/// A resolved catalog entry together with how it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogHit {
    pub descriptor: CapabilityDescriptor,
    pub matched: CatalogMatch,
}

struct ModelEntry {
    key: &'static str,
    caps: CapabilityDescriptor,
}

const fn chat(
    context: u32,
    numeric: bool,
    temperature: bool,
    length_param: LengthParam,
) -> CapabilityDescriptor {
    CapabilityDescriptor {
        supports_temperature: temperature,
        supports_top_p: temperature,
        supports_embeddings: false,
        supports_memory_style_completions: true,
        supports_reliable_numeric_rating: numeric,
        max_context_size: context,
        length_param,
    }
}

const fn embedding(context: u32) -> CapabilityDescriptor {
    CapabilityDescriptor {
        supports_temperature: false,
        supports_top_p: false,
        supports_embeddings: true,
        supports_memory_style_completions: false,
        supports_reliable_numeric_rating: false,
        max_context_size: context,
        length_param: LengthParam::MaxTokens,
    }
}

// Ordered: prefix matching returns the first entry that starts with the prefix.
// Within a shared two-token prefix the least capable model comes first, so an
// unlisted dated id never inherits a sibling's stronger capabilities. Known
// dated ids get exact entries.
static BUILTIN_MODELS: &[ModelEntry] = &[
    // Anthropic
    ModelEntry { key: "claude-opus-4", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-opus-4-20250514", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-sonnet-4", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-sonnet-4-20250514", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-haiku-4", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-haiku", caps: chat(200_000, false, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-haiku-20240307", caps: chat(200_000, false, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-5-sonnet", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-5-sonnet-20240620", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-5-sonnet-20241022", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-5-haiku", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-5-haiku-20241022", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-opus", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "claude-3-opus-20240229", caps: chat(200_000, true, true, LengthParam::MaxTokens) },
    // OpenAI chat
    ModelEntry { key: "gpt-4", caps: chat(8_192, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-4-0613", caps: chat(8_192, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-4-turbo", caps: chat(128_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-4-turbo-2024-04-09", caps: chat(128_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-4o", caps: chat(128_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-4o-2024-08-06", caps: chat(128_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-4o-mini", caps: chat(128_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-4o-mini-2024-07-18", caps: chat(128_000, true, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-3.5-turbo", caps: chat(16_385, false, true, LengthParam::MaxTokens) },
    ModelEntry { key: "gpt-3.5-turbo-0125", caps: chat(16_385, false, true, LengthParam::MaxTokens) },
    // OpenAI reasoning models reject sampling parameters
    ModelEntry { key: "o1", caps: chat(200_000, true, false, LengthParam::MaxCompletionTokens) },
    ModelEntry { key: "o1-mini", caps: chat(128_000, true, false, LengthParam::MaxCompletionTokens) },
    ModelEntry { key: "o3-mini", caps: chat(200_000, true, false, LengthParam::MaxCompletionTokens) },
    // OpenAI embeddings
    ModelEntry { key: "text-embedding-3-small", caps: embedding(8_191) },
    ModelEntry { key: "text-embedding-3-large", caps: embedding(8_191) },
    ModelEntry { key: "text-embedding-ada-002", caps: embedding(8_191) },
    // Google
    ModelEntry { key: "gemini-1.5-flash", caps: chat(1_000_000, false, true, LengthParam::MaxOutputTokens) },
    ModelEntry { key: "gemini-1.5-flash-001", caps: chat(1_000_000, false, true, LengthParam::MaxOutputTokens) },
    ModelEntry { key: "gemini-1.5-flash-002", caps: chat(1_000_000, false, true, LengthParam::MaxOutputTokens) },
    ModelEntry { key: "gemini-1.5-pro", caps: chat(2_000_000, true, true, LengthParam::MaxOutputTokens) },
    ModelEntry { key: "gemini-1.5-pro-001", caps: chat(2_000_000, true, true, LengthParam::MaxOutputTokens) },
    ModelEntry { key: "gemini-1.5-pro-002", caps: chat(2_000_000, true, true, LengthParam::MaxOutputTokens) },
    ModelEntry { key: "gemini-2.0-flash", caps: chat(1_000_000, true, true, LengthParam::MaxOutputTokens) },
    ModelEntry { key: "gemini-2.0-flash-001", caps: chat(1_000_000, true, true, LengthParam::MaxOutputTokens) },
    // Local models (Ollama) drift on bare numbers
    ModelEntry { key: "llama3", caps: chat(8_192, false, true, LengthParam::NumPredict) },
    ModelEntry { key: "llama3.1", caps: chat(128_000, false, true, LengthParam::NumPredict) },
    ModelEntry { key: "mistral", caps: chat(32_768, false, true, LengthParam::NumPredict) },
    ModelEntry { key: "qwen2.5", caps: chat(32_768, false, true, LengthParam::NumPredict) },
];

/// Family keyword → conservative descriptor for ids no table entry matches.
static FAMILY_FALLBACKS: &[(&str, CapabilityDescriptor)] = &[
    ("claude", chat(100_000, false, true, LengthParam::MaxTokens)),
    ("gpt", chat(4_096, false, true, LengthParam::MaxTokens)),
];

/// Model capability catalog: the built-in table plus registered entries.
#[derive(Debug, Clone, Default)]
pub struct CapabilityCatalog {
    registered: Vec<(String, CapabilityDescriptor)>,
}

impl CapabilityCatalog {
    /// Catalog with only the built-in table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry ahead of the built-in table (builder style).
    pub fn with_entry(mut self, model: impl Into<String>, caps: CapabilityDescriptor) -> Self {
        self.register(model, caps);
        self
    }

    /// Register an entry ahead of the built-in table.
    ///
    /// Re-registering a model replaces its previous entry.
    pub fn register(&mut self, model: impl Into<String>, caps: CapabilityDescriptor) {
        let key = normalize(&model.into());
        self.registered.retain(|(existing, _)| *existing != key);
        self.registered.push((key, caps));
    }

    /// Number of registered (non built-in) entries.
    pub fn registered_len(&self) -> usize {
        self.registered.len()
    }

    /// Look up a model's capabilities. `None` is an expected outcome.
    pub fn lookup(&self, model: &str) -> Option<CapabilityDescriptor> {
        self.resolve(model).map(|hit| hit.descriptor)
    }

    /// Look up a model and report which resolution step matched.
    pub fn resolve(&self, model: &str) -> Option<CatalogHit> {
        let id = normalize(model);
        if id.is_empty() {
            return None;
        }

        if let Some((key, caps)) = self.entries().find(|(key, _)| *key == id) {
            return Some(CatalogHit {
                descriptor: caps,
                matched: CatalogMatch::Exact(key.to_string()),
            });
        }

        let prefix = leading_tokens(&id, 2);
        if let Some((key, caps)) = self.entries().find(|(key, _)| key.starts_with(prefix)) {
            return Some(CatalogHit {
                descriptor: caps,
                matched: CatalogMatch::Prefix(key.to_string()),
            });
        }

        FAMILY_FALLBACKS
            .iter()
            .find(|(family, _)| id.contains(family))
            .map(|(family, caps)| CatalogHit {
                descriptor: *caps,
                matched: CatalogMatch::Family((*family).to_string()),
            })
    }

    fn entries(&self) -> impl Iterator<Item = (&str, CapabilityDescriptor)> {
        self.registered
            .iter()
            .map(|(key, caps)| (key.as_str(), *caps))
            .chain(BUILTIN_MODELS.iter().map(|entry| (entry.key, entry.caps)))
    }
}

fn normalize(model: &str) -> String {
    model.trim().to_lowercase()
}

/// The first `n` dash-delimited tokens of `id`, as a slice of `id`.
fn leading_tokens(id: &str, n: usize) -> &str {
    match id.match_indices('-').nth(n - 1) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::types::{grants, Capability};

    #[test]
    fn test_exact_match() {
        let catalog = CapabilityCatalog::new();
        let hit = catalog.resolve("gpt-4o-mini").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Exact("gpt-4o-mini".into()));
        assert!(hit.descriptor.supports_reliable_numeric_rating);
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let catalog = CapabilityCatalog::new();
        let hit = catalog.resolve("  O1 ").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Exact("o1".into()));
        assert!(!hit.descriptor.supports_temperature);
        assert_eq!(hit.descriptor.length_param, LengthParam::MaxCompletionTokens);
    }

    #[test]
    fn test_known_dated_ids_match_exactly() {
        let catalog = CapabilityCatalog::new();
        for id in [
            "claude-3-haiku-20240307",
            "claude-3-5-sonnet-20241022",
            "gpt-4-0613",
            "gpt-4o-mini-2024-07-18",
            "gemini-1.5-flash-002",
        ] {
            let hit = catalog.resolve(id).unwrap();
            assert_eq!(hit.matched, CatalogMatch::Exact(id.into()), "id: {id}");
        }
    }

    #[test]
    fn test_dated_claude_3_haiku_not_trusted_with_numbers() {
        let catalog = CapabilityCatalog::new();
        let caps = catalog.lookup("claude-3-haiku-20240307");
        assert!(!grants(caps.as_ref(), Capability::ReliableNumericRating));

        let flash = catalog.lookup("gemini-1.5-flash-002").unwrap();
        assert!(!flash.supports_reliable_numeric_rating);
        assert_eq!(flash.max_context_size, 1_000_000);

        assert_eq!(catalog.lookup("gpt-4-0613").unwrap().max_context_size, 8_192);
    }

    #[test]
    fn test_prefix_match_takes_least_capable_sibling() {
        let catalog = CapabilityCatalog::new();
        // First two tokens are "claude-3"; the group starts with claude-3-haiku.
        let hit = catalog.resolve("claude-3-5-sonnet-latest").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Prefix("claude-3-haiku".into()));
        assert!(!hit.descriptor.supports_reliable_numeric_rating);

        let hit = catalog.resolve("gemini-1.5-pro-exp-0827").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Prefix("gemini-1.5-flash".into()));

        let hit = catalog.resolve("gpt-4-1106-preview").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Prefix("gpt-4".into()));
        assert_eq!(hit.descriptor.max_context_size, 8_192);

        let hit = catalog.resolve("gpt-4o-2099-01-01").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Prefix("gpt-4o".into()));
    }

    #[test]
    fn test_unlisted_dated_variant_never_outranks_its_base() {
        let catalog = CapabilityCatalog::new();
        for entry in BUILTIN_MODELS {
            let dated = format!("{}-20990101", entry.key);
            let Some(caps) = catalog.lookup(&dated) else {
                continue;
            };
            assert!(
                !caps.supports_reliable_numeric_rating || entry.caps.supports_reliable_numeric_rating,
                "{dated} gained numeric rating"
            );
            assert!(
                caps.max_context_size <= entry.caps.max_context_size,
                "{dated} gained context"
            );
            assert!(
                !caps.supports_temperature || entry.caps.supports_temperature,
                "{dated} gained temperature"
            );
        }
    }

    #[test]
    fn test_family_fallback() {
        let catalog = CapabilityCatalog::new();
        let hit = catalog.resolve("my-finetuned-claude").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Family("claude".into()));
        assert!(!hit.descriptor.supports_reliable_numeric_rating);
        assert!(!hit.descriptor.supports_embeddings);

        let hit = catalog.resolve("acme/gpt-neox").unwrap();
        assert_eq!(hit.matched, CatalogMatch::Family("gpt".into()));
    }

    #[test]
    fn test_unknown_model_is_none() {
        let catalog = CapabilityCatalog::new();
        assert!(catalog.lookup("phi-3-medium").is_none());
        assert!(catalog.lookup("").is_none());
        assert!(catalog.lookup("   ").is_none());
        assert!(catalog.lookup("some-unreleased-model-v9").is_none());
    }

    #[test]
    fn test_registered_entry_wins() {
        let custom = CapabilityDescriptor {
            supports_temperature: false,
            supports_top_p: false,
            supports_embeddings: true,
            supports_memory_style_completions: true,
            supports_reliable_numeric_rating: true,
            max_context_size: 4_096,
            length_param: LengthParam::NumPredict,
        };
        let catalog = CapabilityCatalog::new()
            .with_entry("llama3", custom)
            .with_entry("phi-3-medium", custom);

        assert_eq!(catalog.registered_len(), 2);
        assert_eq!(catalog.lookup("llama3"), Some(custom));
        assert_eq!(catalog.lookup("phi-3-medium-128k"), Some(custom));
    }

    #[test]
    fn test_register_replaces_existing() {
        let mut catalog = CapabilityCatalog::new();
        let mut caps = catalog.lookup("mistral").unwrap();
        caps.supports_reliable_numeric_rating = true;
        catalog.register("Mistral", caps);
        catalog.register("mistral", caps);
        assert_eq!(catalog.registered_len(), 1);
        assert!(catalog.lookup("mistral").unwrap().supports_reliable_numeric_rating);
    }

    #[test]
    fn test_leading_tokens() {
        assert_eq!(leading_tokens("claude-3-5-sonnet", 2), "claude-3");
        assert_eq!(leading_tokens("gpt-4o", 2), "gpt-4o");
        assert_eq!(leading_tokens("llama3", 2), "llama3");
    }
}
