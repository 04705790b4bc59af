//! Typed memory operations over heterogeneous backends
//!
//! Every operation follows the same path:
//!
//! 1. resolve the backend for the operation through the router
//! 2. check the catalog: a backend lacking the required capability is never
//!    called, the degraded strategy answers instead
//! 3. call the backend with options the model accepts
//! 4. interpret the text; an unusable answer resolves to a documented default
//!
//! A failed call degrades like a capability shortfall. Embedding and general
//! completion are the exceptions: they have no local substitute, so their
//! errors reach the caller.

use super::prompts;
use crate::backend::{
    estimate_tokens, Backend, BackendFactory, BackendSpec, CompletionOptions, CredentialSource,
    EnvCredentials, OfflineFactory,
};
use crate::capability::{grants, Capability, CapabilityCatalog, CapabilityDescriptor, OperationKind};
use crate::config::MnemoConfig;
use crate::degraded;
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, TracingSink};
use crate::error::{Error, Result};
use crate::interpret::{extract_json, extract_score, map_cluster_indices, single_cluster};
use crate::routing::{BackendSelector, OperationRouter};
use std::collections::HashMap;
use std::sync::Arc;

/// Sampling settings for one operation's calls.
struct Tuning {
    max_tokens: u32,
    temperature: f32,
}

const NUMERIC: Tuning = Tuning {
    max_tokens: 32,
    temperature: 0.0,
};
const SUMMARIZATION: Tuning = Tuning {
    max_tokens: 1024,
    temperature: 0.3,
};
const ABSTRACTION: Tuning = Tuning {
    max_tokens: 256,
    temperature: 0.5,
};
const CLUSTERING: Tuning = Tuning {
    max_tokens: 512,
    temperature: 0.2,
};

/// Routes memory operations to backends and decodes their answers.
pub struct Orchestrator {
    router: OperationRouter,
    catalog: Arc<CapabilityCatalog>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Orchestrator {
    /// Start building an orchestrator around a constructed default backend.
    pub fn builder(default_backend: Arc<dyn Backend>, default_spec: BackendSpec) -> OrchestratorBuilder {
        OrchestratorBuilder::new(default_backend, default_spec)
    }

    /// Build the default backend and router from configuration.
    ///
    /// A default backend that cannot be constructed is a hard error.
    pub async fn from_config(
        config: &MnemoConfig,
        factory: Arc<dyn BackendFactory>,
        credentials: Arc<dyn CredentialSource>,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Result<Self> {
        config.validate()?;
        let default_spec = config.backend_spec(credentials.as_ref());
        let default_backend = factory.create(&default_spec).await?;

        OrchestratorBuilder::new(default_backend, default_spec)
            .catalog(config.capability_catalog())
            .selectors(config.operation_selectors()?)
            .factory(factory)
            .credentials(credentials)
            .diagnostics(diagnostics)
            .build()
    }

    /// The operation router.
    pub fn router(&self) -> &OperationRouter {
        &self.router
    }

    /// The capability catalog.
    pub fn catalog(&self) -> &CapabilityCatalog {
        &self.catalog
    }

    /// Forget memoized operation backends.
    pub fn reset(&self) {
        self.router.reset();
    }

    /// Similarity of two memories in `[0, 1]`.
    pub async fn rate_similarity(&self, a: &str, b: &str) -> f64 {
        let kind = OperationKind::Similarity;
        let Some((backend, caps)) = self.capable_backend(kind).await else {
            return degraded::similarity(a, b);
        };
        let Some(text) = self
            .call(kind, backend.as_ref(), caps.as_ref(), &prompts::similarity(a, b), &NUMERIC)
            .await
        else {
            return degraded::similarity(a, b);
        };

        self.score(kind, &text, prompts::SIMILARITY_TAG, 0.5, 0.0, 1.0)
    }

    /// Importance of a memory in `[0, 10]`.
    pub async fn score_importance(&self, content: &str) -> f64 {
        let kind = OperationKind::Importance;
        let Some((backend, caps)) = self.capable_backend(kind).await else {
            return degraded::importance(content);
        };
        let Some(text) = self
            .call(kind, backend.as_ref(), caps.as_ref(), &prompts::importance(content), &NUMERIC)
            .await
        else {
            return degraded::importance(content);
        };

        self.score(kind, &text, prompts::IMPORTANCE_TAG, 5.0, 0.0, 10.0)
    }

    /// Summaries of `observations`.
    ///
    /// Zero or one observation is returned as is.
    pub async fn summarize(&self, observations: &[String]) -> Vec<String> {
        if observations.len() <= 1 {
            return observations.to_vec();
        }

        let kind = OperationKind::Summarization;
        let Some((backend, caps)) = self.capable_backend(kind).await else {
            return degraded::summarization(observations);
        };
        let prompt = prompts::summarization(observations);
        let Some(text) = self
            .call(kind, backend.as_ref(), caps.as_ref(), &prompt, &SUMMARIZATION)
            .await
        else {
            return degraded::summarization(observations);
        };

        if let Some(items) = extract_json::<Vec<String>>(&text) {
            let summaries: Vec<String> = items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !summaries.is_empty() {
                return summaries;
            }
        }

        // Prose answers are a single summary.
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return vec![trimmed.to_string()];
        }

        self.diagnostics.record(DiagnosticEvent::ParseFailure {
            operation: kind,
            detail: "empty summarization response".to_string(),
        });
        degraded::summarization(observations)
    }

    /// One general statement covering `observations`.
    pub async fn abstract_observations(&self, observations: &[String]) -> String {
        if observations.is_empty() {
            return String::new();
        }

        let kind = OperationKind::Abstraction;
        let Some((backend, caps)) = self.capable_backend(kind).await else {
            return degraded::abstraction(observations);
        };
        let prompt = prompts::abstraction(observations);
        let Some(text) = self
            .call(kind, backend.as_ref(), caps.as_ref(), &prompt, &ABSTRACTION)
            .await
        else {
            return degraded::abstraction(observations);
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.diagnostics.record(DiagnosticEvent::ParseFailure {
                operation: kind,
                detail: "empty abstraction response".to_string(),
            });
            return degraded::abstraction(observations);
        }
        trimmed.to_string()
    }

    /// Partition of `observations` into topical groups.
    ///
    /// The flattened result is always a permutation of the input.
    pub async fn cluster(&self, observations: &[String]) -> Vec<Vec<String>> {
        if observations.len() <= 1 {
            return single_cluster(observations);
        }

        let kind = OperationKind::Clustering;
        let Some((backend, caps)) = self.capable_backend(kind).await else {
            return degraded::cluster(observations);
        };
        let prompt = prompts::clustering(observations);
        let Some(text) = self
            .call(kind, backend.as_ref(), caps.as_ref(), &prompt, &CLUSTERING)
            .await
        else {
            return degraded::cluster(observations);
        };

        let mapped = extract_json::<serde_json::Value>(&text)
            .and_then(|parsed| map_cluster_indices(&parsed, observations));
        match mapped {
            Some(clusters) => clusters,
            None => {
                self.diagnostics.record(DiagnosticEvent::ParseFailure {
                    operation: kind,
                    detail: format!("expected an array of index arrays, got {}", preview(&text)),
                });
                single_cluster(observations)
            }
        }
    }

    /// Plain completion on the general-purpose backend.
    ///
    /// Options the model rejects are dropped. Errors propagate.
    pub async fn complete(&self, prompt: &str, options: Option<CompletionOptions>) -> Result<String> {
        let kind = OperationKind::General;
        let backend = self.router.resolve(kind).await;
        let caps = self.catalog.lookup(backend.model());
        let options = fit_options(options.unwrap_or_default(), caps.as_ref());

        backend.complete(prompt, &options).await.map_err(|e| {
            self.record_call_failure(kind, backend.as_ref(), &e);
            e
        })
    }

    /// Embedding of `text`, optionally with a requested vector size.
    ///
    /// Fails with [`Error::CapabilityUnavailable`] when the embedding backend
    /// has no embedding endpoint; a fabricated vector is never returned.
    pub async fn embed(&self, text: &str, dimensions: Option<usize>) -> Result<Vec<f32>> {
        let kind = OperationKind::Embedding;
        let capability = Capability::Embeddings;
        let backend = self.router.resolve(kind).await;
        let caps = self.catalog.lookup(backend.model());

        let embedder = match backend.embeddings() {
            Some(embedder) if grants(caps.as_ref(), capability) => embedder,
            _ => {
                self.diagnostics.record(DiagnosticEvent::CapabilityShortfall {
                    operation: kind,
                    model: backend.model().to_string(),
                    capability,
                });
                return Err(Error::CapabilityUnavailable {
                    operation: kind.to_string(),
                    capability: capability.to_string(),
                    provider: backend.provider().to_string(),
                    model: backend.model().to_string(),
                });
            }
        };

        embedder.embed(text, dimensions).await.map_err(|e| {
            self.record_call_failure(kind, backend.as_ref(), &e);
            e
        })
    }

    /// Token count from the default backend's tokenizer, or an estimate.
    pub fn count_tokens(&self, text: &str) -> usize {
        self.router
            .default_backend()
            .count_tokens(text)
            .unwrap_or_else(|| estimate_tokens(text))
    }

    /// Resolve the backend for `kind`, or record a shortfall and return `None`.
    async fn capable_backend(
        &self,
        kind: OperationKind,
    ) -> Option<(Arc<dyn Backend>, Option<CapabilityDescriptor>)> {
        let backend = self.router.resolve(kind).await;
        let caps = self.catalog.lookup(backend.model());

        if let Some(capability) = kind.required_capability() {
            if !grants(caps.as_ref(), capability) {
                self.diagnostics.record(DiagnosticEvent::CapabilityShortfall {
                    operation: kind,
                    model: backend.model().to_string(),
                    capability,
                });
                return None;
            }
        }
        Some((backend, caps))
    }

    /// Call the backend; a failure is recorded and yields `None`.
    async fn call(
        &self,
        kind: OperationKind,
        backend: &dyn Backend,
        caps: Option<&CapabilityDescriptor>,
        prompt: &str,
        tuning: &Tuning,
    ) -> Option<String> {
        let options = fit_options(
            CompletionOptions {
                max_tokens: tuning.max_tokens,
                temperature: Some(tuning.temperature),
                system_prompt: Some(prompts::MEMORY_SYSTEM_PROMPT.to_string()),
                ..CompletionOptions::default()
            },
            caps,
        );

        match backend.complete(prompt, &options).await {
            Ok(text) => Some(text),
            Err(e) => {
                self.record_call_failure(kind, backend, &e);
                None
            }
        }
    }

    fn score(&self, kind: OperationKind, text: &str, tag: &str, default: f64, min: f64, max: f64) -> f64 {
        let extraction = extract_score(text, tag, default, min, max);
        if extraction.is_default() {
            self.diagnostics.record(DiagnosticEvent::ParseFailure {
                operation: kind,
                detail: format!("no score in {}", preview(text)),
            });
        }
        extraction.value
    }

    fn record_call_failure(&self, kind: OperationKind, backend: &dyn Backend, error: &Error) {
        self.diagnostics.record(DiagnosticEvent::BackendCallFailed {
            operation: kind,
            provider: backend.provider().to_string(),
            model: backend.model().to_string(),
            reason: error.to_string(),
        });
    }
}

/// Drop sampling parameters the model rejects and use its length parameter.
///
/// Unknown models keep everything.
fn fit_options(mut options: CompletionOptions, caps: Option<&CapabilityDescriptor>) -> CompletionOptions {
    if let Some(caps) = caps {
        if !caps.supports_temperature {
            options.temperature = None;
        }
        if !caps.supports_top_p {
            options.top_p = None;
        }
        options.length_param = caps.length_param;
    }
    options
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "an empty response".to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX).collect();
    if trimmed.chars().count() > MAX {
        cut.push_str("...");
    }
    format!("{cut:?}")
}

/// Builder for [`Orchestrator`].
pub struct OrchestratorBuilder {
    default_backend: Arc<dyn Backend>,
    default_spec: BackendSpec,
    catalog: CapabilityCatalog,
    selectors: HashMap<OperationKind, BackendSelector>,
    factory: Option<Arc<dyn BackendFactory>>,
    credentials: Arc<dyn CredentialSource>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl OrchestratorBuilder {
    pub fn new(default_backend: Arc<dyn Backend>, default_spec: BackendSpec) -> Self {
        Self {
            default_backend,
            default_spec,
            catalog: CapabilityCatalog::new(),
            selectors: HashMap::new(),
            factory: None,
            credentials: Arc::new(EnvCredentials),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn catalog(mut self, catalog: CapabilityCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Route one operation to a dedicated backend.
    pub fn selector(mut self, kind: OperationKind, selector: BackendSelector) -> Self {
        self.selectors.insert(kind, selector);
        self
    }

    pub fn selectors(mut self, selectors: HashMap<OperationKind, BackendSelector>) -> Self {
        self.selectors.extend(selectors);
        self
    }

    pub fn factory(mut self, factory: Arc<dyn BackendFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Build the orchestrator.
    ///
    /// Selectors need a factory to build their backends.
    pub fn build(self) -> Result<Orchestrator> {
        let factory: Arc<dyn BackendFactory> = match self.factory {
            Some(factory) => factory,
            None if self.selectors.is_empty() => Arc::new(OfflineFactory),
            None => {
                return Err(Error::Config(
                    "operation selectors require a backend factory".to_string(),
                ))
            }
        };

        if self.catalog.lookup(self.default_backend.model()).is_none() {
            self.diagnostics.record(DiagnosticEvent::UnknownModel {
                operation: OperationKind::General,
                model: self.default_backend.model().to_string(),
            });
        }

        let catalog = Arc::new(self.catalog);
        let router = OperationRouter::new(self.default_backend, self.default_spec, factory)
            .with_selectors(self.selectors)
            .with_credentials(self.credentials)
            .with_catalog(Arc::clone(&catalog))
            .with_diagnostics(Arc::clone(&self.diagnostics));

        tracing::debug!(
            provider = %router.default_spec().provider,
            model = %router.default_spec().model,
            "Orchestrator ready"
        );

        Ok(Orchestrator {
            router,
            catalog,
            diagnostics: self.diagnostics,
        })
    }
}
