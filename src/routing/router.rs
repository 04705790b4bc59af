//! Per-operation backend resolution
//!
//! Operations without a selector use the default backend. Operations with a
//! selector get a dedicated backend, built lazily on first use and memoized
//! for the router's lifetime.
//!
//! Construction is single-flight: the first caller stores an initialization
//! cell for the operation *before* awaiting construction, and every
//! concurrent caller awaits that same cell. One construction, one set of
//! warnings, no matter how many callers race.
//!
//! A failed construction is not retried: the operation is pinned to the
//! default backend until [`OperationRouter::reset`].

use super::selector::BackendSelector;
use crate::backend::{Backend, BackendFactory, BackendSpec, CredentialSource, EnvCredentials};
use crate::capability::{CapabilityCatalog, OperationKind};
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, TracingSink};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<dyn Backend>>>;

/// Resolves the backend serving each operation kind.
pub struct OperationRouter {
    default_backend: Arc<dyn Backend>,
    default_spec: BackendSpec,
    selectors: HashMap<OperationKind, BackendSelector>,
    factory: Arc<dyn BackendFactory>,
    credentials: Arc<dyn CredentialSource>,
    catalog: Arc<CapabilityCatalog>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    slots: Mutex<HashMap<OperationKind, Slot>>,
}

impl OperationRouter {
    /// Create a router around an already constructed default backend.
    ///
    /// `default_spec` describes how the default backend was built; selectors
    /// inherit its provider, credential and options.
    pub fn new(
        default_backend: Arc<dyn Backend>,
        default_spec: BackendSpec,
        factory: Arc<dyn BackendFactory>,
    ) -> Self {
        Self {
            default_backend,
            default_spec,
            selectors: HashMap::new(),
            factory,
            credentials: Arc::new(EnvCredentials),
            catalog: Arc::new(CapabilityCatalog::new()),
            diagnostics: Arc::new(TracingSink),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Set the per-operation selectors.
    pub fn with_selectors(mut self, selectors: HashMap<OperationKind, BackendSelector>) -> Self {
        self.selectors = selectors;
        self
    }

    /// Set the credential source consulted for selector providers.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the capability catalog used for unknown-model warnings.
    pub fn with_catalog(mut self, catalog: Arc<CapabilityCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Set the diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Selector configured for an operation, if any.
    pub fn selector(&self, kind: OperationKind) -> Option<&BackendSelector> {
        self.selectors.get(&kind)
    }

    /// The default backend.
    pub fn default_backend(&self) -> Arc<dyn Backend> {
        Arc::clone(&self.default_backend)
    }

    /// Spec the default backend was built from.
    pub fn default_spec(&self) -> &BackendSpec {
        &self.default_spec
    }

    /// Whether a backend for `kind` has finished resolving.
    pub fn is_memoized(&self, kind: OperationKind) -> bool {
        self.lock_slots()
            .get(&kind)
            .is_some_and(|slot| slot.initialized())
    }

    /// Forget every memoized backend; the next resolution rebuilds.
    pub fn reset(&self) {
        self.lock_slots().clear();
        tracing::debug!("Operation router cache cleared");
    }

    /// Backend serving `kind`. Never fails: problems fall back to the default.
    pub async fn resolve(&self, kind: OperationKind) -> Arc<dyn Backend> {
        let Some(selector) = self.selectors.get(&kind) else {
            return self.default_backend();
        };

        // The slot is stored before anyone awaits it.
        let slot = {
            let mut slots = self.lock_slots();
            Arc::clone(slots.entry(kind).or_default())
        };

        let backend = slot.get_or_init(|| self.construct(kind, selector)).await;
        Arc::clone(backend)
    }

    async fn construct(&self, kind: OperationKind, selector: &BackendSelector) -> Arc<dyn Backend> {
        let spec = match self.spec_for(selector) {
            Ok(spec) => spec,
            Err(Error::MissingCredential { provider }) => {
                self.diagnostics
                    .record(DiagnosticEvent::MissingCredential { operation: kind, provider });
                return self.default_backend();
            }
            Err(e) => {
                self.diagnostics.record(DiagnosticEvent::BackendConstructionFailed {
                    operation: kind,
                    provider: self.provider_for(selector).to_string(),
                    model: selector.model_name().to_string(),
                    reason: e.to_string(),
                });
                return self.default_backend();
            }
        };

        if self.catalog.lookup(&spec.model).is_none() {
            self.diagnostics.record(DiagnosticEvent::UnknownModel {
                operation: kind,
                model: spec.model.clone(),
            });
        }

        match self.factory.create(&spec).await {
            Ok(backend) => {
                tracing::info!(
                    operation = %kind,
                    provider = %spec.provider,
                    model = %spec.model,
                    "Created operation backend"
                );
                backend
            }
            Err(e) => {
                self.diagnostics.record(DiagnosticEvent::BackendConstructionFailed {
                    operation: kind,
                    provider: spec.provider,
                    model: spec.model,
                    reason: e.to_string(),
                });
                self.default_backend()
            }
        }
    }

    /// Build the spec for a selector.
    ///
    /// Credential order: the selector's own, then the credential source for
    /// the provider, then the default backend's. A provider different from
    /// the default with no credential at all is an error.
    fn spec_for(&self, selector: &BackendSelector) -> Result<BackendSpec> {
        let model = selector.model_name().trim();
        if model.is_empty() {
            return Err(Error::InvalidOptions("selector names no model".to_string()));
        }

        let provider = self.provider_for(selector).to_string();
        let same_provider = provider == self.default_spec.provider;

        let credential = match selector.own_credential() {
            Some(own) => Some(own.to_string()),
            None => self.credentials.lookup(&provider).or_else(|| {
                let borrowed = self
                    .default_spec
                    .credential
                    .clone()
                    .filter(|c| !c.trim().is_empty());
                if borrowed.is_some() && !same_provider {
                    tracing::debug!(
                        provider = %provider,
                        default_provider = %self.default_spec.provider,
                        "Using the default backend's credential for a different provider"
                    );
                }
                borrowed
            }),
        };

        if credential.is_none() && !same_provider {
            return Err(Error::MissingCredential { provider });
        }

        let options = match selector.options() {
            Some(options) => options.clone(),
            None => self.default_spec.options.clone(),
        };

        Ok(BackendSpec {
            provider,
            model: model.to_string(),
            credential,
            options,
        })
    }

    fn provider_for<'a>(&'a self, selector: &'a BackendSelector) -> &'a str {
        selector
            .provider_name()
            .unwrap_or(self.default_spec.provider.as_str())
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<OperationKind, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
