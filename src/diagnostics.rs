//! Diagnostics side-channel
//!
//! Fallback decisions never show up in return values. They are reported as
//! [`DiagnosticEvent`]s to an injected [`DiagnosticsSink`], which makes them
//! observable and countable in tests instead of going to an ambient logger.

use crate::capability::{Capability, OperationKind};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Broad class of a diagnostic, mirroring the error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    /// Unknown model, missing credential, bad selector options
    ConfigurationWarning,
    /// Resolved backend cannot satisfy the operation
    CapabilityShortfall,
    /// Network, authentication or provider failure during a call
    BackendCallFailure,
    /// The response could not be interpreted as the required shape
    ParseFailure,
}

/// A single fallback or warning event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DiagnosticEvent {
    UnknownModel {
        operation: OperationKind,
        model: String,
    },
    MissingCredential {
        operation: OperationKind,
        provider: String,
    },
    BackendConstructionFailed {
        operation: OperationKind,
        provider: String,
        model: String,
        reason: String,
    },
    CapabilityShortfall {
        operation: OperationKind,
        model: String,
        capability: Capability,
    },
    BackendCallFailed {
        operation: OperationKind,
        provider: String,
        model: String,
        reason: String,
    },
    ParseFailure {
        operation: OperationKind,
        detail: String,
    },
}

impl DiagnosticEvent {
    /// Category this event belongs to.
    pub fn category(&self) -> DiagnosticCategory {
        match self {
            DiagnosticEvent::UnknownModel { .. }
            | DiagnosticEvent::MissingCredential { .. }
            | DiagnosticEvent::BackendConstructionFailed { .. } => {
                DiagnosticCategory::ConfigurationWarning
            }
            DiagnosticEvent::CapabilityShortfall { .. } => DiagnosticCategory::CapabilityShortfall,
            DiagnosticEvent::BackendCallFailed { .. } => DiagnosticCategory::BackendCallFailure,
            DiagnosticEvent::ParseFailure { .. } => DiagnosticCategory::ParseFailure,
        }
    }

    /// Operation the event was raised for.
    pub fn operation(&self) -> OperationKind {
        match self {
            DiagnosticEvent::UnknownModel { operation, .. }
            | DiagnosticEvent::MissingCredential { operation, .. }
            | DiagnosticEvent::BackendConstructionFailed { operation, .. }
            | DiagnosticEvent::CapabilityShortfall { operation, .. }
            | DiagnosticEvent::BackendCallFailed { operation, .. }
            | DiagnosticEvent::ParseFailure { operation, .. } => *operation,
        }
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::UnknownModel { operation, model } => write!(
                f,
                "[{operation}] model '{model}' is not in the capability catalog; assuming capable"
            ),
            DiagnosticEvent::MissingCredential {
                operation,
                provider,
            } => write!(
                f,
                "[{operation}] no credential for provider '{provider}'; using default backend"
            ),
            DiagnosticEvent::BackendConstructionFailed {
                operation,
                provider,
                model,
                reason,
            } => write!(
                f,
                "[{operation}] could not create backend {provider}/{model}: {reason}; using default backend"
            ),
            DiagnosticEvent::CapabilityShortfall {
                operation,
                model,
                capability,
            } => write!(
                f,
                "[{operation}] model '{model}' lacks {capability}; using degraded strategy"
            ),
            DiagnosticEvent::BackendCallFailed {
                operation,
                provider,
                model,
                reason,
            } => write!(
                f,
                "[{operation}] call to {provider}/{model} failed: {reason}"
            ),
            DiagnosticEvent::ParseFailure { operation, detail } => {
                write!(f, "[{operation}] unparseable response: {detail}")
            }
        }
    }
}

/// Receiver of diagnostic events.
pub trait DiagnosticsSink: Send + Sync {
    /// Record one event. Must not fail or block for long.
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards events to `tracing`.
///
/// Capability shortfalls are expected behavior and logged at debug; every
/// other category is a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, event: DiagnosticEvent) {
        let operation = event.operation();
        match event.category() {
            DiagnosticCategory::CapabilityShortfall => {
                tracing::debug!(operation = %operation, "{}", event);
            }
            category => {
                tracing::warn!(operation = %operation, category = ?category, "{}", event);
            }
        }
    }
}

/// Default number of events kept by [`MemorySink`].
pub const DEFAULT_HISTORY: usize = 1024;

/// Keeps a bounded history of events in memory.
#[derive(Debug)]
pub struct MemorySink {
    events: Mutex<VecDeque<DiagnosticEvent>>,
    capacity: usize,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    /// Create a sink keeping the last [`DEFAULT_HISTORY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY)
    }

    /// Create a sink keeping the last `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// All retained events, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.lock().iter().cloned().collect()
    }

    /// The last `limit` events, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<DiagnosticEvent> {
        let events = self.lock();
        let skip = events.len().saturating_sub(limit);
        events.iter().skip(skip).cloned().collect()
    }

    /// Number of retained events in a category.
    pub fn count(&self, category: DiagnosticCategory) -> usize {
        self.lock()
            .iter()
            .filter(|event| event.category() == category)
            .count()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no events are retained.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all retained events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<DiagnosticEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, event: DiagnosticEvent) {
        let mut events = self.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}
