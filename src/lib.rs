//! Mnemoroute - capability-aware routing of memory operations across LLM backends
//!
//! Mnemoroute gives an agent's memory layer five typed operations
//! (summarization, abstraction, similarity rating, importance scoring and
//! clustering) plus plain completion and embedding, and serves them from
//! whichever completion backends are configured. Backends differ in what they
//! reliably do; Mnemoroute picks a backend per operation, skips backends that
//! cannot do the job, and recovers numbers, JSON and index lists from
//! whatever text comes back.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Orchestrator                            │
//! │  summarize · abstract · similarity · importance · cluster        │
//! │  complete · embed · count_tokens                                 │
//! └───────┬───────────────────┬───────────────────┬─────────────────┘
//!         │ resolve(kind)     │ lookup(model)     │ fallback
//! ┌───────▼─────────┐ ┌───────▼─────────┐ ┌───────▼─────────┐
//! │ OperationRouter │ │CapabilityCatalog│ │    degraded     │
//! │  single-flight  │ │ exact → prefix  │ │ Jaccard, chunks │
//! │  memoized slots │ │  → family       │ │ first sentence  │
//! └───────┬─────────┘ └─────────────────┘ └─────────────────┘
//!         │ BackendFactory::create(spec)
//! ┌───────▼──────────────────────────────┐   ┌─────────────────┐
//! │ Backend (provider, model, credential)│──►│    interpret    │
//! │ complete · embeddings? · tokens?     │   │ score/json/index│
//! └──────────────────────────────────────┘   └─────────────────┘
//!
//!         every fallback ──► DiagnosticsSink (tracing or in-memory)
//! ```
//!
//! ## Guarantees
//!
//! - Numeric results always lie in their documented range
//! - Clustering results are always a partition of the input
//! - Backend failures degrade to deterministic local answers; only
//!   `complete` and `embed` return errors
//! - Concurrent first use of an operation builds its backend once
//!
//! ## Modules
//!
//! - [`capability`]: Model capability catalog
//! - [`routing`]: Per-operation backend selection
//! - [`orchestrator`]: The memory-operation surface
//! - [`interpret`]: Score, JSON and cluster-index extraction
//! - [`degraded`]: Local fallback strategies
//! - [`backend`]: Backend contract, credentials, offline backend
//! - [`diagnostics`]: Fallback event reporting
//! - [`config`]: Configuration management

pub mod backend;
pub mod capability;
pub mod config;
pub mod degraded;
pub mod diagnostics;
pub mod error;
pub mod interpret;
pub mod orchestrator;
pub mod routing;

#[cfg(test)]
pub(crate) mod testing;

pub use config::MnemoConfig;
pub use error::{Error, Result};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
