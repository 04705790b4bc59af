//! Operation orchestration: the typed memory-operation surface
//!
//! ## Architecture
//!
//! ```text
//! caller ──► Orchestrator ──► OperationRouter ──► Backend
//!                 │                                  │
//!                 ├── CapabilityCatalog (shortfall?) │ text
//!                 │                                  ▼
//!                 ├── degraded::* ◄── failure ── interpret::*
//!                 │
//!                 └── DiagnosticsSink (every fallback)
//! ```

#[allow(clippy::module_inception)]
pub mod orchestrator;
pub mod prompts;

pub use orchestrator::{Orchestrator, OrchestratorBuilder};
