//! Operation routing: which backend serves which memory operation
//!
//! ## Architecture
//!
//! ```text
//! OperationKind ──► OperationRouter ──► selector? ──no──► default backend
//!                                         │
//!                                        yes
//!                                         ▼
//!                         memoized slot (single-flight OnceCell)
//!                                         │
//!                         spec (provider, model, credential chain)
//!                                         │
//!                           BackendFactory::create ──err──► default backend
//! ```

pub mod router;
pub mod selector;

pub use router::OperationRouter;
pub use selector::{BackendSelector, SelectorSpec};
