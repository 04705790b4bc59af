//! Capability catalog: what each model can reliably do
//!
//! The catalog is pure and immutable once built; routing and orchestration
//! consult it to decide whether a backend may serve an operation or whether
//! a degraded local strategy must answer instead.

pub mod catalog;
pub mod types;

pub use catalog::{CapabilityCatalog, CatalogHit, CatalogMatch};
pub use types::{grants, Capability, CapabilityDescriptor, LengthParam, OperationKind};
