//! Response interpretation: typed values from free-form model text
//!
//! ## Architecture
//!
//! ```text
//! raw text ─┬─► extract_score ──► clamped f64 + ScoreSource
//!           ├─► extract_json ───► T | None
//!           └─► extract_json::<Value> ─► map_cluster_indices ─► ClusterAssignment | None
//! ```
//!
//! All functions are pure and never panic on model output. A `None` or
//! `ScoreSource::Default` result is a parse failure the caller resolves.

pub mod clusters;
pub mod json;
pub mod score;

pub use clusters::{map_cluster_indices, single_cluster, ClusterAssignment};
pub use json::extract_json;
pub use score::{extract_score, ScoreExtraction, ScoreSource};
