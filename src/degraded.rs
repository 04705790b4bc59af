//! Deterministic local substitutes for backend calls
//!
//! Used when the resolved backend lacks a capability or a call fails. Every
//! strategy is synchronous, total, and returns the same shape as the
//! backend-driven path (clustering keeps the partition invariant).

use std::collections::HashSet;

/// Observations per group in [`cluster`].
pub const CLUSTER_CHUNK_SIZE: usize = 3;

/// Observations quoted verbatim by [`abstraction`].
const ABSTRACTION_HEAD: usize = 3;

/// Jaccard index over the word sets of `a` and `b`.
///
/// Words are lowercase runs of word characters longer than two characters.
/// Word characters are Unicode letters and digits plus `_`, not just ASCII,
/// so `naïve` is one word; length counts chars, not bytes.
/// Returns 0.0 when both sets are empty.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = word_set(a);
    let right = word_set(b);

    let intersection = left.intersection(&right).count();
    let union = left.len() + right.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// One point per twenty words, rounded up, within `[1, 10]`.
pub fn importance(content: &str) -> f64 {
    let words = content.split_whitespace().count();
    words.div_ceil(20).clamp(1, 10) as f64
}

/// First sentence of every observation, one summary per observation.
pub fn summarization(observations: &[String]) -> Vec<String> {
    observations.iter().map(|obs| first_sentence(obs)).collect()
}

/// The first three observations joined, with a count of the rest.
pub fn abstraction(observations: &[String]) -> String {
    let head: Vec<&str> = observations
        .iter()
        .take(ABSTRACTION_HEAD)
        .map(|obs| obs.trim())
        .collect();
    let mut out = head.join("; and ");

    let remaining = observations.len().saturating_sub(ABSTRACTION_HEAD);
    if remaining > 0 {
        out.push_str(&format!(" (plus {remaining} more observations)"));
    }
    out
}

/// Contiguous groups of [`CLUSTER_CHUNK_SIZE`], in input order.
pub fn cluster(observations: &[String]) -> Vec<Vec<String>> {
    observations
        .chunks(CLUSTER_CHUNK_SIZE)
        .map(<[String]>::to_vec)
        .collect()
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn first_sentence(observation: &str) -> String {
    let trimmed = observation.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    match trimmed.find(['.', '!', '?']) {
        Some(end) => trimmed[..=end].to_string(),
        None => format!("{trimmed}."),
    }
}
