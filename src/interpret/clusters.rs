//! Mapping model-produced index groups back onto observations
//!
//! Models answer clustering prompts with 1-based index groups such as
//! `[[2,1],[4,3]]`. The mapping keeps the partition invariant: every
//! observation ends up in exactly one group and nothing is invented.
//!
//! - out-of-range or non-numeric indices are dropped individually
//! - an index repeated across groups is kept at its first occurrence
//! - observations the model never mentioned are gathered, in input order,
//!   into one trailing group
//! - groups left empty are removed, whether or not the rest of the
//!   response was well formed
//!
//! Empty groups are never kept as placeholders, even for an otherwise valid
//! response such as `[[9],[1,2]]`; together with the trailing group this
//! means the result never contains an empty group and always covers the input.

use serde_json::Value;
use std::collections::HashSet;

/// Ordered groups of observations forming a partition of the input.
pub type ClusterAssignment = Vec<Vec<String>>;

/// Map parsed index groups onto `observations`.
///
/// Returns `None` when `parsed` is not an array of arrays; callers treat
/// that as an unparseable response.
pub fn map_cluster_indices(parsed: &Value, observations: &[String]) -> Option<ClusterAssignment> {
    let groups = parsed.as_array()?;
    if !groups.iter().all(Value::is_array) {
        return None;
    }

    let mut used: HashSet<usize> = HashSet::new();
    let mut clusters: ClusterAssignment = Vec::with_capacity(groups.len() + 1);

    for group in groups.iter().filter_map(Value::as_array) {
        let cluster: Vec<String> = group
            .iter()
            .filter_map(|raw| to_zero_based(raw, observations.len()))
            .filter(|idx| used.insert(*idx))
            .map(|idx| observations[idx].clone())
            .collect();
        if !cluster.is_empty() {
            clusters.push(cluster);
        }
    }

    let leftovers: Vec<String> = observations
        .iter()
        .enumerate()
        .filter(|(idx, _)| !used.contains(idx))
        .map(|(_, obs)| obs.clone())
        .collect();
    if !leftovers.is_empty() {
        clusters.push(leftovers);
    }

    Some(clusters)
}

/// Every observation in one group, in original order.
///
/// This is the answer for an unparseable clustering response.
pub fn single_cluster(observations: &[String]) -> ClusterAssignment {
    if observations.is_empty() {
        return Vec::new();
    }
    vec![observations.to_vec()]
}

/// Convert a 1-based index (number or numeric string) into a valid 0-based one.
fn to_zero_based(raw: &Value, len: usize) -> Option<usize> {
    let one_based: u64 = match raw {
        Value::Number(n) => match n.as_u64() {
            Some(v) => v,
            None => {
                let f = n.as_f64()?;
                if f.fract() != 0.0 || f < 1.0 {
                    return None;
                }
                f as u64
            }
        },
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    let idx = usize::try_from(one_based.checked_sub(1)?).ok()?;
    (idx < len).then_some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn assert_partition(clusters: &ClusterAssignment, observations: &[String]) {
        let mut flat: Vec<String> = clusters.iter().flatten().cloned().collect();
        let mut expected = observations.to_vec();
        flat.sort();
        expected.sort();
        assert_eq!(flat, expected);
    }

    #[test]
    fn test_maps_pairs() {
        let observations = obs(&["a", "b", "c", "d"]);
        let clusters = map_cluster_indices(&json!([[2, 1], [4, 3]]), &observations).unwrap();
        assert_eq!(clusters, vec![obs(&["b", "a"]), obs(&["d", "c"])]);
    }

    #[test]
    fn test_numeric_strings_and_floats() {
        let observations = obs(&["a", "b", "c"]);
        let clusters =
            map_cluster_indices(&json!([["1", " 3 "], [2.0]]), &observations).unwrap();
        assert_eq!(clusters, vec![obs(&["a", "c"]), obs(&["b"])]);
    }

    #[test]
    fn test_invalid_indices_dropped_individually() {
        let observations = obs(&["a", "b", "c"]);
        let clusters =
            map_cluster_indices(&json!([[0, 1, 9, "x", 2.5, -1], [3]]), &observations).unwrap();
        assert_eq!(clusters[0], obs(&["a"]));
        assert_eq!(clusters[1], obs(&["c"]));
        // "b" was never validly referenced
        assert_eq!(clusters[2], obs(&["b"]));
        assert_partition(&clusters, &observations);
    }

    #[test]
    fn test_duplicates_kept_once() {
        let observations = obs(&["a", "b", "c"]);
        let clusters = map_cluster_indices(&json!([[1, 2], [2, 3], [1]]), &observations).unwrap();
        assert_eq!(clusters, vec![obs(&["a", "b"]), obs(&["c"])]);
    }

    #[test]
    fn test_missing_observations_appended() {
        let observations = obs(&["a", "b", "c", "d", "e"]);
        let clusters = map_cluster_indices(&json!([[5], [2]]), &observations).unwrap();
        assert_eq!(clusters, vec![obs(&["e"]), obs(&["b"]), obs(&["a", "c", "d"])]);
    }

    #[test]
    fn test_empty_group_dropped_in_valid_response() {
        let observations = obs(&["a", "b", "c"]);
        let clusters = map_cluster_indices(&json!([[9], [1, 2], []]), &observations).unwrap();
        assert_eq!(clusters, vec![obs(&["a", "b"]), obs(&["c"])]);
        assert!(clusters.iter().all(|group| !group.is_empty()));
        assert_partition(&clusters, &observations);
    }

    #[test]
    fn test_all_invalid_becomes_single_cluster() {
        let observations = obs(&["a", "b"]);
        let clusters = map_cluster_indices(&json!([[7], []]), &observations).unwrap();
        assert_eq!(clusters, vec![obs(&["a", "b"])]);
    }

    #[test]
    fn test_not_array_of_arrays() {
        let observations = obs(&["a", "b"]);
        assert!(map_cluster_indices(&json!({"clusters": [[1, 2]]}), &observations).is_none());
        assert!(map_cluster_indices(&json!([1, 2]), &observations).is_none());
        assert!(map_cluster_indices(&json!([[1], 2]), &observations).is_none());
        assert!(map_cluster_indices(&json!("[[1,2]]"), &observations).is_none());
    }

    #[test]
    fn test_single_cluster() {
        assert_eq!(single_cluster(&obs(&["x", "y"])), vec![obs(&["x", "y"])]);
        assert!(single_cluster(&[]).is_empty());
    }
}
