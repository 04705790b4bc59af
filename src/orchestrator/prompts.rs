//! Prompt templates for the memory operations
//!
//! Numeric prompts ask for the answer inside a named tag, which is the first
//! thing the score extractor looks for. Structured prompts ask for bare JSON.

/// Tag carrying the similarity answer.
pub const SIMILARITY_TAG: &str = "similarity_score";

/// Tag carrying the importance answer.
pub const IMPORTANCE_TAG: &str = "importance_score";

/// System prompt shared by every memory operation.
pub const MEMORY_SYSTEM_PROMPT: &str = "You maintain the long-term memory of an agent. \
Answer exactly in the requested format with no preamble.";

pub fn similarity(a: &str, b: &str) -> String {
    format!(
        "Rate how similar these two memories are in meaning, from 0 (unrelated) to 1 (the same).\n\n\
         Memory A:\n{a}\n\n\
         Memory B:\n{b}\n\n\
         Respond with only the number inside tags, e.g. <{SIMILARITY_TAG}>0.4</{SIMILARITY_TAG}>."
    )
}

pub fn importance(content: &str) -> String {
    format!(
        "Rate how important this memory is for the agent to remember, from 0 (trivial) \
         to 10 (critical).\n\n\
         Memory:\n{content}\n\n\
         Respond with only the number inside tags, e.g. <{IMPORTANCE_TAG}>6</{IMPORTANCE_TAG}>."
    )
}

pub fn summarization(observations: &[String]) -> String {
    format!(
        "Summarize these observations into a few short, self-contained statements. \
         Merge observations that say the same thing.\n\n\
         Observations:\n{}\n\n\
         Respond with a JSON array of strings.",
        bulleted(observations)
    )
}

pub fn abstraction(observations: &[String]) -> String {
    format!(
        "Write one general statement that captures what these observations have in common.\n\n\
         Observations:\n{}\n\n\
         Respond with the statement only.",
        bulleted(observations)
    )
}

pub fn clustering(observations: &[String]) -> String {
    format!(
        "Group these numbered observations by topic. Every observation belongs to exactly one \
         group.\n\n\
         Observations:\n{}\n\n\
         Respond with a JSON array of arrays of observation numbers, e.g. [[1,3],[2]].",
        numbered(observations)
    )
}

fn bulleted(observations: &[String]) -> String {
    observations
        .iter()
        .map(|o| format!("- {}", o.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// 1-based numbering, matching what the cluster mapper expects back.
fn numbered(observations: &[String]) -> String {
    observations
        .iter()
        .enumerate()
        .map(|(i, o)| format!("{}. {}", i + 1, o.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
