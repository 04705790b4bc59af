//! Numeric score extraction from free-form model output
//!
//! Cascade, first match wins:
//!   1. `<tag>N</tag>`
//!   2. aliases: the tag without `_score`, then `score`, `rating`, `value`
//!   3. the first bare number anywhere in the text
//!   4. keywords (`high`/`very`, `medium`/`moderate`, `low`/`minimal`)
//!   5. the caller's default
//!
//! Every extracted value is clamped to `[min, max]`.

use regex::Regex;
use serde::Serialize;

/// Number as models write scores: up to two integer digits and an optional fraction.
const TAG_NUMBER: &str = r"(\d{0,2}\.?\d+)";

const GENERIC_ALIASES: [&str; 3] = ["score", "rating", "value"];

/// Which step of the cascade produced a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ScoreSource {
    /// The requested tag
    Tag,
    /// One of the alias tags (carries the alias used)
    Alias(String),
    /// A bare number in the text
    BareNumber,
    /// A keyword heuristic (carries the keyword)
    Keyword(&'static str),
    /// Nothing matched
    Default,
}

/// Clamped score plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreExtraction {
    pub value: f64,
    pub source: ScoreSource,
}

impl ScoreExtraction {
    /// True when no step of the cascade matched.
    pub fn is_default(&self) -> bool {
        self.source == ScoreSource::Default
    }
}

/// Extract a score from `text`, always returning a value in `[min, max]`.
pub fn extract_score(text: &str, tag: &str, default: f64, min: f64, max: f64) -> ScoreExtraction {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let clamp = |v: f64| v.clamp(min, max);

    if let Some(value) = tagged_number(text, tag) {
        return ScoreExtraction {
            value: clamp(value),
            source: ScoreSource::Tag,
        };
    }

    for alias in aliases(tag) {
        if let Some(value) = tagged_number(text, &alias) {
            return ScoreExtraction {
                value: clamp(value),
                source: ScoreSource::Alias(alias),
            };
        }
    }

    if let Some(value) = bare_number(text) {
        return ScoreExtraction {
            value: clamp(value),
            source: ScoreSource::BareNumber,
        };
    }

    if let Some((keyword, fraction)) = keyword_fraction(text) {
        return ScoreExtraction {
            value: clamp(min + (max - min) * fraction),
            source: ScoreSource::Keyword(keyword),
        };
    }

    ScoreExtraction {
        value: clamp(default),
        source: ScoreSource::Default,
    }
}

/// `<tag>N</tag>` with optional whitespace around the number.
fn tagged_number(text: &str, tag: &str) -> Option<f64> {
    if tag.is_empty() {
        return None;
    }
    let tag = regex::escape(tag);
    let pattern = format!(r"(?i)<{tag}>\s*{TAG_NUMBER}\s*</{tag}>");
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// First integer or decimal anywhere in the text.
fn bare_number(text: &str) -> Option<f64> {
    let re = Regex::new(r"\d+(?:\.\d+)?").ok()?;
    re.find(text).and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Alias tags in cascade order, without repeating the requested tag.
fn aliases(tag: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(4);
    if let Some(stripped) = tag.strip_suffix("_score") {
        if !stripped.is_empty() {
            out.push(stripped.to_string());
        }
    }
    for alias in GENERIC_ALIASES {
        if alias != tag && !out.iter().any(|a| a == alias) {
            out.push(alias.to_string());
        }
    }
    out
}

/// Fraction of the `[min, max]` span implied by qualitative wording.
fn keyword_fraction(text: &str) -> Option<(&'static str, f64)> {
    let lower = text.to_lowercase();
    let levels: [(&[&'static str], f64); 3] = [
        (&["high", "very"], 0.8),
        (&["medium", "moderate"], 0.5),
        (&["low", "minimal"], 0.2),
    ];
    levels.iter().find_map(|(keywords, fraction)| {
        keywords
            .iter()
            .find(|keyword| lower.contains(**keyword))
            .map(|keyword| (*keyword, *fraction))
    })
}
