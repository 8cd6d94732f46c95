//! Response Parser — extracts and validates the JSON payload embedded in
//! oracle free text.
//!
//! The oracle commonly wraps JSON in ```json fences or pads it with prose,
//! despite being told not to. Extraction order: strip fences → parse as-is →
//! fall back to slicing from the first `[`/`{` to the matching last `]`/`}`.
//! Any irrecoverable shape mismatch fails with a `ParseError` carrying the
//! offending raw text for diagnostics.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::interview::models::{Evaluation, Question, ScoringCriteria};

const DEFAULT_MAX_SCORE: u32 = 100;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON payload found in oracle output")]
    NoJsonPayload { raw: String },

    #[error("invalid JSON in oracle output: {source}")]
    InvalidJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected payload shape: {reason}")]
    SchemaMismatch { raw: String, reason: String },
}

impl ParseError {
    /// The raw oracle text that failed to parse. Logged, never discarded.
    pub fn raw(&self) -> &str {
        match self {
            ParseError::NoJsonPayload { raw }
            | ParseError::InvalidJson { raw, .. }
            | ParseError::SchemaMismatch { raw, .. } => raw,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Payload extraction
// ────────────────────────────────────────────────────────────────────────────

/// Strips ```json ... ``` or ``` ... ``` code fences from oracle output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Locates a probable JSON payload inside prose: from the first `[` or `{`
/// to the matching last `]` or `}`.
fn locate_json_payload(text: &str) -> Option<&str> {
    let start = text.find(|c| c == '[' || c == '{')?;
    let closing = if text.as_bytes()[start] == b'[' { ']' } else { '}' };
    let end = text.rfind(closing)?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

/// Extracts a `serde_json::Value` from raw oracle text.
fn extract_value(raw: &str) -> Result<Value, ParseError> {
    let text = strip_code_fences(raw);
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(direct_err) => {
            let Some(slice) = locate_json_payload(text) else {
                return Err(ParseError::NoJsonPayload {
                    raw: raw.to_string(),
                });
            };
            serde_json::from_str(slice).map_err(|_| ParseError::InvalidJson {
                raw: raw.to_string(),
                source: direct_err,
            })
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Question set parsing
// ────────────────────────────────────────────────────────────────────────────

/// Tolerant question record. Only the question text is required; everything
/// else coerces to a safe default so one sparse entry does not sink the batch.
/// The capitalized aliases cover the second field convention observed in
/// oracle output (`Question`/`Answer`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    #[serde(alias = "Question")]
    question: String,
    #[serde(default, alias = "Answer")]
    expected_answer: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    scoring_criteria: RawCriteria,
}

#[derive(Debug, Deserialize)]
struct RawCriteria {
    #[serde(default = "default_max_score")]
    max: u32,
    #[serde(default)]
    criteria: Vec<String>,
}

fn default_max_score() -> u32 {
    DEFAULT_MAX_SCORE
}

impl Default for RawCriteria {
    fn default() -> Self {
        RawCriteria {
            max: DEFAULT_MAX_SCORE,
            criteria: Vec::new(),
        }
    }
}

impl From<RawQuestion> for Question {
    fn from(raw: RawQuestion) -> Self {
        Question {
            question: raw.question,
            expected_answer: raw.expected_answer,
            key_points: raw.key_points,
            scoring_criteria: ScoringCriteria {
                max: raw.scoring_criteria.max,
                criteria: raw.scoring_criteria.criteria,
            },
        }
    }
}

/// Parses oracle output as an ordered question set.
///
/// The top level must be a JSON array — a failure there discards the whole
/// batch (no partial recovery). Within a successfully parsed array, malformed
/// entries are skipped with a warning and missing optional fields coerce to
/// defaults.
pub fn parse_question_set(raw: &str) -> Result<Vec<Question>, ParseError> {
    let value = extract_value(raw)?;
    let Value::Array(items) = value else {
        return Err(ParseError::SchemaMismatch {
            raw: raw.to_string(),
            reason: "expected a JSON array of question records".to_string(),
        });
    };

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<RawQuestion>(item) {
            Ok(entry) if !entry.question.trim().is_empty() => questions.push(entry.into()),
            Ok(_) => warn!(index, "skipping question entry with empty question text"),
            Err(e) => warn!(index, error = %e, "skipping malformed question entry"),
        }
    }

    if questions.is_empty() {
        return Err(ParseError::SchemaMismatch {
            raw: raw.to_string(),
            reason: "no usable question entries in array".to_string(),
        });
    }
    Ok(questions)
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation parsing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawEvaluation {
    score: f64,
    feedback: String,
    #[serde(default)]
    improvements: Vec<String>,
}

/// Parses oracle output as a single evaluation record.
/// `score` and `feedback` are required; `improvements` defaults to empty.
pub fn parse_evaluation(raw: &str) -> Result<Evaluation, ParseError> {
    let value = extract_value(raw)?;
    let parsed: RawEvaluation =
        serde_json::from_value(value).map_err(|e| ParseError::SchemaMismatch {
            raw: raw.to_string(),
            reason: e.to_string(),
        })?;

    Ok(Evaluation {
        score: parsed.score.round().max(0.0) as u32,
        feedback: parsed.feedback,
        improvements: parsed.improvements,
    })
}
