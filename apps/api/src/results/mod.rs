//! Results Aggregator — reduces per-question evaluations into an overall
//! score and category breakdown, and produces the export document.

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::Serialize;
use serde_json::json;

use crate::interview::models::{Answer, Question};

/// One row of the category breakdown shown on the results screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFeedback {
    pub category: String,
    pub score: u32,
    pub feedback: String,
    pub improvements: Vec<String>,
}

/// Aggregated session outcome. `overall_score` is `None` when no answer
/// carries an evaluation — "not available", never NaN.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsReport {
    pub overall_score: Option<u32>,
    pub answered: usize,
    pub evaluated: usize,
    pub categories: Vec<CategoryFeedback>,
}

/// Reduces the answer map into the overall report.
/// overall = round(mean of all present evaluation scores).
pub fn aggregate(answers: &BTreeMap<usize, Answer>) -> ResultsReport {
    let scores: Vec<u32> = answers
        .values()
        .filter_map(|a| a.evaluation.as_ref().map(|e| e.score))
        .collect();

    let overall_score = if scores.is_empty() {
        None
    } else {
        let sum: u64 = scores.iter().map(|&s| u64::from(s)).sum();
        Some((sum as f64 / scores.len() as f64).round() as u32)
    };

    let categories = match overall_score {
        Some(score) => build_categories(score, answers),
        None => Vec::new(),
    };

    ResultsReport {
        overall_score,
        answered: answers.len(),
        evaluated: scores.len(),
        categories,
    }
}

fn build_categories(overall: u32, answers: &BTreeMap<usize, Answer>) -> Vec<CategoryFeedback> {
    vec![
        CategoryFeedback {
            category: "Technical Knowledge".to_string(),
            score: overall,
            feedback: "Overall technical understanding demonstrated".to_string(),
            improvements: dedupe_improvements(answers, 2),
        },
        CategoryFeedback {
            category: "Communication".to_string(),
            score: overall,
            feedback: "Clear and structured responses provided".to_string(),
            improvements: vec![
                "Use more specific examples".to_string(),
                "Reduce filler words".to_string(),
            ],
        },
        CategoryFeedback {
            category: "Problem Solving".to_string(),
            score: overall,
            feedback: "Good approach to problem-solving demonstrated".to_string(),
            improvements: vec![
                "Explain thought process more clearly".to_string(),
                "Consider edge cases".to_string(),
            ],
        },
    ]
}

/// Collects evaluation improvement suggestions in answer order, dropping
/// duplicate text, capped at `limit`.
fn dedupe_improvements(answers: &BTreeMap<usize, Answer>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    answers
        .values()
        .filter_map(|a| a.evaluation.as_ref())
        .flat_map(|e| e.improvements.iter())
        .filter(|s| seen.insert(s.as_str().to_string()))
        .take(limit)
        .cloned()
        .collect()
}

/// Serializes the downloadable results document:
/// `{questions, answers, overallScore}`.
pub fn export_document(
    questions: &[Question],
    answers: &BTreeMap<usize, Answer>,
    report: &ResultsReport,
) -> serde_json::Value {
    json!({
        "questions": questions,
        "answers": answers,
        "overallScore": report.overall_score,
    })
}

/// One-line shareable summary for the clipboard.
pub fn summary_line(report: &ResultsReport) -> String {
    match report.overall_score {
        Some(score) => format!("I just completed a mock interview and scored {score}%!"),
        None => "I just completed a mock interview!".to_string(),
    }
}
