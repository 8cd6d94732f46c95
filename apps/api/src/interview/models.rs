//! Core interview data model. Wire fields are camelCase to match the JSON
//! shapes the oracle is instructed to produce and the original client stores.

use serde::{Deserialize, Serialize};

/// Experience bucket selected at setup. The wire strings double as the
/// human-readable labels interpolated into prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "0-1 years")]
    ZeroToOne,
    #[serde(rename = "1-3 years")]
    OneToThree,
    #[serde(rename = "3-5 years")]
    ThreeToFive,
    #[serde(rename = "5-8 years")]
    FiveToEight,
    #[serde(rename = "8+ years")]
    EightPlus,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::ZeroToOne => "0-1 years",
            ExperienceLevel::OneToThree => "1-3 years",
            ExperienceLevel::ThreeToFive => "3-5 years",
            ExperienceLevel::FiveToEight => "5-8 years",
            ExperienceLevel::EightPlus => "8+ years",
        }
    }
}

/// Why the user is practicing. Reason codes match the setup form values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewPurpose {
    NewJob,
    #[default]
    Practice,
    Upcoming,
    Skills,
    CareerSwitch,
}

impl InterviewPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewPurpose::NewJob => "new-job",
            InterviewPurpose::Practice => "practice",
            InterviewPurpose::Upcoming => "upcoming",
            InterviewPurpose::Skills => "skills",
            InterviewPurpose::CareerSwitch => "career-switch",
        }
    }

    /// Label used when interpolating the purpose into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            InterviewPurpose::NewJob => "Looking for a new job",
            InterviewPurpose::Practice => "General practice",
            InterviewPurpose::Upcoming => "Preparing for an upcoming interview",
            InterviewPurpose::Skills => "Improving interview skills",
            InterviewPurpose::CareerSwitch => "Switching career paths",
        }
    }
}

fn default_question_count() -> u8 {
    5
}

fn default_duration_secs() -> u32 {
    180
}

/// Parameters chosen at setup. Immutable once a session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewConfig {
    #[serde(default)]
    pub job_title: String,
    pub job_role: String,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub purpose: InterviewPurpose,
    #[serde(default = "default_question_count")]
    pub question_count: u8,
    #[serde(default = "default_duration_secs")]
    pub duration_per_question_secs: u32,
}

/// Scoring rubric attached to a generated question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringCriteria {
    pub max: u32,
    pub criteria: Vec<String>,
}

/// One generated interview question. Produced only by the response parser
/// from oracle output; never hand-constructed outside test fixtures.
/// Ordering within a question set is significant and fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    pub expected_answer: String,
    pub key_points: Vec<String>,
    pub scoring_criteria: ScoringCriteria,
}

/// Structured critique of one answer, produced by the evaluation pipeline.
/// The score range is an oracle contract (0–100), not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u32,
    pub feedback: String,
    pub improvements: Vec<String>,
}

/// A submitted answer. At most one per question index; resubmitting
/// overwrites. `evaluation` is absent when the evaluation call failed and
/// the question was left unscored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_index: usize,
    pub answer_text: String,
    pub evaluation: Option<Evaluation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_level_serde_round_trip() {
        let level: ExperienceLevel = serde_json::from_str(r#""3-5 years""#).unwrap();
        assert_eq!(level, ExperienceLevel::ThreeToFive);
        assert_eq!(serde_json::to_string(&level).unwrap(), r#""3-5 years""#);
    }

    #[test]
    fn test_purpose_reason_codes() {
        let purpose: InterviewPurpose = serde_json::from_str(r#""career-switch""#).unwrap();
        assert_eq!(purpose, InterviewPurpose::CareerSwitch);
        assert_eq!(InterviewPurpose::NewJob.as_str(), "new-job");
        assert_eq!(InterviewPurpose::default(), InterviewPurpose::Practice);
    }

    #[test]
    fn test_config_defaults() {
        let config: InterviewConfig = serde_json::from_str(
            r#"{"jobRole": "Backend Engineer", "experienceLevel": "3-5 years"}"#,
        )
        .unwrap();
        assert_eq!(config.question_count, 5);
        assert_eq!(config.duration_per_question_secs, 180);
        assert_eq!(config.purpose, InterviewPurpose::Practice);
        assert!(config.job_title.is_empty());
    }

    #[test]
    fn test_question_wire_fields_are_camel_case() {
        let question = Question {
            question: "q".to_string(),
            expected_answer: "a".to_string(),
            key_points: vec!["k".to_string()],
            scoring_criteria: ScoringCriteria {
                max: 100,
                criteria: vec!["c".to_string()],
            },
        };
        let json = serde_json::to_value(&question).unwrap();
        assert!(json.get("expectedAnswer").is_some());
        assert!(json.get("keyPoints").is_some());
        assert!(json.get("scoringCriteria").is_some());
    }
}
