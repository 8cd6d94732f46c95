//! Prompt Builder — pure functions mapping interview parameters to oracle
//! instruction strings. No side effects, no failure modes.

use crate::interview::models::{ExperienceLevel, InterviewConfig};
use crate::llm_client::prompts::JSON_ONLY_PREAMBLE;

/// JSON shape the question-generation prompt demands from the oracle.
const QUESTION_SCHEMA_SNIPPET: &str = r#"Format as a JSON array with objects:
[
  {
    "question": "string",
    "expectedAnswer": "string",
    "keyPoints": ["string"],
    "scoringCriteria": {
      "max": number,
      "criteria": ["string"]
    }
  }
]"#;

/// JSON shape the evaluation prompt demands from the oracle.
const EVALUATION_SCHEMA_SNIPPET: &str = r#"Provide a detailed evaluation in JSON format:
{
  "score": number (0-100),
  "feedback": "detailed feedback string",
  "improvements": ["array of specific improvement suggestions"]
}"#;

/// Trims and collapses whitespace in a user-supplied free-text field so it
/// cannot break the instruction it is interpolated into.
pub fn sanitize_field(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds the question-generation prompt from an interview configuration.
/// Every non-empty config field appears verbatim in the output.
pub fn build_question_prompt(config: &InterviewConfig) -> String {
    let job_role = sanitize_field(&config.job_role);
    let job_title = sanitize_field(&config.job_title);

    let mut prompt = format!(
        "{JSON_ONLY_PREAMBLE}\n\n\
         Generate {count} unique and challenging interview questions for a {job_role} \
         position with {experience} of experience. \
         Include a mix of technical and behavioral questions.\n",
        count = config.question_count,
        experience = config.experience_level.as_str(),
    );

    if !job_title.is_empty() {
        prompt.push_str(&format!("Job title: {job_title}.\n"));
    }
    prompt.push_str(&format!("Interview purpose: {}.\n", config.purpose.label()));

    prompt.push_str(
        "\nFor each question, provide:\n\
         1. The question itself\n\
         2. The expected answer\n\
         3. Expected key points in the answer\n\
         4. Evaluation criteria and a maximum score (out of 100)\n\n",
    );
    prompt.push_str(QUESTION_SCHEMA_SNIPPET);
    prompt
}

/// Builds the single-answer evaluation prompt.
pub fn build_evaluation_prompt(
    question: &str,
    answer: &str,
    job_role: &str,
    experience_level: ExperienceLevel,
) -> String {
    format!(
        "{JSON_ONLY_PREAMBLE}\n\n\
         Evaluate this {job_role} interview answer ({experience} experience level):\n\n\
         Question: {question}\n\
         Answer: {answer}\n\n\
         {EVALUATION_SCHEMA_SNIPPET}\n\n\
         Focus on:\n\
         1. Completeness of the answer\n\
         2. Technical accuracy\n\
         3. Communication clarity\n\
         4. Practical examples provided",
        job_role = sanitize_field(job_role),
        experience = experience_level.as_str(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::models::InterviewPurpose;

    fn fixture_config() -> InterviewConfig {
        InterviewConfig {
            job_title: "Senior Backend Engineer".to_string(),
            job_role: "Backend Engineer".to_string(),
            experience_level: ExperienceLevel::ThreeToFive,
            purpose: InterviewPurpose::NewJob,
            question_count: 5,
            duration_per_question_secs: 180,
        }
    }

    #[test]
    fn test_question_prompt_contains_every_config_field() {
        let prompt = build_question_prompt(&fixture_config());
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("Senior Backend Engineer"));
        assert!(prompt.contains("3-5 years"));
        assert!(prompt.contains("Looking for a new job"));
        assert!(prompt.contains('5'));
    }

    #[test]
    fn test_question_prompt_omits_empty_title() {
        let mut config = fixture_config();
        config.job_title.clear();
        let prompt = build_question_prompt(&config);
        assert!(!prompt.contains("Job title:"));
    }

    #[test]
    fn test_question_prompt_demands_wire_schema() {
        let prompt = build_question_prompt(&fixture_config());
        assert!(prompt.contains("expectedAnswer"));
        assert!(prompt.contains("scoringCriteria"));
        assert!(prompt.contains("valid JSON only"));
    }

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_field("  Backend\n Engineer\t"), "Backend Engineer");
        assert_eq!(sanitize_field(""), "");
    }

    #[test]
    fn test_evaluation_prompt_embeds_question_and_answer() {
        let prompt = build_evaluation_prompt(
            "What is ownership?",
            "Ownership is Rust's memory model.",
            "Backend Engineer",
            ExperienceLevel::OneToThree,
        );
        assert!(prompt.contains("What is ownership?"));
        assert!(prompt.contains("Ownership is Rust's memory model."));
        assert!(prompt.contains("1-3 years"));
        assert!(prompt.contains("score"));
    }
}
