//! Recovery cache with typed accessors over well-known slots.
//!
//! Mirrors the browser-local storage contract: each slot holds JSON-serialized
//! text under a fixed string key, written so a reloading client can resume.
//! No expiry, no size bound — this is a recovery mechanism, not a store of
//! record. All storage access goes through this one interface so it stays
//! centralized and substitutable in tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::interview::models::{Answer, InterviewConfig, Question};

pub const INTERVIEW_DATA_KEY: &str = "interviewData";
pub const CURRENT_QUESTIONS_KEY: &str = "currentQuestions";
pub const INTERVIEW_ANSWERS_KEY: &str = "interviewAnswers";
pub const INTERVIEW_QUESTIONS_KEY: &str = "interviewQuestions";

/// Typed get/set/clear over the named recovery slots. Writes are best-effort:
/// a serialization failure is logged and the slot is left untouched.
pub trait SessionRepository: Send + Sync {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: String);
    fn remove(&self, key: &str);
    fn clear(&self);

    fn set_interview_config(&self, config: &InterviewConfig) {
        store_slot(self, INTERVIEW_DATA_KEY, config);
    }

    fn interview_config(&self) -> Option<InterviewConfig> {
        load_slot(self, INTERVIEW_DATA_KEY)
    }

    fn set_current_questions(&self, questions: &[Question]) {
        store_slot(self, CURRENT_QUESTIONS_KEY, &questions);
    }

    fn current_questions(&self) -> Option<Vec<Question>> {
        load_slot(self, CURRENT_QUESTIONS_KEY)
    }

    fn set_finished_answers(&self, answers: &std::collections::BTreeMap<usize, Answer>) {
        store_slot(self, INTERVIEW_ANSWERS_KEY, answers);
    }

    fn finished_answers(&self) -> Option<std::collections::BTreeMap<usize, Answer>> {
        load_slot(self, INTERVIEW_ANSWERS_KEY)
    }

    fn set_finished_questions(&self, questions: &[Question]) {
        store_slot(self, INTERVIEW_QUESTIONS_KEY, &questions);
    }

    fn finished_questions(&self) -> Option<Vec<Question>> {
        load_slot(self, INTERVIEW_QUESTIONS_KEY)
    }
}

fn store_slot<R, T>(repo: &R, key: &str, value: &T)
where
    R: SessionRepository + ?Sized,
    T: Serialize,
{
    match serde_json::to_string(value) {
        Ok(json) => repo.set_raw(key, json),
        Err(e) => warn!(key, error = %e, "failed to serialize recovery slot"),
    }
}

fn load_slot<R, T>(repo: &R, key: &str) -> Option<T>
where
    R: SessionRepository + ?Sized,
    T: DeserializeOwned,
{
    let raw = repo.get_raw(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "stale or corrupt recovery slot ignored");
            None
        }
    }
}

/// Per-user view over a shared repository. Every slot key is prefixed with
/// the owner's identity, so one user's recovery data is invisible to every
/// other user and a new session never clobbers someone else's slots.
pub struct ScopedSessionRepository<'a> {
    inner: &'a dyn SessionRepository,
    namespace: String,
}

impl<'a> ScopedSessionRepository<'a> {
    pub fn new(inner: &'a dyn SessionRepository, namespace: &str) -> Self {
        ScopedSessionRepository {
            inner,
            namespace: namespace.to_string(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

impl SessionRepository for ScopedSessionRepository<'_> {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.inner.get_raw(&self.scoped(key))
    }

    fn set_raw(&self, key: &str, value: String) {
        self.inner.set_raw(&self.scoped(key), value);
    }

    fn remove(&self, key: &str) {
        self.inner.remove(&self.scoped(key));
    }

    /// Clears only this scope's slots; other users' data is untouched.
    fn clear(&self) {
        for key in [
            INTERVIEW_DATA_KEY,
            CURRENT_QUESTIONS_KEY,
            INTERVIEW_ANSWERS_KEY,
            INTERVIEW_QUESTIONS_KEY,
        ] {
            self.inner.remove(&self.scoped(key));
        }
    }
}

/// In-memory repository: the runtime default and the test substitute.
#[derive(Default)]
pub struct InMemorySessionRepository {
    slots: Mutex<HashMap<String, String>>,
}

impl SessionRepository for InMemorySessionRepository {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .map(|slots| slots.get(key).cloned())
            .unwrap_or(None)
    }

    fn set_raw(&self, key: &str, value: String) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.remove(key);
        }
    }

    fn clear(&self) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::interview::models::{
        Answer, Evaluation, ExperienceLevel, InterviewPurpose, ScoringCriteria,
    };

    fn fixture_config() -> InterviewConfig {
        InterviewConfig {
            job_title: String::new(),
            job_role: "Backend Engineer".to_string(),
            experience_level: ExperienceLevel::ThreeToFive,
            purpose: InterviewPurpose::Practice,
            question_count: 2,
            duration_per_question_secs: 180,
        }
    }

    fn fixture_question(text: &str) -> Question {
        Question {
            question: text.to_string(),
            expected_answer: String::new(),
            key_points: Vec::new(),
            scoring_criteria: ScoringCriteria {
                max: 100,
                criteria: Vec::new(),
            },
        }
    }

    #[test]
    fn test_config_slot_round_trip() {
        let repo = InMemorySessionRepository::default();
        repo.set_interview_config(&fixture_config());
        let loaded = repo.interview_config().unwrap();
        assert_eq!(loaded.job_role, "Backend Engineer");
        // Slot content is JSON text under the well-known key.
        assert!(repo.get_raw(INTERVIEW_DATA_KEY).unwrap().contains("jobRole"));
    }

    #[test]
    fn test_questions_and_answers_slots() {
        let repo = InMemorySessionRepository::default();
        repo.set_current_questions(&[fixture_question("q1"), fixture_question("q2")]);
        assert_eq!(repo.current_questions().unwrap().len(), 2);

        let mut answers = BTreeMap::new();
        answers.insert(
            0,
            Answer {
                question_index: 0,
                answer_text: "my answer".to_string(),
                evaluation: Some(Evaluation {
                    score: 80,
                    feedback: "good".to_string(),
                    improvements: Vec::new(),
                }),
            },
        );
        repo.set_finished_answers(&answers);
        let loaded = repo.finished_answers().unwrap();
        assert_eq!(loaded[&0].evaluation.as_ref().unwrap().score, 80);
    }

    #[test]
    fn test_corrupt_slot_reads_as_absent() {
        let repo = InMemorySessionRepository::default();
        repo.set_raw(CURRENT_QUESTIONS_KEY, "not json".to_string());
        assert!(repo.current_questions().is_none());
    }

    #[test]
    fn test_scoped_slots_are_isolated_per_user() {
        let shared = InMemorySessionRepository::default();
        let alice = ScopedSessionRepository::new(&shared, "user-alice");
        let bob = ScopedSessionRepository::new(&shared, "user-bob");

        alice.set_interview_config(&fixture_config());
        alice.set_current_questions(&[fixture_question("q")]);

        assert!(alice.interview_config().is_some());
        assert!(bob.interview_config().is_none());
        assert!(bob.current_questions().is_none());

        // The shared store holds the slot under the owner-prefixed key.
        assert!(shared
            .get_raw(&format!("user-alice:{INTERVIEW_DATA_KEY}"))
            .is_some());
        assert!(shared.get_raw(INTERVIEW_DATA_KEY).is_none());
    }

    #[test]
    fn test_scoped_clear_leaves_other_scopes_alone() {
        let shared = InMemorySessionRepository::default();
        let alice = ScopedSessionRepository::new(&shared, "user-alice");
        let bob = ScopedSessionRepository::new(&shared, "user-bob");

        alice.set_interview_config(&fixture_config());
        bob.set_interview_config(&fixture_config());

        alice.clear();
        assert!(alice.interview_config().is_none());
        assert!(bob.interview_config().is_some());
    }

    #[test]
    fn test_clear_empties_all_slots() {
        let repo = InMemorySessionRepository::default();
        repo.set_interview_config(&fixture_config());
        repo.set_current_questions(&[fixture_question("q")]);
        repo.clear();
        assert!(repo.interview_config().is_none());
        assert!(repo.current_questions().is_none());
    }
}
