//! Session Controller — the per-question state machine.
//!
//! `AwaitingStart → Recording → Evaluating → Reviewing → (next | Finished)`.
//! Questions are presented strictly in question-set order; the index only
//! ever increases and there is no transition back to an earlier question.

pub mod capture;
pub mod handlers;
pub mod repository;
pub mod timer;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::interview::models::{Answer, Evaluation, ExperienceLevel, InterviewConfig, Question};
use crate::session::capture::{CaptureBackend, CaptureStream, MediaAccessError};
use crate::session::repository::SessionRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    AwaitingStart,
    Recording,
    Evaluating,
    Reviewing,
    Finished,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while {phase:?}")]
    InvalidTransition {
        phase: SessionPhase,
        action: &'static str,
    },

    #[error("no answer recorded for the current question")]
    AnswerMissing,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still recording, time remains.
    Running,
    /// The countdown just reached zero — the caller must force a stop.
    /// Fires at most once per question even if zero is observed again.
    Expired,
    /// Not recording (or expiry already fired); nothing to do.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextQuestion(usize),
    Finished,
}

/// Everything the evaluation pipeline needs for the answer just collected.
#[derive(Debug, Clone)]
pub struct PendingEvaluation {
    pub question_index: usize,
    pub question: Question,
    pub answer_text: String,
    pub job_role: String,
    pub experience_level: ExperienceLevel,
}

/// Read-only view of the controller for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub question_count: usize,
    pub remaining_seconds: u32,
    pub capture_active: bool,
    pub evaluation_failed: bool,
    pub answered: usize,
}

pub struct SessionController {
    config: InterviewConfig,
    questions: Vec<Question>,
    current_index: usize,
    answers: BTreeMap<usize, Answer>,
    remaining_secs: u32,
    phase: SessionPhase,
    capture: Option<Box<dyn CaptureStream>>,
    draft_answer: String,
    expiry_fired: bool,
    evaluation_failed: bool,
    timer_epoch: u64,
}

impl SessionController {
    /// Creates a session and mirrors its config and question set into the
    /// recovery cache.
    pub fn new(
        config: InterviewConfig,
        questions: Vec<Question>,
        repo: &dyn SessionRepository,
    ) -> Self {
        repo.set_interview_config(&config);
        repo.set_current_questions(&questions);
        Self::from_parts(config, questions)
    }

    /// Rebuilds a session from the recovery cache after a client reload.
    /// Returns `None` when either slot is missing or stale.
    pub fn recover(repo: &dyn SessionRepository) -> Option<Self> {
        let config = repo.interview_config()?;
        let questions = repo.current_questions()?;
        if questions.is_empty() {
            return None;
        }
        info!(count = questions.len(), "session recovered from cache");
        Some(Self::from_parts(config, questions))
    }

    fn from_parts(config: InterviewConfig, questions: Vec<Question>) -> Self {
        let phase = if questions.is_empty() {
            SessionPhase::Finished
        } else {
            SessionPhase::AwaitingStart
        };
        let remaining_secs = config.duration_per_question_secs;
        SessionController {
            config,
            questions,
            current_index: 0,
            answers: BTreeMap::new(),
            remaining_secs,
            phase,
            capture: None,
            draft_answer: String::new(),
            expiry_fired: false,
            evaluation_failed: false,
            timer_epoch: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_secs
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &BTreeMap<usize, Answer> {
        &self.answers
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    /// Monotonic token identifying the countdown that belongs to the current
    /// recording. A stale countdown task compares its token and exits instead
    /// of mutating a superseded question's state.
    pub fn timer_epoch(&self) -> u64 {
        self.timer_epoch
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            current_index: self.current_index,
            question_count: self.questions.len(),
            remaining_seconds: self.remaining_secs,
            capture_active: self.capture.as_ref().is_some_and(|c| c.is_active()),
            evaluation_failed: self.evaluation_failed,
            answered: self.answers.len(),
        }
    }

    /// `AwaitingStart → Recording`. Resets the countdown to the configured
    /// duration and tries to open a capture stream. A capture failure is
    /// returned inline and the session continues without capture.
    pub fn start_recording(
        &mut self,
        backend: &dyn CaptureBackend,
    ) -> Result<Option<MediaAccessError>, SessionError> {
        if self.phase != SessionPhase::AwaitingStart {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "start recording",
            });
        }

        self.remaining_secs = self.config.duration_per_question_secs;
        self.expiry_fired = false;
        self.evaluation_failed = false;
        self.draft_answer.clear();
        self.timer_epoch += 1;

        let capture_error = match backend.open() {
            Ok(stream) => {
                self.capture = Some(stream);
                None
            }
            Err(e) => {
                warn!(reason = e.reason_code(), "capture unavailable, continuing without it");
                Some(e)
            }
        };

        self.phase = SessionPhase::Recording;
        Ok(capture_error)
    }

    /// Updates the free-text answer collected for the current question.
    pub fn set_answer_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Recording {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "set answer text",
            });
        }
        self.draft_answer = text.into();
        Ok(())
    }

    /// One second of countdown. Expiry fires exactly once per question.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Recording {
            return TickOutcome::Idle;
        }
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
        }
        if self.remaining_secs == 0 && !self.expiry_fired {
            self.expiry_fired = true;
            TickOutcome::Expired
        } else if self.remaining_secs == 0 {
            TickOutcome::Idle
        } else {
            TickOutcome::Running
        }
    }

    /// `Recording → Evaluating`. Releases the capture stream on every stop,
    /// manual or forced, and hands back what the evaluation pipeline needs.
    pub fn stop_recording(&mut self) -> Result<PendingEvaluation, SessionError> {
        if self.phase != SessionPhase::Recording {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "stop recording",
            });
        }
        self.release_capture();
        self.phase = SessionPhase::Evaluating;

        Ok(PendingEvaluation {
            question_index: self.current_index,
            question: self.questions[self.current_index].clone(),
            answer_text: self.draft_answer.clone(),
            job_role: self.config.job_role.clone(),
            experience_level: self.config.experience_level,
        })
    }

    /// `Evaluating → Reviewing`. `None` means the evaluation call failed:
    /// the answer is stored unscored and the failure flag is set so the user
    /// can retry the whole question. Resubmission overwrites any prior
    /// answer at this index.
    pub fn record_evaluation(
        &mut self,
        evaluation: Option<Evaluation>,
    ) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Evaluating {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "record evaluation",
            });
        }
        self.evaluation_failed = evaluation.is_none();
        self.answers.insert(
            self.current_index,
            Answer {
                question_index: self.current_index,
                answer_text: self.draft_answer.clone(),
                evaluation,
            },
        );
        self.phase = SessionPhase::Reviewing;
        Ok(())
    }

    /// Re-arms the current question after a failed evaluation. The unscored
    /// answer is discarded; the whole question is taken again.
    pub fn retry_question(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Reviewing || !self.evaluation_failed {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "retry question",
            });
        }
        self.answers.remove(&self.current_index);
        self.evaluation_failed = false;
        self.expiry_fired = false;
        self.remaining_secs = self.config.duration_per_question_secs;
        self.draft_answer.clear();
        self.phase = SessionPhase::AwaitingStart;
        Ok(())
    }

    /// Advances past a reviewed question. After the last one the controller
    /// writes the finished question set and answer map to the recovery cache
    /// and signals completion. There is no way back.
    pub fn next_question(&mut self, repo: &dyn SessionRepository) -> Result<Advance, SessionError> {
        if self.phase != SessionPhase::Reviewing {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "advance",
            });
        }
        if self.capture.as_ref().is_some_and(|c| c.is_active()) {
            return Err(SessionError::InvalidTransition {
                phase: self.phase,
                action: "advance with active capture",
            });
        }
        if !self.answers.contains_key(&self.current_index) {
            return Err(SessionError::AnswerMissing);
        }

        self.current_index += 1;
        self.evaluation_failed = false;

        if self.current_index == self.questions.len() {
            self.phase = SessionPhase::Finished;
            repo.set_finished_questions(&self.questions);
            repo.set_finished_answers(&self.answers);
            info!(answered = self.answers.len(), "session finished");
            Ok(Advance::Finished)
        } else {
            self.remaining_secs = self.config.duration_per_question_secs;
            self.expiry_fired = false;
            self.draft_answer.clear();
            self.phase = SessionPhase::AwaitingStart;
            Ok(Advance::NextQuestion(self.current_index))
        }
    }

    fn release_capture(&mut self) {
        if let Some(mut stream) = self.capture.take() {
            stream.stop();
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        // Teardown is an exit path from Recording like any other.
        self.release_capture();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::capture::test_support::{DeniedCaptureBackend, TrackingCaptureBackend};
    use super::capture::NoopCaptureBackend;
    use super::repository::InMemorySessionRepository;
    use super::*;
    use crate::interview::models::{InterviewPurpose, ScoringCriteria};

    fn fixture_config(question_count: u8, duration: u32) -> InterviewConfig {
        InterviewConfig {
            job_title: String::new(),
            job_role: "Backend Engineer".to_string(),
            experience_level: ExperienceLevel::ThreeToFive,
            purpose: InterviewPurpose::Practice,
            question_count,
            duration_per_question_secs: duration,
        }
    }

    fn fixture_questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| Question {
                question: format!("question {i}"),
                expected_answer: String::new(),
                key_points: Vec::new(),
                scoring_criteria: ScoringCriteria {
                    max: 100,
                    criteria: Vec::new(),
                },
            })
            .collect()
    }

    fn fixture_evaluation(score: u32) -> Evaluation {
        Evaluation {
            score,
            feedback: "feedback".to_string(),
            improvements: vec!["improve".to_string()],
        }
    }

    fn new_session(n: usize, duration: u32) -> SessionController {
        let repo = InMemorySessionRepository::default();
        SessionController::new(fixture_config(n as u8, duration), fixture_questions(n), &repo)
    }

    fn answer_current(session: &mut SessionController, score: u32) {
        session.start_recording(&NoopCaptureBackend).unwrap();
        session.set_answer_text("my answer").unwrap();
        session.stop_recording().unwrap();
        session
            .record_evaluation(Some(fixture_evaluation(score)))
            .unwrap();
    }

    #[test]
    fn test_full_run_reaches_finished_after_n_evaluations() {
        let repo = InMemorySessionRepository::default();
        let mut session =
            SessionController::new(fixture_config(3, 180), fixture_questions(3), &repo);

        for i in 0..3 {
            assert_eq!(session.current_index(), i);
            answer_current(&mut session, 80);
            let advance = session.next_question(&repo).unwrap();
            if i < 2 {
                assert_eq!(advance, Advance::NextQuestion(i + 1));
            } else {
                assert_eq!(advance, Advance::Finished);
            }
        }

        assert_eq!(session.phase(), SessionPhase::Finished);
        assert_eq!(session.answers().len(), 3);
        // Finished state mirrors questions and answers into the cache.
        assert_eq!(repo.finished_questions().unwrap().len(), 3);
        assert_eq!(repo.finished_answers().unwrap().len(), 3);
    }

    #[test]
    fn test_index_never_decreases_and_never_exceeds_len() {
        let repo = InMemorySessionRepository::default();
        let mut session =
            SessionController::new(fixture_config(2, 180), fixture_questions(2), &repo);
        let mut last_index = 0;

        for _ in 0..2 {
            answer_current(&mut session, 50);
            assert!(session.current_index() >= last_index);
            last_index = session.current_index();
            session.next_question(&repo).unwrap();
        }
        assert_eq!(session.current_index(), 2); // terminal == len
        assert!(session.next_question(&repo).is_err()); // no transition out of Finished
    }

    #[test]
    fn test_timer_resets_per_question_and_fires_once() {
        let repo = InMemorySessionRepository::default();
        let mut session = SessionController::new(fixture_config(2, 3), fixture_questions(2), &repo);

        session.start_recording(&NoopCaptureBackend).unwrap();
        assert_eq!(session.remaining_seconds(), 3);
        assert_eq!(session.tick(), TickOutcome::Running);
        assert_eq!(session.tick(), TickOutcome::Running);
        // Third tick hits zero: exactly one Expired, then Idle.
        assert_eq!(session.tick(), TickOutcome::Expired);
        assert_eq!(session.tick(), TickOutcome::Idle);

        session.stop_recording().unwrap();
        session.record_evaluation(Some(fixture_evaluation(60))).unwrap();
        session.next_question(&repo).unwrap();

        // New question: countdown back at full duration.
        session.start_recording(&NoopCaptureBackend).unwrap();
        assert_eq!(session.remaining_seconds(), 3);
    }

    #[test]
    fn test_tick_outside_recording_is_idle() {
        let mut session = new_session(1, 3);
        assert_eq!(session.tick(), TickOutcome::Idle);
        assert_eq!(session.remaining_seconds(), 3);
    }

    #[test]
    fn test_capture_released_on_manual_stop() {
        let flag = Arc::new(AtomicBool::new(false));
        let backend = TrackingCaptureBackend {
            active_flag: Arc::clone(&flag),
        };
        let mut session = new_session(1, 180);

        session.start_recording(&backend).unwrap();
        assert!(flag.load(Ordering::SeqCst));
        session.stop_recording().unwrap();
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_capture_released_on_forced_timeout_stop() {
        let flag = Arc::new(AtomicBool::new(false));
        let backend = TrackingCaptureBackend {
            active_flag: Arc::clone(&flag),
        };
        let mut session = new_session(1, 1);

        session.start_recording(&backend).unwrap();
        assert_eq!(session.tick(), TickOutcome::Expired);
        session.stop_recording().unwrap(); // the forced stop
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_capture_released_on_teardown() {
        let flag = Arc::new(AtomicBool::new(false));
        let backend = TrackingCaptureBackend {
            active_flag: Arc::clone(&flag),
        };
        {
            let mut session = new_session(1, 180);
            session.start_recording(&backend).unwrap();
            assert!(flag.load(Ordering::SeqCst));
        } // dropped mid-recording
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_denied_capture_is_inline_and_session_continues() {
        let mut session = new_session(1, 180);
        let capture_error = session.start_recording(&DeniedCaptureBackend).unwrap();
        assert_eq!(capture_error.unwrap().reason_code(), "permission-denied");
        assert_eq!(session.phase(), SessionPhase::Recording);
        assert!(!session.snapshot().capture_active);
    }

    #[test]
    fn test_failed_evaluation_leaves_question_unscored() {
        let mut session = new_session(1, 180);
        session.start_recording(&NoopCaptureBackend).unwrap();
        session.set_answer_text("answer").unwrap();
        session.stop_recording().unwrap();
        session.record_evaluation(None).unwrap();

        assert_eq!(session.phase(), SessionPhase::Reviewing);
        let snapshot = session.snapshot();
        assert!(snapshot.evaluation_failed);
        assert!(session.answers()[&0].evaluation.is_none());
    }

    #[test]
    fn test_retry_rearms_question_after_failure() {
        let mut session = new_session(1, 180);
        session.start_recording(&NoopCaptureBackend).unwrap();
        session.set_answer_text("first try").unwrap();
        session.stop_recording().unwrap();
        session.record_evaluation(None).unwrap();

        session.retry_question().unwrap();
        assert_eq!(session.phase(), SessionPhase::AwaitingStart);
        assert_eq!(session.current_index(), 0);
        assert!(session.answers().is_empty());

        // Second attempt succeeds and overwrites.
        answer_current(&mut session, 90);
        assert_eq!(session.answers()[&0].evaluation.as_ref().unwrap().score, 90);
    }

    #[test]
    fn test_retry_rejected_after_successful_evaluation() {
        let mut session = new_session(1, 180);
        answer_current(&mut session, 75);
        assert!(matches!(
            session.retry_question(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut session = new_session(2, 180);
        let repo = InMemorySessionRepository::default();

        assert!(session.stop_recording().is_err()); // not recording
        assert!(session.record_evaluation(None).is_err()); // not evaluating
        assert!(session.next_question(&repo).is_err()); // not reviewing
        assert!(session.set_answer_text("x").is_err()); // not recording

        session.start_recording(&NoopCaptureBackend).unwrap();
        assert!(session.start_recording(&NoopCaptureBackend).is_err()); // already recording
    }

    #[test]
    fn test_evaluating_blocks_concurrent_transitions() {
        let mut session = new_session(1, 180);
        session.start_recording(&NoopCaptureBackend).unwrap();
        session.stop_recording().unwrap();

        // One oracle call in flight: nothing else may move the machine.
        assert_eq!(session.phase(), SessionPhase::Evaluating);
        assert!(session.start_recording(&NoopCaptureBackend).is_err());
        assert!(session.stop_recording().is_err());
        assert_eq!(session.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_timer_epoch_increments_per_recording() {
        let mut session = new_session(1, 180);
        let before = session.timer_epoch();
        session.start_recording(&NoopCaptureBackend).unwrap();
        assert_eq!(session.timer_epoch(), before + 1);
    }

    #[test]
    fn test_recover_round_trip() {
        let repo = InMemorySessionRepository::default();
        let _original =
            SessionController::new(fixture_config(2, 120), fixture_questions(2), &repo);

        let recovered = SessionController::recover(&repo).unwrap();
        assert_eq!(recovered.questions().len(), 2);
        assert_eq!(recovered.config().duration_per_question_secs, 120);
        assert_eq!(recovered.phase(), SessionPhase::AwaitingStart);
    }

    #[test]
    fn test_recover_reads_only_the_callers_scope() {
        use super::repository::ScopedSessionRepository;

        let shared = InMemorySessionRepository::default();
        let alice = ScopedSessionRepository::new(&shared, "user-alice");
        let _session =
            SessionController::new(fixture_config(2, 180), fixture_questions(2), &alice);

        // Another user's scope sees nothing to recover.
        let bob = ScopedSessionRepository::new(&shared, "user-bob");
        assert!(SessionController::recover(&bob).is_none());
        assert!(SessionController::recover(&alice).is_some());
    }

    #[test]
    fn test_recover_with_empty_cache_is_none() {
        let repo = InMemorySessionRepository::default();
        assert!(SessionController::recover(&repo).is_none());
    }

    #[test]
    fn test_end_to_end_scores_aggregate_to_eighty() {
        // Five questions, scores 70/80/90/60/100 → overall 80, Finished.
        let repo = InMemorySessionRepository::default();
        let mut session =
            SessionController::new(fixture_config(5, 180), fixture_questions(5), &repo);

        for score in [70, 80, 90, 60, 100] {
            answer_current(&mut session, score);
            session.next_question(&repo).unwrap();
        }

        assert_eq!(session.phase(), SessionPhase::Finished);
        let report = crate::results::aggregate(session.answers());
        assert_eq!(report.overall_score, Some(80));
    }
}
