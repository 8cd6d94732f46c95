//! Per-question countdown driver.
//!
//! One spawned task per recording, ticking once a second. On expiry it
//! triggers the forced stop-and-evaluate exactly once and exits. The task
//! carries the controller's timer epoch: if the question changed underneath
//! it (new epoch) or the session is gone, it exits without touching state,
//! so a stale countdown can never mutate a superseded question.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

use crate::session::handlers::submit_current_answer;
use crate::session::TickOutcome;
use crate::state::AppState;

pub fn spawn_countdown(state: AppState, session_id: Uuid, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await; // first tick resolves immediately

        loop {
            interval.tick().await;

            let outcome = {
                let mut sessions = state.sessions.write().await;
                let Some(entry) = sessions.get_mut(&session_id) else {
                    break;
                };
                if entry.controller.timer_epoch() != epoch {
                    break;
                }
                entry.controller.tick()
            };

            match outcome {
                TickOutcome::Running => {}
                TickOutcome::Expired => {
                    if let Err(e) = submit_current_answer(&state, session_id).await {
                        warn!(%session_id, error = %e, "forced stop after timeout failed");
                    }
                    break;
                }
                TickOutcome::Idle => break,
            }
        }
    })
}
