use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::Config;
use crate::llm_client::Oracle;
use crate::session::capture::CaptureBackend;
use crate::session::repository::SessionRepository;
use crate::session::SessionController;

/// One live session plus the countdown task driving its timer.
pub struct SessionEntry {
    pub controller: SessionController,
    pub timer: Option<JoinHandle<()>>,
    /// Identity string from the external auth provider, used to attribute
    /// the persisted interview.
    pub user_id: String,
}

impl Drop for SessionEntry {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

pub type SharedSessions = Arc<RwLock<HashMap<Uuid, SessionEntry>>>;

/// Shared application state injected into all route handlers via Axum
/// extractors. The oracle, capture backend, and recovery cache are trait
/// objects so tests substitute them freely.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub oracle: Arc<dyn Oracle>,
    pub capture: Arc<dyn CaptureBackend>,
    pub repository: Arc<dyn SessionRepository>,
    pub sessions: SharedSessions,
    pub config: Config,
}
