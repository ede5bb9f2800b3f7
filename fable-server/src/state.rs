use crate::ai::AiClient;
use crate::db::Database;
use crate::notify::Notifier;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub notifier: Notifier,
    pub ai: AiClient,
}

impl AppState {
    pub fn new(db: Database, ai: AiClient) -> Self {
        let session_manager = SessionManager::new(db.clone());
        let notifier = Notifier::new(db.pool.clone());
        Self {
            db,
            session_manager,
            notifier,
            ai,
        }
    }

    /// Get authenticated user ID from session token
    pub fn authenticated_user_id(&self, token: &str) -> Option<uuid::Uuid> {
        self.session_manager.validate_session(token).ok()
    }
}
