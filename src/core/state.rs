// Application state (AppState)

use crate::core::config::Config;
use crate::db::pool::Database;
use crate::stores::users::Users;
use std::sync::Arc;

/// Shared application state
///
/// Built once by the entry point from the connection provider's handle and
/// handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Record access facade (decrypts on read)
    pub users: Users,

    /// Database handle, used for health checks
    pub db: Arc<Database>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<Database>, users: Users) -> Self {
        Self {
            users,
            db,
            config: Arc::new(config),
        }
    }
}
