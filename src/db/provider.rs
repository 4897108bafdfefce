use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::core::config::{DatabaseConfig, RunMode};
use crate::core::error::{StoreError, StoreResult};
use crate::db::pool::Database;

/// Hands out one database handle per process.
///
/// The provider is created by the entry point and passed to whatever needs
/// a connection. The pool is opened on the first `get_client` call and the
/// same `Arc` is returned from then on. A failed open is not cached.
pub struct ConnectionProvider {
    config: DatabaseConfig,
    mode: RunMode,
    client: Mutex<Option<Arc<Database>>>,
}

impl ConnectionProvider {
    pub fn new(config: DatabaseConfig, mode: RunMode) -> Self {
        Self {
            config,
            mode,
            client: Mutex::new(None),
        }
    }

    pub fn get_client(&self) -> StoreResult<Arc<Database>> {
        let mut slot = self
            .client
            .lock()
            .map_err(|_| StoreError::Connection("Connection provider lock poisoned".to_string()))?;

        if let Some(client) = slot.as_ref() {
            debug!(mode = %self.mode, "Reusing database client");
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(Database::open(&self.config)?);
        info!(
            mode = %self.mode,
            path = %client.path().display(),
            "Database client initialized"
        );

        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    #[cfg(test)]
    pub(crate) fn is_initialized(&self) -> bool {
        self.client
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }
}
