use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::core::config::Config;
use crate::db::pool::Database;
use crate::db::provider::ConnectionProvider;
use crate::stores::users::Users;

// this runs at boot time in both binaries
pub fn open_users(config: &Config, provider: &ConnectionProvider) -> Result<(Arc<Database>, Users)> {
    let keyring = config.keyring()?;

    let db = provider
        .get_client()
        .context(format!("Failed to open database '{}'", config.database.url))?;

    info!(
        mode = %provider.mode(),
        key_fingerprint = %keyring.encryption_fingerprint(),
        decryption_keys = keyring.decryption_key_count(),
        "Field encryption configured"
    );

    let users = Users::new(Arc::clone(&db), keyring);
    Ok((db, users))
}
