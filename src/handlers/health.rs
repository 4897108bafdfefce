use crate::core::state::AppState;
use crate::models::api::HealthResponse;
use crate::utils::time::current_timestamp;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::warn;

/// Health check handler
///
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = current_timestamp();

    let db = Arc::clone(&state.db);
    let check = tokio::task::spawn_blocking(move || db.health_check()).await;

    let (status, database) = match check {
        Ok(Ok(())) => (StatusCode::OK, "ok".to_string()),
        Ok(Err(e)) => {
            warn!(error = %e, "Database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        Err(e) => {
            warn!(error = %e, "Health check task failed");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
            database,
            timestamp,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, DatabaseConfig};
    use crate::crypto::keyring::Keyring;
    use crate::crypto::keys::{Algorithm, FieldKey};
    use crate::db::pool::Database;
    use crate::stores::users::Users;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn create_test_state() -> (TempDir, Arc<AppState>) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.database = DatabaseConfig {
            url: format!("file:{}", temp_dir.path().join("health.db").display()),
            ..DatabaseConfig::default()
        };
        let db = Arc::new(Database::open(&config.database).unwrap());
        let users = Users::new(Arc::clone(&db), Keyring::new(FieldKey::generate(Algorithm::Aes256Gcm)));

        (temp_dir, Arc::new(AppState::new(config, db, users)))
    }

    #[tokio::test]
    async fn test_health_handler() {
        let (_dir, state) = create_test_state();
        let response = health_handler(State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_response_has_timestamp() {
        let (_dir, state) = create_test_state();
        let response = health_handler(State(state)).await.into_response();

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, StatusCode::OK);

        let body = Body::new(body);
        let bytes = body.collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(health.status, "ok");
        assert_eq!(health.database, "ok");
        assert!(health.timestamp > 0);
    }
}
