// Centralized error handling for the user store and its HTTP surface

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::api::ErrorResponse;
use crate::utils::html::escape;

/// Errors raised by keys and ciphertext envelopes
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("No key with fingerprint {0} is configured")]
    UnknownKey(String),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Ciphertext failed authentication (corrupt data or wrong key)")]
    AuthenticationFailed,

    #[error("Decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors surfaced by every `UserStore` implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Unique constraint failed on the field: `{field}`")]
    UniqueConstraint { field: String },

    #[error("Failed to decrypt field `{field}`: {source}")]
    Decryption {
        field: &'static str,
        #[source]
        source: CipherError,
    },

    #[error("Failed to encrypt field `{field}`: {source}")]
    Encryption {
        field: &'static str,
        #[source]
        source: CipherError,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, Some(message)) = &err {
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                return StoreError::UniqueConstraint {
                    field: unique_field(message),
                };
            }
        }
        StoreError::Sqlite(err)
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Connection(err.to_string())
    }
}

/// Column named by an SQLite message such as `UNIQUE constraint failed: User.email`.
fn unique_field(message: &str) -> String {
    message
        .rsplit(": ")
        .next()
        .and_then(|columns| columns.split(',').next())
        .map(|column| column.trim().rsplit('.').next().unwrap_or(column).to_string())
        .unwrap_or_else(|| message.to_string())
}

/// Failure while rendering the users page
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Failed to load users: {0}")]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let body = format!(
            "<!DOCTYPE html><html><body><h1>Something went wrong</h1><p>{}</p></body></html>",
            escape(&self.to_string())
        );

        (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
    }
}

/// Failure in the JSON endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::UniqueConstraint { .. }) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
