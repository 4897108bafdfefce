use crate::core::error::{ApiError, PageError, StoreResult};
use crate::core::state::AppState;
use crate::models::api::UserListResponse;
use crate::models::user::User;
use crate::utils::html::escape;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Json, Response},
};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, error};

async fn load_users(state: &AppState) -> Result<StoreResult<Vec<User>>, tokio::task::JoinError> {
    let users = state.users.clone();
    tokio::task::spawn_blocking(move || users.find_many()).await
}

/// Server-rendered table of every user
///
/// GET /
pub async fn users_page_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, PageError> {
    let users = load_users(&state).await?.map_err(|e| {
        error!(error = %e, "Failed to load users for page");
        e
    })?;

    debug!(count = users.len(), "Rendering users page");
    Ok(Html(render_users_page(&users)))
}

/// Same data as the page, as JSON
///
/// GET /api/users
pub async fn users_api_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let users = load_users(&state).await?.map_err(|e| {
        error!(error = %e, "Failed to load users");
        e
    })?;

    Ok(Json(UserListResponse {
        success: true,
        count: users.len(),
        users,
    })
    .into_response())
}

pub fn render_users_page(users: &[User]) -> String {
    let mut rows = String::new();
    for user in users {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            user.id,
            escape(&user.name),
            escape(&user.email),
            escape(user.id_card_no.as_deref().unwrap_or("")),
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>List of Users</title>
<style>
body {{ font-family: sans-serif; background: #f9fafb; display: flex; flex-direction: column; align-items: center; padding: 2rem; }}
h1 {{ color: #333333; }}
table {{ width: 100%; max-width: 56rem; background: #fff; border-collapse: collapse; box-shadow: 0 1px 3px rgba(0,0,0,.1); }}
th {{ background: #f3f4f6; color: #6b7280; font-size: .75rem; text-transform: uppercase; text-align: left; padding: .75rem 1.5rem; }}
td {{ padding: 1rem 1.5rem; border-top: 1px solid #e5e7eb; font-size: .875rem; color: #374151; }}
</style>
</head>
<body>
<h1>List of Users</h1>
<table>
<thead><tr><th>ID</th><th>Name</th><th>Email</th><th>ID Card No</th></tr></thead>
<tbody>{}</tbody>
</table>
</body>
</html>
"#,
        rows
    )
}
