use axum::http::StatusCode;
use tracing::{error, warn};

use coachmeet_db::DbError;
use coachmeet_db::rusqlite::Connection;

use crate::auth::AppState;

/// Runs `f` against the shared connection on the blocking pool so SQLite
/// never stalls the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Connection) -> coachmeet_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || state.db.with_conn(f))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(status_for)
}

pub(crate) fn status_for(err: DbError) -> StatusCode {
    match err {
        DbError::Constraint(msg) => {
            warn!("Constraint violation: {}", msg);
            StatusCode::CONFLICT
        }
        DbError::InvalidMeetDate { .. } => StatusCode::BAD_REQUEST,
        other => {
            error!("Database error: {}", other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
