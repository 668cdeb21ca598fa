use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::warn;

use coachmeet_db::models::User;
use coachmeet_db::users;
use coachmeet_types::api::Claims;

use crate::auth::AppState;
use crate::db::with_db;

/// Extract and validate JWT from Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // Tokens from before the last logout or password change are revoked
    let user_id = token_data.claims.sub;
    let current = with_db(&state, move |conn| users::token_version(conn, user_id)).await?;
    if current != Some(token_data.claims.ver) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// Loads the caller's current record; a token for a user that no longer
/// resolves is treated as unauthenticated.
pub async fn current_user(state: &AppState, claims: &Claims) -> Result<User, StatusCode> {
    let user_id = claims.sub;
    with_db(state, move |conn| users::get_by_id(conn, user_id))
        .await?
        .ok_or_else(|| {
            warn!("Token subject {} has no user record", user_id);
            StatusCode::UNAUTHORIZED
        })
}
