use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use coachmeet_db::models::User;
use coachmeet_db::{Database, areas, users};
use coachmeet_types::api::{
    AreaResponse, Claims, LoginRequest, LoginResponse, SignupRequest, UserResponse,
};

use crate::db::with_db;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// When set, registering for a meet that is already full is refused.
    pub enforce_meet_capacity: bool,
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Validate input
    if req.name.trim().is_empty() || !validate_email(&req.email) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    // Check if email is taken
    let email = req.email.clone();
    if with_db(&state, move |conn| users::get_by_email(conn, &email))
        .await?
        .is_some()
    {
        return Err(StatusCode::CONFLICT);
    }

    let password_hash = hash_password(&req.password)?;

    // A concurrent signup with the same email still ends up as a
    // constraint violation, reported as 409 as well.
    let user = with_db(&state, move |conn| {
        users::create(
            conn,
            &req.name,
            &req.email,
            &password_hash,
            &req.phone,
            req.gender,
            req.is_coach,
        )
    })
    .await?;

    info!("Registered user {} (coach: {})", user.id, user.is_coach);
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let email = req.email.clone();
    let (found, areas) = with_db(&state, move |conn| {
        let found = match users::get_by_email(conn, &email)? {
            Some(user) => {
                let version = users::token_version(conn, user.id)?.unwrap_or_default();
                Some((user, version))
            }
            None => None,
        };
        Ok((found, areas::list_all(conn)?))
    })
    .await?;
    let (user, version) = found.ok_or(StatusCode::UNAUTHORIZED)?;

    verify_password(&req.password, &user.password_hash)?;

    let token = issue_token(&state, &user, version)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
        areas: areas.iter().map(AreaResponse::from).collect(),
    }))
}

/// Invalidates every token issued to the caller, the presented one included.
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, StatusCode> {
    let user_id = claims.sub;
    with_db(&state, move |conn| users::bump_token_version(conn, user_id))
        .await?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    info!("User {} logged out", user_id);
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn issue_token(
    state: &AppState,
    user: &User,
    version: i64,
) -> Result<String, StatusCode> {
    create_token(
        &state.jwt_secret,
        state.token_ttl_days,
        user.id,
        &user.email,
        version,
    )
    .map_err(|e| {
        error!("Failed to sign token: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> Result<String, StatusCode> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

fn verify_password(password: &str, stored: &str) -> Result<(), StatusCode> {
    let parsed_hash = PasswordHash::new(stored).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

pub fn create_token(
    secret: &str,
    ttl_days: i64,
    user_id: Uuid,
    email: &str,
    version: i64,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        ver: version,
        exp: (chrono::Utc::now() + chrono::Duration::days(ttl_days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Shape check only: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("anna@example.com"));
        assert!(validate_email("a.b+c@sub.example.org"));
        assert!(!validate_email("anna"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("anna@localhost"));
        assert!(!validate_email("anna@@example.com"));
        assert!(!validate_email("anna@example.com."));
        assert!(!validate_email("an na@example.com"));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert_eq!(
            verify_password("battery staple", &hash),
            Err(StatusCode::UNAUTHORIZED)
        );
    }
}
