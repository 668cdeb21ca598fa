use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;

use coachmeet_db::{groups, users};
use coachmeet_types::api::{
    Claims, GroupInfoResponse, GroupResponse, ProfileResponse, SessionResponse,
    UpdateDetailsRequest, UpdatePasswordRequest, UserResponse,
};

use crate::auth::{AppState, MIN_PASSWORD_LEN, hash_password, issue_token, validate_email};
use crate::db::with_db;
use crate::middleware::current_user;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = current_user(&state, &claims).await?;

    let user_id = user.id;
    let is_coach = user.is_coach;
    let (in_groups, coach_groups) = with_db(&state, move |conn| {
        let in_groups = groups::list_for_trainee(conn, user_id)?;
        let coach_groups = if is_coach {
            groups::list_for_coach(conn, user_id)?
        } else {
            Vec::new()
        };
        Ok((in_groups, coach_groups))
    })
    .await?;

    Ok(Json(ProfileResponse {
        is_coach: user.is_coach,
        in_groups: in_groups.iter().map(GroupInfoResponse::from).collect(),
        coach_groups: coach_groups
            .iter()
            .map(|group| GroupResponse::new(group, &user.name))
            .collect(),
        user: UserResponse::from(&user),
    }))
}

/// Applies whichever fields are present, then returns the re-fetched record.
pub async fn update_details(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateDetailsRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = current_user(&state, &claims).await?;

    if let Some(email) = &req.email {
        if !validate_email(email) {
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    if req.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let updated = with_db(&state, move |conn| {
        if let Some(email) = req.email.as_deref().filter(|email| *email != user.email) {
            if users::get_by_email(conn, email)?.is_some() {
                return Ok(Err(StatusCode::CONFLICT));
            }
        }

        users::update_profile(
            conn,
            user.id,
            req.name.as_deref().unwrap_or(&user.name),
            req.email.as_deref().unwrap_or(&user.email),
            req.phone.as_deref().unwrap_or(&user.phone),
            req.description.as_deref().unwrap_or(&user.description),
        )?;

        Ok(users::get_by_id(conn, user.id)?.ok_or(StatusCode::INTERNAL_SERVER_ERROR))
    })
    .await??;

    info!("Updated profile of user {}", updated.id);
    Ok(Json(UserResponse::from(&updated)))
}

pub async fn update_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = current_user(&state, &claims).await?;
    let password_hash = hash_password(&req.password)?;

    // Every other session ends with the old password; the caller gets a new token.
    let (updated, version) = with_db(&state, move |conn| {
        users::update_password(conn, user.id, &password_hash)?;
        let Some(version) = users::bump_token_version(conn, user.id)? else {
            return Ok(Err(StatusCode::UNAUTHORIZED));
        };
        Ok(users::get_by_id(conn, user.id)?
            .map(|user| (user, version))
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR))
    })
    .await??;

    info!("User {} changed password", updated.id);
    Ok(Json(SessionResponse {
        token: issue_token(&state, &updated, version)?,
        user: UserResponse::from(&updated),
    }))
}
