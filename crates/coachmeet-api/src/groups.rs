use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use coachmeet_db::{areas, groups, meets};
use coachmeet_types::api::{
    Claims, CreateGroupRequest, GroupResponse, GroupViewResponse, GroupsQuery, MeetInfoResponse,
    UserBaseResponse,
};

use crate::auth::AppState;
use crate::db::with_db;
use crate::middleware::current_user;

pub async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let coach = current_user(&state, &claims).await?;
    if !coach.is_coach {
        return Err(StatusCode::FORBIDDEN);
    }
    if req.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let coach_id = coach.id;
    let group = with_db(&state, move |conn| {
        if !areas::exists(conn, req.area_id)? {
            return Ok(Err(StatusCode::BAD_REQUEST));
        }
        Ok(Ok(groups::create(
            conn,
            coach_id,
            req.name.trim(),
            &req.description,
            req.area_id,
        )?))
    })
    .await??;

    info!("Coach {} created group {}", coach.id, group.id);
    Ok((
        StatusCode::CREATED,
        Json(GroupResponse::new(&group, &coach.name)),
    ))
}

pub async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupsQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let groups = with_db(&state, move |conn| groups::list_by_area(conn, query.area_id)).await?;
    Ok(Json(
        groups.iter().map(GroupResponse::from).collect::<Vec<_>>(),
    ))
}

/// The group with its meets, `full` and `registered` evaluated for the caller.
pub async fn get_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id = claims.sub;
    let (group, meets) = with_db(&state, move |conn| {
        let Some(group) = groups::get_by_id(conn, group_id)? else {
            return Ok(Err(StatusCode::NOT_FOUND));
        };
        let meets = meets::list_by_group_with_status(conn, group_id, user_id)?;
        Ok(Ok((group, meets)))
    })
    .await??;

    Ok(Json(GroupViewResponse {
        group: GroupResponse::from(&group),
        meets: meets.iter().map(MeetInfoResponse::from).collect(),
    }))
}

pub async fn list_members(
    State(state): State<AppState>,
    Path(group_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let members = with_db(&state, move |conn| {
        if groups::get_by_id(conn, group_id)?.is_none() {
            return Ok(Err(StatusCode::NOT_FOUND));
        }
        Ok(Ok(groups::list_members(conn, group_id)?))
    })
    .await??;

    Ok(Json(
        members.iter().map(UserBaseResponse::from).collect::<Vec<_>>(),
    ))
}

pub async fn join_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let user = current_user(&state, &claims).await?;

    let user_id = user.id;
    with_db(&state, move |conn| {
        if groups::get_by_id(conn, group_id)?.is_none() {
            return Ok(Err(StatusCode::NOT_FOUND));
        }
        if groups::member_exists(conn, group_id, user_id)? {
            return Ok(Err(StatusCode::CONFLICT));
        }
        groups::add_member(conn, group_id, user_id)?;
        Ok(Ok(()))
    })
    .await??;

    Ok(StatusCode::CREATED)
}

/// Members may leave on their own; the group's coach may remove anyone.
/// Registrations for the group's meets go with the membership.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, StatusCode> {
    let caller = claims.sub;
    with_db(&state, move |conn| {
        let Some(group) = groups::get_by_id(conn, group_id)? else {
            return Ok(Err(StatusCode::NOT_FOUND));
        };
        if caller != user_id && caller != group.group.coach_id {
            return Ok(Err(StatusCode::FORBIDDEN));
        }
        if !groups::member_exists(conn, group_id, user_id)? {
            return Ok(Err(StatusCode::NOT_FOUND));
        }
        groups::remove_member(conn, group_id, user_id)?;
        Ok(Ok(()))
    })
    .await??;

    info!("User {} left group {}", user_id, group_id);
    Ok(StatusCode::NO_CONTENT)
}
