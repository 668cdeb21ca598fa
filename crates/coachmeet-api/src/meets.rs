use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};
use uuid::Uuid;

use coachmeet_db::{groups, meets};
use coachmeet_types::api::{Claims, MeetInfoResponse, MeetRequest, MeetResponse, MyMeetsResponse};

use crate::auth::AppState;
use crate::db::with_db;

/// Schedules a meet for a group; only the group's coach may do so.
pub async fn create_meet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<MeetRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.max_members == 0 || req.duration == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let caller = claims.sub;
    let meet = with_db(&state, move |conn| {
        let Some(group) = groups::get_by_id(conn, group_id)? else {
            return Ok(Err(StatusCode::NOT_FOUND));
        };
        if group.group.coach_id != caller {
            return Ok(Err(StatusCode::FORBIDDEN));
        }
        Ok(Ok(meets::create(
            conn,
            group_id,
            req.max_members,
            &req.meet_date,
            req.duration,
            &req.city,
            &req.street,
        )?))
    })
    .await??;

    info!("Scheduled meet {} for group {}", meet.id, group_id);
    Ok((StatusCode::CREATED, Json(MeetResponse::new(&meet, &[]))))
}

pub async fn my_meets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let user_id = claims.sub;
    let meets = with_db(&state, move |conn| meets::list_for_trainee(conn, user_id)).await?;

    Ok(Json(MyMeetsResponse {
        meets: meets.iter().map(MeetInfoResponse::from).collect(),
    }))
}

pub async fn get_meet(
    State(state): State<AppState>,
    Path(meet_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    let (meet, members) = with_db(&state, move |conn| {
        let Some(meet) = meets::get(conn, meet_id)? else {
            return Ok(Err(StatusCode::NOT_FOUND));
        };
        let members = meets::list_members(conn, meet_id)?;
        Ok(Ok((meet, members)))
    })
    .await??;

    Ok(Json(MeetResponse::new(&meet.meet, &members)))
}

pub async fn update_meet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(meet_id): Path<Uuid>,
    Json(req): Json<MeetRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.max_members == 0 || req.duration == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let caller = claims.sub;
    let (meet, members) = with_db(&state, move |conn| {
        let Some(existing) = meets::get(conn, meet_id)? else {
            return Ok(Err(StatusCode::NOT_FOUND));
        };
        if existing.coach_id != caller {
            return Ok(Err(StatusCode::FORBIDDEN));
        }

        meets::update(
            conn,
            meet_id,
            req.max_members,
            &req.meet_date,
            req.duration,
            &req.city,
            &req.street,
        )?;

        let Some(updated) = meets::get(conn, meet_id)? else {
            return Ok(Err(StatusCode::NOT_FOUND));
        };
        let members = meets::list_members(conn, meet_id)?;
        Ok(Ok((updated, members)))
    })
    .await??;

    Ok(Json(MeetResponse::new(&meet.meet, &members)))
}

/// Registers the caller. Requires membership of the meet's group; a full
/// meet is only refused when capacity enforcement is switched on.
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(meet_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let user_id = claims.sub;
    let enforce_capacity = state.enforce_meet_capacity;

    with_db(&state, move |conn| {
        let Some(meet) = meets::get(conn, meet_id)? else {
            return Ok(Err(StatusCode::NOT_FOUND));
        };
        if !groups::member_exists(conn, meet.meet.group_id, user_id)? {
            return Ok(Err(StatusCode::FORBIDDEN));
        }
        if meets::member_exists(conn, meet_id, user_id)? {
            return Ok(Err(StatusCode::CONFLICT));
        }
        if enforce_capacity && meets::count_members(conn, meet_id)? >= meet.meet.max_members {
            debug!("Meet {} is full", meet_id);
            return Ok(Err(StatusCode::CONFLICT));
        }
        meets::add_member(conn, meet_id, user_id)?;
        Ok(Ok(()))
    })
    .await??;

    Ok(StatusCode::CREATED)
}

pub async fn unregister(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(meet_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let user_id = claims.sub;
    with_db(&state, move |conn| {
        if !meets::member_exists(conn, meet_id, user_id)? {
            return Ok(Err(StatusCode::NOT_FOUND));
        }
        meets::remove_member(conn, meet_id, user_id)?;
        Ok(Ok(()))
    })
    .await??;

    Ok(StatusCode::NO_CONTENT)
}
