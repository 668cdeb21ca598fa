use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use coachmeet_db::areas;
use coachmeet_types::api::{AreaResponse, Claims, CreateAreaRequest};

use crate::auth::AppState;
use crate::db::with_db;
use crate::middleware::current_user;

pub async fn list_areas(State(state): State<AppState>) -> Result<impl IntoResponse, StatusCode> {
    let areas = with_db(&state, areas::list_all).await?;
    Ok(Json(areas.iter().map(AreaResponse::from).collect::<Vec<_>>()))
}

/// Areas are reference data; only coaches may add to the list.
pub async fn create_area(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAreaRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if !current_user(&state, &claims).await?.is_coach {
        return Err(StatusCode::FORBIDDEN);
    }
    if req.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let area = with_db(&state, move |conn| areas::create(conn, req.name.trim())).await?;
    Ok((StatusCode::CREATED, Json(AreaResponse::from(&area))))
}
