pub mod areas;
pub mod auth;
pub mod groups;
pub mod meets;
pub mod middleware;
pub mod profile;

mod db;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use auth::AppState;
use middleware::require_auth;

/// Assembles the public and authenticated routes over one shared state.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/areas", get(areas::list_areas).post(areas::create_area))
        .route("/profile", get(profile::get_profile))
        .route("/profile/details", put(profile::update_details))
        .route("/profile/password", put(profile::update_password))
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/{group_id}", get(groups::get_group))
        .route(
            "/groups/{group_id}/members",
            get(groups::list_members).post(groups::join_group),
        )
        .route(
            "/groups/{group_id}/members/{user_id}",
            delete(groups::remove_member),
        )
        .route("/groups/{group_id}/meets", post(meets::create_meet))
        .route("/meets", get(meets::my_meets))
        .route("/meets/{meet_id}", get(meets::get_meet).put(meets::update_meet))
        .route(
            "/meets/{meet_id}/members",
            post(meets::register).delete(meets::unregister),
        )
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
