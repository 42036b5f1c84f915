//! Router for the user session API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;

use super::db::delete_session;
use super::public;
use crate::api::auth::{CurrentUser, SESSION_COOKIE};
use crate::api::public::{ApiError, Envelope};
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

/// Confirm the session cookie is valid and return who it belongs to
async fn check_logged(user: CurrentUser) -> Json<Envelope<public::UserProfile>> {
    Json(Envelope::ok(public::UserProfile {
        id: user.id,
        email: user.email,
        name: user.name,
    }))
}

/// End the current session and clear the cookie
async fn logout(
    State(state): State<SharedState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    delete_session(&state.db, &user.token).await?;
    tracing::info!("User {} logged out", user.id);

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(json!({ "status": 200, "message": "Logged out" }))))
}

/// Create the user router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/checkLogged", post(check_logged))
        .route("/logout", get(logout))
}
