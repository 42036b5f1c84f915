//! Session cookie authentication for the API routes.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum_extra::extract::cookie::CookieJar;
use http::request::Parts;

use super::public::ApiError;
use super::routes::user::db::{delete_session, find_session};
use super::state::AppState;

pub const SESSION_COOKIE: &str = "userToken";

/// The user owning the session cookie of the current request. Handlers
/// that take this extractor respond with 401 when the cookie is
/// missing, unknown, or older than the configured session TTL.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized("Not Logged In"))?;

        let session = find_session(&state.db, &token)
            .await?
            .ok_or(ApiError::Unauthorized("Invalid Token"))?;

        if session.is_expired(state.config.session_ttl_hours) {
            delete_session(&state.db, &token).await?;
            return Err(ApiError::Unauthorized("Session Expired"));
        }

        Ok(CurrentUser {
            id: session.user_id,
            email: session.email,
            name: session.name,
            token,
        })
    }
}
