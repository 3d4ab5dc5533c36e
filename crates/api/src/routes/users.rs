//! Account routes: registration, login, logout, and the caller's profile.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use super::extract::JsonBody;
use crate::error::{Result, clear_sentry_user};
use crate::middleware::{RequireAuth, auth_rate_limiter};
use crate::models::User;
use crate::models::user::{AuthResponse, LoginRequest, ProfileUpdate, RegisterRequest};
use crate::state::AppState;

/// Build the users router.
///
/// Registration and login share the strict auth rate limit.
pub fn router() -> Router<AppState> {
    let credentials = Router::new()
        .route("/", post(register))
        .route("/login", post(login))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/logout", post(logout))
        .route("/profile", get(profile).put(update_profile))
        .merge(credentials)
}

/// POST /api/users
#[instrument(skip(state, request), fields(email = %request.email))]
async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let (user, token) = state
        .auth()
        .register(&request.name, &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}

/// POST /api/users/login
#[instrument(skip(state, request), fields(email = %request.email))]
async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (user, token) = state.auth().login(&request.email, &request.password).await?;
    Ok(Json(AuthResponse::new(user, token)))
}

/// Revoke the presented token.
///
/// POST /api/users/logout
#[instrument(skip(state, current), fields(user_id = %current.id()))]
async fn logout(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<StatusCode> {
    state.auth().logout(&current).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/profile
async fn profile(RequireAuth(current): RequireAuth) -> Json<User> {
    Json(current.user)
}

/// PUT /api/users/profile
#[instrument(skip(state, current, update), fields(user_id = %current.id()))]
async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<User>> {
    let user = state.auth().update_profile(current.id(), &update).await?;
    Ok(Json(user))
}
