//! Admin account management.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde_json::json;
use tracing::instrument;

use bazaar_core::validation::required_text;
use bazaar_core::{Email, UserId, UserRole};

use crate::db::UserRepository;
use crate::db::users::UserChanges;
use crate::error::{AppError, Result};
use crate::middleware::{RequestId, RequireAdmin};
use crate::models::user::AdminUserUpdate;
use crate::models::{NewAuditEntry, User};
use crate::routes::extract::{JsonBody, PathParam};
use crate::services::audit;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/{id}", get(show).put(update).delete(remove))
}

/// GET /api/admin/users
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list().await?))
}

/// GET /api/admin/users/{id}
#[instrument(skip_all, fields(user_id = %id))]
async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    PathParam(id): PathParam<UserId>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

/// Edit another account's name, email, or role.
///
/// PUT /api/admin/users/{id}
#[instrument(skip(state, admin, request_id, update), fields(admin_id = %admin.id()))]
async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<UserId>,
    JsonBody(update): JsonBody<AdminUserUpdate>,
) -> Result<Json<User>> {
    if id == admin.id() && update.role.is_some_and(|role| role != UserRole::Admin) {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".to_string(),
        ));
    }

    let name = update
        .name
        .as_deref()
        .map(|name| required_text("name", name, MAX_NAME_LENGTH))
        .transpose()?;
    let email = update
        .email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;

    let changes = UserChanges {
        name: name.as_deref(),
        email: email.as_ref(),
        password_hash: None,
        role: update.role,
    };
    let user = UserRepository::new(state.pool()).update(id, &changes).await?;

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "user.update", "user")
            .entity(id)
            .details(json!({
                "name": name,
                "email": email.as_ref().map(Email::as_str),
                "role": update.role,
            }))
            .request_id(request_id),
    )
    .await;

    Ok(Json(user))
}

/// DELETE /api/admin/users/{id}
///
/// Admin accounts must be demoted before they can be deleted.
#[instrument(skip(state, admin, request_id), fields(admin_id = %admin.id()))]
async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    PathParam(id): PathParam<UserId>,
) -> Result<StatusCode> {
    let repo = UserRepository::new(state.pool());
    let user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if user.is_admin() {
        return Err(AppError::BadRequest("Cannot delete admin user".to_string()));
    }
    if !repo.delete(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    audit::record(
        state.pool(),
        NewAuditEntry::new(admin.id(), "user.delete", "user")
            .entity(id)
            .details(json!({ "email": user.email }))
            .request_id(request_id),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
