//! Admin product image upload.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
};
use serde_json::json;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{RequestId, RequireAdmin};
use crate::models::NewAuditEntry;
use crate::services::uploads::{StoredImage, UploadError, store_image};
use crate::services::audit;
use crate::state::AppState;

/// Multipart field holding the file.
const IMAGE_FIELD: &str = "image";

pub fn router() -> Router<AppState> {
    // The size cap is enforced while streaming the field below.
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::disable())
}

/// POST /api/admin/uploads (multipart, field `image`)
#[instrument(skip(state, admin, request_id, multipart), fields(admin_id = %admin.id()))]
async fn upload(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredImage>)> {
    let config = &state.config().uploads;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(String::from);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > config.max_bytes {
                return Err(UploadError::TooLarge {
                    max: config.max_bytes,
                }
                .into());
            }
            bytes.extend_from_slice(&chunk);
        }

        let stored = store_image(config, file_name.as_deref(), &bytes).await?;

        audit::record(
            state.pool(),
            NewAuditEntry::new(admin.id(), "upload.create", "upload")
                .entity(&stored.image)
                .details(json!({ "originalName": file_name, "size": stored.size }))
                .request_id(request_id),
        )
        .await;

        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(AppError::Upload(UploadError::MissingFile))
}
