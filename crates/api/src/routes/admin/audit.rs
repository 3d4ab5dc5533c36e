//! Audit log viewer.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::AuditRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{AuditEntry, Paginated, clamp_page, page_count};
use crate::routes::extract::QueryParams;
use crate::state::AppState;

const AUDIT_PAGE_SIZE: i64 = 25;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AuditList {
    pub entries: Vec<AuditEntry>,
}

/// GET /api/admin/audit?page=
#[instrument(skip_all)]
async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    QueryParams(query): QueryParams<AuditQuery>,
) -> Result<Json<Paginated<AuditList>>> {
    let page = clamp_page(query.page);
    let (entries, total) = AuditRepository::new(state.pool())
        .page(page, AUDIT_PAGE_SIZE)
        .await?;

    Ok(Json(Paginated {
        rows: AuditList { entries },
        page,
        pages: page_count(total, AUDIT_PAGE_SIZE),
    }))
}
