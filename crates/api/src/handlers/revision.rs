//! Handlers for the revision tracker.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use reelworks_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RevisionRequest {
    pub description: String,
}

/// POST /api/v1/projects/{project_id}/revisions
pub async fn request_revision(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<RevisionRequest>,
) -> AppResult<impl IntoResponse> {
    let revision = state
        .workflow
        .request_revision(project_id, &auth.actor(), &input.description)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: revision })))
}

/// GET /api/v1/projects/{project_id}/revisions
pub async fn list_revisions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let revisions = state
        .workflow
        .list_revisions(project_id, &auth.actor())
        .await?;
    Ok(Json(DataResponse { data: revisions }))
}

/// POST /api/v1/revisions/{revision_id}/resolve
pub async fn resolve_revision(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(revision_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let revision = state
        .workflow
        .resolve_revision(revision_id, &auth.actor())
        .await?;
    Ok(Json(DataResponse { data: revision }))
}
