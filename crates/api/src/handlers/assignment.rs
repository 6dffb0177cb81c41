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
pub struct AssignRequest {
    pub editor_id: DbId,
}

/// POST /api/v1/projects/{project_id}/assignments
pub async fn assign_editor(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AssignRequest>,
) -> AppResult<impl IntoResponse> {
    let assignment = state
        .workflow
        .assign_editor(project_id, input.editor_id, &auth.actor())
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: assignment })))
}

/// GET /api/v1/projects/{project_id}/assignments
pub async fn list_assignments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let assignments = state
        .workflow
        .list_assignments(project_id, &auth.actor())
        .await?;
    Ok(Json(DataResponse { data: assignments }))
}
