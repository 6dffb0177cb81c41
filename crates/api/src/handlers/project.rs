//! Handlers for the project ledger.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use reelworks_core::project::ProjectIntake;
use reelworks_core::roles::Role;
use reelworks_core::status::ProjectStatus;
use reelworks_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /projects`. Clients order for themselves; admins must
/// name the client.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub client_id: Option<DbId>,
    pub package_id: DbId,
    #[serde(flatten)]
    pub intake: ProjectIntake,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: ProjectStatus,
}

/// POST /api/v1/projects
pub async fn create_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<impl IntoResponse> {
    let client_id = match (auth.role, input.client_id) {
        (_, Some(id)) => id,
        (Role::Client, None) => auth.user_id,
        (_, None) => {
            return Err(AppError::BadRequest(
                "client_id is required when ordering on behalf of a client".into(),
            ))
        }
    };

    let project = state
        .workflow
        .create_project(&auth.actor(), client_id, input.package_id, input.intake)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list_projects(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let projects = state.workflow.list_projects(&auth.actor()).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{project_id}
///
/// The project with its derived payment status and balance.
pub async fn get_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state.workflow.get_project(project_id, &auth.actor()).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/projects/{project_id}/status
pub async fn transition_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<TransitionRequest>,
) -> AppResult<impl IntoResponse> {
    let project = state
        .workflow
        .transition_status(project_id, &auth.actor(), input.status)
        .await?;

    tracing::info!(
        user_id = auth.user_id,
        project_id,
        status = %project.status,
        "Project status set"
    );

    Ok(Json(DataResponse { data: project }))
}
