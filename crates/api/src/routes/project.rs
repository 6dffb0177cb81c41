use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{assignment, payment, project, revision};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET, POST  /
/// GET        /{project_id}
/// POST       /{project_id}/status
/// GET, POST  /{project_id}/revisions
/// GET, POST  /{project_id}/payments
/// GET, POST  /{project_id}/assignments
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(project::list_projects).post(project::create_project),
        )
        .route("/{project_id}", get(project::get_project))
        .route("/{project_id}/status", post(project::transition_status))
        .route(
            "/{project_id}/revisions",
            get(revision::list_revisions).post(revision::request_revision),
        )
        .route(
            "/{project_id}/payments",
            get(payment::list_payments).post(payment::record_payment),
        )
        .route(
            "/{project_id}/assignments",
            get(assignment::list_assignments).post(assignment::assign_editor),
        )
}
