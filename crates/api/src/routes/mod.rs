pub mod health;
pub mod project;
pub mod revision;
pub mod stats;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /projects                                  list, create
/// /projects/{project_id}                     get (with payment status)
/// /projects/{project_id}/status              transition (POST)
/// /projects/{project_id}/revisions           list, request
/// /projects/{project_id}/payments            list, record
/// /projects/{project_id}/assignments         list, assign
///
/// /revisions/{revision_id}/resolve           resolve (POST)
///
/// /stats?scope=global|{client_id}            dashboard numbers
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/revisions", revision::router())
        .nest("/stats", stats::router())
}
