use axum::routing::post;
use axum::Router;

use crate::handlers::revision;
use crate::state::AppState;

/// ```text
/// POST   /{revision_id}/resolve     resolve_revision
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{revision_id}/resolve", post(revision::resolve_revision))
}
