use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use reelworks_core::roles::Role;
use reelworks_core::stats::StatsScope;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// `global` or a client id. Defaults to the caller's own scope for
    /// clients and `global` for everyone else.
    pub scope: Option<String>,
}

/// GET /api/v1/stats
pub async fn get_stats(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<impl IntoResponse> {
    let scope = match query.scope {
        Some(raw) => raw.parse::<StatsScope>()?,
        None if auth.role == Role::Client => StatsScope::Client(auth.user_id),
        None => StatsScope::Global,
    };

    let stats = state.workflow.get_stats(&auth.actor(), scope).await?;
    Ok(Json(DataResponse { data: stats }))
}
