//! Handlers for the payment ledger.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use reelworks_core::payment::RecordPayment;
use reelworks_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/projects/{project_id}/payments
///
/// Append a payment record. A completing payment also queues the project.
pub async fn record_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<RecordPayment>,
) -> AppResult<impl IntoResponse> {
    let payment = state
        .workflow
        .record_payment(project_id, &auth.actor(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: payment })))
}

/// GET /api/v1/projects/{project_id}/payments
pub async fn list_payments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let payments = state
        .workflow
        .list_payments(project_id, &auth.actor())
        .await?;
    Ok(Json(DataResponse { data: payments }))
}
