use reelworks_core::error::CoreError;
use reelworks_core::payment::Payment;
use reelworks_core::status::{PaymentStatus, StatusId};
use reelworks_core::types::{Amount, DbId, Timestamp};
use sqlx::FromRow;

use super::{decode_name, decode_status};

/// A row from the `payments` table.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: DbId,
    pub project_id: DbId,
    pub client_id: DbId,
    pub amount: Amount,
    pub currency: String,
    pub method: String,
    pub status_id: StatusId,
    pub transaction_ref: Option<String>,
    pub payment_date: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            project_id: row.project_id,
            client_id: row.client_id,
            amount: row.amount,
            currency: row.currency,
            method: decode_name("payment method", &row.method)?,
            status: decode_status("payment status", row.status_id, PaymentStatus::from_id)?,
            transaction_ref: row.transaction_ref,
            payment_date: row.payment_date,
            created_at: row.created_at,
        })
    }
}
