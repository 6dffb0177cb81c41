//! Repository for the append-only `payments` table. There is deliberately
//! no update or delete.

use reelworks_core::payment::NewPayment;
use reelworks_core::types::DbId;
use sqlx::PgPool;

use crate::models::payment::PaymentRow;

const COLUMNS: &str = "id, project_id, client_id, amount, currency, method, status_id, \
    transaction_ref, payment_date, created_at";

pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn create(pool: &PgPool, input: &NewPayment) -> Result<PaymentRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments
                (project_id, client_id, amount, currency, method, status_id,
                 transaction_ref, payment_date, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PaymentRow>(&query)
            .bind(input.project_id)
            .bind(input.client_id)
            .bind(input.amount)
            .bind(&input.currency)
            .bind(input.method.as_str())
            .bind(input.status.id())
            .bind(&input.transaction_ref)
            .bind(input.payment_date)
            .bind(input.created_at)
            .fetch_one(pool)
            .await
    }

    /// A project's ledger in recording order.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<PaymentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE project_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, PaymentRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Every payment of a client, or of everyone when `client_id` is `None`.
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: Option<DbId>,
    ) -> Result<Vec<PaymentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments
             WHERE ($1::BIGINT IS NULL OR client_id = $1)
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, PaymentRow>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }
}
