//! Repository for the `notifications` outbox.

use reelworks_core::notifications::NotificationRequest;
use reelworks_core::types::DbId;
use sqlx::PgPool;

use crate::models::notification::Notification;

const COLUMNS: &str = "id, recipient_id, kind, title, message, link, is_read, created_at";

pub struct NotificationRepo;

impl NotificationRepo {
    pub async fn create(
        pool: &PgPool,
        request: &NotificationRequest,
    ) -> Result<Notification, sqlx::Error> {
        let query = format!(
            "INSERT INTO notifications (recipient_id, kind, title, message, link)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(request.recipient_id)
            .bind(request.kind.as_str())
            .bind(&request.title)
            .bind(&request.message)
            .bind(&request.link)
            .fetch_one(pool)
            .await
    }

    /// Newest first.
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE recipient_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(recipient_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn mark_read(pool: &PgPool, id: DbId, recipient_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
