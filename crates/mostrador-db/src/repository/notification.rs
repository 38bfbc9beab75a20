//! Notification inbox rows.
//!
//! Rows are written best-effort by the services after the business write
//! they describe has committed.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{Notification, NotificationKind};

const SELECT_NOTIFICATION: &str = "SELECT id, business_id, kind, title, body, transaction_id, \
     created_at, read_at FROM notifications";

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub business_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    pub async fn insert(&self, new: &NewNotification) -> DbResult<Notification> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            business_id: new.business_id.clone(),
            kind: new.kind,
            title: new.title.clone(),
            body: new.body.clone(),
            transaction_id: new.transaction_id.clone(),
            created_at: Utc::now(),
            read_at: None,
        };

        sqlx::query(
            "INSERT INTO notifications (id, business_id, kind, title, body, transaction_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&notification.id)
        .bind(&notification.business_id)
        .bind(notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.transaction_id)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    /// Unread notifications, newest first.
    pub async fn list_unread(&self, business_id: &str) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(&format!(
            "{} WHERE business_id = ? AND read_at IS NULL ORDER BY created_at DESC",
            SELECT_NOTIFICATION
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    pub async fn count_by_business(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE business_id = ?")
                .bind(business_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Marks one notification read. Scoped by business so a tenant cannot
    /// touch another tenant's inbox.
    pub async fn mark_read(&self, business_id: &str, id: &str, read_at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = COALESCE(read_at, ?) WHERE id = ? AND business_id = ?",
        )
        .bind(read_at)
        .bind(id)
        .bind(business_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }
        Ok(())
    }
}
