//! Payment method records (tender types) per business.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::PaymentMethod;

const SELECT_METHOD: &str =
    "SELECT id, business_id, code, name, is_active, created_at FROM payment_methods";

#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!("{} WHERE id = ?", SELECT_METHOD))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(method)
    }

    /// Looks up the method a business uses for `code` (e.g. the webhook
    /// needs `stripe_checkout`).
    pub async fn find_by_code(&self, business_id: &str, code: &str) -> DbResult<Option<PaymentMethod>> {
        let method = sqlx::query_as::<_, PaymentMethod>(&format!(
            "{} WHERE business_id = ? AND code = ?",
            SELECT_METHOD
        ))
        .bind(business_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(method)
    }

    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<PaymentMethod>> {
        let methods = sqlx::query_as::<_, PaymentMethod>(&format!(
            "{} WHERE business_id = ? ORDER BY created_at, code",
            SELECT_METHOD
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    /// Inserts an active method. Codes are unique per business.
    pub async fn insert(&self, business_id: &str, code: &str, name: &str) -> DbResult<PaymentMethod> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, business_id = %business_id, code = %code, "Inserting payment method");

        sqlx::query(
            "INSERT INTO payment_methods (id, business_id, code, name, is_active, created_at) \
             VALUES (?, ?, ?, ?, 1, ?)",
        )
        .bind(&id)
        .bind(business_id)
        .bind(code)
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("PaymentMethod", id))
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE payment_methods SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PaymentMethod", id));
        }
        Ok(())
    }
}
