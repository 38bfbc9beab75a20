//! Staff accounts.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{Staff, StaffRole};

const SELECT_STAFF: &str =
    "SELECT id, business_id, name, role, is_active, created_at FROM staff";

#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!("{} WHERE id = ?", SELECT_STAFF))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(staff)
    }

    pub async fn insert(&self, business_id: &str, name: &str, role: StaffRole) -> DbResult<Staff> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, business_id = %business_id, role = ?role, "Inserting staff");

        sqlx::query(
            "INSERT INTO staff (id, business_id, name, role, is_active, created_at) \
             VALUES (?, ?, ?, ?, 1, ?)",
        )
        .bind(&id)
        .bind(business_id)
        .bind(name)
        .bind(role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Staff", id))
    }

    pub async fn list_by_business(&self, business_id: &str) -> DbResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "{} WHERE business_id = ? ORDER BY created_at",
            SELECT_STAFF
        ))
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(staff)
    }

    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE staff SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Staff", id));
        }
        Ok(())
    }
}
