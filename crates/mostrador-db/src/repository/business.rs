//! # Business Repository
//!
//! Tenant rows: preset tag, raw override JSON and billing state.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{Business, SubscriptionStatus};

const SELECT_BUSINESS: &str = "SELECT id, name, preset, custom_config, subscription_status, \
     online_store_enabled, created_at FROM businesses";

/// Input for creating a tenant.
#[derive(Debug, Clone)]
pub struct NewBusiness {
    pub name: String,
    pub preset: String,
    pub custom_config: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub online_store_enabled: bool,
}

impl NewBusiness {
    pub fn new(name: impl Into<String>, preset: impl Into<String>) -> Self {
        NewBusiness {
            name: name.into(),
            preset: preset.into(),
            custom_config: None,
            subscription_status: SubscriptionStatus::Trialing,
            online_store_enabled: false,
        }
    }

    pub fn custom_config(mut self, raw: impl Into<String>) -> Self {
        self.custom_config = Some(raw.into());
        self
    }

    pub fn subscription_status(mut self, status: SubscriptionStatus) -> Self {
        self.subscription_status = status;
        self
    }
}

/// Repository for tenant rows.
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(&format!("{} WHERE id = ?", SELECT_BUSINESS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(business)
    }

    pub async fn insert(&self, new: &NewBusiness) -> DbResult<Business> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, preset = %new.preset, "Inserting business");

        sqlx::query(
            "INSERT INTO businesses (id, name, preset, custom_config, subscription_status, \
             online_store_enabled, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new.name)
        .bind(&new.preset)
        .bind(&new.custom_config)
        .bind(new.subscription_status)
        .bind(new.online_store_enabled)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("Business", id))
    }

    /// Replaces the tenant override. `None` clears it.
    ///
    /// The text is stored as given; resolution decides whether it is usable.
    pub async fn update_custom_config(&self, id: &str, raw: Option<&str>) -> DbResult<()> {
        debug!(id = %id, cleared = raw.is_none(), "Updating custom config");

        let result = sqlx::query("UPDATE businesses SET custom_config = ? WHERE id = ?")
            .bind(raw)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }
        Ok(())
    }

    pub async fn update_subscription_status(
        &self,
        id: &str,
        status: SubscriptionStatus,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE businesses SET subscription_status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }
        Ok(())
    }

    pub async fn set_online_store_enabled(&self, id: &str, enabled: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE businesses SET online_store_enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }
        Ok(())
    }
}
