//! # Cash Session Repository
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert_open()                                                          │
//! │    INSERT ... status = 'open'                                           │
//! │    └── idx_cash_sessions_one_open rejects a second open row for the     │
//! │        same business → DbError::UniqueViolation                         │
//! │                                                                         │
//! │  close()                                                                │
//! │    UPDATE ... SET status = 'closed', closing fields                     │
//! │    WHERE id = ? AND status = 'open'                                     │
//! │    └── 0 rows → the caller held a stale reference (already closed)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::{CashSession, Money, Reconciliation};

const SELECT_SESSION: &str = "SELECT id, business_id, opening_cash, status, opened_at, \
     opened_by, closed_at, closed_by, closing_cash, expected_cash, cash_difference, notes \
     FROM cash_sessions";

/// Repository for drawer sessions.
#[derive(Debug, Clone)]
pub struct CashSessionRepository {
    pool: SqlitePool,
}

impl CashSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashSessionRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(&format!("{} WHERE id = ?", SELECT_SESSION))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// The open session of a business, if any.
    pub async fn find_open(&self, business_id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(&format!(
            "{} WHERE business_id = ? AND status = 'open' LIMIT 1",
            SELECT_SESSION
        ))
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Most recent sessions first.
    pub async fn list(&self, business_id: &str, limit: i64) -> DbResult<Vec<CashSession>> {
        let sessions = sqlx::query_as::<_, CashSession>(&format!(
            "{} WHERE business_id = ? ORDER BY opened_at DESC LIMIT ?",
            SELECT_SESSION
        ))
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Inserts a new open session.
    ///
    /// A concurrent open for the same business fails with
    /// `DbError::UniqueViolation` on `cash_sessions.business_id`.
    pub async fn insert_open(
        &self,
        business_id: &str,
        opened_by: &str,
        opening_cash: Money,
    ) -> DbResult<CashSession> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, business_id = %business_id, opening_cash = %opening_cash, "Opening cash session");

        sqlx::query(
            "INSERT INTO cash_sessions (id, business_id, opening_cash, status, opened_at, opened_by) \
             VALUES (?, ?, ?, 'open', ?, ?)",
        )
        .bind(&id)
        .bind(business_id)
        .bind(opening_cash)
        .bind(Utc::now())
        .bind(opened_by)
        .execute(&self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DbError::not_found("CashSession", id))
    }

    /// Closes an open session with its reconciliation.
    ///
    /// Returns `None` when the session was not open (or does not exist);
    /// nothing is written in that case.
    pub async fn close(
        &self,
        id: &str,
        closed_by: &str,
        reconciliation: &Reconciliation,
        notes: Option<&str>,
        closed_at: DateTime<Utc>,
    ) -> DbResult<Option<CashSession>> {
        debug!(id = %id, expected = %reconciliation.expected_cash, "Closing cash session");

        let result = sqlx::query(
            "UPDATE cash_sessions SET status = 'closed', closed_at = ?, closed_by = ?, \
             closing_cash = ?, expected_cash = ?, cash_difference = ?, notes = COALESCE(?, notes) \
             WHERE id = ? AND status = 'open'",
        )
        .bind(closed_at)
        .bind(closed_by)
        .bind(reconciliation.closing_cash)
        .bind(reconciliation.expected_cash)
        .bind(reconciliation.difference)
        .bind(notes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
