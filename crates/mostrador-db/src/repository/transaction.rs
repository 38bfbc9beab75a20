//! # Transaction Repository
//!
//! Database operations for transactions and their line items.
//!
//! ## Creating a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. UPDATE businesses SET last_transaction_seq += 1 RETURNING seq      │
//! │      (takes the write lock, numbers stay sequential per business)       │
//! │   2. INSERT transactions (header, number T-000042)                      │
//! │   3. INSERT transaction_items (one per cart line, snapshots)            │
//! │   4. UPDATE products SET stock -= qty   (stock-tracked lines only)      │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure before COMMIT drops the transaction: no header without     │
//! │  items, no stock moved for a sale that does not exist.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Updates
//! Every status change is a conditional UPDATE (`WHERE status = ...`), so a
//! transition that is no longer valid writes nothing and returns `None`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mostrador_core::ledger::format_transaction_number;
use mostrador_core::{
    CartItem, DeliveryStatus, Money, PaymentMethod, Transaction, TransactionItem,
    TransactionSource, TransactionStatus, TransactionTotals,
};

const SELECT_TRANSACTION: &str = "SELECT id, business_id, transaction_number, cash_session_id, \
     source, status, delivery_status, payment_method_id, payment_method_code, subtotal, discount, \
     tax, total, customer_id, customer_name, served_by, payment_reference, notes, created_at, \
     paid_at, cancelled_at, delivered_at FROM transactions";

const SELECT_ITEM: &str = "SELECT id, transaction_id, product_id, product_name, quantity, \
     unit_price, discount, subtotal, created_at FROM transaction_items";

/// Header fields of a transaction about to be created. Amounts come from
/// the items.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub business_id: String,
    pub cash_session_id: Option<String>,
    pub source: TransactionSource,
    pub status: TransactionStatus,
    pub payment_method_id: Option<String>,
    pub payment_method_code: Option<String>,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub served_by: Option<String>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
}

/// Paid total for one payment method code.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CodeTotal {
    pub code: String,
    pub total: Money,
    pub count: i64,
}

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a transaction with its items and stock decrements atomically.
    ///
    /// `items` must already be validated; the CHECK constraints on the
    /// items and products tables are the last line and abort the whole write.
    pub async fn create(
        &self,
        new: &NewTransaction,
        items: &[CartItem],
    ) -> DbResult<(Transaction, Vec<TransactionItem>)> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let totals = TransactionTotals::from_items(items);
        let paid_at = (new.status == TransactionStatus::Paid).then_some(now);

        let mut tx = self.pool.begin().await?;

        let sequence: i64 = sqlx::query_scalar(
            "UPDATE businesses SET last_transaction_seq = last_transaction_seq + 1 \
             WHERE id = ? RETURNING last_transaction_seq",
        )
        .bind(&new.business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Business", new.business_id.clone()))?;

        let transaction = Transaction {
            id: id.clone(),
            business_id: new.business_id.clone(),
            transaction_number: format_transaction_number(sequence),
            cash_session_id: new.cash_session_id.clone(),
            source: new.source,
            status: new.status,
            delivery_status: DeliveryStatus::Pending,
            payment_method_id: new.payment_method_id.clone(),
            payment_method_code: new.payment_method_code.clone(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            tax: totals.tax,
            total: totals.total,
            customer_id: new.customer_id.clone(),
            customer_name: new.customer_name.clone(),
            served_by: new.served_by.clone(),
            payment_reference: new.payment_reference.clone(),
            notes: new.notes.clone(),
            created_at: now,
            paid_at,
            cancelled_at: None,
            delivered_at: None,
        };

        debug!(
            id = %id,
            number = %transaction.transaction_number,
            items = items.len(),
            total = %transaction.total,
            "Inserting transaction"
        );

        sqlx::query(
            "INSERT INTO transactions (id, business_id, transaction_number, cash_session_id, \
             source, status, delivery_status, payment_method_id, payment_method_code, subtotal, \
             discount, tax, total, customer_id, customer_name, served_by, payment_reference, \
             notes, created_at, paid_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&transaction.id)
        .bind(&transaction.business_id)
        .bind(&transaction.transaction_number)
        .bind(&transaction.cash_session_id)
        .bind(transaction.source)
        .bind(transaction.status)
        .bind(transaction.delivery_status)
        .bind(&transaction.payment_method_id)
        .bind(&transaction.payment_method_code)
        .bind(transaction.subtotal)
        .bind(transaction.discount)
        .bind(transaction.tax)
        .bind(transaction.total)
        .bind(&transaction.customer_id)
        .bind(&transaction.customer_name)
        .bind(&transaction.served_by)
        .bind(&transaction.payment_reference)
        .bind(&transaction.notes)
        .bind(transaction.created_at)
        .bind(transaction.paid_at)
        .execute(&mut *tx)
        .await?;

        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            let row = TransactionItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: id.clone(),
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                discount: item.discount,
                subtotal: item.subtotal(),
                created_at: now,
            };

            sqlx::query(
                "INSERT INTO transaction_items (id, transaction_id, product_id, product_name, \
                 quantity, unit_price, discount, subtotal, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&row.id)
            .bind(&row.transaction_id)
            .bind(&row.product_id)
            .bind(&row.product_name)
            .bind(row.quantity)
            .bind(row.unit_price)
            .bind(row.discount)
            .bind(row.subtotal)
            .bind(row.created_at)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE products SET stock = stock - ?, updated_at = ? \
                 WHERE id = ? AND business_id = ? AND track_stock = 1",
            )
            .bind(item.quantity)
            .bind(now)
            .bind(&item.product_id)
            .bind(&new.business_id)
            .execute(&mut *tx)
            .await?;

            rows.push(row);
        }

        tx.commit().await?;

        Ok((transaction, rows))
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let transaction =
            sqlx::query_as::<_, Transaction>(&format!("{} WHERE id = ?", SELECT_TRANSACTION))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(transaction)
    }

    pub async fn get_items(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let items = sqlx::query_as::<_, TransactionItem>(&format!(
            "{} WHERE transaction_id = ? ORDER BY created_at, id",
            SELECT_ITEM
        ))
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Every transaction recorded against a session, any status.
    pub async fn list_by_session(&self, session_id: &str) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "{} WHERE cash_session_id = ? ORDER BY created_at",
            SELECT_TRANSACTION
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Paid transactions of a session that carry a payment method.
    pub async fn list_paid_with_method(&self, session_id: &str) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "{} WHERE cash_session_id = ? AND status = 'paid' AND payment_method_id IS NOT NULL \
             ORDER BY created_at",
            SELECT_TRANSACTION
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Most recent transactions of a business.
    pub async fn list_by_business(&self, business_id: &str, limit: i64) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            "{} WHERE business_id = ? ORDER BY created_at DESC LIMIT ?",
            SELECT_TRANSACTION
        ))
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    pub async fn count_by_business(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE business_id = ?")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Status Updates
    // =========================================================================

    /// pending → paid. Returns `None` if the transaction was not pending.
    pub async fn mark_paid(
        &self,
        id: &str,
        method: &PaymentMethod,
        reference: Option<&str>,
        paid_at: DateTime<Utc>,
    ) -> DbResult<Option<Transaction>> {
        debug!(id = %id, code = %method.code, "Marking transaction paid");

        let result = sqlx::query(
            "UPDATE transactions SET status = 'paid', payment_method_id = ?, \
             payment_method_code = ?, payment_reference = COALESCE(?, payment_reference), \
             paid_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(&method.id)
        .bind(&method.code)
        .bind(reference)
        .bind(paid_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// pending|paid → cancelled, appending `note_line` to the notes.
    /// Returns `None` if the transaction was already cancelled.
    pub async fn cancel(
        &self,
        id: &str,
        note_line: &str,
        cancelled_at: DateTime<Utc>,
    ) -> DbResult<Option<Transaction>> {
        debug!(id = %id, "Cancelling transaction");

        let result = sqlx::query(
            "UPDATE transactions SET status = 'cancelled', cancelled_at = ?, \
             notes = CASE WHEN notes IS NULL OR notes = '' THEN ? ELSE notes || char(10) || ? END \
             WHERE id = ? AND status IN ('pending', 'paid')",
        )
        .bind(cancelled_at)
        .bind(note_line)
        .bind(note_line)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// Moves delivery from `from` to `to`. Returns `None` if the stored
    /// delivery status is no longer `from`.
    pub async fn update_delivery_status(
        &self,
        id: &str,
        from: DeliveryStatus,
        to: DeliveryStatus,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Transaction>> {
        let delivered_at = (to == DeliveryStatus::Delivered).then_some(now);

        let result = sqlx::query(
            "UPDATE transactions SET delivery_status = ?, delivered_at = COALESCE(?, delivered_at) \
             WHERE id = ? AND delivery_status = ?",
        )
        .bind(to)
        .bind(delivered_at)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    // =========================================================================
    // Report Aggregates
    // =========================================================================

    /// Paid totals per payment method code for `[from, to)` by `paid_at`.
    pub async fn paid_totals_by_code(
        &self,
        business_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<CodeTotal>> {
        let totals = sqlx::query_as::<_, CodeTotal>(
            "SELECT COALESCE(payment_method_code, 'other') AS code, \
             CAST(SUM(total) AS INTEGER) AS total, COUNT(*) AS count \
             FROM transactions \
             WHERE business_id = ? AND status = 'paid' AND paid_at >= ? AND paid_at < ? \
             GROUP BY COALESCE(payment_method_code, 'other') ORDER BY code",
        )
        .bind(business_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Transactions cancelled in `[from, to)`.
    pub async fn count_cancelled(
        &self,
        business_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions \
             WHERE business_id = ? AND status = 'cancelled' AND cancelled_at >= ? AND cancelled_at < ?",
        )
        .bind(business_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
