//! # Transaction Service
//!
//! Creating, paying, cancelling and tracking sales.
//!
//! ## Create Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_transaction(ctx, request)                                       │
//! │                                                                         │
//! │  Checks (no writes yet)                                                 │
//! │    • business subscription allows writes                                │
//! │    • lines: 1..=100, quantity 1..=999, prices and discounts ≥ 0         │
//! │    • requireCashSession && source = pos && no session                   │
//! │        → CashSessionRequired                                            │
//! │    • session given → exists, same business, open                        │
//! │    • requireCustomer / !allowAnonymous without customer                 │
//! │        → CustomerRequired                                               │
//! │    • payment method → same business, active, enabled by config          │
//! │    • status paid without method → PaymentMethodRequired                 │
//! │    • stock-tracked products have enough stock                           │
//! │                                                                         │
//! │  Write (one db transaction)                                             │
//! │    number ─► header ─► items ─► stock decrements ─► COMMIT              │
//! │                                                                         │
//! │  After commit                                                           │
//! │    online order → best-effort notification                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use mostrador_core::validation::{validate_customer_name, validate_line_count, validate_notes};
use mostrador_core::{
    BusinessConfig, CartItem, CoreError, DeliveryStatus, NotificationKind, PaymentMethod,
    Transaction, TransactionItem, TransactionSource, TransactionStatus, TransactionTotals,
    ValidationError,
};
use mostrador_db::{Database, NewNotification, NewTransaction};

use crate::access::StaffContext;
use crate::error::{ServiceError, ServiceResult};
use crate::notifications::{record, NotificationHub};
use crate::tenant::{config_for, TenantService};

// =============================================================================
// Payloads
// =============================================================================

/// Input of [`TransactionService::create_transaction`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub cash_session_id: Option<String>,
    #[serde(default)]
    pub payment_method_id: Option<String>,
    /// `None` uses the configured default status.
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub source: TransactionSource,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateTransactionRequest {
    pub fn new(items: Vec<CartItem>) -> Self {
        CreateTransactionRequest {
            items,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTransaction {
    pub transaction_id: String,
    pub transaction_number: String,
    pub status: TransactionStatus,
    pub totals: TransactionTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct TransactionService {
    db: Database,
    tenants: TenantService,
    hub: NotificationHub,
}

impl TransactionService {
    pub fn new(db: Database, hub: NotificationHub) -> Self {
        TransactionService {
            tenants: TenantService::new(db.clone()),
            db,
            hub,
        }
    }

    pub async fn create_transaction(
        &self,
        ctx: &StaffContext,
        request: CreateTransactionRequest,
    ) -> ServiceResult<CreatedTransaction> {
        debug!(
            business_id = %ctx.business_id,
            lines = request.items.len(),
            source = ?request.source,
            "create_transaction"
        );

        let business = self.tenants.writable_business(&ctx.business_id).await?;
        let config = config_for(&business);

        validate_line_count(request.items.len())?;
        for item in &request.items {
            item.validate()?;
        }
        let customer_name = validate_customer_name(request.customer_name.as_deref())?;
        let notes = validate_notes(request.notes.as_deref())?;
        let customer_id = request
            .customer_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from);

        let status = request
            .status
            .unwrap_or_else(|| config.transactions.default_status.into());
        if status == TransactionStatus::Cancelled {
            return Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: "a transaction is created pending or paid".to_string(),
            }
            .into());
        }

        self.check_session(ctx, &config, request.source, request.cash_session_id.as_deref())
            .await?;

        let has_customer = customer_id.is_some() || customer_name.is_some();
        let rules = &config.transactions;
        if !has_customer && (rules.require_customer || !rules.allow_anonymous) {
            return Err(CoreError::CustomerRequired.into());
        }

        let method = match request.payment_method_id.as_deref() {
            Some(id) => Some(self.usable_method(ctx, &config, id).await?),
            None => None,
        };
        if status == TransactionStatus::Paid && method.is_none() {
            return Err(CoreError::PaymentMethodRequired.into());
        }

        self.check_stock(ctx, &request.items).await?;

        let new = NewTransaction {
            business_id: business.id.clone(),
            cash_session_id: request.cash_session_id,
            source: request.source,
            status,
            payment_method_id: method.as_ref().map(|m| m.id.clone()),
            payment_method_code: method.as_ref().map(|m| m.code.clone()),
            customer_id,
            customer_name,
            served_by: Some(ctx.staff_id.clone()),
            payment_reference: request.payment_reference,
            notes,
        };

        let (transaction, items) = self.db.transactions().create(&new, &request.items).await?;

        info!(
            transaction_id = %transaction.id,
            number = %transaction.transaction_number,
            business_id = %transaction.business_id,
            status = %transaction.status,
            items = items.len(),
            total = %transaction.total,
            "Transaction created"
        );

        if transaction.source == TransactionSource::OnlineStore {
            record(
                &self.db,
                &self.hub,
                NewNotification {
                    business_id: transaction.business_id.clone(),
                    kind: NotificationKind::OnlineOrder,
                    title: "Nueva orden en línea".to_string(),
                    body: format!("{} · {}", transaction.transaction_number, transaction.total),
                    transaction_id: Some(transaction.id.clone()),
                },
            )
            .await;
        }

        Ok(CreatedTransaction {
            transaction_id: transaction.id,
            transaction_number: transaction.transaction_number,
            status: transaction.status,
            totals: TransactionTotals {
                subtotal: transaction.subtotal,
                discount: transaction.discount,
                tax: transaction.tax,
                total: transaction.total,
            },
        })
    }

    /// pending → paid with the given payment method.
    pub async fn pay_transaction(
        &self,
        ctx: &StaffContext,
        transaction_id: &str,
        payment_method_id: &str,
        reference: Option<&str>,
    ) -> ServiceResult<Transaction> {
        let business = self.tenants.writable_business(&ctx.business_id).await?;
        let transaction = self.owned(ctx, transaction_id).await?;

        if !transaction.status.can_transition_to(TransactionStatus::Paid) {
            return Err(CoreError::invalid_transition(
                "Transaction",
                &transaction.id,
                transaction.status,
                TransactionStatus::Paid,
            )
            .into());
        }

        let method = self
            .usable_method(ctx, &config_for(&business), payment_method_id)
            .await?;
        self.settle(&transaction, &method, reference).await
    }

    /// pending|paid → cancelled. Stock and drawer totals are not reversed.
    pub async fn cancel_transaction(
        &self,
        ctx: &StaffContext,
        transaction_id: &str,
        reason: Option<&str>,
    ) -> ServiceResult<Transaction> {
        self.tenants.writable_business(&ctx.business_id).await?;
        let transaction = self.owned(ctx, transaction_id).await?;

        if !transaction.status.can_transition_to(TransactionStatus::Cancelled) {
            return Err(CoreError::invalid_transition(
                "Transaction",
                &transaction.id,
                transaction.status,
                TransactionStatus::Cancelled,
            )
            .into());
        }

        let note_line = match validate_notes(reason)? {
            Some(reason) => format!("Cancelled: {}", reason),
            None => "Cancelled".to_string(),
        };

        let cancelled = match self
            .db
            .transactions()
            .cancel(&transaction.id, &note_line, Utc::now())
            .await?
        {
            Some(cancelled) => cancelled,
            None => return Err(self.lost_race(&transaction.id, TransactionStatus::Cancelled).await),
        };

        info!(
            transaction_id = %cancelled.id,
            staff_id = %ctx.staff_id,
            previous = %transaction.status,
            "Transaction cancelled"
        );

        Ok(cancelled)
    }

    /// Moves the delivery axis forward (or to cancelled).
    pub async fn update_delivery_status(
        &self,
        ctx: &StaffContext,
        transaction_id: &str,
        status: DeliveryStatus,
    ) -> ServiceResult<Transaction> {
        self.tenants.writable_business(&ctx.business_id).await?;
        let transaction = self.owned(ctx, transaction_id).await?;
        let current = transaction.delivery_status;

        if !current.can_transition_to(status) {
            return Err(CoreError::invalid_transition("Delivery", &transaction.id, current, status).into());
        }

        let updated = self
            .db
            .transactions()
            .update_delivery_status(&transaction.id, current, status, Utc::now())
            .await?
            .ok_or_else(|| {
                // Someone else moved it between our read and write.
                ServiceError::from(CoreError::invalid_transition("Delivery", &transaction.id, current, status))
            })?;

        info!(transaction_id = %updated.id, from = %current, to = %status, "Delivery status updated");
        Ok(updated)
    }

    pub async fn get_transaction(&self, ctx: &StaffContext, transaction_id: &str) -> ServiceResult<TransactionDetail> {
        let transaction = self.owned(ctx, transaction_id).await?;
        let items = self.db.transactions().get_items(&transaction.id).await?;
        Ok(TransactionDetail { transaction, items })
    }

    pub async fn recent_transactions(&self, ctx: &StaffContext, limit: i64) -> ServiceResult<Vec<Transaction>> {
        Ok(self
            .db
            .transactions()
            .list_by_business(&ctx.business_id, limit.clamp(1, 200))
            .await?)
    }

    // =========================================================================
    // Shared with the payment webhook
    // =========================================================================

    /// Marks a pending transaction paid and emits the payment notification.
    pub(crate) async fn settle(
        &self,
        transaction: &Transaction,
        method: &PaymentMethod,
        reference: Option<&str>,
    ) -> ServiceResult<Transaction> {
        let paid = match self
            .db
            .transactions()
            .mark_paid(&transaction.id, method, reference, Utc::now())
            .await?
        {
            Some(paid) => paid,
            None => return Err(self.lost_race(&transaction.id, TransactionStatus::Paid).await),
        };

        info!(
            transaction_id = %paid.id,
            number = %paid.transaction_number,
            code = %method.code,
            total = %paid.total,
            "Transaction paid"
        );

        record(
            &self.db,
            &self.hub,
            NewNotification {
                business_id: paid.business_id.clone(),
                kind: NotificationKind::PaymentReceived,
                title: "Pago recibido".to_string(),
                body: format!("{} · {} · {}", paid.transaction_number, paid.total, method.name),
                transaction_id: Some(paid.id.clone()),
            },
        )
        .await;

        Ok(paid)
    }

    // =========================================================================
    // Checks
    // =========================================================================

    async fn check_session(
        &self,
        ctx: &StaffContext,
        config: &BusinessConfig,
        source: TransactionSource,
        session_id: Option<&str>,
    ) -> ServiceResult<()> {
        let Some(session_id) = session_id else {
            if config.transactions.require_cash_session && source != TransactionSource::OnlineStore {
                return Err(CoreError::CashSessionRequired.into());
            }
            return Ok(());
        };

        let session = self
            .db
            .cash_sessions()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotOpen {
                session_id: session_id.to_string(),
            })?;
        ctx.ensure_business(&session.business_id)?;

        if !session.is_open() {
            return Err(CoreError::SessionNotOpen {
                session_id: session.id,
            }
            .into());
        }
        Ok(())
    }

    async fn usable_method(
        &self,
        ctx: &StaffContext,
        config: &BusinessConfig,
        payment_method_id: &str,
    ) -> ServiceResult<PaymentMethod> {
        let method = self
            .db
            .payment_methods()
            .get_by_id(payment_method_id)
            .await?
            .filter(|m| m.business_id == ctx.business_id)
            .ok_or_else(|| ServiceError::not_found("PaymentMethod", payment_method_id))?;

        if !method.is_active || !config.accepts_payment_code(&method.code) {
            return Err(CoreError::PaymentMethodDisabled { code: method.code }.into());
        }
        Ok(method)
    }

    async fn check_stock(&self, ctx: &StaffContext, items: &[CartItem]) -> ServiceResult<()> {
        let mut requested: HashMap<&str, i64> = HashMap::new();
        for item in items {
            *requested.entry(item.product_id.as_str()).or_default() += item.quantity;
        }

        let products = self.db.products();
        for (product_id, quantity) in requested {
            let product = products
                .get_by_id(product_id)
                .await?
                .filter(|p| p.business_id == ctx.business_id && p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

            if !product.can_sell(quantity) {
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.stock,
                    requested: quantity,
                }
                .into());
            }
        }
        Ok(())
    }

    async fn owned(&self, ctx: &StaffContext, transaction_id: &str) -> ServiceResult<Transaction> {
        let transaction = self
            .db
            .transactions()
            .get_by_id(transaction_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction", transaction_id))?;
        ctx.ensure_business(&transaction.business_id)?;
        Ok(transaction)
    }

    /// Builds the error for a conditional update that matched no row.
    async fn lost_race(&self, transaction_id: &str, to: TransactionStatus) -> ServiceError {
        warn!(transaction_id = %transaction_id, to = %to, "Transaction changed before update");
        match self.db.transactions().get_by_id(transaction_id).await {
            Ok(Some(current)) => {
                CoreError::invalid_transition("Transaction", transaction_id, current.status, to).into()
            }
            Ok(None) => ServiceError::not_found("Transaction", transaction_id),
            Err(err) => err.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
