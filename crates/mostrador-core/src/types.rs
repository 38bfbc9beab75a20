//! # Domain Types
//!
//! Core domain types used throughout Mostrador.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Business     │   │   CashSession   │   │   Transaction   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  business_id    │◄──│  cash_session_id│       │
//! │  │  preset (tag)   │   │  opening_cash   │   │  status         │       │
//! │  │  custom_config  │   │  status         │   │  delivery_status│       │
//! │  └─────────────────┘   │  expected_cash  │   │  total          │       │
//! │                        └─────────────────┘   └────────┬────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐            │                │
//! │  │  PaymentMethod  │   │     Product     │   ┌────────▼────────┐       │
//! │  │  code: cash,    │   │  price, stock   │   │ TransactionItem │       │
//! │  │  card, transfer │   └─────────────────┘   │ (snapshot)      │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All money columns are INTEGER cents; all ids are UUID v4 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tenancy
// =============================================================================

/// Billing state of a tenant. Writes are refused unless the subscription is
/// trialing or active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Trialing,
    Active,
    PastDue,
    Cancelled,
}

impl SubscriptionStatus {
    /// Returns true if the tenant may record new activity.
    pub fn allows_writes(&self) -> bool {
        matches!(self, SubscriptionStatus::Trialing | SubscriptionStatus::Active)
    }
}

/// A tenant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    /// Business-type tag; unrecognized tags resolve to the retail preset.
    pub preset: String,
    /// Tenant override as raw JSON text, merged over the preset on demand.
    pub custom_config: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub online_store_enabled: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Staff role within a business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Owner,
    Admin,
    Cashier,
}

impl StaffRole {
    /// Owners and admins see the users entry and may manage staff.
    pub fn is_admin(&self) -> bool {
        matches!(self, StaffRole::Owner | StaffRole::Admin)
    }
}

/// A staff account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub role: StaffRole,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub price: Money,
    /// Whether sales decrement and are limited by `stock`.
    pub track_stock: bool,
    pub stock: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if `quantity` units can be sold.
    pub fn can_sell(&self, quantity: i64) -> bool {
        !self.track_stock || self.stock >= quantity
    }
}

/// A tender type configured by a business.
///
/// `code` is loosely typed in the store (`cash`, `card`, `card_manual`,
/// `transfer`, `stripe_checkout`, ...); see [`crate::ledger::TenderKind`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    pub business_id: String,
    pub code: String,
    pub name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cash Session
// =============================================================================

/// Drawer session state. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// One cash-drawer shift.
///
/// ## Lifecycle
/// ```text
/// {none} ──open_session──► Open ──close_session──► Closed (terminal)
/// ```
/// Closing fields stay `None` while the session is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashSession {
    pub id: String,
    pub business_id: String,
    pub opening_cash: Money,
    pub status: SessionStatus,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    pub opened_by: String,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub closed_by: Option<String>,
    pub closing_cash: Option<Money>,
    pub expected_cash: Option<Money>,
    pub cash_difference: Option<Money>,
    pub notes: Option<String>,
}

impl CashSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Payment state of a transaction.
///
/// ## Transitions
/// ```text
/// Pending ──pay──► Paid
///    │               │
///    └──cancel──► Cancelled ◄──cancel──┘   (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl TransactionStatus {
    /// Returns true if the state machine allows `self → next`.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!((self, next), (Pending, Paid) | (Pending, Cancelled) | (Paid, Cancelled))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfilment axis, independent of payment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    InRoute,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    fn rank(&self) -> u8 {
        match self {
            DeliveryStatus::Pending => 0,
            DeliveryStatus::Preparing => 1,
            DeliveryStatus::Ready => 2,
            DeliveryStatus::InRoute => 3,
            DeliveryStatus::Delivered => 4,
            DeliveryStatus::Cancelled => 5,
        }
    }

    /// Delivery moves forward only; delivered and cancelled are terminal.
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        match (self, next) {
            (DeliveryStatus::Delivered | DeliveryStatus::Cancelled, _) => false,
            (_, DeliveryStatus::Cancelled) => true,
            (current, next) => next.rank() > current.rank(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Preparing => "preparing",
            DeliveryStatus::Ready => "ready",
            DeliveryStatus::InRoute => "in_route",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a transaction was taken. Online-store orders never need a drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSource {
    #[default]
    Pos,
    OnlineStore,
}

/// One sale or order.
///
/// `total` is the sum of the line subtotals and is stored as computed; it is
/// not re-derived from `subtotal - discount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub business_id: String,
    /// Human-facing number, sequential per business (`T-000042`).
    pub transaction_number: String,
    pub cash_session_id: Option<String>,
    pub source: TransactionSource,
    pub status: TransactionStatus,
    pub delivery_status: DeliveryStatus,
    pub payment_method_id: Option<String>,
    /// Code of the payment method at payment time (`cash`, `card`, ...).
    pub payment_method_code: Option<String>,
    pub subtotal: Money,
    pub discount: Money,
    pub tax: Money,
    pub total: Money,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub served_by: Option<String>,
    pub payment_reference: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

/// A line item, written together with its transaction and never edited.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// Discount per unit.
    pub discount: Money,
    /// `max(0, (unit_price - discount) × quantity)`.
    pub subtotal: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PaymentReceived,
    OnlineOrder,
    SessionClosed,
}

/// A row in the notification inbox of a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub business_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub read_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_transitions() {
        use TransactionStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Paid.can_transition_to(Cancelled));

        assert!(!Paid.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Paid));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn test_delivery_transitions() {
        use DeliveryStatus::*;
        assert!(Pending.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(InRoute));
        assert!(Ready.can_transition_to(Cancelled));

        assert!(!Ready.can_transition_to(Preparing));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_subscription_gate() {
        assert!(SubscriptionStatus::default().allows_writes());
        assert!(SubscriptionStatus::Active.allows_writes());
        assert!(!SubscriptionStatus::PastDue.allows_writes());
        assert!(!SubscriptionStatus::Cancelled.allows_writes());
    }

    #[test]
    fn test_product_can_sell() {
        let now = Utc::now();
        let mut product = Product {
            id: "p-1".to_string(),
            business_id: "b-1".to_string(),
            name: "Aspirin 500mg".to_string(),
            price: Money::from_units(100),
            track_stock: true,
            stock: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(product.can_sell(2));
        assert!(!product.can_sell(3));

        product.track_stock = false;
        assert!(product.can_sell(3));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&DeliveryStatus::InRoute).unwrap();
        assert_eq!(json, "\"in_route\"");
        let json = serde_json::to_string(&TransactionSource::OnlineStore).unwrap();
        assert_eq!(json, "\"online_store\"");
    }
}
