//! # Error Types
//!
//! Domain-specific error types for mostrador-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mostrador-core errors (this file)                                     │
//! │  ├── CoreError        - Business-rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  mostrador-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  mostrador-services errors                                             │
//! │  └── ServiceError     - What callers see (kind + short message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError ← DbError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration resolution has no error type on purpose: it always
//! degrades to a preset.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business-rule errors.
///
/// These are rejected before any write (or after a read-only lookup) and
/// leave no partial state behind.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cash session is already open for the business.
    ///
    /// ## When This Occurs
    /// - `open_session` finds an open session during the advisory lookup
    /// - The partial unique index rejects a concurrent second open
    #[error("A cash session is already open for business {business_id}")]
    SessionAlreadyOpen { business_id: String },

    /// The referenced session is not open (closed, or never existed).
    #[error("Cash session {session_id} is not open")]
    SessionNotOpen { session_id: String },

    /// The tenant configuration requires an open cash session for sales.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier taps "Charge"
    ///      │
    ///      ▼
    /// config.transactions.require_cash_session == true
    /// source != online_store, session_id == None
    ///      │
    ///      ▼
    /// CashSessionRequired → "Open the cash register before selling"
    /// ```
    #[error("An open cash session is required to record sales")]
    CashSessionRequired,

    /// The tenant configuration requires a customer on every transaction.
    #[error("A customer is required for this transaction")]
    CustomerRequired,

    /// A paid transaction needs a payment method.
    #[error("A payment method is required to mark a transaction as paid")]
    PaymentMethodRequired,

    /// The payment method is not enabled for this business.
    #[error("Payment method '{code}' is not enabled for this business")]
    PaymentMethodDisabled { code: String },

    /// Cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product is not a line in the cart.
    #[error("Product {0} is not in the cart")]
    ProductNotInCart(String),

    /// Insufficient stock to complete the sale.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A status change the state machine does not allow.
    ///
    /// ## When This Occurs
    /// - Paying a cancelled transaction
    /// - Cancelling an already cancelled transaction
    /// - Moving a delivered order back to preparing
    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidTransition error from displayable states.
    pub fn invalid_transition(
        entity: &'static str,
        id: impl Into<String>,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        CoreError::InvalidTransition {
            entity,
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Reported verbatim to the caller; nothing is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two settings contradict each other.
    #[error("{field} conflicts with {other}")]
    Conflict { field: String, other: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
