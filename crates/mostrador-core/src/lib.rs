//! # mostrador-core: Pure Business Logic for Mostrador
//!
//! This crate is the **heart** of Mostrador. It contains the business
//! configuration resolver and the ledger arithmetic as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mostrador Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              mostrador-services (orchestration)                 │   │
//! │  │   open_session, create_transaction, close_session, webhooks     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mostrador-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  config   │  │   money   │  │   cart    │  │  ledger   │  │   │
//! │  │   │  presets  │  │   Money   │  │   Cart    │  │ summaries │  │   │
//! │  │   │  merge    │  │           │  │ CartItem  │  │ reconcile │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 mostrador-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, repositories               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Business, CashSession, Transaction, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`config`] - Business-type presets, tenant overrides, navigation
//! - [`cart`] - Client-side cart and transaction totals
//! - [`ledger`] - Tender buckets, session summaries, reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use mostrador_core::config::resolve;
//!
//! // Unknown overrides never break resolution.
//! let config = resolve("restaurant", None);
//! assert!(config.has_module("tables"));
//! assert!(config.transactions.require_cash_session);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod config;
pub mod error;
pub mod ledger;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, TransactionTotals};
pub use config::{BusinessConfig, BusinessPreset, NavItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{Reconciliation, SessionSummary, TenderKind};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest amount accepted for a price, discount or counted drawer, in cents.
///
/// A full cart at this price still fits comfortably in an `i64`.
pub const MAX_MONEY_CENTS: i64 = 1_000_000_000_000;

/// Maximum length of a free-text note stored on sessions and transactions.
pub const MAX_NOTES_LENGTH: usize = 1000;
