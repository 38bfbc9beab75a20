//! # mostrador-db: Database Layer for Mostrador
//!
//! SQLite storage for tenants, the cash drawer and the transaction ledger,
//! accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mostrador-services (SessionService, TransactionService, ...)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 mostrador-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐  ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Repositories   │  │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                  │  │  (embedded)  │  │   │
//! │  │   │               │    │ CashSessionRepo  │  │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TransactionRepo  │  │ 001_initial  │  │   │
//! │  │   │               │    │ BusinessRepo ... │  │              │  │   │
//! │  │   └───────────────┘    └──────────────────┘  └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (MOSTRADOR_DATABASE_PATH)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table family
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mostrador_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("mostrador.db")).await?;
//! let open = db.cash_sessions().find_open(&business_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    BusinessRepository, CashSessionRepository, CodeTotal, NewBusiness, NewNotification,
    NewTransaction, NotificationRepository, PaymentMethodRepository, ProductRepository,
    StaffRepository, TransactionRepository,
};
