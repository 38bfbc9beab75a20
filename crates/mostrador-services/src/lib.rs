//! # mostrador-services: Business Operations for Mostrador
//!
//! Orchestrates the pure rules of `mostrador-core` over the repositories of
//! `mostrador-db`. Every operation takes a [`StaffContext`] (or, for the
//! storefront and webhook paths, a transaction id) and returns a
//! [`ServiceResult`].
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState                                                               │
//! │    ├── TenantService        config, navigation, payment methods         │
//! │    ├── SessionService       open / close / summarize drawers            │
//! │    ├── TransactionService   create / pay / cancel / delivery            │
//! │    ├── PaymentService       checkout links, provider webhook            │
//! │    ├── NotificationService  inbox + live feed (NotificationHub)         │
//! │    └── ReportService        sales by tender                             │
//! │                                                                         │
//! │  settings   MOSTRADOR_* environment                                     │
//! │  telemetry  tracing subscriber                                          │
//! │  error      ServiceError, ErrorKind, ApiResult                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod access;
pub mod error;
pub mod notifications;
pub mod payments;
pub mod reports;
pub mod sessions;
pub mod settings;
pub mod telemetry;
pub mod tenant;
pub mod transactions;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use tracing::info;

use mostrador_db::Database;

pub use access::StaffContext;
pub use error::{ApiResult, ErrorKind, ServiceError, ServiceResult};
pub use notifications::{NotificationHub, NotificationService, Subscription};
pub use payments::{CheckoutConfig, PaymentProvider, PaymentService, StripeCheckoutProvider};
pub use reports::{ReportService, SalesReport};
pub use sessions::{SessionClose, SessionService};
pub use settings::{Settings, SettingsError};
pub use tenant::TenantService;
pub use transactions::{CreateTransactionRequest, CreatedTransaction, TransactionService};

/// Shared application state handed to the transport layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub hub: NotificationHub,
    pub settings: Settings,
    pub tenants: TenantService,
    pub sessions: SessionService,
    pub transactions: TransactionService,
    pub payments: PaymentService,
    pub notifications: NotificationService,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let hub = NotificationHub::default();
        let provider = settings
            .stripe_provider()
            .map(|p| Arc::new(p) as Arc<dyn PaymentProvider>);

        info!(
            online_checkout = provider.is_some(),
            webhook = settings.webhook_secret.is_some(),
            "Services ready"
        );

        AppState {
            tenants: TenantService::new(db.clone()),
            sessions: SessionService::new(db.clone(), hub.clone()),
            transactions: TransactionService::new(db.clone(), hub.clone()),
            payments: PaymentService::new(db.clone(), hub.clone(), provider, settings.checkout_config()),
            notifications: NotificationService::new(db.clone(), hub.clone()),
            reports: ReportService::new(db.clone()),
            db,
            hub,
            settings,
        }
    }

    /// Opens the database from `settings` and builds the services.
    pub async fn connect(settings: Settings) -> ServiceResult<Self> {
        let db = Database::new(settings.db_config()).await?;
        info!(path = %settings.database_path.display(), "Database opened");
        Ok(AppState::new(db, settings))
    }
}
