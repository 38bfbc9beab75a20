//! # Repository Module
//!
//! One repository per table family. Each holds a clone of the pool and
//! exposes the statements the services need, nothing more.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BusinessRepository       tenants, preset + custom_config, billing     │
//! │  StaffRepository          staff accounts and roles                     │
//! │  ProductRepository        catalog, stock                               │
//! │  PaymentMethodRepository  tender types per business                    │
//! │  CashSessionRepository    open / close drawer (conditional updates)    │
//! │  TransactionRepository    sale + items + stock in one db transaction   │
//! │  NotificationRepository   inbox rows                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row mapping uses `sqlx::query_as::<_, T>` with the `FromRow` derives of
//! the core entity types.

pub mod business;
pub mod cash_session;
pub mod notification;
pub mod payment_method;
pub mod product;
pub mod staff;
pub mod transaction;

pub use business::{BusinessRepository, NewBusiness};
pub use cash_session::CashSessionRepository;
pub use notification::{NewNotification, NotificationRepository};
pub use payment_method::PaymentMethodRepository;
pub use product::ProductRepository;
pub use staff::StaffRepository;
pub use transaction::{CodeTotal, NewTransaction, TransactionRepository};

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared setup for repository tests.

    use mostrador_core::{Business, Money, PaymentMethod, Product};

    use super::NewBusiness;
    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn business(db: &Database, preset: &str) -> Business {
        db.businesses()
            .insert(&NewBusiness::new("Farmacia Central", preset))
            .await
            .unwrap()
    }

    pub async fn payment_method(db: &Database, business_id: &str, code: &str) -> PaymentMethod {
        db.payment_methods()
            .insert(business_id, code, code)
            .await
            .unwrap()
    }

    pub async fn product(
        db: &Database,
        business_id: &str,
        name: &str,
        price: Money,
        stock: Option<i64>,
    ) -> Product {
        db.products()
            .insert(business_id, name, price, stock)
            .await
            .unwrap()
    }
}
