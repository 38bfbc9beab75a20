//! Shared fixtures for service tests.

use mostrador_core::{Business, Money, PaymentMethod, Product, StaffRole};
use mostrador_db::{Database, DbConfig, NewBusiness};

use crate::access::StaffContext;
use crate::notifications::NotificationHub;

/// One business with an owner, a cashier and the usual tenders.
pub(crate) struct Fixture {
    pub db: Database,
    pub hub: NotificationHub,
    pub business: Business,
    pub owner: StaffContext,
    pub cashier: StaffContext,
    pub cash: PaymentMethod,
    pub card: PaymentMethod,
    #[allow(dead_code)]
    pub transfer: PaymentMethod,
    pub stripe: PaymentMethod,
}

pub(crate) async fn fixture(preset: &str) -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    fixture_in(&db, NotificationHub::default(), preset).await
}

/// Adds another business to an existing database.
pub(crate) async fn fixture_in(db: &Database, hub: NotificationHub, preset: &str) -> Fixture {
    let business = db
        .businesses()
        .insert(&NewBusiness::new("Almacén Don Pedro", preset))
        .await
        .unwrap();

    let owner = db
        .staff()
        .insert(&business.id, "Pedro", StaffRole::Owner)
        .await
        .unwrap();
    let cashier = db
        .staff()
        .insert(&business.id, "Ana", StaffRole::Cashier)
        .await
        .unwrap();

    let methods = db.payment_methods();
    let cash = methods.insert(&business.id, "cash", "Efectivo").await.unwrap();
    let card = methods.insert(&business.id, "card", "Tarjeta").await.unwrap();
    let transfer = methods
        .insert(&business.id, "transfer", "Transferencia")
        .await
        .unwrap();
    let stripe = methods
        .insert(&business.id, "stripe_checkout", "Pago en línea")
        .await
        .unwrap();

    Fixture {
        db: db.clone(),
        hub,
        business,
        owner: StaffContext::from_staff(&owner),
        cashier: StaffContext::from_staff(&cashier),
        cash,
        card,
        transfer,
        stripe,
    }
}

pub(crate) async fn product(fx: &Fixture, name: &str, price: Money, stock: Option<i64>) -> Product {
    fx.db
        .products()
        .insert(&fx.business.id, name, price, stock)
        .await
        .unwrap()
}
