//! Creates a demo business in the configured database.
//!
//! ```text
//! MOSTRADOR_DATABASE_PATH=demo.db cargo run --bin mostrador-seed -- restaurant
//! ```

use anyhow::{bail, Context};
use tracing::info;

use mostrador_core::{BusinessPreset, Money, StaffRole};
use mostrador_db::{Database, NewBusiness};
use mostrador_services::telemetry::{init_tracing, DEFAULT_FILTER};
use mostrador_services::{Settings, StaffContext, TenantService};

const PAYMENT_METHODS: [(&str, &str); 4] = [
    ("cash", "Efectivo"),
    ("card", "Tarjeta"),
    ("transfer", "Transferencia"),
    ("stripe_checkout", "Pago en línea"),
];

const PRODUCTS: [(&str, i64, Option<i64>); 4] = [
    ("Café americano", 250, None),
    ("Medialuna", 120, Some(48)),
    ("Agua mineral", 180, Some(24)),
    ("Tostado", 450, None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing(DEFAULT_FILTER);

    let preset_tag = std::env::args().nth(1).unwrap_or_else(|| "retail".to_string());
    let Some(preset) = BusinessPreset::from_tag(&preset_tag) else {
        bail!("unknown business type: {}", preset_tag);
    };

    let settings = Settings::from_env().context("loading settings")?;
    let db = Database::new(settings.db_config())
        .await
        .context("opening database")?;

    let business = db
        .businesses()
        .insert(&NewBusiness::new(format!("Demo {}", preset), preset.as_str()))
        .await?;
    let owner = db.staff().insert(&business.id, "Dueño", StaffRole::Owner).await?;
    db.staff().insert(&business.id, "Cajero", StaffRole::Cashier).await?;

    for (code, name) in PAYMENT_METHODS {
        db.payment_methods().insert(&business.id, code, name).await?;
    }
    for (name, cents, stock) in PRODUCTS {
        db.products()
            .insert(&business.id, name, Money::from_cents(cents), stock)
            .await?;
    }

    let ctx = StaffContext::from_staff(&owner);
    let navigation = TenantService::new(db.clone())
        .navigation(&ctx)
        .await
        .context("resolving navigation")?;

    info!(
        business_id = %business.id,
        owner_id = %owner.id,
        preset = %preset,
        menu = navigation.len(),
        "Demo business created"
    );

    db.close().await;
    Ok(())
}
