//! Built-in configuration bundles, one per business type.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use super::{
    BusinessConfig, DefaultStatus, FeatureFlags, ModuleFlags, PaymentFlags, TransactionRules,
    UiConfig, UiLabels,
};

/// Business-type tag stored on the business row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BusinessPreset {
    Retail,
    Restaurant,
    Services,
    Pharmacy,
    Fashion,
    Delivery,
    Online,
    Hybrid,
}

impl BusinessPreset {
    pub const ALL: [BusinessPreset; 8] = [
        BusinessPreset::Retail,
        BusinessPreset::Restaurant,
        BusinessPreset::Services,
        BusinessPreset::Pharmacy,
        BusinessPreset::Fashion,
        BusinessPreset::Delivery,
        BusinessPreset::Online,
        BusinessPreset::Hybrid,
    ];

    /// Parses a stored tag. Matching ignores case and surrounding spaces.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str().eq_ignore_ascii_case(tag))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessPreset::Retail => "retail",
            BusinessPreset::Restaurant => "restaurant",
            BusinessPreset::Services => "services",
            BusinessPreset::Pharmacy => "pharmacy",
            BusinessPreset::Fashion => "fashion",
            BusinessPreset::Delivery => "delivery",
            BusinessPreset::Online => "online",
            BusinessPreset::Hybrid => "hybrid",
        }
    }

    /// The full default configuration for this business type.
    pub fn config(&self) -> BusinessConfig {
        let preset = *self;
        match preset {
            BusinessPreset::Retail => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    pos: true,
                    inventory: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    cash_register: true,
                    barcode_scanner: true,
                    ..Default::default()
                },
                payments: counter_payments(),
                transactions: walk_in_rules(),
                ui: labels("Productos", "Ventas", "Nueva venta", "N° de venta", "Cliente", "Pedidos pendientes"),
            },

            BusinessPreset::Restaurant => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    pos: true,
                    inventory: true,
                    tables: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    cash_register: true,
                    pending_orders: true,
                    kitchen_display: true,
                    tips: true,
                    ..Default::default()
                },
                payments: counter_payments(),
                transactions: TransactionRules {
                    default_status: DefaultStatus::Pending,
                    ..walk_in_rules()
                },
                ui: labels("Menú", "Órdenes", "Nueva orden", "N° de orden", "Cliente", "Comandas"),
            },

            BusinessPreset::Services => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    pos: true,
                    appointments: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    cash_register: true,
                    calendar_booking: true,
                    tips: true,
                    ..Default::default()
                },
                payments: counter_payments(),
                transactions: TransactionRules {
                    require_cash_session: true,
                    allow_anonymous: false,
                    require_customer: true,
                    default_status: DefaultStatus::Paid,
                },
                ui: labels("Servicios", "Cobros", "Nuevo cobro", "N° de cobro", "Cliente", "Citas pendientes"),
            },

            BusinessPreset::Pharmacy => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    pos: true,
                    inventory: true,
                    prescriptions: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    cash_register: true,
                    barcode_scanner: true,
                    expiry_tracking: true,
                    prescription_check: true,
                    ..Default::default()
                },
                payments: counter_payments(),
                transactions: walk_in_rules(),
                ui: labels("Medicamentos", "Ventas", "Nueva venta", "N° de venta", "Paciente", "Recetas pendientes"),
            },

            BusinessPreset::Fashion => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    pos: true,
                    inventory: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    cash_register: true,
                    barcode_scanner: true,
                    variants: true,
                    ..Default::default()
                },
                payments: counter_payments(),
                transactions: walk_in_rules(),
                ui: labels("Prendas", "Ventas", "Nueva venta", "N° de venta", "Cliente", "Apartados"),
            },

            BusinessPreset::Delivery => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    pos: true,
                    inventory: true,
                    online_store: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    cash_register: true,
                    pending_orders: true,
                    delivery_tracking: true,
                    ..Default::default()
                },
                payments: PaymentFlags {
                    card_online: true,
                    ..counter_payments()
                },
                transactions: TransactionRules {
                    require_cash_session: true,
                    allow_anonymous: false,
                    require_customer: true,
                    default_status: DefaultStatus::Pending,
                },
                ui: labels("Productos", "Pedidos", "Nuevo pedido", "N° de pedido", "Cliente", "Por entregar"),
            },

            BusinessPreset::Online => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    inventory: true,
                    online_store: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    pending_orders: true,
                    delivery_tracking: true,
                    ..Default::default()
                },
                payments: PaymentFlags {
                    card_online: true,
                    transfer: true,
                    ..Default::default()
                },
                transactions: TransactionRules {
                    require_cash_session: false,
                    allow_anonymous: false,
                    require_customer: true,
                    default_status: DefaultStatus::Pending,
                },
                ui: labels("Productos", "Pedidos", "Nuevo pedido", "N° de pedido", "Cliente", "Pedidos pendientes"),
            },

            BusinessPreset::Hybrid => BusinessConfig {
                preset,
                modules: ModuleFlags {
                    pos: true,
                    inventory: true,
                    online_store: true,
                    ..Default::default()
                },
                features: FeatureFlags {
                    cash_register: true,
                    barcode_scanner: true,
                    pending_orders: true,
                    delivery_tracking: true,
                    ..Default::default()
                },
                payments: PaymentFlags {
                    card_online: true,
                    ..counter_payments()
                },
                transactions: walk_in_rules(),
                ui: labels("Productos", "Ventas", "Nueva venta", "N° de venta", "Cliente", "Pedidos en línea"),
            },
        }
    }
}

impl fmt::Display for BusinessPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Shared Building Blocks
// =============================================================================

/// Cash, card terminal and bank transfer at the counter.
fn counter_payments() -> PaymentFlags {
    PaymentFlags {
        cash: true,
        card_manual: true,
        card_online: false,
        transfer: true,
    }
}

/// Drawer required, walk-in customers allowed, paid on the spot.
fn walk_in_rules() -> TransactionRules {
    TransactionRules {
        require_cash_session: true,
        allow_anonymous: true,
        require_customer: false,
        default_status: DefaultStatus::Paid,
    }
}

fn labels(
    products: &str,
    transactions: &str,
    new_transaction: &str,
    transaction_number: &str,
    customer: &str,
    pending_orders: &str,
) -> UiConfig {
    UiConfig {
        labels: UiLabels {
            products: products.to_string(),
            transactions: transactions.to_string(),
            new_transaction: new_transaction.to_string(),
            transaction_number: transaction_number.to_string(),
            customer: customer.to_string(),
            pending_orders: pending_orders.to_string(),
        },
    }
}
