//! Navigation assembly.
//!
//! ## Order
//! ```text
//! dashboard
//! new-sale, cash-register        (module pos)
//! tables                         (module tables)
//! appointments                   (module appointments)
//! prescriptions                  (module prescriptions)
//! pending-orders                 (feature pendingOrders)
//! transactions, products         (always, labels from config)
//! inventory                      (module inventory)
//! online-store                   (module onlineStore)
//! users                          (admin only)
//! reports, settings              (always last)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::BusinessConfig;

/// One entry of the sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub id: String,
    pub label: String,
    pub href: String,
    pub admin_only: bool,
}

impl NavItem {
    fn new(id: &str, label: &str) -> Self {
        NavItem {
            id: id.to_string(),
            label: label.to_string(),
            href: format!("/{}", id),
            admin_only: false,
        }
    }

    fn admin(mut self) -> Self {
        self.admin_only = true;
        self
    }
}

/// Builds the ordered navigation for a user of this business.
pub fn build_navigation(config: &BusinessConfig, is_admin: bool) -> Vec<NavItem> {
    let labels = &config.ui.labels;
    let mut items = vec![NavItem::new("dashboard", "Inicio")];

    if config.has_module("pos") {
        items.push(NavItem::new("new-sale", &labels.new_transaction));
        items.push(NavItem::new("cash-register", "Caja"));
    }
    if config.has_module("tables") {
        items.push(NavItem::new("tables", "Mesas"));
    }
    if config.has_module("appointments") {
        items.push(NavItem::new("appointments", "Agenda"));
    }
    if config.has_module("prescriptions") {
        items.push(NavItem::new("prescriptions", "Recetas"));
    }
    if config.has_feature("pendingOrders") {
        items.push(NavItem::new("pending-orders", &labels.pending_orders));
    }

    items.push(NavItem::new("transactions", &labels.transactions));
    items.push(NavItem::new("products", &labels.products));

    if config.has_module("inventory") {
        items.push(NavItem::new("inventory", "Inventario"));
    }
    if config.has_module("onlineStore") {
        items.push(NavItem::new("online-store", "Tienda en línea"));
    }

    items.push(NavItem::new("users", "Usuarios").admin());
    items.push(NavItem::new("reports", "Reportes"));
    items.push(NavItem::new("settings", "Configuración"));

    items.retain(|item| is_admin || !item.admin_only);
    items
}
