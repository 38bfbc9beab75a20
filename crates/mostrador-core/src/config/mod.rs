//! # Business Configuration
//!
//! Turns a business-type preset plus an optional tenant override into the
//! effective [`BusinessConfig`] of one tenant.
//!
//! ## Resolution Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  businesses.preset ("pharmacy")      businesses.custom_config (JSON)    │
//! │        │                                      │                         │
//! │        ▼                                      ▼                         │
//! │  BusinessPreset::from_tag            serde_json → ConfigOverride        │
//! │  (unknown tag → Retail)              (every field optional)             │
//! │        │                                      │                         │
//! │        ▼                                      │                         │
//! │  preset defaults ─────────► merge ◄───────────┘                         │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                      BusinessConfig::validate                           │
//! │                        │              │                                 │
//! │                       Ok             Err / parse error                  │
//! │                        │              │                                 │
//! │                        ▼              ▼                                 │
//! │                   merged config   warn! + pure preset                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution never fails. A broken override degrades to the preset the
//! tenant picked, never to a half-merged value.
//!
//! ## Usage
//! ```rust
//! use mostrador_core::config::resolve;
//!
//! let config = resolve("restaurant", Some(r#"{"payments":{"transfer":false}}"#));
//! assert!(config.has_module("tables"));
//! assert!(!config.can_pay_with("transfer"));
//!
//! // Malformed JSON falls back to the preset.
//! assert_eq!(resolve("restaurant", Some("{oops")), resolve("restaurant", None));
//! ```

mod merge;
mod navigation;
mod preset;

pub use merge::{
    ConfigOverride, FeatureOverride, LabelOverride, ModuleOverride, OverrideError,
    PaymentOverride, TransactionOverride, UiOverride,
};
pub use navigation::{build_navigation, NavItem};
pub use preset::BusinessPreset;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::ledger::TenderKind;
use crate::types::{PaymentMethod, TransactionStatus};
use crate::validation::validate_label;

// =============================================================================
// Configuration Schema
// =============================================================================

/// Effective configuration of one tenant. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BusinessConfig {
    pub preset: BusinessPreset,
    pub modules: ModuleFlags,
    pub features: FeatureFlags,
    pub payments: PaymentFlags,
    pub transactions: TransactionRules,
    pub ui: UiConfig,
}

/// Coarse feature areas. Gate navigation and route access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFlags {
    pub pos: bool,
    pub inventory: bool,
    pub tables: bool,
    pub online_store: bool,
    pub appointments: bool,
    pub prescriptions: bool,
}

/// Finer-grained switches, including the sector-specific ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    pub cash_register: bool,
    pub barcode_scanner: bool,
    pub pending_orders: bool,
    pub delivery_tracking: bool,
    pub calendar_booking: bool,
    pub kitchen_display: bool,
    pub tips: bool,
    pub variants: bool,
    pub expiry_tracking: bool,
    pub prescription_check: bool,
}

/// Payment capabilities. Payment method records are shown only when the
/// capability behind their code is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFlags {
    pub cash: bool,
    pub card_manual: bool,
    pub card_online: bool,
    pub transfer: bool,
}

/// Status a new transaction gets when the caller does not choose one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DefaultStatus {
    Pending,
    Paid,
}

impl From<DefaultStatus> for TransactionStatus {
    fn from(status: DefaultStatus) -> Self {
        match status {
            DefaultStatus::Pending => TransactionStatus::Pending,
            DefaultStatus::Paid => TransactionStatus::Paid,
        }
    }
}

/// Rules applied when a transaction is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRules {
    pub require_cash_session: bool,
    pub allow_anonymous: bool,
    pub require_customer: bool,
    pub default_status: DefaultStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub labels: UiLabels,
}

/// Display strings per domain noun ("Medicamentos" instead of "Productos").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UiLabels {
    pub products: String,
    pub transactions: String,
    pub new_transaction: String,
    pub transaction_number: String,
    pub customer: String,
    pub pending_orders: String,
}

// =============================================================================
// Queries
// =============================================================================

impl BusinessConfig {
    /// Module lookup by its camelCase name. Unknown names are disabled.
    pub fn has_module(&self, name: &str) -> bool {
        let m = &self.modules;
        match name {
            "pos" => m.pos,
            "inventory" => m.inventory,
            "tables" => m.tables,
            "onlineStore" => m.online_store,
            "appointments" => m.appointments,
            "prescriptions" => m.prescriptions,
            _ => false,
        }
    }

    /// Feature lookup by its camelCase name. Unknown names are disabled.
    pub fn has_feature(&self, name: &str) -> bool {
        let f = &self.features;
        match name {
            "cashRegister" => f.cash_register,
            "barcodeScanner" => f.barcode_scanner,
            "pendingOrders" => f.pending_orders,
            "deliveryTracking" => f.delivery_tracking,
            "calendarBooking" => f.calendar_booking,
            "kitchenDisplay" => f.kitchen_display,
            "tips" => f.tips,
            "variants" => f.variants,
            "expiryTracking" => f.expiry_tracking,
            "prescriptionCheck" => f.prescription_check,
            _ => false,
        }
    }

    /// Payment capability lookup (`cash`, `cardManual`, `cardOnline`,
    /// `transfer`). Unknown names are disabled.
    pub fn can_pay_with(&self, capability: &str) -> bool {
        let p = &self.payments;
        match capability {
            "cash" => p.cash,
            "cardManual" => p.card_manual,
            "cardOnline" => p.card_online,
            "transfer" => p.transfer,
            _ => false,
        }
    }

    /// Returns true if a payment method with this code may be used.
    ///
    /// Codes outside the known tender families (`other`, custom codes) are
    /// not gated by any capability.
    pub fn accepts_payment_code(&self, code: &str) -> bool {
        match TenderKind::from_code(code).capability() {
            Some(capability) => self.can_pay_with(capability),
            None => true,
        }
    }

    /// Filters a business's payment method records down to the active ones
    /// this configuration allows.
    pub fn visible_payment_methods(&self, methods: &[PaymentMethod]) -> Vec<PaymentMethod> {
        methods
            .iter()
            .filter(|m| m.is_active && self.accepts_payment_code(&m.code))
            .cloned()
            .collect()
    }

    /// Checks internal consistency.
    ///
    /// ## Rules
    /// - Every label is non-blank and at most 40 characters
    /// - `requireCustomer` excludes `allowAnonymous`
    /// - At least one payment capability is enabled
    /// - The tables module needs the pos module
    pub fn validate(&self) -> Result<(), ValidationError> {
        let labels = &self.ui.labels;
        for (field, value) in [
            ("ui.labels.products", &labels.products),
            ("ui.labels.transactions", &labels.transactions),
            ("ui.labels.newTransaction", &labels.new_transaction),
            ("ui.labels.transactionNumber", &labels.transaction_number),
            ("ui.labels.customer", &labels.customer),
            ("ui.labels.pendingOrders", &labels.pending_orders),
        ] {
            validate_label(field, value)?;
        }

        if self.transactions.require_customer && self.transactions.allow_anonymous {
            return Err(ValidationError::Conflict {
                field: "transactions.requireCustomer".to_string(),
                other: "transactions.allowAnonymous".to_string(),
            });
        }

        let p = &self.payments;
        if !(p.cash || p.card_manual || p.card_online || p.transfer) {
            return Err(ValidationError::Required {
                field: "payments".to_string(),
            });
        }

        if self.modules.tables && !self.modules.pos {
            return Err(ValidationError::Conflict {
                field: "modules.tables".to_string(),
                other: "modules.pos".to_string(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolves the effective configuration of a tenant.
///
/// `override_json` is the raw `custom_config` column. `None`, blank text and
/// JSON `null` all mean "no override".
pub fn resolve(preset_tag: &str, override_json: Option<&str>) -> BusinessConfig {
    let preset = BusinessPreset::from_tag(preset_tag).unwrap_or_else(|| {
        debug!(preset = %preset_tag, "Unknown preset tag, using retail");
        BusinessPreset::Retail
    });

    let base = preset.config();

    let Some(raw) = override_json.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return base;
    };

    match merge::apply_json(&base, raw) {
        Ok(config) => config,
        Err(err) => {
            warn!(
                preset = %preset,
                error = %err,
                "Ignoring tenant config override, using preset"
            );
            base
        }
    }
}

/// Strict counterpart of [`resolve`] for the write path: returns the merged
/// configuration or the reason the override is unusable.
pub fn check_override(preset_tag: &str, override_json: &str) -> Result<BusinessConfig, OverrideError> {
    let base = BusinessPreset::from_tag(preset_tag)
        .unwrap_or(BusinessPreset::Retail)
        .config();
    merge::apply_json(&base, override_json)
}

/// Like [`resolve`], for an override that is already parsed JSON.
pub fn resolve_value(preset_tag: &str, value: Option<&serde_json::Value>) -> BusinessConfig {
    match value {
        None | Some(serde_json::Value::Null) => resolve(preset_tag, None),
        Some(value) => resolve(preset_tag, Some(&value.to_string())),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn method(code: &str, is_active: bool) -> PaymentMethod {
        PaymentMethod {
            id: format!("pm-{}", code),
            business_id: "b-1".to_string(),
            code: code.to_string(),
            name: code.to_string(),
            is_active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_without_override_is_preset() {
        for preset in BusinessPreset::ALL {
            assert_eq!(resolve(preset.as_str(), None), preset.config());
            assert_eq!(resolve(preset.as_str(), Some("")), preset.config());
            assert_eq!(resolve(preset.as_str(), Some("null")), preset.config());
        }
    }

    #[test]
    fn test_unknown_tag_falls_back_to_retail() {
        assert_eq!(resolve("bakery", None), BusinessPreset::Retail.config());
    }

    #[test]
    fn test_every_preset_is_valid() {
        for preset in BusinessPreset::ALL {
            assert!(preset.config().validate().is_ok(), "{} preset invalid", preset);
        }
    }

    #[test]
    fn test_override_merges_field_by_field() {
        let config = resolve(
            "retail",
            Some(r#"{"modules":{"onlineStore":true},"ui":{"labels":{"products":"Artículos"}}}"#),
        );
        let preset = BusinessPreset::Retail.config();

        assert!(config.has_module("onlineStore"));
        assert_eq!(config.modules.pos, preset.modules.pos);
        assert_eq!(config.ui.labels.products, "Artículos");
        assert_eq!(config.ui.labels.customer, preset.ui.labels.customer);
        assert_eq!(config.payments, preset.payments);
    }

    #[test]
    fn test_malformed_override_falls_back() {
        let pure = resolve("pharmacy", None);
        for raw in [
            "{not json",
            "[1, 2, 3]",
            r#"{"modules":{"pos":"yes"}}"#,
            r#"{"transactions":{"defaultStatus":"refunded"}}"#,
        ] {
            assert_eq!(resolve("pharmacy", Some(raw)), pure, "override {}", raw);
        }
    }

    #[test]
    fn test_invalid_merge_falls_back() {
        let pure = resolve("retail", None);

        let no_payments =
            r#"{"payments":{"cash":false,"cardManual":false,"cardOnline":false,"transfer":false}}"#;
        assert_eq!(resolve("retail", Some(no_payments)), pure);

        let conflict = r#"{"transactions":{"requireCustomer":true,"allowAnonymous":true}}"#;
        assert_eq!(resolve("retail", Some(conflict)), pure);

        let long_label = format!(r#"{{"ui":{{"labels":{{"products":"{}"}}}}}}"#, "x".repeat(41));
        assert_eq!(resolve("retail", Some(&long_label)), pure);

        assert_eq!(resolve("restaurant", Some(r#"{"modules":{"pos":false}}"#)), resolve("restaurant", None));
    }

    #[test]
    fn test_check_override_reports_reason() {
        let err = check_override("restaurant", r#"{"modules":{"pos":false}}"#).unwrap_err();
        assert!(matches!(err, OverrideError::Invalid(ValidationError::Conflict { .. })));

        assert!(matches!(check_override("retail", "{oops"), Err(OverrideError::Parse(_))));

        let merged = check_override("retail", r#"{"features":{"tips":true}}"#).unwrap();
        assert!(merged.has_feature("tips"));
    }

    #[test]
    fn test_unknown_override_keys_are_ignored() {
        let config = resolve("retail", Some(r#"{"theme":"dark","features":{"tips":true}}"#));
        assert!(config.has_feature("tips"));
    }

    #[test]
    fn test_lookups_default_false() {
        let config = resolve("hybrid", None);
        assert!(!config.has_module("warehouse"));
        assert!(!config.has_feature("loyalty"));
        assert!(!config.can_pay_with("crypto"));
    }

    #[test]
    fn test_resolve_value() {
        let value = serde_json::json!({ "payments": { "transfer": false } });
        let config = resolve_value("retail", Some(&value));
        assert!(!config.can_pay_with("transfer"));
        assert_eq!(resolve_value("retail", Some(&serde_json::Value::Null)), resolve("retail", None));
    }

    #[test]
    fn test_visible_payment_methods() {
        let config = resolve(
            "retail",
            Some(r#"{"payments":{"cash":true,"cardManual":false,"cardOnline":false,"transfer":true}}"#),
        );
        let methods = vec![
            method("cash", true),
            method("card_manual", true),
            method("stripe_checkout", true),
            method("transfer", false),
            method("other", true),
        ];

        let codes: Vec<String> = config
            .visible_payment_methods(&methods)
            .into_iter()
            .map(|m| m.code)
            .collect();
        assert_eq!(codes, vec!["cash", "other"]);
    }

    #[test]
    fn test_config_serializes_camel_case() {
        let json = serde_json::to_value(resolve("restaurant", None)).unwrap();
        assert_eq!(json["preset"], "restaurant");
        assert_eq!(json["modules"]["onlineStore"], false);
        assert_eq!(json["transactions"]["requireCashSession"], true);
        assert!(json["ui"]["labels"]["newTransaction"].is_string());
    }
}
