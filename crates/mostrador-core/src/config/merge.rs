//! Typed tenant overrides.
//!
//! The override mirrors [`BusinessConfig`] with every leaf optional. A field
//! present in the JSON replaces the preset value; a missing field keeps it.
//! Unknown keys are ignored, a key with the wrong type rejects the whole
//! override.

use serde::Deserialize;
use thiserror::Error;

use super::{BusinessConfig, DefaultStatus};
use crate::error::ValidationError;

/// Why an override could not be applied.
#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("override is not valid JSON for the config schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("merged config is invalid: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigOverride {
    pub modules: Option<ModuleOverride>,
    pub features: Option<FeatureOverride>,
    pub payments: Option<PaymentOverride>,
    pub transactions: Option<TransactionOverride>,
    pub ui: Option<UiOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleOverride {
    pub pos: Option<bool>,
    pub inventory: Option<bool>,
    pub tables: Option<bool>,
    pub online_store: Option<bool>,
    pub appointments: Option<bool>,
    pub prescriptions: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureOverride {
    pub cash_register: Option<bool>,
    pub barcode_scanner: Option<bool>,
    pub pending_orders: Option<bool>,
    pub delivery_tracking: Option<bool>,
    pub calendar_booking: Option<bool>,
    pub kitchen_display: Option<bool>,
    pub tips: Option<bool>,
    pub variants: Option<bool>,
    pub expiry_tracking: Option<bool>,
    pub prescription_check: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentOverride {
    pub cash: Option<bool>,
    pub card_manual: Option<bool>,
    pub card_online: Option<bool>,
    pub transfer: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransactionOverride {
    pub require_cash_session: Option<bool>,
    pub allow_anonymous: Option<bool>,
    pub require_customer: Option<bool>,
    pub default_status: Option<DefaultStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiOverride {
    pub labels: Option<LabelOverride>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelOverride {
    pub products: Option<String>,
    pub transactions: Option<String>,
    pub new_transaction: Option<String>,
    pub transaction_number: Option<String>,
    pub customer: Option<String>,
    pub pending_orders: Option<String>,
}

fn fill<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl ConfigOverride {
    /// Applies the override on top of `base`, field by field.
    pub fn apply(self, base: &BusinessConfig) -> BusinessConfig {
        let mut config = base.clone();

        if let Some(m) = self.modules {
            let t = &mut config.modules;
            fill(&mut t.pos, m.pos);
            fill(&mut t.inventory, m.inventory);
            fill(&mut t.tables, m.tables);
            fill(&mut t.online_store, m.online_store);
            fill(&mut t.appointments, m.appointments);
            fill(&mut t.prescriptions, m.prescriptions);
        }

        if let Some(f) = self.features {
            let t = &mut config.features;
            fill(&mut t.cash_register, f.cash_register);
            fill(&mut t.barcode_scanner, f.barcode_scanner);
            fill(&mut t.pending_orders, f.pending_orders);
            fill(&mut t.delivery_tracking, f.delivery_tracking);
            fill(&mut t.calendar_booking, f.calendar_booking);
            fill(&mut t.kitchen_display, f.kitchen_display);
            fill(&mut t.tips, f.tips);
            fill(&mut t.variants, f.variants);
            fill(&mut t.expiry_tracking, f.expiry_tracking);
            fill(&mut t.prescription_check, f.prescription_check);
        }

        if let Some(p) = self.payments {
            let t = &mut config.payments;
            fill(&mut t.cash, p.cash);
            fill(&mut t.card_manual, p.card_manual);
            fill(&mut t.card_online, p.card_online);
            fill(&mut t.transfer, p.transfer);
        }

        if let Some(r) = self.transactions {
            let t = &mut config.transactions;
            fill(&mut t.require_cash_session, r.require_cash_session);
            fill(&mut t.allow_anonymous, r.allow_anonymous);
            fill(&mut t.require_customer, r.require_customer);
            fill(&mut t.default_status, r.default_status);
        }

        if let Some(labels) = self.ui.and_then(|ui| ui.labels) {
            let t = &mut config.ui.labels;
            fill(&mut t.products, labels.products);
            fill(&mut t.transactions, labels.transactions);
            fill(&mut t.new_transaction, labels.new_transaction);
            fill(&mut t.transaction_number, labels.transaction_number);
            fill(&mut t.customer, labels.customer);
            fill(&mut t.pending_orders, labels.pending_orders);
        }

        config
    }
}

/// Parses `raw`, merges it over `base` and validates the result.
pub(super) fn apply_json(base: &BusinessConfig, raw: &str) -> Result<BusinessConfig, OverrideError> {
    let Some(overrides) = serde_json::from_str::<Option<ConfigOverride>>(raw)? else {
        return Ok(base.clone());
    };

    let merged = overrides.apply(base);
    merged.validate()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BusinessPreset;

    #[test]
    fn test_empty_override_is_identity() {
        let base = BusinessPreset::Services.config();
        assert_eq!(ConfigOverride::default().apply(&base), base);
        assert_eq!(apply_json(&base, "{}").unwrap(), base);
    }

    #[test]
    fn test_partial_section_keeps_siblings() {
        let base = BusinessPreset::Restaurant.config();
        let merged = apply_json(&base, r#"{"transactions":{"defaultStatus":"paid"}}"#).unwrap();

        assert_eq!(merged.transactions.default_status, DefaultStatus::Paid);
        assert_eq!(
            merged.transactions.require_cash_session,
            base.transactions.require_cash_session
        );
    }

    #[test]
    fn test_errors_are_classified() {
        let base = BusinessPreset::Retail.config();
        assert!(matches!(
            apply_json(&base, r#"{"modules":{"tables":1}}"#),
            Err(OverrideError::Parse(_))
        ));
        assert!(matches!(
            apply_json(&base, r#"{"ui":{"labels":{"customer":" "}}}"#),
            Err(OverrideError::Invalid(_))
        ));
    }
}
