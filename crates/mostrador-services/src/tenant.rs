//! Tenant configuration service.
//!
//! Resolves the effective [`BusinessConfig`] of a business from its stored
//! preset tag and override, and answers the UI-facing questions built on
//! it (navigation, payment methods to offer).

use tracing::info;

use mostrador_core::config::{self, build_navigation, NavItem};
use mostrador_core::{Business, BusinessConfig, PaymentMethod, ValidationError};
use mostrador_db::Database;

use crate::access::{ensure_writable, StaffContext};
use crate::error::{ServiceError, ServiceResult};

/// Effective configuration of a stored business.
pub fn config_for(business: &Business) -> BusinessConfig {
    config::resolve(&business.preset, business.custom_config.as_deref())
}

#[derive(Debug, Clone)]
pub struct TenantService {
    db: Database,
}

impl TenantService {
    pub fn new(db: Database) -> Self {
        TenantService { db }
    }

    pub async fn business(&self, business_id: &str) -> ServiceResult<Business> {
        self.db
            .businesses()
            .get_by_id(business_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Business", business_id))
    }

    /// Loads a business that may record new activity.
    pub async fn writable_business(&self, business_id: &str) -> ServiceResult<Business> {
        let business = self.business(business_id).await?;
        ensure_writable(&business)?;
        Ok(business)
    }

    pub async fn config(&self, ctx: &StaffContext) -> ServiceResult<BusinessConfig> {
        let business = self.business(&ctx.business_id).await?;
        Ok(config_for(&business))
    }

    /// Navigation entries for the caller's role.
    pub async fn navigation(&self, ctx: &StaffContext) -> ServiceResult<Vec<NavItem>> {
        let config = self.config(ctx).await?;
        Ok(build_navigation(&config, ctx.is_admin()))
    }

    /// Active payment methods the configuration allows, for the checkout screen.
    pub async fn payment_methods(&self, ctx: &StaffContext) -> ServiceResult<Vec<PaymentMethod>> {
        let config = self.config(ctx).await?;
        let methods = self
            .db
            .payment_methods()
            .list_by_business(&ctx.business_id)
            .await?;
        Ok(config.visible_payment_methods(&methods))
    }

    /// Replaces the tenant override (admin only).
    ///
    /// Unlike resolution, this rejects an override that would be ignored,
    /// so a bad edit is reported instead of silently falling back.
    pub async fn update_custom_config(
        &self,
        ctx: &StaffContext,
        raw: Option<&str>,
    ) -> ServiceResult<BusinessConfig> {
        ctx.ensure_admin()?;
        let business = self.writable_business(&ctx.business_id).await?;

        let raw = raw.map(str::trim).filter(|raw| !raw.is_empty());
        let resolved = match raw {
            Some(raw) => config::check_override(&business.preset, raw).map_err(|err| {
                ServiceError::from(ValidationError::InvalidFormat {
                    field: "customConfig".to_string(),
                    reason: err.to_string(),
                })
            })?,
            None => config::resolve(&business.preset, None),
        };

        self.db
            .businesses()
            .update_custom_config(&business.id, raw)
            .await?;

        info!(
            business_id = %business.id,
            staff_id = %ctx.staff_id,
            cleared = raw.is_none(),
            "Custom config updated"
        );

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::fixture;

    #[tokio::test]
    async fn test_navigation_by_role() {
        let fx = fixture("restaurant").await;
        let tenants = TenantService::new(fx.db.clone());

        let owner_nav = tenants.navigation(&fx.owner).await.unwrap();
        let cashier_nav = tenants.navigation(&fx.cashier).await.unwrap();

        assert_eq!(owner_nav.first().map(|n| n.id.as_str()), Some("dashboard"));
        assert!(owner_nav.iter().any(|n| n.id == "tables"));
        assert!(owner_nav.iter().any(|n| n.id == "users"));
        assert!(!cashier_nav.iter().any(|n| n.id == "users"));
        assert_eq!(owner_nav.len(), cashier_nav.len() + 1);
    }

    #[tokio::test]
    async fn test_payment_methods_follow_config() {
        let fx = fixture("retail").await;
        let tenants = TenantService::new(fx.db.clone());

        // Retail has no online card capability.
        let codes: Vec<String> = tenants
            .payment_methods(&fx.cashier)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.code)
            .collect();
        assert!(codes.contains(&"cash".to_string()));
        assert!(codes.contains(&"card".to_string()));
        assert!(!codes.contains(&"stripe_checkout".to_string()));
    }

    #[tokio::test]
    async fn test_update_custom_config() {
        let fx = fixture("retail").await;
        let tenants = TenantService::new(fx.db.clone());

        let err = tenants
            .update_custom_config(&fx.cashier, Some(r#"{"features":{"tips":true}}"#))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let err = tenants
            .update_custom_config(&fx.owner, Some(r#"{"modules":{"tables":true,"pos":false}}"#))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let config = tenants
            .update_custom_config(&fx.owner, Some(r#"{"features":{"tips":true}}"#))
            .await
            .unwrap();
        assert!(config.has_feature("tips"));
        assert_eq!(tenants.config(&fx.cashier).await.unwrap(), config);

        let cleared = tenants.update_custom_config(&fx.owner, None).await.unwrap();
        assert!(!cleared.has_feature("tips"));
    }
}
