//! Caller identity and tenant gating.

use serde::{Deserialize, Serialize};
use tracing::warn;

use mostrador_core::{Business, Staff, StaffRole};
use mostrador_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Who is calling, as established by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffContext {
    pub staff_id: String,
    pub business_id: String,
    pub role: StaffRole,
}

impl StaffContext {
    pub fn new(staff_id: impl Into<String>, business_id: impl Into<String>, role: StaffRole) -> Self {
        StaffContext {
            staff_id: staff_id.into(),
            business_id: business_id.into(),
            role,
        }
    }

    pub fn from_staff(staff: &Staff) -> Self {
        StaffContext::new(&staff.id, &staff.business_id, staff.role)
    }

    /// Loads an active staff member.
    pub async fn load(db: &Database, staff_id: &str) -> ServiceResult<Self> {
        let staff = db
            .staff()
            .get_by_id(staff_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Staff", staff_id))?;

        if !staff.is_active {
            warn!(staff_id = %staff_id, "Inactive staff member rejected");
            return Err(ServiceError::forbidden("staff account is disabled"));
        }

        Ok(StaffContext::from_staff(&staff))
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Rejects access to another tenant's rows.
    pub fn ensure_business(&self, business_id: &str) -> ServiceResult<()> {
        if self.business_id != business_id {
            warn!(
                staff_id = %self.staff_id,
                own = %self.business_id,
                requested = %business_id,
                "Cross-tenant access rejected"
            );
            return Err(ServiceError::forbidden("resource belongs to another business"));
        }
        Ok(())
    }

    pub fn ensure_admin(&self) -> ServiceResult<()> {
        if !self.is_admin() {
            return Err(ServiceError::forbidden("owner or admin role required"));
        }
        Ok(())
    }
}

/// Rejects writes for a business whose subscription lapsed.
pub fn ensure_writable(business: &Business) -> ServiceResult<()> {
    if !business.subscription_status.allows_writes() {
        return Err(ServiceError::SubscriptionInactive {
            business_id: business.id.clone(),
        });
    }
    Ok(())
}
