//! # Service Errors
//!
//! One error type for every service operation.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ──► CoreError ──┐                                      │
//! │                                  ├──► ServiceError ──► ApiResult<T>     │
//! │  DbError ────────────────────────┘        │            { success,      │
//! │   (detail logged with error!,             │              data | error } │
//! │    replaced by a generic message)         ▼                             │
//! │                                       ErrorKind                         │
//! │                                       (Validation, BusinessRule,        │
//! │                                        Conflict, NotFound, Forbidden,   │
//! │                                        PaymentProvider, Internal)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::error;
use ts_rs::TS;

use mostrador_core::{CoreError, ValidationError};
use mostrador_db::DbError;

/// Service operation errors.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Business rule or input validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Role or tenant mismatch.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Writes on a business whose subscription is past due or cancelled.
    #[error("The subscription of business {business_id} is not active")]
    SubscriptionInactive { business_id: String },

    /// Checkout link creation failed. The detail stays in the logs.
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    /// A notification stream is already open for this business.
    #[error("Notifications for business {business_id} are already subscribed")]
    AlreadySubscribed { business_id: String },

    #[error("Database error: {0}")]
    Database(DbError),
}

/// Coarse classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    BusinessRule,
    Conflict,
    NotFound,
    Forbidden,
    PaymentProvider,
    Internal,
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(err) => match err {
                CoreError::Validation(_) => ErrorKind::Validation,
                CoreError::SessionAlreadyOpen { .. } | CoreError::InvalidTransition { .. } => {
                    ErrorKind::Conflict
                }
                CoreError::ProductNotFound(_) => ErrorKind::NotFound,
                _ => ErrorKind::BusinessRule,
            },
            ServiceError::NotFound { .. } => ErrorKind::NotFound,
            ServiceError::Forbidden(_) | ServiceError::SubscriptionInactive { .. } => {
                ErrorKind::Forbidden
            }
            ServiceError::PaymentProvider(_) => ErrorKind::PaymentProvider,
            ServiceError::AlreadySubscribed { .. } => ErrorKind::Conflict,
            ServiceError::Database(err) => match err {
                DbError::UniqueViolation { .. } | DbError::CheckViolation { .. } => {
                    ErrorKind::Conflict
                }
                DbError::NotFound { .. } => ErrorKind::NotFound,
                DbError::ForeignKeyViolation { .. } => ErrorKind::Validation,
                _ => ErrorKind::Internal,
            },
        }
    }

    /// Short text for the person at the counter.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::PaymentProvider(_) => {
                "Could not start the online payment, please try again".to_string()
            }
            ServiceError::Database(_) => match self.kind() {
                ErrorKind::Conflict => {
                    "The data changed while saving, please try again".to_string()
                }
                ErrorKind::Validation => "Invalid reference".to_string(),
                ErrorKind::NotFound => "Record not found".to_string(),
                _ => "Storage error, please try again".to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

/// Logs the database detail; callers only ever see [`ServiceError::user_message`].
impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            other => {
                error!(error = %other, "Database operation failed");
                ServiceError::Database(other)
            }
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Response Envelope
// =============================================================================

/// Transport envelope, discriminated by `success`.
///
/// ```json
/// { "success": true, "data": { "transactionNumber": "T-000042" } }
/// { "success": false, "error": "An open cash session is required to record sales" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResult<T> {
    pub fn ok(data: T) -> Self {
        ApiResult {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        ApiResult {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T> From<ServiceResult<T>> for ApiResult<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(data) => ApiResult::ok(data),
            Err(err) => ApiResult::err(err.user_message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let err: ServiceError = CoreError::CashSessionRequired.into();
        assert_eq!(err.kind(), ErrorKind::BusinessRule);

        let err: ServiceError = ValidationError::Negative {
            field: "openingCash".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err: ServiceError = CoreError::SessionAlreadyOpen {
            business_id: "b-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(ServiceError::forbidden("x").kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_db_not_found_becomes_not_found() {
        let err: ServiceError = DbError::not_found("Transaction", "t-1").into();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        assert_eq!(err.user_message(), "Transaction not found: t-1");
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err: ServiceError = DbError::QueryFailed("disk I/O error at page 7".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.user_message().contains("page 7"));
    }

    #[test]
    fn test_envelope() {
        let ok: ApiResult<i32> = Ok(7).into();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({ "success": true, "data": 7 })
        );

        let failed: ApiResult<i32> = Err(ServiceError::from(CoreError::EmptyCart)).into();
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "success": false, "error": "Cart is empty" })
        );
    }
}
