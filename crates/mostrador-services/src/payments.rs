//! # Online Payments
//!
//! Hosted checkout links and the provider's completion webhook.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start_online_checkout(tx)                                              │
//! │    pending tx + items ──► CheckoutRequest ──► PaymentProvider           │
//! │                                   (metadata[transaction_id] = tx.id)    │
//! │    provider error ──► ServiceError::PaymentProvider, tx untouched       │
//! │                                                                         │
//! │  handle_webhook(secret, body)                                           │
//! │    secret != configured ──► Forbidden (nothing parsed, nothing written) │
//! │    checkout.session.completed ──► settle with "stripe_checkout" method  │
//! │    any other type ──► Ignored                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use ts_rs::TS;

use mostrador_core::{CoreError, Money, TransactionStatus, ValidationError};
use mostrador_db::Database;

use crate::error::{ServiceError, ServiceResult};
use crate::notifications::NotificationHub;
use crate::tenant::{config_for, TenantService};
use crate::transactions::TransactionService;

/// Payment method code settled by the checkout webhook.
pub const ONLINE_METHOD_CODE: &str = "stripe_checkout";

const COMPLETED_EVENT: &str = "checkout.session.completed";

// =============================================================================
// Provider Abstraction
// =============================================================================

/// One amount line of a hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLine {
    pub name: String,
    /// Net unit price (after the per-unit discount).
    pub unit_amount: Money,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub transaction_id: String,
    pub transaction_number: String,
    pub currency: String,
    pub lines: Vec<CheckoutLine>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLink {
    pub id: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("provider rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Http(err.to_string())
    }
}

/// A hosted-checkout payment processor.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_link(&self, request: &CheckoutRequest) -> Result<CheckoutLink, ProviderError>;
}

// =============================================================================
// Stripe (REST, no SDK)
// =============================================================================

#[derive(Debug, Clone)]
pub struct StripeCheckoutProvider {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeCheckoutProvider {
    pub fn new(secret_key: String, api_base: String) -> Self {
        StripeCheckoutProvider {
            client: reqwest::Client::new(),
            secret_key,
            api_base,
        }
    }
}

/// Form fields of a one-off payment-mode checkout session.
fn checkout_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
        ("client_reference_id".to_string(), request.transaction_id.clone()),
        ("metadata[transaction_id]".to_string(), request.transaction_id.clone()),
        ("metadata[transaction_number]".to_string(), request.transaction_number.clone()),
    ];

    for (i, line) in request.lines.iter().enumerate() {
        let prefix = format!("line_items[{}]", i);
        form.push((format!("{}[price_data][currency]", prefix), request.currency.clone()));
        form.push((format!("{}[price_data][product_data][name]", prefix), line.name.clone()));
        form.push((
            format!("{}[price_data][unit_amount]", prefix),
            line.unit_amount.cents().to_string(),
        ));
        form.push((format!("{}[quantity]", prefix), line.quantity.to_string()));
    }

    form
}

#[async_trait]
impl PaymentProvider for StripeCheckoutProvider {
    async fn create_checkout_link(&self, request: &CheckoutRequest) -> Result<CheckoutLink, ProviderError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&checkout_form(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        match (body["id"].as_str(), body["url"].as_str()) {
            (Some(id), Some(url)) => Ok(CheckoutLink {
                id: id.to_string(),
                url: url.to_string(),
            }),
            _ => Err(ProviderError::InvalidResponse(body.to_string())),
        }
    }
}

// =============================================================================
// Webhook Payload
// =============================================================================

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    kind: String,
    /// Shape depends on `type`; only read for completed checkouts.
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    object: WebhookObject,
}

#[derive(Debug, Deserialize)]
struct WebhookObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// What a webhook delivery did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Paid {
        #[serde(rename = "transactionId")]
        transaction_id: String,
    },
    /// Redelivery of an event already applied.
    AlreadyPaid {
        #[serde(rename = "transactionId")]
        transaction_id: String,
    },
    Ignored {
        #[serde(rename = "eventType")]
        event_type: String,
    },
}

fn secrets_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

// =============================================================================
// Service
// =============================================================================

/// Checkout and webhook settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    pub webhook_secret: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub currency: String,
}

#[derive(Clone)]
pub struct PaymentService {
    db: Database,
    tenants: TenantService,
    transactions: TransactionService,
    provider: Option<Arc<dyn PaymentProvider>>,
    config: CheckoutConfig,
}

impl PaymentService {
    pub fn new(
        db: Database,
        hub: NotificationHub,
        provider: Option<Arc<dyn PaymentProvider>>,
        config: CheckoutConfig,
    ) -> Self {
        PaymentService {
            tenants: TenantService::new(db.clone()),
            transactions: TransactionService::new(db.clone(), hub),
            db,
            provider,
            config,
        }
    }

    /// Creates a hosted checkout link for a pending transaction.
    pub async fn start_online_checkout(&self, transaction_id: &str) -> ServiceResult<CheckoutLink> {
        let Some(provider) = self.provider.as_ref() else {
            warn!(transaction_id = %transaction_id, "Online checkout requested without a provider");
            return Err(ServiceError::PaymentProvider("no provider configured".to_string()));
        };

        let transaction = self
            .db
            .transactions()
            .get_by_id(transaction_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction", transaction_id))?;

        let business = self.tenants.writable_business(&transaction.business_id).await?;
        if !config_for(&business).accepts_payment_code(ONLINE_METHOD_CODE) {
            return Err(CoreError::PaymentMethodDisabled {
                code: ONLINE_METHOD_CODE.to_string(),
            }
            .into());
        }

        if transaction.status != TransactionStatus::Pending {
            return Err(CoreError::invalid_transition(
                "Transaction",
                &transaction.id,
                transaction.status,
                TransactionStatus::Paid,
            )
            .into());
        }
        if !transaction.total.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "total".to_string(),
            }
            .into());
        }

        let items = self.db.transactions().get_items(&transaction.id).await?;
        let lines = items
            .iter()
            .map(|item| CheckoutLine {
                name: item.product_name.clone(),
                unit_amount: (item.unit_price - item.discount).clamp_non_negative(),
                quantity: item.quantity,
            })
            .collect();

        let request = CheckoutRequest {
            transaction_id: transaction.id.clone(),
            transaction_number: transaction.transaction_number.clone(),
            currency: self.config.currency.clone(),
            lines,
            success_url: self.config.success_url.clone(),
            cancel_url: self.config.cancel_url.clone(),
        };

        let link = provider.create_checkout_link(&request).await.map_err(|err| {
            error!(transaction_id = %transaction.id, error = %err, "Checkout link creation failed");
            ServiceError::PaymentProvider(err.to_string())
        })?;

        info!(
            transaction_id = %transaction.id,
            checkout_id = %link.id,
            total = %transaction.total,
            "Checkout link created"
        );
        Ok(link)
    }

    /// Applies a provider event. The shared secret is checked before the
    /// body is even parsed.
    pub async fn handle_webhook(&self, secret: Option<&str>, body: &str) -> ServiceResult<WebhookOutcome> {
        let authorized = match (secret, self.config.webhook_secret.as_deref()) {
            (Some(given), Some(expected)) => secrets_match(given, expected),
            _ => false,
        };
        if !authorized {
            warn!(has_secret = secret.is_some(), "Webhook rejected");
            return Err(ServiceError::forbidden("invalid webhook secret"));
        }

        let event: WebhookEvent = serde_json::from_str(body).map_err(|err| ValidationError::InvalidFormat {
            field: "body".to_string(),
            reason: err.to_string(),
        })?;

        if event.kind != COMPLETED_EVENT {
            debug!(event_type = %event.kind, "Webhook event ignored");
            return Ok(WebhookOutcome::Ignored { event_type: event.kind });
        }

        let data: WebhookData = serde_json::from_value(event.data).map_err(|err| ValidationError::InvalidFormat {
            field: "data".to_string(),
            reason: err.to_string(),
        })?;
        let object = data.object;
        let transaction_id = object
            .metadata
            .get("transaction_id")
            .ok_or_else(|| ValidationError::Required {
                field: "metadata.transaction_id".to_string(),
            })?;

        let transaction = self
            .db
            .transactions()
            .get_by_id(transaction_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction", transaction_id))?;

        if transaction.status == TransactionStatus::Paid {
            info!(transaction_id = %transaction.id, "Webhook redelivered for a paid transaction");
            return Ok(WebhookOutcome::AlreadyPaid {
                transaction_id: transaction.id,
            });
        }

        let method = self
            .db
            .payment_methods()
            .find_by_code(&transaction.business_id, ONLINE_METHOD_CODE)
            .await?
            .ok_or_else(|| ServiceError::not_found("PaymentMethod", ONLINE_METHOD_CODE))?;

        let paid = self
            .transactions
            .settle(&transaction, &method, object.id.as_deref())
            .await?;

        Ok(WebhookOutcome::Paid { transaction_id: paid.id })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
