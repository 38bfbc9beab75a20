//! # Cash Session Service
//!
//! Opening, closing and summarising cash-drawer sessions.
//!
//! ## Close Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  close_session(ctx, &session, closing_cash, notes)                      │
//! │                                                                         │
//! │  1. paid transactions of the session that carry a payment method        │
//! │  2. cash-coded subset ──► Σ total = cash_sales                          │
//! │  3. expected   = opening_cash + cash_sales                              │
//! │     difference = closing_cash − expected                                │
//! │  4. UPDATE ... WHERE id = ? AND status = 'open'                         │
//! │       0 rows → SessionNotOpen (stale reference, nothing written)        │
//! │  5. best-effort "session closed" notification                           │
//! │                                                                         │
//! │  Card, transfer and online totals are informational; only cash feeds   │
//! │  the drawer.                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use mostrador_core::ledger::cash_sales_total;
use mostrador_core::validation::{validate_cash_amount, validate_notes};
use mostrador_core::{CashSession, CoreError, Money, NotificationKind, Reconciliation, SessionSummary};
use mostrador_db::{Database, NewNotification};

use crate::access::StaffContext;
use crate::error::{ServiceError, ServiceResult};
use crate::notifications::{record, NotificationHub};
use crate::tenant::TenantService;

const MAX_SESSION_LIST: i64 = 100;

/// Result of closing a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionClose {
    pub session: CashSession,
    pub expected_cash: Money,
    pub closing_cash: Money,
    pub difference: Money,
}

#[derive(Debug, Clone)]
pub struct SessionService {
    db: Database,
    tenants: TenantService,
    hub: NotificationHub,
}

impl SessionService {
    pub fn new(db: Database, hub: NotificationHub) -> Self {
        SessionService {
            tenants: TenantService::new(db.clone()),
            db,
            hub,
        }
    }

    /// Opens the drawer for the caller's business.
    ///
    /// The lookup before the insert gives the common case a clean error; the
    /// partial unique index turns a concurrent second open into the same
    /// `SessionAlreadyOpen` instead of a duplicate row.
    pub async fn open_session(&self, ctx: &StaffContext, opening_cash: Money) -> ServiceResult<CashSession> {
        validate_cash_amount("openingCash", opening_cash)?;
        let business = self.tenants.writable_business(&ctx.business_id).await?;
        let repo = self.db.cash_sessions();

        if let Some(open) = repo.find_open(&business.id).await? {
            info!(business_id = %business.id, session_id = %open.id, "Session already open");
            return Err(CoreError::SessionAlreadyOpen {
                business_id: business.id,
            }
            .into());
        }

        let session = match repo.insert_open(&business.id, &ctx.staff_id, opening_cash).await {
            Ok(session) => session,
            Err(err) if err.is_unique_violation_on("cash_sessions.business_id") => {
                warn!(business_id = %business.id, "Concurrent session open rejected");
                return Err(CoreError::SessionAlreadyOpen {
                    business_id: business.id,
                }
                .into());
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            session_id = %session.id,
            business_id = %session.business_id,
            staff_id = %ctx.staff_id,
            opening_cash = %opening_cash,
            "Cash session opened"
        );

        Ok(session)
    }

    /// Closes the session the caller holds and reconciles the drawer.
    pub async fn close_session(
        &self,
        ctx: &StaffContext,
        session: &CashSession,
        closing_cash: Money,
        notes: Option<&str>,
    ) -> ServiceResult<SessionClose> {
        ctx.ensure_business(&session.business_id)?;
        validate_cash_amount("closingCash", closing_cash)?;
        let notes = validate_notes(notes)?;

        if !session.is_open() {
            return Err(CoreError::SessionNotOpen {
                session_id: session.id.clone(),
            }
            .into());
        }

        let paid = self.db.transactions().list_paid_with_method(&session.id).await?;
        let cash_sales = cash_sales_total(&paid);
        let reconciliation = Reconciliation::compute(session.opening_cash, cash_sales, closing_cash);

        let closed = self
            .db
            .cash_sessions()
            .close(&session.id, &ctx.staff_id, &reconciliation, notes.as_deref(), Utc::now())
            .await?
            .ok_or_else(|| {
                warn!(session_id = %session.id, "Close on a session that is no longer open");
                ServiceError::from(CoreError::SessionNotOpen {
                    session_id: session.id.clone(),
                })
            })?;

        info!(
            session_id = %closed.id,
            staff_id = %ctx.staff_id,
            paid_transactions = paid.len(),
            cash_sales = %cash_sales,
            expected = %reconciliation.expected_cash,
            closing = %closing_cash,
            difference = %reconciliation.difference,
            "Cash session closed"
        );

        record(
            &self.db,
            &self.hub,
            NewNotification {
                business_id: closed.business_id.clone(),
                kind: NotificationKind::SessionClosed,
                title: "Caja cerrada".to_string(),
                body: format!(
                    "Esperado {} · Contado {} · Diferencia {}",
                    reconciliation.expected_cash, closing_cash, reconciliation.difference
                ),
                transaction_id: None,
            },
        )
        .await;

        Ok(SessionClose {
            session: closed,
            expected_cash: reconciliation.expected_cash,
            closing_cash,
            difference: reconciliation.difference,
        })
    }

    /// Per-tender totals of a session. Read-only.
    pub async fn get_session_summary(&self, ctx: &StaffContext, session_id: &str) -> ServiceResult<SessionSummary> {
        let session = self.owned_session(ctx, session_id).await?;
        let transactions = self.db.transactions().list_by_session(&session.id).await?;
        Ok(SessionSummary::from_transactions(&transactions))
    }

    pub async fn active_session(&self, ctx: &StaffContext) -> ServiceResult<Option<CashSession>> {
        Ok(self.db.cash_sessions().find_open(&ctx.business_id).await?)
    }

    /// Most recent sessions first, at most 100.
    pub async fn list_sessions(&self, ctx: &StaffContext, limit: i64) -> ServiceResult<Vec<CashSession>> {
        let limit = limit.clamp(1, MAX_SESSION_LIST);
        Ok(self.db.cash_sessions().list(&ctx.business_id, limit).await?)
    }

    async fn owned_session(&self, ctx: &StaffContext, session_id: &str) -> ServiceResult<CashSession> {
        let session = self
            .db
            .cash_sessions()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("CashSession", session_id))?;
        ctx.ensure_business(&session.business_id)?;
        Ok(session)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{fixture, product};
    use crate::transactions::{CreateTransactionRequest, TransactionService};
    use mostrador_core::{CartItem, SessionStatus, SubscriptionStatus, TransactionStatus};

    async fn sell(
        transactions: &TransactionService,
        ctx: &StaffContext,
        session_id: &str,
        method_id: &str,
        item: CartItem,
    ) -> String {
        let mut request = CreateTransactionRequest::new(vec![item]);
        request.cash_session_id = Some(session_id.to_string());
        request.payment_method_id = Some(method_id.to_string());
        request.status = Some(TransactionStatus::Paid);
        transactions.create_transaction(ctx, request).await.unwrap().transaction_id
    }

    #[tokio::test]
    async fn test_open_then_close_without_sales() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());

        let session = sessions.open_session(&fx.cashier, Money::from_units(250)).await.unwrap();
        let close = sessions
            .close_session(&fx.cashier, &session, Money::from_units(240), None)
            .await
            .unwrap();

        assert_eq!(close.expected_cash, Money::from_units(250));
        assert_eq!(close.difference, Money::from_units(-10));
        assert_eq!(close.session.status, SessionStatus::Closed);
        assert_eq!(close.session.closed_by.as_deref(), Some(fx.cashier.staff_id.as_str()));
    }

    #[tokio::test]
    async fn test_reconciliation_scenario() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());
        let transactions = TransactionService::new(fx.db.clone(), fx.hub.clone());
        let p = product(&fx, "Canasta", Money::from_units(1), None).await;

        let session = sessions.open_session(&fx.cashier, Money::from_units(1000)).await.unwrap();
        let cash_sale = CartItem::new(&p.id, &p.name, Money::from_units(500), 1);
        let card_sale = CartItem::new(&p.id, &p.name, Money::from_units(300), 1);
        sell(&transactions, &fx.cashier, &session.id, &fx.cash.id, cash_sale).await;
        sell(&transactions, &fx.cashier, &session.id, &fx.card.id, card_sale).await;

        let summary = sessions.get_session_summary(&fx.cashier, &session.id).await.unwrap();
        assert_eq!(summary.cash_sales, Money::from_units(500));
        assert_eq!(summary.card_sales, Money::from_units(300));
        assert_eq!(summary.total_sales, Money::from_units(800));
        assert_eq!(summary.cancelled_count, 0);

        // Idempotent read.
        assert_eq!(sessions.get_session_summary(&fx.cashier, &session.id).await.unwrap(), summary);

        let close = sessions
            .close_session(&fx.cashier, &session, Money::from_units(1500), Some("cierre"))
            .await
            .unwrap();
        assert_eq!(close.expected_cash, Money::from_units(1500));
        assert_eq!(close.difference, Money::zero());
        assert_eq!(close.session.expected_cash, Some(Money::from_units(1500)));
        assert_eq!(close.session.cash_difference, Some(Money::zero()));
    }

    #[tokio::test]
    async fn test_expected_cash_sums_every_cash_sale() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());
        let transactions = TransactionService::new(fx.db.clone(), fx.hub.clone());
        let p = product(&fx, "Pan", Money::from_cents(1), None).await;

        let opening = Money::from_cents(12_345);
        let session = sessions.open_session(&fx.cashier, opening).await.unwrap();
        let amounts = [199, 1, 10_000, 4_550];
        for cents in amounts {
            let item = CartItem::new(&p.id, &p.name, Money::from_cents(cents), 1);
            sell(&transactions, &fx.cashier, &session.id, &fx.cash.id, item).await;
        }

        let close = sessions
            .close_session(&fx.cashier, &session, Money::zero(), None)
            .await
            .unwrap();
        let expected = opening + amounts.iter().map(|c| Money::from_cents(*c)).sum::<Money>();
        assert_eq!(close.expected_cash, expected);
        assert_eq!(close.difference, -expected);
    }

    #[tokio::test]
    async fn test_cancelled_pending_sale_does_not_move_drawer() {
        let fx = fixture("restaurant").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());
        let transactions = TransactionService::new(fx.db.clone(), fx.hub.clone());
        let p = product(&fx, "Café", Money::from_units(40), None).await;

        let session = sessions.open_session(&fx.cashier, Money::from_units(100)).await.unwrap();
        let mut request = CreateTransactionRequest::new(vec![CartItem::from_product(&p, 1)]);
        request.cash_session_id = Some(session.id.clone());
        let created = transactions.create_transaction(&fx.cashier, request).await.unwrap();
        transactions
            .cancel_transaction(&fx.cashier, &created.transaction_id, Some("mesa se fue"))
            .await
            .unwrap();

        let summary = sessions.get_session_summary(&fx.cashier, &session.id).await.unwrap();
        assert_eq!(summary.cancelled_count, 1);
        assert_eq!(summary.total_sales, Money::zero());

        let close = sessions
            .close_session(&fx.cashier, &session, Money::from_units(100), None)
            .await
            .unwrap();
        assert_eq!(close.expected_cash, Money::from_units(100));
    }

    #[tokio::test]
    async fn test_second_open_is_rejected() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());

        sessions.open_session(&fx.cashier, Money::zero()).await.unwrap();
        let err = sessions.open_session(&fx.owner, Money::zero()).await.unwrap_err();

        assert!(matches!(err, ServiceError::Core(CoreError::SessionAlreadyOpen { .. })));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(sessions.list_sessions(&fx.owner, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_opens_leave_one_open_session() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());

        let (a, b) = tokio::join!(
            sessions.open_session(&fx.cashier, Money::from_units(10)),
            sessions.open_session(&fx.owner, Money::from_units(20)),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err, ServiceError::Core(CoreError::SessionAlreadyOpen { .. })));

        let open: Vec<_> = sessions
            .list_sessions(&fx.owner, 10)
            .await
            .unwrap()
            .into_iter()
            .filter(|s| s.is_open())
            .collect();
        assert_eq!(open.len(), 1);
    }

    #[tokio::test]
    async fn test_closing_stale_reference_fails() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());

        let session = sessions.open_session(&fx.cashier, Money::from_units(50)).await.unwrap();
        sessions
            .close_session(&fx.cashier, &session, Money::from_units(50), None)
            .await
            .unwrap();

        // `session` still says Open; the database knows better.
        let err = sessions
            .close_session(&fx.owner, &session, Money::from_units(999), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::SessionNotOpen { .. })));

        let stored = fx.db.cash_sessions().get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.closing_cash, Some(Money::from_units(50)));
    }

    #[tokio::test]
    async fn test_open_validation_and_gating() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());

        let err = sessions.open_session(&fx.cashier, Money::from_cents(-1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        fx.db
            .businesses()
            .update_subscription_status(&fx.business.id, SubscriptionStatus::PastDue)
            .await
            .unwrap();
        let err = sessions.open_session(&fx.cashier, Money::zero()).await.unwrap_err();
        assert!(matches!(err, ServiceError::SubscriptionInactive { .. }));
        assert!(sessions.active_session(&fx.cashier).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_drawer_amounts_rejected() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());

        let err = sessions
            .open_session(&fx.cashier, Money::from_cents(i64::MAX))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(sessions.active_session(&fx.cashier).await.unwrap().is_none());

        let session = sessions.open_session(&fx.cashier, Money::from_units(100)).await.unwrap();
        let err = sessions
            .close_session(&fx.cashier, &session, Money::from_cents(i64::MAX), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(sessions.active_session(&fx.cashier).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_close_notifies_and_checks_tenant() {
        let fx = fixture("retail").await;
        let other = crate::testing::fixture_in(&fx.db, fx.hub.clone(), "retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());

        let session = sessions.open_session(&fx.cashier, Money::zero()).await.unwrap();
        let err = sessions
            .close_session(&other.cashier, &session, Money::zero(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let mut feed = fx.hub.subscribe(&fx.business.id).unwrap();
        sessions
            .close_session(&fx.cashier, &session, Money::zero(), None)
            .await
            .unwrap();
        assert_eq!(feed.recv().await.map(|n| n.kind), Some(NotificationKind::SessionClosed));
    }
}
