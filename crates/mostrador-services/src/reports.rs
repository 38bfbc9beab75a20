//! Sales reports over a time window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use mostrador_core::{Money, SessionSummary, TenderKind, TransactionStatus, ValidationError};
use mostrador_db::Database;

use crate::access::StaffContext;
use crate::error::ServiceResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TenderTotal {
    pub code: String,
    pub tender: TenderKind,
    pub total: Money,
    pub count: i64,
}

/// Paid sales by tender and cancellations in `[from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
    pub summary: SessionSummary,
    pub by_code: Vec<TenderTotal>,
    pub paid_count: i64,
}

#[derive(Debug, Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        ReportService { db }
    }

    pub async fn sales_report(
        &self,
        ctx: &StaffContext,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<SalesReport> {
        if from >= to {
            return Err(ValidationError::InvalidFormat {
                field: "to".to_string(),
                reason: "must be after from".to_string(),
            }
            .into());
        }

        debug!(business_id = %ctx.business_id, %from, %to, "sales_report");

        let transactions = self.db.transactions();
        let (totals, cancelled) = tokio::try_join!(
            transactions.paid_totals_by_code(&ctx.business_id, from, to),
            transactions.count_cancelled(&ctx.business_id, from, to),
        )?;

        let mut summary = SessionSummary {
            cancelled_count: cancelled,
            ..Default::default()
        };
        let by_code: Vec<TenderTotal> = totals
            .into_iter()
            .map(|row| {
                summary.record(TransactionStatus::Paid, Some(&row.code), row.total);
                TenderTotal {
                    tender: TenderKind::from_code(&row.code),
                    code: row.code,
                    total: row.total,
                    count: row.count,
                }
            })
            .collect();

        Ok(SalesReport {
            from,
            to,
            summary,
            paid_count: by_code.iter().map(|t| t.count).sum(),
            by_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sessions::SessionService;
    use crate::testing::{fixture, fixture_in, product};
    use crate::transactions::{CreateTransactionRequest, TransactionService};
    use chrono::Duration;
    use mostrador_core::CartItem;

    #[tokio::test]
    async fn test_sales_report() {
        let fx = fixture("retail").await;
        let sessions = SessionService::new(fx.db.clone(), fx.hub.clone());
        let transactions = TransactionService::new(fx.db.clone(), fx.hub.clone());
        let reports = ReportService::new(fx.db.clone());
        let session = sessions.open_session(&fx.cashier, Money::zero()).await.unwrap();

        let sales = [
            (500, &fx.cash),
            (250, &fx.cash),
            (300, &fx.card),
            (100, &fx.cash),
        ];
        let mut ids = Vec::new();
        for (price, method) in sales {
            let p = product(&fx, "Item", Money::from_units(price), None).await;
            let mut request = CreateTransactionRequest::new(vec![CartItem::from_product(&p, 1)]);
            request.cash_session_id = Some(session.id.clone());
            request.payment_method_id = Some(method.id.clone());
            ids.push(transactions.create_transaction(&fx.cashier, request).await.unwrap().transaction_id);
        }
        transactions.cancel_transaction(&fx.cashier, &ids[3], None).await.unwrap();

        let now = Utc::now();
        let report = reports
            .sales_report(&fx.owner, now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(report.summary.cash_sales, Money::from_units(750));
        assert_eq!(report.summary.card_sales, Money::from_units(300));
        assert_eq!(report.summary.total_sales, Money::from_units(1050));
        assert_eq!(report.summary.cancelled_count, 1);
        assert_eq!(report.paid_count, 3);

        let codes: Vec<&str> = report.by_code.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["card", "cash"]);
        assert_eq!(report.by_code[1].tender, TenderKind::Cash);
        assert_eq!(report.by_code[1].count, 2);

        // Scoped to the caller's business.
        let other = fixture_in(&fx.db, fx.hub.clone(), "retail").await;
        let empty = reports
            .sales_report(&other.owner, now - Duration::hours(1), now + Duration::hours(1))
            .await
            .unwrap();
        assert!(empty.by_code.is_empty());
        assert_eq!(empty.summary, SessionSummary::default());
    }

    #[tokio::test]
    async fn test_window_bounds() {
        let fx = fixture("retail").await;
        let reports = ReportService::new(fx.db.clone());
        let now = Utc::now();

        let err = reports.sales_report(&fx.owner, now, now).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let future = reports
            .sales_report(&fx.owner, now + Duration::days(1), now + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(future.paid_count, 0);
    }
}
