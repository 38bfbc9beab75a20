//! # Ledger Arithmetic
//!
//! Pure computations behind the cash drawer: tender buckets, session
//! summaries and the reconciliation done when a session is closed.
//!
//! ## Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session transactions                                                   │
//! │  ├── paid + cash ──────────┐                                            │
//! │  ├── paid + card/transfer  │  informational only                        │
//! │  ├── pending               │  ignored                                   │
//! │  └── cancelled             │  ignored (counted in the summary)          │
//! │                            ▼                                            │
//! │  expected_cash   = opening_cash + Σ total                               │
//! │  cash_difference = closing_cash − expected_cash                         │
//! │                    (negative: drawer is short, positive: over)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Transaction, TransactionStatus};

/// Prefix of human-facing transaction numbers.
pub const TRANSACTION_NUMBER_PREFIX: &str = "T-";

// =============================================================================
// Tender Kinds
// =============================================================================

/// Tender family of a payment method code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderKind {
    Cash,
    Card,
    Transfer,
    Online,
    Other,
}

impl TenderKind {
    /// Maps a stored payment method code to its family.
    ///
    /// ```text
    /// cash                      → Cash
    /// card, card_manual         → Card
    /// transfer                  → Transfer
    /// stripe_checkout, stripe   → Online
    /// anything else             → Other
    /// ```
    pub fn from_code(code: &str) -> Self {
        match code {
            "cash" => TenderKind::Cash,
            "card" | "card_manual" => TenderKind::Card,
            "transfer" => TenderKind::Transfer,
            "stripe_checkout" | "stripe" => TenderKind::Online,
            _ => TenderKind::Other,
        }
    }

    /// The configuration payment capability that gates this family.
    pub fn capability(&self) -> Option<&'static str> {
        match self {
            TenderKind::Cash => Some("cash"),
            TenderKind::Card => Some("cardManual"),
            TenderKind::Transfer => Some("transfer"),
            TenderKind::Online => Some("cardOnline"),
            TenderKind::Other => None,
        }
    }
}

// =============================================================================
// Session Summary
// =============================================================================

/// Per-tender totals of one cash session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_sales: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
    pub transfer_sales: Money,
    pub online_sales: Money,
    pub other_sales: Money,
    pub cancelled_count: i64,
}

impl SessionSummary {
    /// Folds one transaction into the summary.
    ///
    /// Paid rows go to their tender bucket (a paid row without a method
    /// code lands in `other`), cancelled rows are counted, pending rows are
    /// ignored.
    pub fn record(&mut self, status: TransactionStatus, code: Option<&str>, total: Money) {
        match status {
            TransactionStatus::Paid => {
                let bucket = match code.map(TenderKind::from_code).unwrap_or(TenderKind::Other) {
                    TenderKind::Cash => &mut self.cash_sales,
                    TenderKind::Card => &mut self.card_sales,
                    TenderKind::Transfer => &mut self.transfer_sales,
                    TenderKind::Online => &mut self.online_sales,
                    TenderKind::Other => &mut self.other_sales,
                };
                *bucket += total;
                self.total_sales += total;
            }
            TransactionStatus::Cancelled => self.cancelled_count += 1,
            TransactionStatus::Pending => {}
        }
    }

    /// Single pass over a session's transactions.
    pub fn from_transactions<'a, I>(transactions: I) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        let mut summary = SessionSummary::default();
        for tx in transactions {
            summary.record(tx.status, tx.payment_method_code.as_deref(), tx.total);
        }
        summary
    }
}

/// Sum of paid, cash-coded totals. Only this feeds the drawer.
pub fn cash_sales_total<'a, I>(transactions: I) -> Money
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .filter(|tx| tx.status == TransactionStatus::Paid)
        .filter(|tx| {
            tx.payment_method_code
                .as_deref()
                .map(TenderKind::from_code)
                == Some(TenderKind::Cash)
        })
        .map(|tx| tx.total)
        .sum()
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Outcome of counting the drawer at close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub opening_cash: Money,
    pub cash_sales: Money,
    pub expected_cash: Money,
    pub closing_cash: Money,
    pub difference: Money,
}

impl Reconciliation {
    /// ## Example
    /// ```rust
    /// use mostrador_core::{Money, Reconciliation};
    ///
    /// let r = Reconciliation::compute(
    ///     Money::from_units(1000),
    ///     Money::from_units(500),
    ///     Money::from_units(1490),
    /// );
    /// assert_eq!(r.expected_cash, Money::from_units(1500));
    /// assert_eq!(r.difference, Money::from_units(-10));
    /// assert!(r.is_short());
    /// ```
    pub fn compute(opening_cash: Money, cash_sales: Money, closing_cash: Money) -> Self {
        let expected_cash = opening_cash + cash_sales;
        Reconciliation {
            opening_cash,
            cash_sales,
            expected_cash,
            closing_cash,
            difference: closing_cash - expected_cash,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.difference.is_zero()
    }

    pub fn is_short(&self) -> bool {
        self.difference.is_negative()
    }
}

// =============================================================================
// Transaction Numbers
// =============================================================================

/// Formats the per-business sequence number: `1 → "T-000001"`.
pub fn format_transaction_number(sequence: i64) -> String {
    format!("{}{:06}", TRANSACTION_NUMBER_PREFIX, sequence)
}

/// Parses a number produced by [`format_transaction_number`].
pub fn parse_transaction_number(number: &str) -> Option<i64> {
    number
        .strip_prefix(TRANSACTION_NUMBER_PREFIX)?
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeliveryStatus, TransactionSource};
    use chrono::Utc;

    fn tx(status: TransactionStatus, code: Option<&str>, total: i64) -> Transaction {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            business_id: "b-1".to_string(),
            transaction_number: format_transaction_number(1),
            cash_session_id: Some("s-1".to_string()),
            source: TransactionSource::Pos,
            status,
            delivery_status: DeliveryStatus::Pending,
            payment_method_id: code.map(|c| format!("pm-{}", c)),
            payment_method_code: code.map(str::to_string),
            subtotal: Money::from_units(total),
            discount: Money::zero(),
            tax: Money::zero(),
            total: Money::from_units(total),
            customer_id: None,
            customer_name: None,
            served_by: None,
            payment_reference: None,
            notes: None,
            created_at: Utc::now(),
            paid_at: None,
            cancelled_at: None,
            delivered_at: None,
        }
    }

    #[test]
    fn test_tender_kind_from_code() {
        assert_eq!(TenderKind::from_code("cash"), TenderKind::Cash);
        assert_eq!(TenderKind::from_code("card"), TenderKind::Card);
        assert_eq!(TenderKind::from_code("card_manual"), TenderKind::Card);
        assert_eq!(TenderKind::from_code("stripe"), TenderKind::Online);
        assert_eq!(TenderKind::from_code("stripe_checkout"), TenderKind::Online);
        assert_eq!(TenderKind::from_code("voucher"), TenderKind::Other);
    }

    #[test]
    fn test_summary_buckets() {
        let txs = vec![
            tx(TransactionStatus::Paid, Some("cash"), 500),
            tx(TransactionStatus::Paid, Some("card_manual"), 300),
            tx(TransactionStatus::Paid, Some("transfer"), 40),
            tx(TransactionStatus::Paid, Some("stripe_checkout"), 60),
            tx(TransactionStatus::Paid, Some("voucher"), 7),
            tx(TransactionStatus::Pending, Some("cash"), 1000),
            tx(TransactionStatus::Cancelled, Some("cash"), 250),
            tx(TransactionStatus::Cancelled, None, 10),
        ];

        let summary = SessionSummary::from_transactions(&txs);
        assert_eq!(summary.cash_sales, Money::from_units(500));
        assert_eq!(summary.card_sales, Money::from_units(300));
        assert_eq!(summary.transfer_sales, Money::from_units(40));
        assert_eq!(summary.online_sales, Money::from_units(60));
        assert_eq!(summary.other_sales, Money::from_units(7));
        assert_eq!(summary.total_sales, Money::from_units(907));
        assert_eq!(summary.cancelled_count, 2);

        assert_eq!(SessionSummary::from_transactions(&txs), summary);
    }

    #[test]
    fn test_cash_sales_total_ignores_other_tenders() {
        let txs = vec![
            tx(TransactionStatus::Paid, Some("cash"), 500),
            tx(TransactionStatus::Paid, Some("cash"), 120),
            tx(TransactionStatus::Paid, Some("card"), 300),
            tx(TransactionStatus::Cancelled, Some("cash"), 900),
            tx(TransactionStatus::Pending, None, 900),
        ];
        assert_eq!(cash_sales_total(&txs), Money::from_units(620));
    }

    #[test]
    fn test_reconciliation_without_sales() {
        let opening = Money::from_units(250);
        let closing = Money::from_units(260);
        let r = Reconciliation::compute(opening, Money::zero(), closing);

        assert_eq!(r.expected_cash, opening);
        assert_eq!(r.difference, closing - opening);
        assert!(!r.is_short());
    }

    #[test]
    fn test_reconciliation_balanced() {
        let r = Reconciliation::compute(
            Money::from_units(1000),
            Money::from_units(500),
            Money::from_units(1500),
        );
        assert!(r.is_balanced());
    }

    #[test]
    fn test_reconciliation_saturates() {
        let r = Reconciliation::compute(Money::from_cents(i64::MAX), Money::from_cents(500), Money::zero());
        assert_eq!(r.expected_cash, Money::from_cents(i64::MAX));
        assert!(r.is_short());
    }

    #[test]
    fn test_transaction_numbers() {
        assert_eq!(format_transaction_number(1), "T-000001");
        assert_eq!(format_transaction_number(1234567), "T-1234567");
        assert_eq!(parse_transaction_number("T-000042"), Some(42));
        assert_eq!(parse_transaction_number("T-000000"), None);
        assert_eq!(parse_transaction_number("X-1"), None);
    }
}
