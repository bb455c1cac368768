use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sales::period_label;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Purchase,
    Other,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Purchase => "purchase",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "sale" => Self::Sale,
            "purchase" => Self::Purchase,
            _ => Self::Other,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceTransaction {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub region: String,
    pub sku: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_sales: Decimal,
    pub total_purchases: Decimal,
    /// Sales minus purchases; the one aggregate allowed to go negative.
    pub net_profit: Decimal,
    pub transaction_count: usize,
    pub avg_transaction_value: Decimal,
    pub period: String,
    pub window_days: u32,
    pub used_all_time_fallback: bool,
}

impl FinancialSummary {
    pub fn from_transactions(transactions: &[FinanceTransaction], window_days: u32) -> Option<Self> {
        if transactions.is_empty() {
            return None;
        }

        let total_for = |kind: TransactionKind| -> Decimal {
            transactions.iter().filter(|tx| tx.kind == kind).map(|tx| tx.amount).sum()
        };
        let total_sales = total_for(TransactionKind::Sale);
        let total_purchases = total_for(TransactionKind::Purchase);
        let gross: Decimal = transactions.iter().map(|tx| tx.amount).sum();
        let transaction_count = transactions.len();

        Some(Self {
            total_sales,
            total_purchases,
            net_profit: total_sales - total_purchases,
            transaction_count,
            avg_transaction_value: gross / Decimal::from(transaction_count),
            period: period_label(window_days),
            window_days,
            used_all_time_fallback: false,
        })
    }

    /// `None` when there were no sales to divide by.
    pub fn profit_margin_pct(&self) -> Option<Decimal> {
        if self.total_sales.is_zero() {
            return None;
        }
        Some(self.net_profit / self.total_sales * Decimal::ONE_HUNDRED)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{FinanceTransaction, FinancialSummary, TransactionKind};

    fn tx(kind: TransactionKind, amount: i64) -> FinanceTransaction {
        FinanceTransaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
            kind,
            amount: Decimal::new(amount, 0),
            region: "North".to_string(),
            sku: None,
        }
    }

    #[test]
    fn net_profit_is_sales_minus_purchases() {
        let summary = FinancialSummary::from_transactions(
            &[tx(TransactionKind::Sale, 1000), tx(TransactionKind::Purchase, 750)],
            365,
        )
        .expect("summary");

        assert_eq!(summary.net_profit, Decimal::new(250, 0));
        assert_eq!(summary.transaction_count, 2);
        assert_eq!(summary.avg_transaction_value, Decimal::new(875, 0));
        assert_eq!(summary.profit_margin_pct(), Some(Decimal::new(25, 0)));
    }

    #[test]
    fn net_profit_may_be_negative() {
        let summary = FinancialSummary::from_transactions(
            &[tx(TransactionKind::Sale, 100), tx(TransactionKind::Purchase, 400)],
            90,
        )
        .expect("summary");
        assert_eq!(summary.net_profit, Decimal::new(-300, 0));
    }

    #[test]
    fn margin_is_absent_without_sales() {
        let summary =
            FinancialSummary::from_transactions(&[tx(TransactionKind::Purchase, 400)], 90)
                .expect("summary");
        assert_eq!(summary.profit_margin_pct(), None);
    }

    #[test]
    fn unknown_kinds_parse_as_other() {
        assert_eq!(TransactionKind::parse("SALE"), TransactionKind::Sale);
        assert_eq!(TransactionKind::parse("refund"), TransactionKind::Other);
    }
}
