use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;

use inventra_core::domain::finance::{FinanceTransaction, TransactionKind};

use super::{column, format_date, parse_date, parse_decimal, FinanceRepository, RepositoryError};
use crate::DbPool;

pub struct SqlFinanceRepository {
    pool: DbPool,
}

impl SqlFinanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_transaction(row: &SqliteRow) -> Result<FinanceTransaction, RepositoryError> {
    let date: String = column(row, "date")?;
    let kind: String = column(row, "type")?;
    let amount: String = column(row, "amount")?;

    Ok(FinanceTransaction {
        date: parse_date("date", &date)?,
        kind: TransactionKind::parse(&kind),
        amount: parse_decimal("amount", &amount)?,
        region: column(row, "region")?,
        sku: column(row, "sku")?,
    })
}

#[async_trait::async_trait]
impl FinanceRepository for SqlFinanceRepository {
    async fn list_transactions(
        &self,
        since: Option<NaiveDate>,
        region: Option<&str>,
    ) -> Result<Vec<FinanceTransaction>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT date, type, amount, region, sku
             FROM finance
             WHERE (?1 IS NULL OR date >= ?1)
               AND (?2 IS NULL OR region = ?2)
             ORDER BY date DESC, id DESC",
        )
        .bind(since.map(format_date))
        .bind(region)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    async fn record(&self, transaction: FinanceTransaction) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO finance (date, type, amount, region, sku) VALUES (?, ?, ?, ?, ?)")
            .bind(format_date(transaction.date))
            .bind(transaction.kind.as_str())
            .bind(transaction.amount.to_string())
            .bind(&transaction.region)
            .bind(&transaction.sku)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
