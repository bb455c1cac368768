use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;

use inventra_core::domain::sales::SaleRecord;

use super::{column, format_date, parse_date, parse_decimal, RepositoryError, SalesRepository};
use crate::DbPool;

pub struct SqlSalesRepository {
    pool: DbPool,
}

impl SqlSalesRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_sale(row: &SqliteRow) -> Result<SaleRecord, RepositoryError> {
    let date: String = column(row, "date")?;
    let revenue: String = column(row, "revenue")?;

    Ok(SaleRecord {
        date: parse_date("date", &date)?,
        sku: column(row, "sku")?,
        qty: column(row, "qty")?,
        revenue: parse_decimal("revenue", &revenue)?,
        region: column(row, "region")?,
        weather_condition: column(row, "weather_condition")?,
        temperature: column(row, "temperature")?,
        rainfall: column(row, "rainfall")?,
    })
}

#[async_trait::async_trait]
impl SalesRepository for SqlSalesRepository {
    async fn list_sales(
        &self,
        since: Option<NaiveDate>,
        sku: Option<&str>,
    ) -> Result<Vec<SaleRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT date, sku, qty, revenue, region, weather_condition, temperature, rainfall
             FROM sales
             WHERE (?1 IS NULL OR date >= ?1)
               AND (?2 IS NULL OR sku = ?2)
             ORDER BY date DESC, id DESC",
        )
        .bind(since.map(format_date))
        .bind(sku)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_sale).collect()
    }

    async fn record_sale(&self, sale: SaleRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sales (date, sku, qty, revenue, region, weather_condition, temperature,
                                rainfall)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(format_date(sale.date))
        .bind(&sale.sku)
        .bind(sale.qty)
        .bind(sale.revenue.to_string())
        .bind(&sale.region)
        .bind(&sale.weather_condition)
        .bind(sale.temperature)
        .bind(sale.rainfall)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
