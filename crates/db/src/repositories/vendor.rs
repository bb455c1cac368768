use sqlx::sqlite::SqliteRow;

use inventra_core::domain::vendor::{Vendor, VendorId};

use super::{column, parse_decimal, RepositoryError, VendorRepository};
use crate::DbPool;

pub struct SqlVendorRepository {
    pool: DbPool,
}

impl SqlVendorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_vendor(row: &SqliteRow) -> Result<Vendor, RepositoryError> {
    let unit_price: String = column(row, "unit_price")?;

    Ok(Vendor {
        id: VendorId(column(row, "vendor_id")?),
        name: column(row, "name")?,
        quality_score: column(row, "quality_score")?,
        reliability_rating: column(row, "reliability_rating")?,
        lead_time_days: column(row, "lead_time_days")?,
        unit_price: parse_decimal("unit_price", &unit_price)?,
    })
}

#[async_trait::async_trait]
impl VendorRepository for SqlVendorRepository {
    async fn list_ranked(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT vendor_id, name, quality_score, reliability_rating, lead_time_days, unit_price
             FROM vendors
             ORDER BY quality_score DESC, reliability_rating DESC, lead_time_days ASC, vendor_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_vendor).collect()
    }

    async fn find_by_id(&self, id: &VendorId) -> Result<Option<Vendor>, RepositoryError> {
        let row = sqlx::query(
            "SELECT vendor_id, name, quality_score, reliability_rating, lead_time_days, unit_price
             FROM vendors WHERE vendor_id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_vendor).transpose()
    }

    async fn save(&self, vendor: Vendor) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO vendors (vendor_id, name, quality_score, reliability_rating,
                                  lead_time_days, unit_price)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(vendor_id) DO UPDATE SET
                 name = excluded.name,
                 quality_score = excluded.quality_score,
                 reliability_rating = excluded.reliability_rating,
                 lead_time_days = excluded.lead_time_days,
                 unit_price = excluded.unit_price",
        )
        .bind(&vendor.id.0)
        .bind(&vendor.name)
        .bind(vendor.quality_score)
        .bind(vendor.reliability_rating)
        .bind(vendor.lead_time_days)
        .bind(vendor.unit_price.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
