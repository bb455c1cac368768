use sqlx::sqlite::SqliteRow;

use inventra_core::domain::inventory::InventoryItem;

use super::{column, parse_decimal, InventoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInventoryRepository {
    pool: DbPool,
}

impl SqlInventoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_item(row: &SqliteRow) -> Result<InventoryItem, RepositoryError> {
    let unit_price: String = column(row, "unit_price")?;

    Ok(InventoryItem {
        sku: column(row, "sku")?,
        name: column(row, "name")?,
        category: column(row, "category")?,
        region: column(row, "region")?,
        qty: column(row, "qty")?,
        reorder_threshold: column(row, "reorder_threshold")?,
        vendor_id: column(row, "vendor_id")?,
        unit_price: parse_decimal("unit_price", &unit_price)?,
    })
}

#[async_trait::async_trait]
impl InventoryRepository for SqlInventoryRepository {
    async fn list_items(&self, region: Option<&str>) -> Result<Vec<InventoryItem>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT sku, name, category, region, qty, reorder_threshold, vendor_id, unit_price
             FROM inventory
             WHERE ?1 IS NULL OR region = ?1
             ORDER BY sku",
        )
        .bind(region)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<InventoryItem>, RepositoryError> {
        let row = sqlx::query(
            "SELECT sku, name, category, region, qty, reorder_threshold, vendor_id, unit_price
             FROM inventory WHERE sku = ?",
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn save_item(&self, item: InventoryItem) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO inventory (sku, name, category, region, qty, reorder_threshold,
                                    vendor_id, unit_price)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(sku) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 region = excluded.region,
                 qty = excluded.qty,
                 reorder_threshold = excluded.reorder_threshold,
                 vendor_id = excluded.vendor_id,
                 unit_price = excluded.unit_price",
        )
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category)
        .bind(&item.region)
        .bind(item.qty)
        .bind(item.reorder_threshold)
        .bind(&item.vendor_id)
        .bind(item.unit_price.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
