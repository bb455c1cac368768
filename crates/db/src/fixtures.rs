use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

const SEED_VENDOR_IDS: &[&str] = &["V001", "V002", "V003", "V004", "V005", "V006"];

const SEED_SKUS: &[&str] = &[
    "UMB-N01", "HTR-N01", "JKT-N01", "FAN-S01", "BEV-S01", "SUN-S01", "RNC-E01", "BEV-E01",
    "FAN-E01", "AC-W01", "BEV-W01", "SUN-W01", "UMB-C01", "HTR-C01", "BEV-C01",
];

const SEED_LOW_STOCK_SKUS: &[&str] = &["UMB-N01", "JKT-N01", "BEV-S01", "BEV-E01", "AC-W01"];

const SEED_REGIONS: &[&str] = &["North", "South", "East", "West", "Central"];

const SEED_SALES_ROWS: i64 = 22;
const SEED_FINANCE_ROWS: i64 = 17;
const SEED_TICKET_ROWS: i64 = 3;
const SEED_PENDING_TICKETS: i64 = 2;

/// Deterministic demo data: six vendors, fifteen items spread over every region, sales and
/// finance history reaching past the one-year window, and three tickets.
pub struct DemoDataset;

impl DemoDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed.sql");

    /// Loads the dataset. Rows already present are left untouched, so loading twice is safe.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            vendors: SEED_VENDOR_IDS.len(),
            inventory_items: SEED_SKUS.len(),
            sales: SEED_SALES_ROWS as usize,
            finance: SEED_FINANCE_ROWS as usize,
            tickets: SEED_TICKET_ROWS as usize,
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let vendors: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM vendors WHERE vendor_id IN {}",
            sql_array_from_ids(SEED_VENDOR_IDS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("vendors", vendors == SEED_VENDOR_IDS.len() as i64));

        let items: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM inventory WHERE sku IN {}",
            sql_array_from_ids(SEED_SKUS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("inventory", items == SEED_SKUS.len() as i64));

        let low_stock: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM inventory WHERE qty <= reorder_threshold AND sku IN {}",
            sql_array_from_ids(SEED_LOW_STOCK_SKUS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("low-stock-items", low_stock == SEED_LOW_STOCK_SKUS.len() as i64));

        let regions: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(DISTINCT region) FROM inventory WHERE region IN {}",
            sql_array_from_ids(SEED_REGIONS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("regions", regions == SEED_REGIONS.len() as i64));

        let sales: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM sales WHERE id BETWEEN 1 AND ?1")
                .bind(SEED_SALES_ROWS)
                .fetch_one(pool)
                .await?;
        checks.push(("sales", sales == SEED_SALES_ROWS));

        let finance: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM finance WHERE id BETWEEN 1 AND ?1")
                .bind(SEED_FINANCE_ROWS)
                .fetch_one(pool)
                .await?;
        checks.push(("finance", finance == SEED_FINANCE_ROWS));

        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM tickets WHERE id BETWEEN 1 AND ?1 AND status = 'pending'",
        )
        .bind(SEED_TICKET_ROWS)
        .fetch_one(pool)
        .await?;
        checks.push(("pending-tickets", pending == SEED_PENDING_TICKETS));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the seeded rows, children first.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM tickets WHERE id BETWEEN 1 AND ?1")
            .bind(SEED_TICKET_ROWS)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM finance WHERE id BETWEEN 1 AND ?1")
            .bind(SEED_FINANCE_ROWS)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sales WHERE id BETWEEN 1 AND ?1")
            .bind(SEED_SALES_ROWS)
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM inventory WHERE sku IN {}", sql_array_from_ids(SEED_SKUS)))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "DELETE FROM vendors WHERE vendor_id IN {}",
            sql_array_from_ids(SEED_VENDOR_IDS)
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub vendors: usize,
    pub inventory_items: usize,
    pub sales: usize,
    pub finance: usize,
    pub tickets: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
