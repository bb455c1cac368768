use inventra_agent::decision::FINANCIAL_HEALTH_WINDOW_DAYS;
use inventra_agent::gatherer::{PENDING_TICKET_LIMIT, VELOCITY_WINDOW_DAYS};
use inventra_agent::DataGatherer;
use inventra_core::pipeline::formatter::{
    format_financial, format_inventory_report, format_sales, format_tickets,
};
use inventra_db::Repositories;

use crate::commands::{
    block_on, load_config, open_database, repository_failure, CommandResult, Failure,
};

/// Inventory, sales, finance and ticket dashboards straight from the stores, without the model.
pub fn run() -> CommandResult {
    let config = match load_config("stats") {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on("stats", async {
        let pool = open_database(&config).await?;
        let gatherer = DataGatherer::new(&Repositories::sqlite(pool.clone()));
        let body = dashboard(&gatherer).await;
        pool.close().await;
        body
    })
}

pub async fn dashboard(gatherer: &DataGatherer) -> Result<String, Failure> {
    let inventory = gatherer.inventory_report(None).await.map_err(repository_failure)?;
    let sales =
        gatherer.sales_summary(None, VELOCITY_WINDOW_DAYS).await.map_err(repository_failure)?;
    let finance = gatherer
        .financial_summary(None, FINANCIAL_HEALTH_WINDOW_DAYS)
        .await
        .map_err(repository_failure)?;
    let tickets = gatherer.pending_tickets(PENDING_TICKET_LIMIT).await.map_err(repository_failure)?;

    Ok([
        format_inventory_report(&inventory, None),
        format_sales(&sales),
        format_financial(&finance, None),
        format_tickets(&tickets),
    ]
    .join("\n\n"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use inventra_agent::DataGatherer;
    use inventra_core::domain::finance::{FinanceTransaction, TransactionKind};
    use inventra_core::domain::inventory::InventoryItem;
    use inventra_core::domain::sales::SaleRecord;
    use inventra_db::repositories::{
        InMemoryFinanceRepository, InMemoryInventoryRepository, InMemorySalesRepository,
        Repositories,
    };

    use super::dashboard;

    #[tokio::test]
    async fn dashboard_has_inventory_sales_finance_and_ticket_sections() {
        let today = Utc::now().date_naive();
        let repositories = Repositories {
            inventory: Arc::new(InMemoryInventoryRepository::with_items([InventoryItem {
                sku: "UMB-N01".to_string(),
                name: "Compact Umbrella".to_string(),
                category: "Rainwear".to_string(),
                region: "North".to_string(),
                qty: 3,
                reorder_threshold: 10,
                vendor_id: None,
                unit_price: Decimal::from(300),
            }])),
            sales: Arc::new(InMemorySalesRepository::with_sales([SaleRecord {
                date: today - Duration::days(2),
                sku: "UMB-N01".to_string(),
                qty: 30,
                revenue: Decimal::from(9000),
                region: "North".to_string(),
                weather_condition: "Rain".to_string(),
                temperature: Some(23.0),
                rainfall: Some(18.0),
            }])),
            finance: Arc::new(InMemoryFinanceRepository::with_transactions([FinanceTransaction {
                date: today,
                kind: TransactionKind::Sale,
                amount: Decimal::from(9000),
                region: "North".to_string(),
                sku: Some("UMB-N01".to_string()),
            }])),
            ..Repositories::in_memory()
        };

        let text = dashboard(&DataGatherer::new(&repositories)).await.expect("dashboard");

        assert!(text.starts_with("INVENTORY STATUS"));
        assert!(text.contains("CRITICAL ITEMS (under 7 days of stock):\n- UMB-N01: 3 units"));
        assert!(text.contains("SALES ANALYSIS (last 30 days)\n\nTotal sales: 30 units"));
        assert!(text.contains("FINANCIAL SUMMARY (last 90 days)\n\nTotal sales: Rs 9,000.00"));
        assert!(text.ends_with("TICKET STATUS\n\nTotal pending: 0\nTotal value: Rs 0.00\n"));
    }
}
