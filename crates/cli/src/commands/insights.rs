use inventra_agent::DataGatherer;
use inventra_core::domain::sales::DEFAULT_TRENDING_MIN_UNITS;
use inventra_core::pipeline::formatter::{
    format_regional_performance, format_trending_products, format_weather_impact,
};
use inventra_db::Repositories;

use crate::commands::{
    block_on, load_config, open_database, repository_failure, CommandResult, Failure,
};

pub const DEFAULT_TRENDING_WINDOW_DAYS: u32 = 30;
pub const REGIONAL_WINDOW_DAYS: u32 = 90;

pub struct InsightsArgs {
    pub sku: Option<String>,
    pub category: Option<String>,
    pub days: Option<u32>,
    pub min_units: Option<i64>,
}

/// Sales analytics straight from the stores: trends, regions, weather and per-sku pace.
pub fn run(args: InsightsArgs) -> CommandResult {
    let config = match load_config("insights") {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on("insights", async {
        let pool = open_database(&config).await?;
        let gatherer = DataGatherer::new(&Repositories::sqlite(pool.clone()));
        let body = report(&gatherer, &args).await;
        pool.close().await;
        body
    })
}

pub async fn report(gatherer: &DataGatherer, args: &InsightsArgs) -> Result<String, Failure> {
    let days = args.days.unwrap_or(DEFAULT_TRENDING_WINDOW_DAYS).max(1);
    let trending = gatherer
        .trending_products(days, args.min_units.unwrap_or(DEFAULT_TRENDING_MIN_UNITS))
        .await
        .map_err(repository_failure)?;
    let regional =
        gatherer.regional_performance(REGIONAL_WINDOW_DAYS).await.map_err(repository_failure)?;
    let weather =
        gatherer.weather_impact(args.category.as_deref()).await.map_err(repository_failure)?;

    let mut sections = vec![
        format_trending_products(&trending, days),
        format_regional_performance(&regional),
        format_weather_impact(&weather),
    ];
    if let Some(sku) = args.sku.as_deref() {
        let velocity = gatherer.sales_velocity(sku, days).await.map_err(repository_failure)?;
        sections.push(format!("Sales velocity for {sku} (last {days} days): {velocity:.1} units/day"));
    }
    Ok(sections.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use inventra_agent::DataGatherer;
    use inventra_core::domain::sales::SaleRecord;
    use inventra_db::repositories::{InMemorySalesRepository, Repositories};

    use super::{report, InsightsArgs};

    fn sale(sku: &str, qty: i64, region: &str, weather: &str) -> SaleRecord {
        SaleRecord {
            date: Utc::now().date_naive() - Duration::days(1),
            sku: sku.to_string(),
            qty,
            revenue: Decimal::from(qty * 50),
            region: region.to_string(),
            weather_condition: weather.to_string(),
            temperature: Some(31.0),
            rainfall: None,
        }
    }

    #[tokio::test]
    async fn insights_combine_trends_regions_weather_and_velocity() {
        let repositories = Repositories {
            sales: Arc::new(InMemorySalesRepository::with_sales([
                sale("FAN-W01", 28, "West", "Clear"),
                sale("UMB-N01", 4, "North", "Rain"),
            ])),
            ..Repositories::in_memory()
        };
        let args =
            InsightsArgs { sku: Some("FAN-W01".to_string()), category: None, days: Some(7), min_units: None };

        let text = report(&DataGatherer::new(&repositories), &args).await.expect("report");

        assert!(text.starts_with("TRENDING PRODUCTS (last 7 days)\n\n- FAN-W01: 28 units, Rs 1,400.00\n\n"));
        assert!(!text.contains("- UMB-N01: 4 units, Rs"));
        assert!(text.contains("Best region: West"));
        assert!(text.contains("Best selling condition: Clear (28 units)"));
        assert!(text.ends_with("Sales velocity for FAN-W01 (last 7 days): 4.0 units/day"));
    }

    #[tokio::test]
    async fn empty_stores_report_missing_sales() {
        let args = InsightsArgs { sku: None, category: Some("Cooling".to_string()), days: None, min_units: None };

        let text = report(&DataGatherer::new(&Repositories::in_memory()), &args).await.expect("report");

        assert!(text.contains("No products reached the minimum sales."));
        assert!(text.contains("Regional Performance: No sales data found"));
        assert!(text.ends_with("Weather Impact: No sales data found"));
    }
}
