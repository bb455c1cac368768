use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub date: NaiveDate,
    pub sku: String,
    pub qty: i64,
    pub revenue: Decimal,
    pub region: String,
    pub weather_condition: String,
    pub temperature: Option<f64>,
    pub rainfall: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSale {
    pub date: NaiveDate,
    pub sku: String,
    pub qty: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesPatternSummary {
    pub total_units: i64,
    pub total_revenue: Decimal,
    pub avg_daily_units: f64,
    pub top_sales: Vec<TopSale>,
    pub weather_breakdown: BTreeMap<String, i64>,
    pub region_revenue: BTreeMap<String, Decimal>,
    pub period: String,
    pub window_days: u32,
    /// Set when the requested window was empty and all-time rows were summarized instead.
    pub used_all_time_fallback: bool,
}

impl SalesPatternSummary {
    pub const TOP_SALES_LIMIT: usize = 5;

    /// `None` when there is nothing to summarize.
    pub fn from_records(records: &[SaleRecord], window_days: u32) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let total_units: i64 = records.iter().map(|record| record.qty).sum();
        let total_revenue: Decimal = records.iter().map(|record| record.revenue).sum();
        let avg_daily_units = total_units as f64 / f64::from(window_days.max(1));

        let mut ranked: Vec<&SaleRecord> = records.iter().collect();
        ranked.sort_by(|left, right| right.qty.cmp(&left.qty));
        let top_sales = ranked
            .into_iter()
            .take(Self::TOP_SALES_LIMIT)
            .map(|record| TopSale { date: record.date, sku: record.sku.clone(), qty: record.qty })
            .collect();

        let mut weather_breakdown = BTreeMap::new();
        let mut region_revenue = BTreeMap::new();
        for record in records {
            *weather_breakdown.entry(record.weather_condition.clone()).or_insert(0) += record.qty;
            *region_revenue.entry(record.region.clone()).or_insert(Decimal::ZERO) +=
                record.revenue;
        }

        Some(Self {
            total_units,
            total_revenue,
            avg_daily_units,
            top_sales,
            weather_breakdown,
            region_revenue,
            period: period_label(window_days),
            window_days,
            used_all_time_fallback: false,
        })
    }

    /// Regions ordered by revenue, highest first.
    pub fn top_regions(&self, limit: usize) -> Vec<String> {
        let mut regions: Vec<(&String, &Decimal)> = self.region_revenue.iter().collect();
        regions.sort_by(|left, right| right.1.cmp(left.1).then_with(|| left.0.cmp(right.0)));
        regions.into_iter().take(limit).map(|(region, _)| region.clone()).collect()
    }
}

pub fn period_label(window_days: u32) -> String {
    format!("last {window_days} days")
}

pub const TRENDING_PRODUCT_LIMIT: usize = 20;
pub const DEFAULT_TRENDING_MIN_UNITS: i64 = 10;

/// Average units sold per day across `window_days`.
pub fn sales_velocity(records: &[SaleRecord], window_days: u32) -> f64 {
    let units: i64 = records.iter().map(|record| record.qty).sum();
    units as f64 / f64::from(window_days.max(1))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSales {
    pub sku: String,
    pub units: i64,
    pub revenue: Decimal,
}

/// Products that sold at least `min_units`, best sellers first, capped at
/// [`TRENDING_PRODUCT_LIMIT`].
pub fn trending_products(records: &[SaleRecord], min_units: i64) -> Vec<ProductSales> {
    let mut by_sku: BTreeMap<&str, ProductSales> = BTreeMap::new();
    for record in records {
        let product = by_sku.entry(record.sku.as_str()).or_insert_with(|| ProductSales {
            sku: record.sku.clone(),
            units: 0,
            revenue: Decimal::ZERO,
        });
        product.units += record.qty;
        product.revenue += record.revenue;
    }

    let mut trending: Vec<ProductSales> =
        by_sku.into_values().filter(|product| product.units >= min_units).collect();
    trending.sort_by(|left, right| right.units.cmp(&left.units).then_with(|| left.sku.cmp(&right.sku)));
    trending.truncate(TRENDING_PRODUCT_LIMIT);
    trending
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSales {
    pub region: String,
    pub total_units: i64,
    pub total_revenue: Decimal,
    pub transaction_count: u64,
    pub avg_transaction_size: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalPerformance {
    pub period: String,
    /// Ordered by region name.
    pub regions: Vec<RegionSales>,
    pub best_region: String,
    pub total_revenue: Decimal,
}

impl RegionalPerformance {
    pub fn from_records(records: &[SaleRecord], window_days: u32) -> Option<Self> {
        let mut by_region: BTreeMap<&str, (i64, Decimal, u64)> = BTreeMap::new();
        for record in records {
            let totals = by_region.entry(record.region.as_str()).or_insert((0, Decimal::ZERO, 0));
            totals.0 += record.qty;
            totals.1 += record.revenue;
            totals.2 += 1;
        }

        let regions: Vec<RegionSales> = by_region
            .into_iter()
            .map(|(region, (total_units, total_revenue, transaction_count))| RegionSales {
                region: region.to_string(),
                total_units,
                total_revenue,
                transaction_count,
                avg_transaction_size: total_revenue / Decimal::from(transaction_count),
            })
            .collect();

        let best_region = regions
            .iter()
            .max_by(|left, right| {
                left.total_revenue
                    .cmp(&right.total_revenue)
                    .then_with(|| right.region.cmp(&left.region))
            })?
            .region
            .clone();
        let total_revenue: Decimal = regions.iter().map(|region| region.total_revenue).sum();

        Some(Self { period: period_label(window_days), regions, best_region, total_revenue })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionSales {
    pub condition: String,
    pub total_units: i64,
    pub avg_temperature: Option<f64>,
    pub avg_rainfall: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRange {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// How sales split across recorded weather conditions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherImpact {
    pub category: String,
    pub best_condition: String,
    pub best_condition_units: i64,
    pub temperature_range: Option<TemperatureRange>,
    /// Ordered by condition name.
    pub conditions: Vec<ConditionSales>,
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

impl WeatherImpact {
    pub fn from_records(records: &[SaleRecord], category: Option<&str>) -> Option<Self> {
        let mut by_condition: BTreeMap<&str, (i64, Vec<f64>, Vec<f64>)> = BTreeMap::new();
        for record in records {
            let entry = by_condition
                .entry(record.weather_condition.as_str())
                .or_insert_with(|| (0, Vec::new(), Vec::new()));
            entry.0 += record.qty;
            entry.1.extend(record.temperature);
            entry.2.extend(record.rainfall);
        }

        let conditions: Vec<ConditionSales> = by_condition
            .into_iter()
            .map(|(condition, (total_units, temperatures, rainfall))| ConditionSales {
                condition: condition.to_string(),
                total_units,
                avg_temperature: mean(&temperatures),
                avg_rainfall: mean(&rainfall),
            })
            .collect();

        let best = conditions.iter().max_by(|left, right| {
            left.total_units
                .cmp(&right.total_units)
                .then_with(|| right.condition.cmp(&left.condition))
        })?;

        let temperatures: Vec<f64> = records.iter().filter_map(|record| record.temperature).collect();
        let temperature_range = mean(&temperatures).map(|avg| TemperatureRange {
            min: temperatures.iter().copied().fold(f64::INFINITY, f64::min),
            max: temperatures.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            avg,
        });

        Some(Self {
            category: category.unwrap_or("All").to_string(),
            best_condition: best.condition.clone(),
            best_condition_units: best.total_units,
            temperature_range,
            conditions,
        })
    }
}
