use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub region: String,
    pub qty: i64,
    pub reorder_threshold: i64,
    pub vendor_id: Option<String>,
    pub unit_price: Decimal,
}

impl InventoryItem {
    /// At or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.qty <= self.reorder_threshold
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockItem {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub region: String,
    pub qty: i64,
    pub reorder_threshold: i64,
    pub vendor_id: Option<String>,
}

impl From<&InventoryItem> for LowStockItem {
    fn from(item: &InventoryItem) -> Self {
        Self {
            sku: item.sku.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            region: item.region.clone(),
            qty: item.qty,
            reorder_threshold: item.reorder_threshold,
            vendor_id: item.vendor_id.clone(),
        }
    }
}

/// Read projection over current inventory rows. Rebuilt on every request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub total_items: usize,
    pub low_stock_count: usize,
    pub low_stock_items: Vec<LowStockItem>,
    pub category_summary: BTreeMap<String, i64>,
    pub region_summary: BTreeMap<String, i64>,
}

impl InventorySnapshot {
    pub fn from_items(items: &[InventoryItem]) -> Self {
        let low_stock_items: Vec<LowStockItem> =
            items.iter().filter(|item| item.is_low_stock()).map(LowStockItem::from).collect();

        let mut category_summary = BTreeMap::new();
        let mut region_summary = BTreeMap::new();
        for item in items {
            *category_summary.entry(item.category.clone()).or_insert(0) += item.qty;
            *region_summary.entry(item.region.clone()).or_insert(0) += item.qty;
        }

        Self {
            total_items: items.len(),
            low_stock_count: low_stock_items.len(),
            low_stock_items,
            category_summary,
            region_summary,
        }
    }
}

/// Units needed to bring stock back up to `threshold * multiplier`. Never negative.
pub fn reorder_quantity(current_qty: i64, threshold: i64, multiplier: f64) -> i64 {
    let target = (threshold as f64 * multiplier).trunc() as i64;
    (target - current_qty).max(0)
}

pub const DEFAULT_REORDER_MULTIPLIER: f64 = 2.0;

/// Days until stockout at the given sales rate; `None` when nothing is selling.
pub fn stock_coverage_days(current_qty: i64, avg_daily_sales: f64) -> Option<f64> {
    if avg_daily_sales <= 0.0 {
        return None;
    }
    Some(current_qty as f64 / avg_daily_sales)
}

pub const CRITICAL_COVERAGE_DAYS: f64 = 7.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CriticalItem {
    pub sku: String,
    pub qty: i64,
    pub avg_daily_sales: f64,
    pub coverage_days: f64,
}

/// Items whose coverage falls under `coverage_threshold_days`. Items with no recorded sales are
/// never critical.
pub fn critical_items(
    velocities: &[(LowStockItem, f64)],
    coverage_threshold_days: f64,
) -> Vec<CriticalItem> {
    velocities
        .iter()
        .filter_map(|(item, avg_daily_sales)| {
            let coverage_days = stock_coverage_days(item.qty, *avg_daily_sales)?;
            (coverage_days < coverage_threshold_days).then(|| CriticalItem {
                sku: item.sku.clone(),
                qty: item.qty,
                avg_daily_sales: *avg_daily_sales,
                coverage_days,
            })
        })
        .collect()
}

/// Snapshot plus recent sales pace and the low-stock items about to run out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub snapshot: InventorySnapshot,
    pub window_days: u32,
    pub avg_daily_units: f64,
    pub revenue: Decimal,
    pub critical_items: Vec<CriticalItem>,
}
