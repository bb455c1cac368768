use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VendorId(pub String);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub quality_score: f64,
    pub reliability_rating: f64,
    pub lead_time_days: i64,
    pub unit_price: Decimal,
}

/// Performance view handed to prompts and decision context.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorPerformance {
    pub vendor_id: VendorId,
    pub name: String,
    pub quality_score: f64,
    pub reliability: f64,
    pub lead_time_days: i64,
}

impl From<&Vendor> for VendorPerformance {
    fn from(vendor: &Vendor) -> Self {
        Self {
            vendor_id: vendor.id.clone(),
            name: vendor.name.clone(),
            quality_score: vendor.quality_score,
            reliability: vendor.reliability_rating,
            lead_time_days: vendor.lead_time_days,
        }
    }
}

/// Quality desc, then reliability desc, then lead time asc.
pub fn compare_performance(left: &VendorPerformance, right: &VendorPerformance) -> Ordering {
    right
        .quality_score
        .total_cmp(&left.quality_score)
        .then_with(|| right.reliability.total_cmp(&left.reliability))
        .then_with(|| left.lead_time_days.cmp(&right.lead_time_days))
}

pub fn rank_vendors(vendors: &[Vendor]) -> Vec<VendorPerformance> {
    let mut ranked: Vec<VendorPerformance> = vendors.iter().map(VendorPerformance::from).collect();
    ranked.sort_by(compare_performance);
    ranked
}
