use serde::{Deserialize, Serialize};

use crate::domain::finance::FinancialSummary;
use crate::domain::inventory::InventorySnapshot;
use crate::domain::region::Region;
use crate::domain::sales::SalesPatternSummary;
use crate::domain::ticket::TicketSnapshot;
use crate::domain::vendor::VendorPerformance;

/// An aggregate that either resolved or carries a user-facing reason it could not.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Report<T> {
    Ready(T),
    Unavailable { error: String },
}

impl<T> Report<T> {
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self::Unavailable { error: error.into() }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Output of the gather stage; shape follows the intent's gather rule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DataResult {
    Inventory(InventorySnapshot),
    Sales(Report<SalesPatternSummary>),
    Financial(Report<FinancialSummary>),
    Tickets(TicketSnapshot),
    #[default]
    Empty,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReorderDecision {
    pub region: Option<Region>,
    pub low_stock_count: usize,
    pub analysis: String,
    pub inventory: InventorySnapshot,
    pub top_vendors: Vec<VendorPerformance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunityDecision {
    pub category: Option<String>,
    pub forecast_days: u32,
    pub analysis: String,
    pub sales_data: Report<SalesPatternSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorDecision {
    pub sku: Option<String>,
    pub analysis: String,
    pub top_vendors: Vec<VendorPerformance>,
}

/// Output of the decide stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionResult {
    Reorder(ReorderDecision),
    SalesOpportunity(OpportunityDecision),
    VendorSelection(VendorDecision),
    #[default]
    Empty,
}

impl DecisionResult {
    /// Analysis text, skipping blank model replies.
    pub fn analysis(&self) -> Option<&str> {
        let text = match self {
            Self::Reorder(decision) => decision.analysis.as_str(),
            Self::SalesOpportunity(decision) => decision.analysis.as_str(),
            Self::VendorSelection(decision) => decision.analysis.as_str(),
            Self::Empty => return None,
        };
        (!text.trim().is_empty()).then_some(text)
    }
}
