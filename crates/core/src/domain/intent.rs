use std::fmt;

use serde::{Deserialize, Serialize};

/// Classified purpose of a user query. Drives every routing and dispatch decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    InventoryStatus,
    SalesAnalysis,
    FinancialReport,
    ReorderRecommendation,
    SalesOpportunity,
    VendorSelection,
    TicketStatus,
    #[default]
    General,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::InventoryStatus,
        Intent::SalesAnalysis,
        Intent::FinancialReport,
        Intent::ReorderRecommendation,
        Intent::SalesOpportunity,
        Intent::VendorSelection,
        Intent::TicketStatus,
        Intent::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InventoryStatus => "inventory_status",
            Self::SalesAnalysis => "sales_analysis",
            Self::FinancialReport => "financial_report",
            Self::ReorderRecommendation => "reorder_recommendation",
            Self::SalesOpportunity => "sales_opportunity",
            Self::VendorSelection => "vendor_selection",
            Self::TicketStatus => "ticket_status",
            Self::General => "general",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::InventoryStatus => "Check inventory levels",
            Self::SalesAnalysis => "Sales patterns/trends",
            Self::FinancialReport => "Financial metrics",
            Self::ReorderRecommendation => "Reorder suggestions",
            Self::SalesOpportunity => "Find sales opportunities",
            Self::VendorSelection => "Vendor recommendations",
            Self::TicketStatus => "View tickets",
            Self::General => "General question/greeting",
        }
    }

    /// Total over any input: unknown or empty tokens resolve to `General`.
    pub fn parse_lenient(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
            .unwrap_or(Self::General)
    }

    pub fn requires_judgment(&self) -> bool {
        matches!(
            self,
            Self::ReorderRecommendation | Self::SalesOpportunity | Self::VendorSelection
        )
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;

    #[test]
    fn every_intent_round_trips_through_its_token() {
        for intent in Intent::ALL {
            assert_eq!(Intent::parse_lenient(intent.as_str()), intent);
        }
    }

    #[test]
    fn unknown_tokens_fall_back_to_general() {
        assert_eq!(Intent::parse_lenient(""), Intent::General);
        assert_eq!(Intent::parse_lenient("weather_chat"), Intent::General);
        assert_eq!(Intent::parse_lenient("  Inventory_Status "), Intent::InventoryStatus);
    }

    #[test]
    fn only_recommendation_intents_require_judgment() {
        let judged: Vec<_> = Intent::ALL.into_iter().filter(Intent::requires_judgment).collect();
        assert_eq!(
            judged,
            vec![
                Intent::ReorderRecommendation,
                Intent::SalesOpportunity,
                Intent::VendorSelection
            ]
        );
    }
}
