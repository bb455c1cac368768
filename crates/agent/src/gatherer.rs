use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use inventra_core::domain::finance::FinancialSummary;
use inventra_core::domain::intent::Intent;
use inventra_core::domain::inventory::{
    critical_items, InventoryReport, InventorySnapshot, CRITICAL_COVERAGE_DAYS,
};
use inventra_core::domain::region::Region;
use inventra_core::domain::sales::{
    sales_velocity, trending_products, ProductSales, RegionalPerformance, SalesPatternSummary,
    WeatherImpact,
};
use inventra_core::domain::ticket::{TicketSnapshot, TicketStatus};
use inventra_core::pipeline::formatter::{NO_FINANCE_DATA, NO_SALES_DATA};
use inventra_core::pipeline::{DataResult, Report};
use inventra_db::repositories::{
    FinanceRepository, InventoryRepository, Repositories, RepositoryError, SalesRepository,
    TicketRepository,
};

pub const GATHER_WINDOW_DAYS: u32 = 365;
pub const PENDING_TICKET_LIMIT: u32 = 50;
pub const VELOCITY_WINDOW_DAYS: u32 = 30;

/// What the gather stage reads for one query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatherPlan {
    Inventory { region: Option<Region> },
    Sales { sku: Option<String>, window_days: u32 },
    Financial { region: Option<Region>, window_days: u32 },
    PendingTickets { limit: u32 },
    Nothing,
}

impl GatherPlan {
    pub fn for_query(intent: Intent, region: Option<Region>, sku: Option<&str>) -> Self {
        match intent {
            Intent::InventoryStatus => Self::Inventory { region },
            Intent::SalesAnalysis => {
                Self::Sales { sku: sku.map(str::to_string), window_days: GATHER_WINDOW_DAYS }
            }
            Intent::FinancialReport => Self::Financial { region, window_days: GATHER_WINDOW_DAYS },
            Intent::TicketStatus => Self::PendingTickets { limit: PENDING_TICKET_LIMIT },
            Intent::ReorderRecommendation
            | Intent::SalesOpportunity
            | Intent::VendorSelection
            | Intent::General => Self::Nothing,
        }
    }
}

fn window_start(window_days: u32) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(i64::from(window_days))
}

fn payload_kind(data: &DataResult) -> &'static str {
    match data {
        DataResult::Inventory(_) => "inventory",
        DataResult::Sales(_) => "sales",
        DataResult::Financial(_) => "financial",
        DataResult::Tickets(_) => "tickets",
        DataResult::Empty => "empty",
    }
}

/// Read-only access to the stores the gather and decide stages summarise.
#[derive(Clone)]
pub struct DataGatherer {
    inventory: Arc<dyn InventoryRepository>,
    sales: Arc<dyn SalesRepository>,
    finance: Arc<dyn FinanceRepository>,
    tickets: Arc<dyn TicketRepository>,
}

impl DataGatherer {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            inventory: repositories.inventory.clone(),
            sales: repositories.sales.clone(),
            finance: repositories.finance.clone(),
            tickets: repositories.tickets.clone(),
        }
    }

    pub async fn gather(
        &self,
        intent: Intent,
        region: Option<Region>,
        sku: Option<&str>,
    ) -> Result<DataResult, RepositoryError> {
        let data = self.execute(GatherPlan::for_query(intent, region, sku)).await?;
        info!(
            event_name = "pipeline.gather.completed",
            intent = intent.as_str(),
            payload = payload_kind(&data),
            "data gathered"
        );
        Ok(data)
    }

    pub async fn execute(&self, plan: GatherPlan) -> Result<DataResult, RepositoryError> {
        Ok(match plan {
            GatherPlan::Inventory { region } => DataResult::Inventory(self.inventory_snapshot(region).await?),
            GatherPlan::Sales { sku, window_days } => {
                DataResult::Sales(self.sales_summary(sku.as_deref(), window_days).await?)
            }
            GatherPlan::Financial { region, window_days } => {
                DataResult::Financial(self.financial_summary(region, window_days).await?)
            }
            GatherPlan::PendingTickets { limit } => {
                DataResult::Tickets(self.pending_tickets(limit).await?)
            }
            GatherPlan::Nothing => DataResult::Empty,
        })
    }

    pub async fn inventory_snapshot(
        &self,
        region: Option<Region>,
    ) -> Result<InventorySnapshot, RepositoryError> {
        let items = self.inventory.list_items(region.map(|region| region.canonical_name())).await?;
        Ok(InventorySnapshot::from_items(&items))
    }

    /// Summarises the last `window_days` of sales, falling back to all recorded sales when the
    /// window is empty. The summary keeps the requested period label either way.
    pub async fn sales_summary(
        &self,
        sku: Option<&str>,
        window_days: u32,
    ) -> Result<Report<SalesPatternSummary>, RepositoryError> {
        let mut records = self.sales.list_sales(Some(window_start(window_days)), sku).await?;
        let mut used_all_time_fallback = false;
        if records.is_empty() {
            records = self.sales.list_sales(None, sku).await?;
            used_all_time_fallback = !records.is_empty();
            if used_all_time_fallback {
                warn!(
                    event_name = "pipeline.gather.all_time_fallback",
                    source = "sales",
                    window_days,
                    rows = records.len(),
                    "requested window was empty; summarising all recorded sales"
                );
            }
        }

        Ok(match SalesPatternSummary::from_records(&records, window_days) {
            Some(mut summary) => {
                summary.used_all_time_fallback = used_all_time_fallback;
                Report::Ready(summary)
            }
            None => Report::unavailable(NO_SALES_DATA),
        })
    }

    pub async fn financial_summary(
        &self,
        region: Option<Region>,
        window_days: u32,
    ) -> Result<Report<FinancialSummary>, RepositoryError> {
        let region_name = region.map(|region| region.canonical_name());
        let mut transactions =
            self.finance.list_transactions(Some(window_start(window_days)), region_name).await?;
        let mut used_all_time_fallback = false;
        if transactions.is_empty() {
            transactions = self.finance.list_transactions(None, region_name).await?;
            used_all_time_fallback = !transactions.is_empty();
            if used_all_time_fallback {
                warn!(
                    event_name = "pipeline.gather.all_time_fallback",
                    source = "finance",
                    window_days,
                    rows = transactions.len(),
                    "requested window was empty; summarising all recorded transactions"
                );
            }
        }

        Ok(match FinancialSummary::from_transactions(&transactions, window_days) {
            Some(mut summary) => {
                summary.used_all_time_fallback = used_all_time_fallback;
                Report::Ready(summary)
            }
            None => Report::unavailable(NO_FINANCE_DATA),
        })
    }

    /// Average daily units for one sku over the window. No fallback to older sales.
    pub async fn sales_velocity(&self, sku: &str, window_days: u32) -> Result<f64, RepositoryError> {
        let records = self.sales.list_sales(Some(window_start(window_days)), Some(sku)).await?;
        Ok(sales_velocity(&records, window_days))
    }

    /// Snapshot enriched with the last 30 days of sales and the low-stock items that would sell
    /// out within a week at their current pace.
    pub async fn inventory_report(
        &self,
        region: Option<Region>,
    ) -> Result<InventoryReport, RepositoryError> {
        let snapshot = self.inventory_snapshot(region).await?;
        let (avg_daily_units, revenue) =
            match self.sales_summary(None, VELOCITY_WINDOW_DAYS).await? {
                Report::Ready(summary) => (summary.avg_daily_units, summary.total_revenue),
                Report::Unavailable { .. } => (0.0, Decimal::ZERO),
            };

        let mut velocities = Vec::with_capacity(snapshot.low_stock_items.len());
        for item in &snapshot.low_stock_items {
            let velocity = self.sales_velocity(&item.sku, VELOCITY_WINDOW_DAYS).await?;
            velocities.push((item.clone(), velocity));
        }
        let critical_items = critical_items(&velocities, CRITICAL_COVERAGE_DAYS);

        Ok(InventoryReport {
            snapshot,
            window_days: VELOCITY_WINDOW_DAYS,
            avg_daily_units,
            revenue,
            critical_items,
        })
    }

    pub async fn trending_products(
        &self,
        window_days: u32,
        min_units: i64,
    ) -> Result<Vec<ProductSales>, RepositoryError> {
        let records = self.sales.list_sales(Some(window_start(window_days)), None).await?;
        Ok(trending_products(&records, min_units))
    }

    pub async fn regional_performance(
        &self,
        window_days: u32,
    ) -> Result<Report<RegionalPerformance>, RepositoryError> {
        let records = self.sales.list_sales(Some(window_start(window_days)), None).await?;
        Ok(RegionalPerformance::from_records(&records, window_days)
            .map_or_else(|| Report::unavailable(NO_SALES_DATA), Report::Ready))
    }

    /// Weather split over all recorded sales, optionally restricted to one inventory category.
    pub async fn weather_impact(
        &self,
        category: Option<&str>,
    ) -> Result<Report<WeatherImpact>, RepositoryError> {
        let mut records = self.sales.list_sales(None, None).await?;
        if let Some(category) = category {
            let skus: HashSet<String> = self
                .inventory
                .list_items(None)
                .await?
                .into_iter()
                .filter(|item| item.category.eq_ignore_ascii_case(category))
                .map(|item| item.sku)
                .collect();
            records.retain(|record| skus.contains(&record.sku));
        }

        Ok(WeatherImpact::from_records(&records, category)
            .map_or_else(|| Report::unavailable(NO_SALES_DATA), Report::Ready))
    }

    pub async fn pending_tickets(&self, limit: u32) -> Result<TicketSnapshot, RepositoryError> {
        let tickets = self.tickets.list(Some(TicketStatus::Pending), limit).await?;
        let stats = self.tickets.stats().await?;
        Ok(TicketSnapshot { tickets, stats })
    }
}
