use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use inventra_core::domain::finance::FinancialSummary;
use inventra_core::domain::intent::Intent;
use inventra_core::domain::inventory::InventorySnapshot;
use inventra_core::domain::region::Region;
use inventra_core::domain::sales::SalesPatternSummary;
use inventra_core::domain::vendor::{rank_vendors, VendorPerformance};
use inventra_core::pipeline::format_currency;
use inventra_core::pipeline::{
    DecisionResult, OpportunityDecision, ReorderDecision, Report, VendorDecision,
};
use inventra_db::repositories::{Repositories, VendorRepository};

use crate::error::PipelineError;
use crate::executor::AnalysisExecutor;
use crate::gatherer::DataGatherer;
use crate::tools::ToolRegistry;
use crate::weather::{WeatherForecastTool, WeatherService};

pub const REORDER_VENDOR_LIMIT: usize = 5;
pub const VENDOR_DECISION_LIMIT: usize = 5;
pub const OPPORTUNITY_SALES_WINDOW_DAYS: u32 = 30;
pub const FINANCIAL_HEALTH_WINDOW_DAYS: u32 = 90;
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

const LOW_STOCK_PROMPT_LIMIT: usize = 10;
const TOP_REGION_LIMIT: usize = 3;

pub const DECISION_SYSTEM_PROMPT: &str = "\
You are an intelligent inventory and financial decision agent for Inventra.

Your role is to analyze data and provide actionable recommendations considering:
- Current inventory levels and low-stock situations
- Historical sales patterns and trends
- Weather forecasts and seasonal impacts
- Vendor performance and reliability
- Financial metrics and profitability

When making decisions:
1. Always consider weather impact on product categories
2. Prioritize high-quality, reliable vendors
3. Balance inventory costs with stockout risks
4. Focus on profitable regions and products
5. Provide specific, actionable recommendations with quantities and vendors

Be concise, data-driven, and business-focused in your analysis.";

/// What the decide stage analyses for one query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecisionPlan {
    Reorder { region: Option<Region> },
    SalesOpportunity { category: Option<String>, forecast_days: u32 },
    VendorSelection { sku: Option<String> },
    Nothing,
}

impl DecisionPlan {
    pub fn for_query(
        intent: Intent,
        region: Option<Region>,
        category: Option<&str>,
        sku: Option<&str>,
        forecast_days: u32,
    ) -> Self {
        match intent {
            Intent::ReorderRecommendation => Self::Reorder { region },
            Intent::SalesOpportunity => Self::SalesOpportunity {
                category: category.map(str::to_string),
                forecast_days,
            },
            Intent::VendorSelection => Self::VendorSelection { sku: sku.map(str::to_string) },
            Intent::InventoryStatus
            | Intent::SalesAnalysis
            | Intent::FinancialReport
            | Intent::TicketStatus
            | Intent::General => Self::Nothing,
        }
    }
}

/// Result of the operator-only financial health review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialHealthAnalysis {
    pub region: Option<Region>,
    pub summary: FinancialSummary,
    pub analysis: String,
}

/// Which review [`DecisionMaker::analyze_all_regions`] repeats for every region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionalAnalysisKind {
    Inventory,
    Financial,
    Sales,
}

/// One region's outcome. A failing region does not stop the sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionalAnalysis {
    pub region: Region,
    pub outcome: Result<String, String>,
}

fn region_suffix(region: Option<Region>) -> String {
    region.map(|region| format!(" for {} region", region.canonical_name())).unwrap_or_default()
}

pub fn format_low_stock_items(snapshot: &InventorySnapshot) -> String {
    if snapshot.low_stock_items.is_empty() {
        return "None".to_string();
    }
    snapshot
        .low_stock_items
        .iter()
        .take(LOW_STOCK_PROMPT_LIMIT)
        .map(|item| {
            format!(
                "- {}: {} ({}) - {} units (threshold: {})",
                item.sku, item.name, item.category, item.qty, item.reorder_threshold
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_vendors(vendors: &[VendorPerformance]) -> String {
    if vendors.is_empty() {
        return "None".to_string();
    }
    vendors
        .iter()
        .enumerate()
        .map(|(index, vendor)| {
            format!(
                "{}. {}\n   - Vendor ID: {}\n   - Quality Score: {}/5.0\n   - Reliability: {}\n   - Lead Time: {} days",
                index + 1,
                vendor.name,
                vendor.vendor_id.0,
                vendor.quality_score,
                vendor.reliability,
                vendor.lead_time_days
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn inventory_analysis_prompt(
    region: Option<Region>,
    snapshot: &InventorySnapshot,
    vendors: &[VendorPerformance],
) -> String {
    let target = region.map(|region| region.as_str()).unwrap_or("all regions");
    format!(
        "Analyze inventory situation{suffix}:\n\n\
         Inventory Summary:\n\
         - Total items: {total}\n\
         - Low stock items: {low}\n\n\
         Low Stock Items:\n{items}\n\n\
         Top Available Vendors:\n{vendors}\n\n\
         Task: Use the weather forecast tool to check upcoming weather for {target}, then recommend:\n\
         1. Which items to reorder immediately and why\n\
         2. Recommended quantities based on weather and sales patterns\n\
         3. Best vendors to use for each item\n\
         4. Priority order for each recommendation\n\n\
         Keep recommendations actionable and specific.",
        suffix = region_suffix(region),
        total = snapshot.total_items,
        low = snapshot.low_stock_count,
        items = format_low_stock_items(snapshot),
        vendors = format_vendors(vendors),
    )
}

pub fn sales_opportunity_prompt(
    category: Option<&str>,
    forecast_days: u32,
    sales: &Report<SalesPatternSummary>,
) -> String {
    let suffix = category.map(|category| format!(" for {category}")).unwrap_or_default();
    let (units, revenue, regions) = match sales.ready() {
        Some(summary) => {
            let regions = summary.top_regions(TOP_REGION_LIMIT);
            let regions = if regions.is_empty() { "None".to_string() } else { regions.join(", ") };
            (summary.total_units, format_currency(summary.total_revenue), regions)
        }
        None => (0, format_currency(Default::default()), "None".to_string()),
    };

    format!(
        "Analyze sales opportunities{suffix} for the next {forecast_days} days:\n\n\
         Recent Sales Performance ({OPPORTUNITY_SALES_WINDOW_DAYS} days):\n\
         - Total sales: {units} units\n\
         - Total revenue: {revenue}\n\
         - Top regions: {regions}\n\n\
         Task: Check weather forecast for all regions and identify:\n\
         1. Which product categories will likely see increased demand\n\
         2. Which regions present the best opportunities\n\
         3. Recommended inventory adjustments to capture demand\n\
         4. Expected revenue impact\n\n\
         Focus on weather-sensitive products."
    )
}

pub fn vendor_selection_prompt(sku: Option<&str>, vendors: &[VendorPerformance]) -> String {
    let suffix = sku.map(|sku| format!(" for SKU {sku}")).unwrap_or_default();
    format!(
        "Recommend optimal vendor selection{suffix}:\n\n\
         Vendors by Performance:\n{vendors}\n\n\
         Task: Analyze and recommend:\n\
         1. Best overall vendor\n\
         2. Backup vendor options\n\
         3. Trade-offs between quality, lead time, and reliability\n\
         4. Risk mitigation strategies\n\n\
         Consider quality score, reliability rating, and lead time in your analysis.",
        vendors = format_vendors(vendors),
    )
}

pub fn financial_health_prompt(region: Option<Region>, summary: &FinancialSummary) -> String {
    let margin = summary
        .profit_margin_pct()
        .map(|margin| format!("{:.1}%", margin.round_dp(1)))
        .unwrap_or_else(|| "0.0%".to_string());
    format!(
        "Analyze financial health{suffix} (last {FINANCIAL_HEALTH_WINDOW_DAYS} days):\n\n\
         Financial Summary:\n\
         - Total sales: {sales}\n\
         - Total purchases: {purchases}\n\
         - Net profit: {profit}\n\
         - Profit margin: {margin}\n\
         - Transaction count: {count}\n\n\
         Task: Provide:\n\
         1. Financial health assessment\n\
         2. Key insights on profitability trends\n\
         3. Recommendations to improve margins\n\
         4. Cost optimization opportunities\n\
         5. Revenue growth strategies\n\n\
         Be specific and actionable.",
        suffix = region_suffix(region),
        sales = format_currency(summary.total_sales),
        purchases = format_currency(summary.total_purchases),
        profit = format_currency(summary.net_profit),
        count = summary.transaction_count,
    )
}

fn decision_kind(decision: &DecisionResult) -> &'static str {
    match decision {
        DecisionResult::Reorder(_) => "reorder",
        DecisionResult::SalesOpportunity(_) => "sales_opportunity",
        DecisionResult::VendorSelection(_) => "vendor_selection",
        DecisionResult::Empty => "empty",
    }
}

/// Builds a judgment prompt from current data and hands it to a fresh executor run.
pub struct DecisionMaker {
    gatherer: DataGatherer,
    vendors: Arc<dyn VendorRepository>,
    executor: AnalysisExecutor,
    weather_tools: ToolRegistry,
    forecast_days: u32,
}

impl DecisionMaker {
    pub fn new(
        repositories: &Repositories,
        executor: AnalysisExecutor,
        weather: Arc<WeatherService>,
        forecast_days: u32,
    ) -> Self {
        let mut weather_tools = ToolRegistry::default();
        weather_tools.register(WeatherForecastTool::new(weather));

        Self {
            gatherer: DataGatherer::new(repositories),
            vendors: repositories.vendors.clone(),
            executor,
            weather_tools,
            forecast_days,
        }
    }

    pub async fn decide(
        &self,
        intent: Intent,
        region: Option<Region>,
        category: Option<&str>,
        sku: Option<&str>,
    ) -> Result<DecisionResult, PipelineError> {
        let plan = DecisionPlan::for_query(intent, region, category, sku, self.forecast_days);
        let decision = self.execute(plan).await?;
        info!(
            event_name = "pipeline.decide.completed",
            intent = intent.as_str(),
            decision = decision_kind(&decision),
            "decision produced"
        );
        Ok(decision)
    }

    pub async fn execute(&self, plan: DecisionPlan) -> Result<DecisionResult, PipelineError> {
        match plan {
            DecisionPlan::Reorder { region } => self.reorder(region).await,
            DecisionPlan::SalesOpportunity { category, forecast_days } => {
                self.sales_opportunity(category, forecast_days).await
            }
            DecisionPlan::VendorSelection { sku } => self.vendor_selection(sku).await,
            DecisionPlan::Nothing => Ok(DecisionResult::Empty),
        }
    }

    async fn ranked_vendors(&self) -> Result<Vec<VendorPerformance>, PipelineError> {
        let vendors = self.vendors.list_ranked().await?;
        Ok(rank_vendors(&vendors))
    }

    async fn analyse(&self, prompt: &str, tools: &ToolRegistry) -> Result<String, PipelineError> {
        self.executor
            .run(DECISION_SYSTEM_PROMPT, prompt, tools)
            .await
            .map_err(PipelineError::Decision)
    }

    async fn reorder(&self, region: Option<Region>) -> Result<DecisionResult, PipelineError> {
        let inventory = self.gatherer.inventory_snapshot(region).await?;
        let mut top_vendors = self.ranked_vendors().await?;
        top_vendors.truncate(REORDER_VENDOR_LIMIT);
        let prompt = inventory_analysis_prompt(region, &inventory, &top_vendors);
        let analysis = self.analyse(&prompt, &self.weather_tools).await?;

        Ok(DecisionResult::Reorder(ReorderDecision {
            region,
            low_stock_count: inventory.low_stock_count,
            analysis,
            inventory,
            top_vendors,
        }))
    }

    async fn sales_opportunity(
        &self,
        category: Option<String>,
        forecast_days: u32,
    ) -> Result<DecisionResult, PipelineError> {
        let sales_data = self.gatherer.sales_summary(None, OPPORTUNITY_SALES_WINDOW_DAYS).await?;
        let prompt = sales_opportunity_prompt(category.as_deref(), forecast_days, &sales_data);
        let analysis = self.analyse(&prompt, &self.weather_tools).await?;

        Ok(DecisionResult::SalesOpportunity(OpportunityDecision {
            category,
            forecast_days,
            analysis,
            sales_data,
        }))
    }

    async fn vendor_selection(&self, sku: Option<String>) -> Result<DecisionResult, PipelineError> {
        let mut top_vendors = self.ranked_vendors().await?;
        let prompt = vendor_selection_prompt(sku.as_deref(), &top_vendors);
        let analysis = self.analyse(&prompt, &self.weather_tools).await?;
        top_vendors.truncate(VENDOR_DECISION_LIMIT);

        Ok(DecisionResult::VendorSelection(VendorDecision { sku, analysis, top_vendors }))
    }

    /// Runs the chosen review once per region. Sales opportunities are not region scoped, so that
    /// kind repeats the company-wide analysis for each region.
    pub async fn analyze_all_regions(&self, kind: RegionalAnalysisKind) -> Vec<RegionalAnalysis> {
        let mut results = Vec::with_capacity(Region::ALL.len());
        for region in Region::ALL {
            let outcome = match self.analyse_region(kind, region).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(
                        event_name = "pipeline.regional_analysis.failed",
                        region = region.as_str(),
                        error = %error,
                        "regional analysis failed"
                    );
                    Err(error.to_string())
                }
            };
            results.push(RegionalAnalysis { region, outcome });
        }
        results
    }

    async fn analyse_region(
        &self,
        kind: RegionalAnalysisKind,
        region: Region,
    ) -> Result<Result<String, String>, PipelineError> {
        let decision = match kind {
            RegionalAnalysisKind::Inventory => self.reorder(Some(region)).await?,
            RegionalAnalysisKind::Sales => {
                self.sales_opportunity(None, self.forecast_days).await?
            }
            RegionalAnalysisKind::Financial => {
                return Ok(match self.analyze_financial_health(Some(region)).await? {
                    Report::Ready(health) => Ok(health.analysis),
                    Report::Unavailable { error } => Err(error),
                });
            }
        };
        Ok(Ok(decision.analysis().unwrap_or_default().to_string()))
    }

    /// 90-day financial review. Not reachable from any intent; operators run it directly.
    pub async fn analyze_financial_health(
        &self,
        region: Option<Region>,
    ) -> Result<Report<FinancialHealthAnalysis>, PipelineError> {
        let summary = match self
            .gatherer
            .financial_summary(region, FINANCIAL_HEALTH_WINDOW_DAYS)
            .await?
        {
            Report::Ready(summary) => summary,
            Report::Unavailable { error } => return Ok(Report::Unavailable { error }),
        };
        let analysis = self.analyse(&financial_health_prompt(region, &summary), &self.weather_tools).await?;
        info!(
            event_name = "pipeline.financial_health.completed",
            region = region.map(|region| region.as_str()),
            "financial health analysed"
        );
        Ok(Report::Ready(FinancialHealthAnalysis { region, summary, analysis }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use serde_json::json;

    use inventra_core::domain::finance::{FinanceTransaction, FinancialSummary, TransactionKind};
    use inventra_core::domain::intent::Intent;
    use inventra_core::domain::inventory::{InventoryItem, InventorySnapshot};
    use inventra_core::domain::region::Region;
    use inventra_core::domain::vendor::{Vendor, VendorId, VendorPerformance};
    use inventra_core::pipeline::formatter::NO_FINANCE_DATA;
    use inventra_core::pipeline::{DecisionResult, Report};
    use inventra_db::repositories::{
        InMemoryFinanceRepository, InMemoryInventoryRepository, InMemoryVendorRepository,
        Repositories,
    };

    use super::{
        financial_health_prompt, format_low_stock_items, format_vendors, vendor_selection_prompt,
        DecisionMaker, DecisionPlan, RegionalAnalysisKind, DECISION_SYSTEM_PROMPT,
    };
    use crate::executor::AnalysisExecutor;
    use crate::llm::{ChatReply, ToolCallRequest};
    use crate::testing::ScriptedChatModel;
    use crate::weather::{WeatherService, WEATHER_TOOL_NAME};

    fn vendor(id: &str, quality: f64, lead_time_days: i64) -> Vendor {
        Vendor {
            id: VendorId(id.to_string()),
            name: format!("Vendor {id}"),
            quality_score: quality,
            reliability_rating: 0.9,
            lead_time_days,
            unit_price: Decimal::from(100),
        }
    }

    fn item(sku: &str, qty: i64) -> InventoryItem {
        InventoryItem {
            sku: sku.to_string(),
            name: "Umbrella".to_string(),
            category: "Rainwear".to_string(),
            region: "North".to_string(),
            qty,
            reorder_threshold: 10,
            vendor_id: Some("V1".to_string()),
            unit_price: Decimal::from(300),
        }
    }

    fn repositories() -> Repositories {
        Repositories {
            inventory: Arc::new(InMemoryInventoryRepository::with_items([
                item("UMB-N01", 4),
                item("UMB-N02", 40),
            ])),
            vendors: Arc::new(InMemoryVendorRepository::with_vendors(
                (1..=8).map(|n| vendor(&format!("V{n}"), 3.0 + f64::from(n) / 10.0, 7)),
            )),
            ..Repositories::in_memory()
        }
    }

    fn maker(model: Arc<ScriptedChatModel>, repositories: &Repositories) -> DecisionMaker {
        DecisionMaker::new(
            repositories,
            AnalysisExecutor::new(model, 5),
            Arc::new(WeatherService::offline()),
            7,
        )
    }

    #[test]
    fn only_judgment_intents_have_a_plan() {
        for intent in Intent::ALL {
            let plan = DecisionPlan::for_query(intent, None, None, None, 7);
            assert_eq!(plan != DecisionPlan::Nothing, intent.requires_judgment(), "{intent}");
        }
    }

    #[test]
    fn prompt_sections_render_lists_or_none() {
        assert_eq!(format_low_stock_items(&InventorySnapshot::default()), "None");
        assert_eq!(format_vendors(&[]), "None");

        let snapshot = InventorySnapshot::from_items(&[item("UMB-N01", 4)]);
        assert_eq!(
            format_low_stock_items(&snapshot),
            "- UMB-N01: Umbrella (Rainwear) - 4 units (threshold: 10)"
        );

        let vendors = [VendorPerformance::from(&vendor("V9", 4.5, 3))];
        assert_eq!(
            format_vendors(&vendors),
            "1. Vendor V9\n   - Vendor ID: V9\n   - Quality Score: 4.5/5.0\n   - Reliability: 0.9\n   - Lead Time: 3 days"
        );
        assert!(vendor_selection_prompt(Some("UMB-N01"), &vendors)
            .starts_with("Recommend optimal vendor selection for SKU UMB-N01:"));
    }

    #[test]
    fn financial_prompt_shows_currency_and_margin() {
        let summary = FinancialSummary {
            total_sales: Decimal::from(1000),
            total_purchases: Decimal::from(750),
            net_profit: Decimal::from(250),
            transaction_count: 2,
            avg_transaction_value: Decimal::from(875),
            period: "last 90 days".to_string(),
            window_days: 90,
            used_all_time_fallback: false,
        };
        let prompt = financial_health_prompt(Some(Region::West), &summary);

        assert!(prompt.starts_with("Analyze financial health for West region (last 90 days):"));
        assert!(prompt.contains("- Net profit: Rs 250.00"));
        assert!(prompt.contains("- Profit margin: 25.0%"));
    }

    #[tokio::test]
    async fn reorder_prompts_with_low_stock_and_top_five_vendors() {
        let repositories = repositories();
        let model = Arc::new(ScriptedChatModel::new([
            ChatReply::calls(vec![ToolCallRequest {
                id: "w1".to_string(),
                name: WEATHER_TOOL_NAME.to_string(),
                arguments: json!({ "region": "north", "days": 3 }).to_string(),
            }]),
            ChatReply::text("Reorder 16 units of UMB-N01 from Vendor V8."),
        ]));

        let decision = maker(model.clone(), &repositories)
            .decide(Intent::ReorderRecommendation, Some(Region::North), None, None)
            .await
            .expect("decide");

        let DecisionResult::Reorder(reorder) = decision else { panic!("expected reorder decision") };
        assert_eq!(reorder.low_stock_count, 1);
        assert_eq!(reorder.top_vendors.len(), 5);
        assert_eq!(reorder.top_vendors[0].vendor_id, VendorId("V8".to_string()));
        assert_eq!(reorder.analysis, "Reorder 16 units of UMB-N01 from Vendor V8.");

        let transcripts = model.transcripts().await;
        assert_eq!(transcripts[0][0].content, DECISION_SYSTEM_PROMPT);
        let prompt = &transcripts[0][1].content;
        assert!(prompt.starts_with("Analyze inventory situation for North region:"));
        assert!(prompt.contains("- UMB-N01: Umbrella (Rainwear) - 4 units (threshold: 10)"));
        assert!(!prompt.contains("6. Vendor"));
        assert_eq!(model.offered_tools().await[0], vec![WEATHER_TOOL_NAME.to_string()]);

        let tool_reply = &transcripts[1][3].content;
        assert!(tool_reply.starts_with("Weather forecast for north (3 days):"));
    }

    #[tokio::test]
    async fn opportunity_without_sales_still_prompts_with_zeroes() {
        let repositories = repositories();
        let model = Arc::new(ScriptedChatModel::new([ChatReply::text("Stock umbrellas in the east.")]));

        let decision = maker(model.clone(), &repositories)
            .decide(Intent::SalesOpportunity, None, Some("Rainwear"), None)
            .await
            .expect("decide");

        let DecisionResult::SalesOpportunity(opportunity) = decision else {
            panic!("expected opportunity decision")
        };
        assert_eq!(opportunity.forecast_days, 7);
        assert!(opportunity.sales_data.ready().is_none());

        let prompt = &model.transcripts().await[0][1].content;
        assert!(prompt.starts_with("Analyze sales opportunities for Rainwear for the next 7 days:"));
        assert!(prompt.contains("- Total revenue: Rs 0.00\n- Top regions: None"));
    }

    #[tokio::test]
    async fn vendor_selection_prompts_every_vendor_and_keeps_five() {
        let repositories = Repositories {
            vendors: Arc::new(InMemoryVendorRepository::with_vendors(
                (1..=12).map(|n| vendor(&format!("V{n}"), 5.0 - f64::from(n) / 10.0, 7)),
            )),
            ..repositories()
        };
        let model = Arc::new(ScriptedChatModel::new([ChatReply::text("Use V1, back up with V2.")]));

        let decision = maker(model.clone(), &repositories)
            .decide(Intent::VendorSelection, None, None, Some("UMB-N01"))
            .await
            .expect("decide");

        let DecisionResult::VendorSelection(selection) = decision else {
            panic!("expected vendor decision")
        };
        assert_eq!(selection.top_vendors.len(), 5);
        assert_eq!(selection.top_vendors[0].vendor_id, VendorId("V1".to_string()));
        assert_eq!(selection.sku.as_deref(), Some("UMB-N01"));

        let prompt = &model.transcripts().await[0][1].content;
        assert!(prompt.contains("11. Vendor V11"));
        assert!(prompt.contains("12. Vendor V12"));
        assert!(!prompt.contains("Top 10"));
        assert_eq!(model.offered_tools().await[0], vec![WEATHER_TOOL_NAME.to_string()]);
    }

    #[tokio::test]
    async fn executor_failures_become_decision_errors() {
        let repositories = repositories();
        let error = maker(Arc::new(ScriptedChatModel::default()), &repositories)
            .decide(Intent::VendorSelection, None, None, None)
            .await
            .expect_err("no scripted replies");
        assert!(error.to_string().starts_with("decision failed"));
    }

    #[tokio::test]
    async fn financial_health_is_unavailable_without_transactions() {
        let repositories = repositories();
        let model = Arc::new(ScriptedChatModel::default());

        let report = maker(model.clone(), &repositories)
            .analyze_financial_health(Some(Region::North))
            .await
            .expect("analysis");

        assert_eq!(report, Report::unavailable(NO_FINANCE_DATA));
        assert_eq!(model.calls().await, 0);
    }

    #[tokio::test]
    async fn financial_health_runs_the_executor_on_the_summary() {
        let today = Utc::now().date_naive();
        let repositories = Repositories {
            finance: Arc::new(InMemoryFinanceRepository::with_transactions([
                FinanceTransaction {
                    date: today,
                    kind: TransactionKind::Sale,
                    amount: Decimal::from(1000),
                    region: "North".to_string(),
                    sku: None,
                },
                FinanceTransaction {
                    date: today,
                    kind: TransactionKind::Purchase,
                    amount: Decimal::from(750),
                    region: "North".to_string(),
                    sku: None,
                },
            ])),
            ..repositories()
        };
        let model = Arc::new(ScriptedChatModel::new([ChatReply::text("Margins are healthy.")]));

        let report = maker(model, &repositories)
            .analyze_financial_health(Some(Region::North))
            .await
            .expect("analysis");

        let analysis = report.ready().expect("ready");
        assert_eq!(analysis.summary.net_profit, Decimal::from(250));
        assert_eq!(analysis.analysis, "Margins are healthy.");
    }

    #[tokio::test]
    async fn regional_sweep_keeps_going_past_missing_data_and_failures() {
        let repositories = Repositories {
            finance: Arc::new(InMemoryFinanceRepository::with_transactions([FinanceTransaction {
                date: Utc::now().date_naive(),
                kind: TransactionKind::Sale,
                amount: Decimal::from(1000),
                region: "North".to_string(),
                sku: None,
            }])),
            ..repositories()
        };
        let model = Arc::new(ScriptedChatModel::new([ChatReply::text("North margins are healthy.")]));
        let maker = maker(model.clone(), &repositories);

        let financial = maker.analyze_all_regions(RegionalAnalysisKind::Financial).await;

        let regions: Vec<_> = financial.iter().map(|result| result.region).collect();
        assert_eq!(regions, Region::ALL.to_vec());
        assert_eq!(financial[0].outcome, Ok("North margins are healthy.".to_string()));
        assert!(financial[1..].iter().all(|result| result.outcome == Err(NO_FINANCE_DATA.to_string())));
        assert_eq!(model.calls().await, 1);

        let inventory = maker.analyze_all_regions(RegionalAnalysisKind::Inventory).await;
        assert_eq!(inventory.len(), 5);
        assert!(inventory
            .iter()
            .all(|result| result.outcome.as_ref().is_err_and(|error| error.starts_with("decision failed"))));
    }
}
