use inventra_agent::{
    FinancialHealthAnalysis, PipelineController, RegionalAnalysis, RegionalAnalysisKind,
};
use inventra_core::pipeline::formatter::format_financial;
use inventra_core::pipeline::Report;
use inventra_db::Repositories;
use uuid::Uuid;

use crate::commands::{
    block_on, load_config, open_database, parse_region, pipeline_failure, CommandResult,
};

/// Which regions the financial review covers.
pub enum FinanceScope {
    Single { region: Option<String> },
    AllRegions,
}

pub fn run(scope: FinanceScope) -> CommandResult {
    let config = match load_config("finance-health") {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on("finance-health", async {
        let region = match &scope {
            FinanceScope::Single { region } => parse_region(region.as_deref())?,
            FinanceScope::AllRegions => None,
        };
        let pool = open_database(&config).await?;
        let repositories = Repositories::sqlite(pool.clone());
        let controller = PipelineController::from_config(&config, &repositories)
            .map_err(|error| ("agent_init", error.to_string(), 3u8))?;

        let correlation_id = Uuid::new_v4().to_string();
        let decision_maker = controller.decision_maker();
        let outcome = match scope {
            FinanceScope::Single { .. } => decision_maker
                .analyze_financial_health(region)
                .await
                .map(|report| render(&report))
                .map_err(|error| pipeline_failure(error, &correlation_id)),
            FinanceScope::AllRegions => Ok(render_regions(
                &decision_maker.analyze_all_regions(RegionalAnalysisKind::Financial).await,
            )),
        };
        pool.close().await;
        outcome
    })
}

fn render(report: &Report<FinancialHealthAnalysis>) -> String {
    match report {
        Report::Ready(health) => format!(
            "{}\n\nAnalysis:\n{}",
            format_financial(&Report::Ready(health.summary.clone()), health.region),
            health.analysis.trim()
        ),
        Report::Unavailable { error } => format!("Financial health unavailable: {error}"),
    }
}

fn render_regions(results: &[RegionalAnalysis]) -> String {
    results
        .iter()
        .map(|result| match &result.outcome {
            Ok(analysis) => format!("== {} ==\n{}", result.region, analysis.trim()),
            Err(error) => format!("== {} ==\nunavailable: {error}", result.region),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
