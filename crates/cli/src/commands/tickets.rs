use inventra_agent::tickets::DEFAULT_LIST_LIMIT;
use inventra_agent::{PipelineController, TicketService};
use inventra_core::domain::intent::Intent;
use inventra_core::domain::ticket::{TicketId, TicketPriority, TicketSnapshot, TicketStatus};
use inventra_core::pipeline::formatter::format_tickets;
use inventra_core::pipeline::DecisionResult;
use inventra_db::Repositories;
use uuid::Uuid;

use crate::commands::{
    block_on, load_config, open_database, parse_region, pipeline_failure, repository_failure,
    CommandResult, Failure,
};

pub enum TicketAction {
    List { status: Option<String>, limit: Option<u32> },
    ByPriority { priority: String, limit: Option<u32> },
    CreateFromReorder { region: Option<String> },
    Update { id: i64, status: String },
}

pub fn run(action: TicketAction) -> CommandResult {
    let config = match load_config("tickets") {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on("tickets", async {
        let pool = open_database(&config).await?;
        let repositories = Repositories::sqlite(pool.clone());
        let service = TicketService::new(&repositories);

        let outcome = match action {
            TicketAction::List { status, limit } => {
                let status = status.as_deref().map(parse_status).transpose()?;
                let tickets = service
                    .list(status, limit.unwrap_or(DEFAULT_LIST_LIMIT))
                    .await
                    .map_err(repository_failure)?;
                let stats = service.stats().await.map_err(repository_failure)?;
                Ok(format_tickets(&TicketSnapshot { tickets, stats }))
            }
            TicketAction::ByPriority { priority, limit } => {
                let priority = parse_priority(&priority)?;
                let tickets = service
                    .by_priority(priority, limit.unwrap_or(DEFAULT_LIST_LIMIT))
                    .await
                    .map_err(repository_failure)?;
                let stats = service.stats().await.map_err(repository_failure)?;
                Ok(format_tickets(&TicketSnapshot { tickets, stats }))
            }
            TicketAction::CreateFromReorder { region } => {
                let region = parse_region(region.as_deref())?;
                let controller = PipelineController::from_config(&config, &repositories)
                    .map_err(|error| ("agent_init", error.to_string(), 3u8))?;
                let correlation_id = Uuid::new_v4().to_string();
                let decision = controller
                    .decision_maker()
                    .decide(Intent::ReorderRecommendation, region, None, None)
                    .await
                    .map_err(|error| pipeline_failure(error, &correlation_id))?;

                match decision {
                    DecisionResult::Reorder(reorder) => {
                        let created = service
                            .create_from_reorder(&reorder)
                            .await
                            .map_err(repository_failure)?;
                        Ok(format!(
                            "created {} reorder tickets for {} low-stock items",
                            created.len(),
                            reorder.low_stock_count
                        ))
                    }
                    _ => Ok("no reorder decision produced".to_string()),
                }
            }
            TicketAction::Update { id, status } => {
                let status = parse_status(&status)?;
                if service.update_status(TicketId(id), status).await.map_err(repository_failure)? {
                    Ok(format!("ticket {id} is now {}", status.as_str()))
                } else {
                    Err(("not_found", format!("ticket {id} does not exist"), 8))
                }
            }
        };

        pool.close().await;
        outcome
    })
}

fn parse_status(token: &str) -> Result<TicketStatus, Failure> {
    token.parse::<TicketStatus>().map_err(|error| ("bad_request", error.to_string(), 8))
}

fn parse_priority(token: &str) -> Result<TicketPriority, Failure> {
    token.parse::<TicketPriority>().map_err(|error| ("bad_request", error.to_string(), 8))
}
