use inventra_agent::PipelineController;
use inventra_core::domain::conversation::SessionId;
use inventra_db::Repositories;
use uuid::Uuid;

use crate::commands::{block_on, load_config, open_database, pipeline_failure, CommandResult, Failure};

pub fn run(query: &str, session: Option<&str>) -> CommandResult {
    let config = match load_config("ask") {
        Ok(config) => config,
        Err(result) => return result,
    };

    block_on("ask", async {
        let pool = open_database(&config).await?;
        let repositories = Repositories::sqlite(pool.clone());
        let controller = PipelineController::from_config(&config, &repositories)
            .map_err(|error| ("agent_init", error.to_string(), 3u8))?;

        let session = session.map(|id| SessionId(id.to_string()));
        let reply = answer(&controller, query, session.as_ref()).await;
        pool.close().await;
        reply
    })
}

/// Runs one query through the pipeline. Failures carry only the user-facing message.
pub async fn answer(
    controller: &PipelineController,
    query: &str,
    session: Option<&SessionId>,
) -> Result<String, Failure> {
    let query = query.trim();
    if query.is_empty() {
        return Err(("bad_request", "query must not be empty".to_string(), 8));
    }

    let correlation_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("cli.ask", correlation_id = correlation_id.as_str());
    let _entered = span.enter();

    controller
        .run_in_session(query, session)
        .await
        .map(|outcome| outcome.response)
        .map_err(|error| pipeline_failure(error, &correlation_id))
}
