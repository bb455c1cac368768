use std::sync::Arc;

use inventra_agent::PipelineController;
use inventra_core::config::AppConfig;
use inventra_db::{connect_from_config, migrations, DbPool, Repositories};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub controller: Arc<PipelineController>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("pipeline initialisation failed: {0}")]
    Pipeline(#[source] anyhow::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", correlation_id = "bootstrap", "starting application bootstrap");

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let repositories = Repositories::sqlite(db_pool.clone());
    let controller = PipelineController::from_config(&config, &repositories)
        .map_err(BootstrapError::Pipeline)?;
    info!(
        event_name = "system.bootstrap.pipeline_ready",
        correlation_id = "bootstrap",
        llm_provider = config.llm.provider.as_str(),
        llm_model = config.llm.model.as_str(),
        weather_enabled = config.weather.has_api_key(),
        "pipeline controller assembled"
    );

    Ok(Application { config, db_pool, controller: Arc::new(controller) })
}
