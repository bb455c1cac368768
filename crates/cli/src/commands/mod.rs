pub mod ask;
pub mod chat;
pub mod config;
pub mod doctor;
pub mod finance_health;
pub mod history;
pub mod insights;
pub mod migrate;
pub mod seed;
pub mod stats;
pub mod tickets;

use std::future::Future;

use inventra_core::config::{AppConfig, LoadOptions};
use inventra_core::domain::region::Region;
use inventra_core::errors::ApplicationError;
use inventra_db::{connect_from_config, migrations, DbPool};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Error class, message and exit code of a failed step.
pub type Failure = (&'static str, String, u8);

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })
}

/// Drives `future` on a fresh single-threaded runtime and folds the outcome into a result.
pub(crate) fn block_on<F>(command: &str, future: F) -> CommandResult
where
    F: Future<Output = Result<String, Failure>>,
{
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(future) {
        Ok(message) => CommandResult::success(command, message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(command, error_class, message, exit_code)
        }
    }
}

/// Connects and applies pending migrations.
pub(crate) async fn open_database(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_from_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) fn repository_failure(error: impl std::fmt::Display) -> Failure {
    ("repository", error.to_string(), 5)
}

/// Logs the full error and hands back only the user-safe message.
pub(crate) fn pipeline_failure(error: impl Into<ApplicationError>, correlation_id: &str) -> Failure {
    let error = error.into();
    tracing::error!(
        event_name = "cli.pipeline.failed",
        correlation_id,
        error = %error,
        "query failed"
    );
    let interface = error.into_interface(correlation_id);
    ("pipeline", interface.user_message().to_string(), 7)
}

pub(crate) fn parse_region(region: Option<&str>) -> Result<Option<Region>, Failure> {
    region
        .map(|token| token.parse::<Region>())
        .transpose()
        .map_err(|error| ("bad_request", error.to_string(), 8))
}
