use std::env;
use std::io::Cursor;
use std::sync::{Arc, Mutex, OnceLock};

use inventra_agent::llm::ChatReply;
use inventra_agent::testing::{ScriptedChatModel, ScriptedLlm};
use inventra_agent::{PipelineController, WeatherService};
use inventra_cli::commands::{ask, chat, config, migrate, seed, stats};
use inventra_core::config::AppConfig;
use inventra_core::domain::conversation::SessionId;
use inventra_core::pipeline::formatter::GREETING;
use inventra_db::Repositories;
use serde_json::Value;

const IN_MEMORY_DB: (&str, &str) = ("INVENTRA_DATABASE_URL", "sqlite::memory:");

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[IN_MEMORY_DB], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn seed_reports_loaded_counts() {
    with_env(&[IN_MEMORY_DB], || {
        let result = seed::run();
        assert_eq!(result.exit_code, 0, "expected seed success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("demo dataset loaded:"), "{message}");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    with_env(&[IN_MEMORY_DB], || {
        let first = parse_payload(&seed::run().output);
        let second = parse_payload(&seed::run().output);

        assert_eq!(first["status"], "ok");
        assert_eq!(second["status"], "ok");
        assert_eq!(first["message"], second["message"]);
    });
}

#[test]
fn openai_without_a_key_is_a_config_failure() {
    with_env(&[IN_MEMORY_DB, ("INVENTRA_LLM_PROVIDER", "openai")], || {
        let result = stats::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "stats");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn stats_renders_dashboards_without_the_model() {
    with_env(&[IN_MEMORY_DB], || {
        let result = stats::run();
        assert_eq!(result.exit_code, 0, "expected stats success: {}", result.output);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.starts_with("INVENTORY STATUS"), "{message}");
    });
}

#[test]
fn ask_hides_model_failures_behind_a_user_message() {
    with_env(&[IN_MEMORY_DB, ("INVENTRA_LLM_BASE_URL", "http://127.0.0.1:9")], || {
        let result = ask::run("What's low on stock in north?", None);
        assert_eq!(result.exit_code, 7, "expected pipeline failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "ask");
        assert_eq!(payload["error_class"], "pipeline");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(!message.contains("127.0.0.1"), "transport detail leaked: {message}");
    });
}

#[test]
fn config_attributes_env_sources_and_redacts_keys() {
    with_env(
        &[
            IN_MEMORY_DB,
            ("INVENTRA_LLM_PROVIDER", "openai"),
            ("INVENTRA_LLM_API_KEY", "sk-live-secret"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);

            let payload = parse_payload(&result.output);
            let message = payload["message"].as_str().unwrap_or_default();
            assert!(message.contains("- llm.api_key = sk-*** (source: env (INVENTRA_LLM_API_KEY))"));
            assert!(message.contains("- database.url = sqlite::memory: (source: env (INVENTRA_DATABASE_URL))"));
            assert!(!message.contains("secret"), "{message}");
        },
    );
}

#[tokio::test]
async fn chat_session_answers_and_shows_history() {
    let repositories = Repositories::in_memory();
    let controller = PipelineController::assemble(
        &AppConfig::default(),
        &repositories,
        Arc::new(ScriptedLlm::new(["intent: general\nregion: none\ncategory: none\nsku: none"])),
        Arc::new(ScriptedChatModel::always(ChatReply::text("unused"))),
        Arc::new(WeatherService::offline()),
    );
    let session = SessionId("chat-test".to_string());
    let input = Cursor::new("hello\n\nhistory\nexit\nignored after exit\n");
    let mut output = Vec::new();

    let turns = chat::converse(
        &controller,
        repositories.conversations.as_ref(),
        &session,
        10,
        input,
        &mut output,
    )
    .await
    .expect("chat loop completes");

    let transcript = String::from_utf8(output).expect("utf8 transcript");
    assert_eq!(turns, 1);
    assert!(transcript.contains(&format!("inventra> {GREETING}")), "{transcript}");
    assert!(transcript.contains("You: hello"), "{transcript}");
    assert!(!transcript.contains("ignored after exit"));
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "INVENTRA_DATABASE_URL",
        "INVENTRA_DATABASE_MAX_CONNECTIONS",
        "INVENTRA_DATABASE_TIMEOUT_SECS",
        "INVENTRA_LLM_PROVIDER",
        "INVENTRA_LLM_API_KEY",
        "OPENAI_API_KEY",
        "INVENTRA_LLM_BASE_URL",
        "INVENTRA_LLM_MODEL",
        "INVENTRA_LLM_TIMEOUT_SECS",
        "INVENTRA_LLM_TEMPERATURE",
        "INVENTRA_WEATHER_API_KEY",
        "OPENWEATHER_API_KEY",
        "INVENTRA_WEATHER_BASE_URL",
        "INVENTRA_PIPELINE_MAX_ITERATIONS",
        "INVENTRA_PIPELINE_FORECAST_DAYS",
        "INVENTRA_SERVER_BIND_ADDRESS",
        "INVENTRA_SERVER_PORT",
        "INVENTRA_LOGGING_LEVEL",
        "INVENTRA_LOGGING_FORMAT",
        "INVENTRA_LOG_LEVEL",
        "INVENTRA_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
