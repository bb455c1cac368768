use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use inventra_core::config::AppConfig;
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use crate::commands::{load_config, CommandResult};

/// Where a setting's effective value came from, checked in precedence order.
struct SourceLookup<'a> {
    doc: Option<Value>,
    path: Option<&'a Path>,
}

impl SourceLookup<'_> {
    fn source(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if self.doc.as_ref().is_some_and(|doc| contains_path(doc, key_path)) {
            let file_path = self
                .path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }

        "default".to_string()
    }
}

struct Entry {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

impl Entry {
    fn new(key: &'static str, value: String, env_keys: &'static [&'static str]) -> Self {
        Self { key, value, env_keys }
    }
}

pub fn run() -> CommandResult {
    match load_config("config") {
        Ok(config) => CommandResult::success("config", render(&config)),
        Err(result) => result,
    }
}

fn render(config: &AppConfig) -> String {
    let path = detect_config_path();
    let lookup = SourceLookup { doc: load_config_file_doc(path.as_deref()), path: path.as_deref() };

    let entries = [
        Entry::new("database.url", config.database.url.clone(), &["INVENTRA_DATABASE_URL"]),
        Entry::new(
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["INVENTRA_DATABASE_MAX_CONNECTIONS"],
        ),
        Entry::new(
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["INVENTRA_DATABASE_TIMEOUT_SECS"],
        ),
        Entry::new("llm.provider", config.llm.provider.as_str().to_string(), &["INVENTRA_LLM_PROVIDER"]),
        Entry::new("llm.model", config.llm.model.clone(), &["INVENTRA_LLM_MODEL"]),
        Entry::new("llm.base_url", config.llm.resolved_base_url(), &["INVENTRA_LLM_BASE_URL"]),
        Entry::new(
            "llm.api_key",
            redact_secret(config.llm.api_key.as_ref()),
            &["INVENTRA_LLM_API_KEY", "OPENAI_API_KEY"],
        ),
        Entry::new("llm.timeout_secs", config.llm.timeout_secs.to_string(), &["INVENTRA_LLM_TIMEOUT_SECS"]),
        Entry::new("llm.temperature", config.llm.temperature.to_string(), &["INVENTRA_LLM_TEMPERATURE"]),
        Entry::new(
            "weather.api_key",
            redact_secret(config.weather.api_key.as_ref()),
            &["INVENTRA_WEATHER_API_KEY", "OPENWEATHER_API_KEY"],
        ),
        Entry::new("weather.base_url", config.weather.base_url.clone(), &["INVENTRA_WEATHER_BASE_URL"]),
        Entry::new(
            "pipeline.max_iterations",
            config.pipeline.max_iterations.to_string(),
            &["INVENTRA_PIPELINE_MAX_ITERATIONS"],
        ),
        Entry::new(
            "pipeline.forecast_days",
            config.pipeline.forecast_days.to_string(),
            &["INVENTRA_PIPELINE_FORECAST_DAYS"],
        ),
        Entry::new("pipeline.history_limit", config.pipeline.history_limit.to_string(), &[]),
        Entry::new(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["INVENTRA_SERVER_BIND_ADDRESS"],
        ),
        Entry::new("server.port", config.server.port.to_string(), &["INVENTRA_SERVER_PORT"]),
        Entry::new(
            "logging.level",
            config.logging.level.clone(),
            &["INVENTRA_LOGGING_LEVEL", "INVENTRA_LOG_LEVEL"],
        ),
        Entry::new(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["INVENTRA_LOGGING_FORMAT", "INVENTRA_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.iter().map(|entry| {
        format!(
            "- {} = {} (source: {})",
            entry.key,
            entry.value,
            lookup.source(entry.key, entry.env_keys)
        )
    }));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["inventra.toml", "config/inventra.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|secret| secret.expose_secret().trim()) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(value) => match value.split_once('-') {
            Some((prefix, _)) if prefix.len() <= 4 => format!("{prefix}-***"),
            _ => "<redacted>".to_string(),
        },
    }
}
