use inventra_core::config::{AppConfig, LlmProvider, LoadOptions};
use inventra_db::{connect_from_config, ping};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_readiness(&config));
            checks.push(check_weather_readiness(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["llm_readiness", "weather_readiness", "database_connectivity"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status != CheckStatus::Fail);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_llm_readiness(config: &AppConfig) -> DoctorCheck {
    let llm = &config.llm;
    let credentials = match llm.provider {
        LlmProvider::OpenAi => "api key present",
        LlmProvider::Ollama => "no api key required",
    };
    DoctorCheck {
        name: "llm_readiness",
        status: CheckStatus::Pass,
        details: format!(
            "{} model `{}` at {} ({credentials})",
            llm.provider.as_str(),
            llm.model,
            llm.resolved_base_url()
        ),
    }
}

/// A missing weather key is not a failure: forecasts fall back to clear skies.
fn check_weather_readiness(config: &AppConfig) -> DoctorCheck {
    if config.weather.has_api_key() {
        DoctorCheck {
            name: "weather_readiness",
            status: CheckStatus::Pass,
            details: format!("forecasts from {}", config.weather.base_url),
        }
    } else {
        DoctorCheck {
            name: "weather_readiness",
            status: CheckStatus::Skipped,
            details: "no weather api key; forecasts use the clear-weather fallback".to_string(),
        }
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
        let reachable = ping(&pool).await.map_err(|error| format!("database ping failed: {error}"));

        pool.close().await;
        reachable
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use inventra_core::config::AppConfig;
    use secrecy::SecretString;

    use super::{check_llm_readiness, check_weather_readiness, render_human, CheckStatus, DoctorCheck, DoctorReport};

    #[test]
    fn weather_without_a_key_is_skipped_not_failed() {
        let mut config = AppConfig::default();
        assert_eq!(check_weather_readiness(&config).status, CheckStatus::Skipped);

        config.weather.api_key = Some(SecretString::from("owm-key".to_string()));
        assert_eq!(check_weather_readiness(&config).status, CheckStatus::Pass);
    }

    #[test]
    fn default_llm_points_at_local_ollama() {
        let check = check_llm_readiness(&AppConfig::default());
        assert_eq!(check.status, CheckStatus::Pass);
        assert!(check.details.contains("ollama"), "{}", check.details);
        assert!(check.details.contains("http://localhost:11434/v1"), "{}", check.details);
    }

    #[test]
    fn human_rendering_marks_each_check() {
        let report = DoctorReport {
            overall_status: CheckStatus::Fail,
            summary: "doctor: one or more readiness checks failed".to_string(),
            checks: vec![
                DoctorCheck { name: "config_validation", status: CheckStatus::Pass, details: "ok".to_string() },
                DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: "down".to_string() },
            ],
        };
        assert_eq!(
            render_human(&report),
            "doctor: one or more readiness checks failed\n- [ok] config_validation: ok\n- [fail] database_connectivity: down"
        );
    }
}
