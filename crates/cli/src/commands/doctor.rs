use offersense_core::config::{AppConfig, EmbeddingProvider, LlmProvider, LoadOptions};
use offersense_db::connect_with_settings;
use serde::Serialize;

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

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            checks.push(check_collaborator_credentials(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "collaborator_credentials",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_collaborator_credentials(config: &AppConfig) -> DoctorCheck {
    // Config validation already rejects hosted providers without keys; this
    // check reports which collaborators run local versus hosted.
    let llm = match config.llm.provider {
        LlmProvider::Ollama => "llm: local (ollama)",
        LlmProvider::OpenAi => "llm: hosted (openai, key present)",
        LlmProvider::Anthropic => "llm: hosted (anthropic, key present)",
    };
    let embedding = match config.embedding.provider {
        EmbeddingProvider::Hashing => "embedding: local (hashing)",
        EmbeddingProvider::OpenAi => "embedding: hosted (openai, key present)",
    };

    DoctorCheck {
        name: "collaborator_credentials",
        status: CheckStatus::Pass,
        details: format!("{llm}; {embedding}"),
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
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

        pool.close().await;
        Ok::<(), String>(())
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
