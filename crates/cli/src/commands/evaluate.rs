//! Offline evaluation: retrieval with the configured (by default hashing)
//! embedder and the deterministic ranking policy. No language model call is
//! made on this path, so the verdict is reproducible from the store alone.

use serde_json::json;

use crate::commands::CommandResult;
use offersense_agent::{embedder_from_config, EvaluatorAgent, SummarizerAgent};
use offersense_core::config::{AppConfig, LoadOptions};
use offersense_core::retrieval::OfferIndex;
use offersense_core::RankingPolicy;
use offersense_db::{connect_with_settings, migrations, SqlOfferStore};

pub fn run(query: &str, top_k: Option<usize>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "evaluate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    if query.trim().is_empty() {
        return CommandResult::failure("evaluate", "empty_query", "query must not be empty", 2);
    }
    let top_k = top_k.unwrap_or(config.retrieval.top_k).clamp(1, 100);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "evaluate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let embedder = embedder_from_config(&config.embedding)
            .map_err(|error| ("embedder_setup", error.to_string(), 6u8))?;
        let store =
            SqlOfferStore::new(pool.clone(), embedder, config.embedding.model.clone());

        let retrieved = store
            .query(query, top_k)
            .await
            .map_err(|error| ("retrieval", error.to_string(), 7u8))?;
        let retrieved_count = retrieved.len();

        let evaluator = EvaluatorAgent::deterministic(RankingPolicy::default());
        let summarizer = SummarizerAgent::deterministic();

        let payload = match evaluator.evaluate(query, retrieved).await {
            None => json!({
                "recommendation": null,
                "reasoning": "No supplier offers were retrieved for the given query.",
                "candidates_retrieved": 0,
            }),
            Some(verdict) => {
                let reasoning = summarizer.summarize(query, &verdict).await;
                json!({
                    "recommendation": verdict.recommendation(),
                    "reasoning": reasoning,
                    "candidates_retrieved": retrieved_count,
                    "verdict": verdict,
                })
            }
        };

        pool.close().await;
        Ok::<String, (&'static str, String, u8)>(
            serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string()),
        )
    });

    match result {
        Ok(message) => CommandResult::success("evaluate", message),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("evaluate", error_class, message, exit_code)
        }
    }
}
