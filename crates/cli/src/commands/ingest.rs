use std::sync::Arc;

use crate::commands::CommandResult;
use offersense_agent::{client_from_config, embedder_from_config, ExtractorAgent};
use offersense_core::config::{AppConfig, LoadOptions};
use offersense_db::{connect_with_settings, migrations, SqlOfferStore};

pub fn run(file: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ingest",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(error) => {
            return CommandResult::failure(
                "ingest",
                "file_read",
                format!("could not read `{file}`: {error}"),
                2,
            );
        }
    };
    if text.trim().is_empty() {
        return CommandResult::failure("ingest", "empty_input", "quotation file is empty", 2);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ingest",
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

        let llm = client_from_config(&config.llm)
            .map_err(|error| ("llm_setup", error.to_string(), 6u8))?;
        let extractor = ExtractorAgent::new(Arc::from(llm));
        let offers = extractor
            .extract_offers(&text)
            .await
            .map_err(|error| ("extraction", error.to_string(), 7u8))?;
        if offers.is_empty() {
            return Err(("extraction", "no offers could be extracted".to_string(), 7u8));
        }

        let embedder = embedder_from_config(&config.embedding)
            .map_err(|error| ("embedder_setup", error.to_string(), 6u8))?;
        let store = SqlOfferStore::new(
            pool.clone(),
            Arc::from(embedder),
            config.embedding.model.clone(),
        );
        let offers_added = store
            .append(&offers)
            .await
            .map_err(|error| ("store", error.to_string(), 8u8))?;

        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(offers_added)
    });

    match result {
        Ok(offers_added) => CommandResult::success(
            "ingest",
            format!("extracted and stored {offers_added} offer(s) from `{file}`"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ingest", error_class, message, exit_code)
        }
    }
}
