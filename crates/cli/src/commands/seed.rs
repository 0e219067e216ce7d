use crate::commands::CommandResult;
use offersense_agent::embedder_from_config;
use offersense_core::config::{AppConfig, LoadOptions};
use offersense_db::{connect_with_settings, fixtures, migrations, SqlOfferStore};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
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

        let seed_result = fixtures::apply(&store)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<usize, (&'static str, String, u8)>(seed_result.offers_added)
    });

    match result {
        Ok(offers_added) => {
            let suppliers: Vec<String> = fixtures::seed_offers()
                .iter()
                .map(|offer| format!("  - {}: {}", offer.supplier, offer.item))
                .collect();
            let message = format!(
                "demo quotation dataset loaded ({offers_added} offers):\n{}",
                suppliers.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
