use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use offersense_agent::{
    client_from_config, embedder_from_config, EvaluatorAgent, ExtractorAgent, LlmClient,
    SummarizerAgent,
};
use offersense_core::config::{AppConfig, ConfigError, LoadOptions};
use offersense_core::retrieval::RetrievalError;
use offersense_core::RankingPolicy;
use offersense_db::{connect_with_settings, migrations, DbPool, SqlOfferStore};

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("embedding collaborator setup failed: {0}")]
    Embedding(#[from] RetrievalError),
    #[error("language model collaborator setup failed: {0}")]
    Llm(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
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

    let embedder = embedder_from_config(&config.embedding)?;
    let llm: Arc<dyn LlmClient> = Arc::from(
        client_from_config(&config.llm).map_err(|error| BootstrapError::Llm(error.to_string()))?,
    );

    let store = Arc::new(SqlOfferStore::new(
        db_pool.clone(),
        embedder,
        config.embedding.model.clone(),
    ));

    let state = AppState {
        index: store,
        extractor: Arc::new(ExtractorAgent::new(llm.clone())),
        evaluator: Arc::new(EvaluatorAgent::with_llm(RankingPolicy::default(), llm.clone())),
        summarizer: Arc::new(SummarizerAgent::with_llm(llm)),
        default_top_k: config.retrieval.top_k,
    };

    Ok(Application { config, db_pool, state })
}
