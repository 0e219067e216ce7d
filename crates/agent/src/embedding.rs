//! Embedding collaborators behind the core `Embedder` capability trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use offersense_core::config::{EmbeddingConfig, EmbeddingProvider};
use offersense_core::retrieval::{Embedder, RetrievalError};
use offersense_core::HashingEmbedder;

pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(
        base_url: String,
        api_key: Option<SecretString>,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|error| RetrievalError::Embedding(error.to_string()))?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key, model })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let request = EmbeddingsRequest { model: &self.model, input: vec![text] };

        let mut builder =
            self.client.post(format!("{}/v1/embeddings", self.base_url)).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|error| RetrievalError::Embedding(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Embedding(format!(
                "embeddings endpoint returned {status}: {body}"
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|error| RetrievalError::Embedding(error.to_string()))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| RetrievalError::Embedding("embeddings response was empty".to_string()))
    }
}

/// Build the configured embedder. The hashing provider is fully local and is
/// what the offline CLI path and the tests run on.
pub fn embedder_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, RetrievalError> {
    match config.provider {
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimensions))),
        EmbeddingProvider::OpenAi => Ok(Arc::new(HttpEmbedder::new(
            config.base_url.clone().unwrap_or_else(|| "https://api.openai.com".to_string()),
            config.api_key.clone(),
            config.model.clone(),
            config.timeout_secs,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use offersense_core::config::EmbeddingConfig;

    use super::embedder_from_config;

    #[tokio::test]
    async fn hashing_provider_needs_no_network() {
        let config = EmbeddingConfig {
            provider: offersense_core::config::EmbeddingProvider::Hashing,
            api_key: None,
            base_url: None,
            model: "hashing".to_string(),
            dimensions: 64,
            timeout_secs: 5,
        };

        let embedder = embedder_from_config(&config).expect("hashing embedder builds");
        let vector = embedder.embed("10mm steel bolt").await.expect("embedding succeeds");
        assert_eq!(vector.len(), 64);
    }
}
