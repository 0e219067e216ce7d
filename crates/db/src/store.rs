//! Append-only offer store with an embedding side table.
//!
//! Offers are written once at ingest time and never updated; similarity
//! search loads the stored vectors and scores them in process, which keeps
//! the index an ordinary SQLite file with no external service.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use thiserror::Error;
use uuid::Uuid;

use offersense_core::retrieval::{
    cosine_similarity, offer_document, relevance_filter, Embedder, OfferIndex, RetrievalError,
};
use offersense_core::{Offer, OfferId, RuleBook};

use crate::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("embedding error: {0}")]
    Embedding(String),
}

impl From<RepositoryError> for RetrievalError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Embedding(message) => RetrievalError::Embedding(message),
            other => RetrievalError::Store(other.to_string()),
        }
    }
}

pub struct SqlOfferStore {
    pool: DbPool,
    embedder: Arc<dyn Embedder>,
    embedding_model: String,
    rules: RuleBook,
}

impl SqlOfferStore {
    pub fn new(pool: DbPool, embedder: Arc<dyn Embedder>, embedding_model: String) -> Self {
        Self { pool, embedder, embedding_model, rules: RuleBook::default() }
    }

    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    /// Append offers and their embeddings. Insert-only by design; there is no
    /// update path in this crate.
    pub async fn append(&self, offers: &[Offer]) -> Result<usize, RepositoryError> {
        if offers.is_empty() {
            return Ok(0);
        }

        let mut embeddings = Vec::with_capacity(offers.len());
        for offer in offers {
            let vector = self
                .embedder
                .embed(&offer_document(offer))
                .await
                .map_err(|error| RepositoryError::Embedding(error.to_string()))?;
            embeddings.push(vector);
        }

        let mut tx = self.pool.begin().await?;
        for (offer, vector) in offers.iter().zip(&embeddings) {
            sqlx::query(
                "INSERT INTO offer (id, supplier, item, product_id, unit_price, min_quantity, \
                 delivery_days, payment_terms, risk_note, notes, supplier_comments, raw_text, \
                 created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(offer.id.to_string())
            .bind(&offer.supplier)
            .bind(&offer.item)
            .bind(&offer.product_id)
            .bind(offer.unit_price.map(|price| price.to_string()))
            .bind(offer.min_quantity.map(i64::from))
            .bind(offer.delivery_days.map(i64::from))
            .bind(&offer.payment_terms)
            .bind(&offer.risk_note)
            .bind(&offer.notes)
            .bind(&offer.supplier_comments)
            .bind(&offer.raw_text)
            .bind(offer.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

            let vector_json = serde_json::to_string(vector)
                .map_err(|error| RepositoryError::Decode(error.to_string()))?;
            sqlx::query("INSERT INTO offer_embedding (offer_id, vector, model) VALUES (?, ?, ?)")
                .bind(offer.id.to_string())
                .bind(vector_json)
                .bind(&self.embedding_model)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(offers.len())
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM offer").fetch_one(&self.pool).await?)
    }

    async fn load_all(&self) -> Result<Vec<(Offer, Vec<f32>)>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT o.id, o.supplier, o.item, o.product_id, o.unit_price, o.min_quantity, \
             o.delivery_days, o.payment_terms, o.risk_note, o.notes, o.supplier_comments, \
             o.raw_text, o.created_at, e.vector \
             FROM offer o JOIN offer_embedding e ON e.offer_id = o.id \
             ORDER BY o.created_at, o.id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let offer = decode_offer(row)?;
                let vector: Vec<f32> = serde_json::from_str(row.get::<String, _>("vector").as_str())
                    .map_err(|error| RepositoryError::Decode(error.to_string()))?;
                Ok((offer, vector))
            })
            .collect()
    }
}

fn decode_offer(row: &sqlx::sqlite::SqliteRow) -> Result<Offer, RepositoryError> {
    let id = Uuid::parse_str(row.get::<String, _>("id").as_str())
        .map_err(|error| RepositoryError::Decode(format!("offer id: {error}")))?;
    let unit_price = row
        .get::<Option<String>, _>("unit_price")
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|error| RepositoryError::Decode(format!("unit_price: {error}")))
        })
        .transpose()?;
    let created_at = DateTime::parse_from_rfc3339(row.get::<String, _>("created_at").as_str())
        .map_err(|error| RepositoryError::Decode(format!("created_at: {error}")))?
        .with_timezone(&Utc);

    Ok(Offer {
        id: OfferId(id),
        supplier: row.get("supplier"),
        item: row.get("item"),
        product_id: row.get("product_id"),
        unit_price,
        min_quantity: row.get::<Option<i64>, _>("min_quantity").map(|v| v as u32),
        delivery_days: row.get::<Option<i64>, _>("delivery_days").map(|v| v as u32),
        payment_terms: row.get("payment_terms"),
        risk_note: row.get("risk_note"),
        notes: row.get("notes"),
        supplier_comments: row.get("supplier_comments"),
        raw_text: row.get("raw_text"),
        created_at,
    })
}

#[async_trait]
impl OfferIndex for SqlOfferStore {
    async fn index(&self, offers: &[Offer]) -> Result<(), RetrievalError> {
        self.append(offers).await?;
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<Offer>, RetrievalError> {
        let query_vector = self.embedder.embed(text).await?;
        let stored = self.load_all().await.map_err(RetrievalError::from)?;

        let mut scored: Vec<(f32, Offer)> = stored
            .into_iter()
            .map(|(offer, vector)| (cosine_similarity(&query_vector, &vector), offer))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        // Over-fetch so the relevance pass has room to discard, then narrow.
        let retrieved: Vec<Offer> =
            scored.into_iter().take(k.saturating_mul(2)).map(|(_, offer)| offer).collect();
        Ok(relevance_filter(text, retrieved, k, &self.rules))
    }
}
