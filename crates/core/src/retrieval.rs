//! Retrieval seam.
//!
//! The similarity oracle is a capability interface: `index(records)` and
//! `query(text, k)` returning candidates ordered by embedding similarity
//! only. The ranking policy never depends on a concrete index, so it can be
//! exercised against a deterministic fake instead of a real embedding
//! service.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::offer::Offer;
use crate::evaluate::size::required_size;
use crate::intent::{detect_intents, Intent};
use crate::rules::RuleBook;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("index failure: {0}")]
    Store(String),
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

#[async_trait]
pub trait OfferIndex: Send + Sync {
    /// Append offers to the index. Indexed records are never mutated.
    async fn index(&self, offers: &[Offer]) -> Result<(), RetrievalError>;

    /// Approximate top-k by embedding similarity. No ordering guarantee
    /// beyond the similarity score.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<Offer>, RetrievalError>;
}

/// Descriptive text an offer is embedded under.
pub fn offer_document(offer: &Offer) -> String {
    format!(
        "Supplier: {}. Item: {}. Product ID: {}. Unit price: {}. Minimum quantity: {}. \
         Delivery time: {} days. Payment terms: {}. Risk note: {}.",
        offer.supplier,
        offer.item,
        offer.product_id.as_deref().unwrap_or("n/a"),
        offer.unit_price.map(|p| p.to_string()).unwrap_or_else(|| "n/a".to_string()),
        offer.min_quantity.map(|q| q.to_string()).unwrap_or_else(|| "n/a".to_string()),
        offer.delivery_days.map(|d| d.to_string()).unwrap_or_else(|| "n/a".to_string()),
        offer.payment_terms.as_deref().unwrap_or("n/a"),
        offer.risk_note.as_deref().unwrap_or("No risk notes provided"),
    )
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }
    let dot: f32 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm: f32 = left.iter().map(|a| a * a).sum::<f32>().sqrt();
    let right_norm: f32 = right.iter().map(|b| b * b).sum::<f32>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm * right_norm)
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x1000_0000_01b3;
const INDEX_SEED: u64 = 0x9e37_79b1_85eb_ca87;
const SIGN_SEED: u64 = 0xc2b2_ae3d_27d4_eb4f;

fn fnv1a_64_with_seed(bytes: &[u8], seed: u64) -> u64 {
    let mut hash = FNV_OFFSET_BASIS ^ seed;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic feature-hashed embedding over word unigrams and adjacent
/// pairs. No model, no network: the same text always embeds to the same
/// vector, which is what the offline CLI path and the tests run on.
#[derive(Clone, Debug)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(8) }
    }

    fn features(text: &str) -> Vec<String> {
        let tokens: Vec<String> = text
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        let mut features = tokens.clone();
        features.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
        features
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut accumulator = vec![0f32; self.dimensions];
        for feature in Self::features(text) {
            let bytes = feature.as_bytes();
            let index = (fnv1a_64_with_seed(bytes, INDEX_SEED) % self.dimensions as u64) as usize;
            let sign = if fnv1a_64_with_seed(bytes, SIGN_SEED) & 1 == 1 { 1.0 } else { -1.0 };
            accumulator[index] += sign;
        }

        let norm: f32 = accumulator.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut accumulator {
                *value /= norm;
            }
        }
        accumulator
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        Ok(self.embed_sync(text))
    }
}

/// Post-retrieval relevance pass over similarity-ordered candidates:
/// product-keyword gate, exact size agreement when the query names one, and
/// an intent soft-filter. Falls back to the unfiltered top-k when filtering
/// empties the set, so similarity alone still answers vague queries.
pub fn relevance_filter(query: &str, retrieved: Vec<Offer>, k: usize, rules: &RuleBook) -> Vec<Offer> {
    let query_mm = required_size(query);
    let intents = detect_intents(query, rules);
    let soft_filter_active = intents != [Intent::General];

    let mut kept: Vec<Offer> = Vec::new();
    for offer in &retrieved {
        let text = offer.item.to_lowercase();

        if !rules.product_keywords.iter().any(|keyword| text.contains(keyword)) {
            continue;
        }

        if let Some(query_mm) = &query_mm {
            match required_size(&text) {
                Some(item_mm) if &item_mm == query_mm => {}
                _ => continue,
            }
        }

        if soft_filter_active {
            let matched = intents.iter().any(|intent| {
                let markers = match intent {
                    Intent::Delivery => &rules.relevance.delivery,
                    Intent::Price => &rules.relevance.price,
                    Intent::Risk => &rules.relevance.risk,
                    Intent::Bulk => &rules.relevance.bulk,
                    Intent::General => return false,
                };
                markers.iter().any(|marker| text.contains(marker))
            });
            if !matched {
                continue;
            }
        }

        kept.push(offer.clone());
    }

    let mut results = if kept.is_empty() { retrieved } else { kept };
    results.truncate(k);
    results
}

#[cfg(test)]
mod tests {
    use crate::domain::offer::{Offer, OfferDraft};
    use crate::rules::RuleBook;

    use super::{cosine_similarity, offer_document, relevance_filter, HashingEmbedder};

    fn offer(supplier: &str, item: &str) -> Offer {
        OfferDraft {
            supplier: supplier.to_string(),
            item: item.to_string(),
            raw_text: format!("{supplier} quotes {item}."),
            ..OfferDraft::default()
        }
        .validate()
        .expect("fixture offer is valid")
    }

    #[test]
    fn embedding_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let text = offer_document(&offer("QuickFix", "10mm steel bolt"));
        assert_eq!(embedder.embed_sync(&text), embedder.embed_sync(&text));
    }

    #[test]
    fn closer_text_scores_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed_sync("10mm steel bolts with fast delivery");
        let near = embedder.embed_sync("Supplier QuickFix. Item: 10mm steel bolt. Delivery: 10 days.");
        let far = embedder.embed_sync("Quarterly earnings call transcript for a software company.");

        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[test]
    fn product_keyword_gate_drops_unrelated_items() {
        let retrieved = vec![offer("A", "10mm steel bolt"), offer("B", "office chair")];
        let kept = relevance_filter("10mm bolts", retrieved, 5, &RuleBook::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].supplier, "A");
    }

    #[test]
    fn size_agreement_is_exact() {
        let retrieved = vec![offer("A", "10mm steel bolt"), offer("B", "12mm steel bolt")];
        let kept = relevance_filter("need 12mm bolts", retrieved, 5, &RuleBook::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].supplier, "B");
    }

    #[test]
    fn falls_back_to_similarity_order_when_filter_empties() {
        let retrieved = vec![offer("A", "office chair"), offer("B", "standing desk")];
        let kept = relevance_filter("any seating", retrieved.clone(), 1, &RuleBook::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].supplier, "A");
    }

    #[test]
    fn intent_soft_filter_accepts_any_matching_intent() {
        let retrieved = vec![offer("A", "steel bolt, bulk quantity discounts")];
        let kept =
            relevance_filter("bulk order of steel bolts", retrieved, 5, &RuleBook::default());
        assert_eq!(kept.len(), 1);
    }
}
