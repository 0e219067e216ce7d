//! Deterministic in-memory index, used wherever tests need the retrieval
//! oracle without a database file or network.

use std::sync::Mutex;

use async_trait::async_trait;

use offersense_core::retrieval::{
    cosine_similarity, offer_document, relevance_filter, OfferIndex, RetrievalError,
};
use offersense_core::{HashingEmbedder, Offer, RuleBook};

#[derive(Default)]
pub struct InMemoryOfferIndex {
    embedder: HashingEmbedder,
    rules: RuleBook,
    entries: Mutex<Vec<(Offer, Vec<f32>)>>,
}

impl InMemoryOfferIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("index lock is never poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OfferIndex for InMemoryOfferIndex {
    async fn index(&self, offers: &[Offer]) -> Result<(), RetrievalError> {
        let mut entries = self.entries.lock().expect("index lock is never poisoned");
        for offer in offers {
            let vector = self.embedder.embed_sync(&offer_document(offer));
            entries.push((offer.clone(), vector));
        }
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<Offer>, RetrievalError> {
        let query_vector = self.embedder.embed_sync(text);
        let mut scored: Vec<(f32, Offer)> = {
            let entries = self.entries.lock().expect("index lock is never poisoned");
            entries
                .iter()
                .map(|(offer, vector)| (cosine_similarity(&query_vector, vector), offer.clone()))
                .collect()
        };
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let retrieved: Vec<Offer> =
            scored.into_iter().take(k.saturating_mul(2)).map(|(_, offer)| offer).collect();
        Ok(relevance_filter(text, retrieved, k, &self.rules))
    }
}

#[cfg(test)]
mod tests {
    use offersense_core::retrieval::OfferIndex;
    use offersense_core::OfferDraft;

    use super::InMemoryOfferIndex;

    #[tokio::test]
    async fn indexed_offers_are_retrievable() {
        let index = InMemoryOfferIndex::new();
        let offer = OfferDraft {
            supplier: "QuickFix".to_string(),
            item: "10mm steel bolt".to_string(),
            raw_text: "QuickFix quotes the 10mm steel bolt.".to_string(),
            ..OfferDraft::default()
        }
        .validate()
        .expect("fixture offer is valid");

        index.index(&[offer]).await.expect("index should succeed");
        assert_eq!(index.len(), 1);

        let results = index.query("10mm bolts", 5).await.expect("query should succeed");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].supplier, "QuickFix");
    }
}
