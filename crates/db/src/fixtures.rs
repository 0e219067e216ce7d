//! Deterministic demo dataset for `offersense seed` and integration smoke
//! checks. The quotations mirror the canonical supplier samples the pipeline
//! was built around.

use rust_decimal::Decimal;

use offersense_core::{Offer, OfferDraft};

use crate::store::{RepositoryError, SqlOfferStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub offers_added: usize,
}

pub fn seed_offers() -> Vec<Offer> {
    let drafts = vec![
        OfferDraft {
            supplier: "QuickFix".to_string(),
            item: "10mm steel bolt".to_string(),
            product_id: Some("SB-10".to_string()),
            unit_price: Some(Decimal::new(75, 2)),
            min_quantity: Some(1000),
            delivery_days: Some(10),
            payment_terms: Some("Net 45".to_string()),
            risk_note: Some(
                "Reliable supplier with great quality and a long record of on-time delivery. \
                 Historical on-time delivery rate is 95%."
                    .to_string(),
            ),
            raw_text: "QuickFix is currently running a promotion on their specialty fastening \
                       components. They offer the 10mm steel bolt (Product ID: SB-10) at a \
                       discounted rate of $0.75 per unit for orders over 1,000 units. Delivery \
                       is estimated at 10 business days. Standard payment terms are Net 45."
                .to_string(),
            ..OfferDraft::default()
        },
        OfferDraft {
            supplier: "Premier Metals".to_string(),
            item: "10mm steel bolt".to_string(),
            product_id: Some("SB-10".to_string()),
            unit_price: Some(Decimal::new(70, 2)),
            min_quantity: Some(500),
            delivery_days: Some(8),
            payment_terms: Some("Net 60".to_string()),
            risk_note: Some(
                "Had major quality issues with their stock last year. The fixtures didn't meet \
                 specifications and caused production delays. Be cautious with this supplier; \
                 high risk."
                    .to_string(),
            ),
            raw_text: "Premier Metals now offers specialty fastening components. We quote the \
                       10mm steel bolt (Product ID: SB-10) at a competitive rate of $0.70 per \
                       unit for orders over 500 units. We guarantee delivery within 8 calendar \
                       days. We offer standard Net 60 terms."
                .to_string(),
            ..OfferDraft::default()
        },
        OfferDraft {
            supplier: "Apex Alloy Works".to_string(),
            item: "12mm alloy bolt".to_string(),
            product_id: Some("AB-12".to_string()),
            unit_price: Some(Decimal::new(110, 2)),
            min_quantity: Some(250),
            delivery_days: Some(12),
            payment_terms: Some("Net 30".to_string()),
            risk_note: Some("Moderate delays reported during peak season.".to_string()),
            raw_text: "Apex Alloy Works quotes the 12mm alloy bolt (AB-12) at $1.10 per unit, \
                       minimum order 250 units, delivery in 12 days, Net 30 terms."
                .to_string(),
            ..OfferDraft::default()
        },
    ];

    drafts
        .into_iter()
        .map(|draft| draft.validate().expect("seed fixtures satisfy the offer contract"))
        .collect()
}

pub async fn apply(store: &SqlOfferStore) -> Result<SeedResult, RepositoryError> {
    let offers = seed_offers();
    let offers_added = store.append(&offers).await?;
    Ok(SeedResult { offers_added })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use offersense_core::HashingEmbedder;

    use crate::store::SqlOfferStore;
    use crate::{connect_with_settings, migrations};

    use super::{apply, seed_offers};

    #[test]
    fn seed_dataset_covers_both_risk_poles() {
        let offers = seed_offers();
        assert_eq!(offers.len(), 3);
        assert!(offers.iter().any(|o| o
            .risk_note
            .as_deref()
            .is_some_and(|note| note.to_lowercase().contains("high risk"))));
        assert!(offers.iter().any(|o| o
            .risk_note
            .as_deref()
            .is_some_and(|note| note.to_lowercase().contains("reliable"))));
    }

    #[tokio::test]
    async fn seeding_populates_the_store() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5)
            .await
            .expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations should apply");
        let store =
            SqlOfferStore::new(pool, Arc::new(HashingEmbedder::default()), "hashing".to_string());

        let result = apply(&store).await.expect("seed should succeed");
        assert_eq!(result.offers_added, 3);
        assert_eq!(store.count().await.expect("count"), 3);
    }
}
