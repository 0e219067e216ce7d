use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub Uuid);

impl OfferId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One supplier's quotation terms for one item.
///
/// An offer is immutable once created: evaluation output is attached to an
/// [`EvaluatedOffer`] wrapper and never written back to the stored record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub supplier: String,
    pub item: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub min_quantity: Option<u32>,
    #[serde(default)]
    pub delivery_days: Option<u32>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub risk_note: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub supplier_comments: Option<String>,
    /// Original quoted snippet; required for traceability back to the source
    /// quotation.
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated offer fields as produced by the extraction collaborator.
///
/// Extraction output is untrusted; `validate` enforces the offer contract and
/// is the only path from a draft to an [`Offer`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferDraft {
    pub supplier: String,
    pub item: String,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    #[serde(default)]
    pub min_quantity: Option<u32>,
    #[serde(default)]
    pub delivery_days: Option<u32>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub risk_note: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub supplier_comments: Option<String>,
    pub raw_text: String,
}

impl OfferDraft {
    pub fn validate(self) -> Result<Offer, DomainError> {
        if self.supplier.trim().is_empty() {
            return Err(DomainError::MissingRequiredField { field: "supplier" });
        }
        if self.item.trim().is_empty() {
            return Err(DomainError::MissingRequiredField { field: "item" });
        }
        if self.raw_text.trim().is_empty() {
            return Err(DomainError::MissingRequiredField { field: "raw_text" });
        }
        if let Some(price) = self.unit_price {
            if price < Decimal::ZERO {
                return Err(DomainError::NegativeNumeric { field: "unit_price" });
            }
        }
        if self.min_quantity == Some(0) {
            return Err(DomainError::NonPositiveQuantity);
        }

        Ok(Offer {
            id: OfferId::generate(),
            supplier: self.supplier,
            item: self.item,
            product_id: self.product_id,
            unit_price: self.unit_price,
            min_quantity: self.min_quantity,
            delivery_days: self.delivery_days,
            payment_terms: self.payment_terms,
            risk_note: self.risk_note,
            notes: self.notes,
            supplier_comments: self.supplier_comments,
            raw_text: self.raw_text,
            created_at: Utc::now(),
        })
    }
}

impl Offer {
    /// Every free-text field that might carry supplier risk commentary,
    /// joined for substring screening. Missing fields contribute nothing.
    pub fn risk_commentary(&self) -> String {
        [&self.risk_note, &self.notes, &self.supplier_comments]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An offer annotated with the evaluation verdict fields. Lives only on the
/// in-memory result returned from a query, never in the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluatedOffer {
    #[serde(flatten)]
    pub offer: Offer,
    pub evaluation_reason: String,
    pub score_explanation: String,
    pub priority_breakdown: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::errors::DomainError;

    use super::OfferDraft;

    fn draft() -> OfferDraft {
        OfferDraft {
            supplier: "QuickFix".to_string(),
            item: "10mm steel bolt".to_string(),
            unit_price: Some(Decimal::new(75, 2)),
            raw_text: "QuickFix offers the 10mm steel bolt at $0.75 per unit.".to_string(),
            ..OfferDraft::default()
        }
    }

    #[test]
    fn valid_draft_becomes_offer() {
        let offer = draft().validate().expect("draft should validate");
        assert_eq!(offer.supplier, "QuickFix");
        assert!(!offer.raw_text.is_empty());
    }

    #[test]
    fn missing_supplier_is_a_contract_violation() {
        let error = OfferDraft { supplier: "  ".to_string(), ..draft() }
            .validate()
            .expect_err("blank supplier should fail");
        assert!(matches!(error, DomainError::MissingRequiredField { field: "supplier" }));
    }

    #[test]
    fn missing_raw_text_is_a_contract_violation() {
        let error = OfferDraft { raw_text: String::new(), ..draft() }
            .validate()
            .expect_err("missing raw_text should fail");
        assert!(matches!(error, DomainError::MissingRequiredField { field: "raw_text" }));
    }

    #[test]
    fn negative_price_is_rejected() {
        let error = OfferDraft { unit_price: Some(Decimal::new(-1, 2)), ..draft() }
            .validate()
            .expect_err("negative price should fail");
        assert!(matches!(error, DomainError::NegativeNumeric { field: "unit_price" }));
    }

    #[test]
    fn zero_min_quantity_is_rejected() {
        let error = OfferDraft { min_quantity: Some(0), ..draft() }
            .validate()
            .expect_err("zero min_quantity should fail");
        assert!(matches!(error, DomainError::NonPositiveQuantity));
    }

    #[test]
    fn risk_commentary_skips_missing_fields() {
        let offer = OfferDraft {
            risk_note: Some("Be cautious; high risk.".to_string()),
            supplier_comments: Some("Had production delays.".to_string()),
            ..draft()
        }
        .validate()
        .expect("draft should validate");

        let commentary = offer.risk_commentary();
        assert!(commentary.contains("high risk"));
        assert!(commentary.contains("production delays"));
    }
}
