//! Offer evaluation: deterministic filtering, ranking, and justification.

pub mod explain;
pub mod policy;
pub mod risk_screen;
pub mod size;

use serde::Serialize;

use crate::domain::offer::{EvaluatedOffer, Offer};
use crate::evaluate::explain::justify;
use crate::evaluate::policy::{PolicyOutcome, RankingPolicy};

/// Sentinel supplier name for the terminal "no eligible offer" outcome.
pub const NO_OFFER: &str = "No Offer";

/// The ranking result: a concrete annotated offer, or the terminal sentinel.
///
/// "No candidates supplied at all" is not a [`Verdict`]; callers represent
/// that absence as `None` so it can never be conflated with the sentinel.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Verdict {
    Selected(EvaluatedOffer),
    NoOffer { reason: String, score_explanation: String, priority_breakdown: String },
}

impl Verdict {
    pub fn no_size_match() -> Self {
        Self::NoOffer {
            reason: "No supplier found matching the required product size.".to_string(),
            score_explanation: "Query specified a size not found in offers.".to_string(),
            priority_breakdown: "Product size match".to_string(),
        }
    }

    pub fn all_high_risk() -> Self {
        Self::NoOffer {
            reason: "All matching suppliers were disqualified due to high risk for a critical \
                     order."
                .to_string(),
            score_explanation: "All suppliers matching the size constraint were found to be high \
                                risk."
                .to_string(),
            priority_breakdown: "Risk assessment was the highest priority.".to_string(),
        }
    }

    pub fn recommendation(&self) -> &str {
        match self {
            Self::Selected(evaluated) => &evaluated.offer.supplier,
            Self::NoOffer { .. } => NO_OFFER,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::Selected(evaluated) => &evaluated.evaluation_reason,
            Self::NoOffer { reason, .. } => reason,
        }
    }

    pub fn selected(&self) -> Option<&EvaluatedOffer> {
        match self {
            Self::Selected(evaluated) => Some(evaluated),
            Self::NoOffer { .. } => None,
        }
    }
}

/// Fully deterministic evaluation: policy ranking plus the deterministic
/// justification. `None` means no candidates were supplied at all.
pub fn evaluate_deterministic(
    policy: &RankingPolicy,
    query: &str,
    offers: Vec<Offer>,
) -> Option<Verdict> {
    match policy.evaluate(query, offers) {
        PolicyOutcome::NoCandidates => None,
        PolicyOutcome::NoSizeMatch { .. } => Some(Verdict::no_size_match()),
        PolicyOutcome::AllHighRisk => Some(Verdict::all_high_risk()),
        PolicyOutcome::Ranked(ranked) => {
            let justification = justify(policy, &ranked);
            Some(Verdict::Selected(EvaluatedOffer {
                offer: ranked.winner().clone(),
                evaluation_reason: justification.reason,
                score_explanation: justification.score_explanation,
                priority_breakdown: justification.priority_breakdown,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::offer::OfferDraft;
    use crate::evaluate::policy::RankingPolicy;

    use super::{evaluate_deterministic, Verdict, NO_OFFER};

    fn draft(supplier: &str, item: &str) -> OfferDraft {
        OfferDraft {
            supplier: supplier.to_string(),
            item: item.to_string(),
            raw_text: format!("{supplier} quotes {item}."),
            ..OfferDraft::default()
        }
    }

    #[test]
    fn size_mismatch_yields_the_sentinel_with_its_reason() {
        let offers = vec![draft("A", "10mm steel bolt").validate().expect("valid")];
        let verdict = evaluate_deterministic(&RankingPolicy::default(), "8mm fasteners", offers)
            .expect("candidates were supplied");

        assert_eq!(verdict.recommendation(), NO_OFFER);
        assert_eq!(verdict.reason(), "No supplier found matching the required product size.");
    }

    #[test]
    fn empty_input_yields_explicit_absence() {
        assert_eq!(
            evaluate_deterministic(&RankingPolicy::default(), "8mm fasteners", Vec::new()),
            None
        );
    }

    #[test]
    fn winner_carries_annotations() {
        let offers = vec![
            OfferDraft {
                unit_price: Some(Decimal::new(60, 2)),
                ..draft("A", "10mm steel bolt")
            }
            .validate()
            .expect("valid"),
            OfferDraft {
                unit_price: Some(Decimal::new(80, 2)),
                ..draft("B", "10mm steel bolt")
            }
            .validate()
            .expect("valid"),
        ];

        let verdict = evaluate_deterministic(&RankingPolicy::default(), "10mm bolts", offers)
            .expect("candidates were supplied");
        let evaluated = match verdict {
            Verdict::Selected(evaluated) => evaluated,
            other => panic!("expected a selection, got {other:?}"),
        };

        assert_eq!(evaluated.offer.supplier, "A");
        assert!(!evaluated.evaluation_reason.is_empty());
        assert!(!evaluated.score_explanation.is_empty());
        assert!(!evaluated.priority_breakdown.is_empty());
    }
}
