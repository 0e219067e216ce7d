//! Offer evaluation orchestration.
//!
//! The winner is always picked by the deterministic ranking policy in the
//! core crate. When a language model is wired in, it is asked to phrase the
//! justification for that winner, and its reply is reconciled against the
//! candidate set: a reply that names anything other than the deterministic
//! winner, or that cannot be parsed, is discarded in favor of the
//! deterministic justification. Collaborator failure degrades the wording,
//! never the decision, and never surfaces as an error to the caller.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use offersense_core::evaluate::explain::justify;
use offersense_core::evaluate::policy::PolicyOutcome;
use offersense_core::evaluate::Verdict;
use offersense_core::{EvaluatedOffer, Offer, RankedCandidates, RankingPolicy, NO_OFFER};

use crate::llm::{strip_code_fences, LlmClient};

const PHRASING_PROMPT: &str = "\
You are a procurement analyst explaining a supplier selection that has
already been made by a deterministic ranking policy.

The policy applies this strict priority chain:
1. Lower risk assessment (Low > Moderate > High > Unknown)
2. Lower unit price
3. Lower delivery days
4. Better payment terms (Net 60 > Net 45 > Net 30)
5. Lower minimum order quantity

Do NOT change the selection. Explain why the named winner satisfies the
chain, referencing the user's priorities to color the wording. If the winner
is low-risk but expensive and the user wanted cheap, say explicitly that
risk outranks price.

Return ONLY a valid JSON object with exactly these string fields:
{\"supplier\": \"<winner name>\", \"reason\": \"...\",
 \"score_explanation\": \"...\", \"priority_breakdown\": \"...\"}
";

#[derive(Debug, Deserialize)]
struct PhrasedDecision {
    supplier: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    score_explanation: String,
    #[serde(default)]
    priority_breakdown: String,
}

pub struct EvaluatorAgent {
    policy: RankingPolicy,
    llm: Option<Arc<dyn LlmClient>>,
}

impl EvaluatorAgent {
    /// Fully deterministic evaluator: selection and justification both come
    /// from the core policy.
    pub fn deterministic(policy: RankingPolicy) -> Self {
        Self { policy, llm: None }
    }

    /// Evaluator that phrases justifications through a language model.
    pub fn with_llm(policy: RankingPolicy, llm: Arc<dyn LlmClient>) -> Self {
        Self { policy, llm: Some(llm) }
    }

    pub fn policy(&self) -> &RankingPolicy {
        &self.policy
    }

    /// Evaluate candidates for a query. `None` means no candidates were
    /// supplied at all, which callers must present distinctly from the
    /// "No Offer" sentinel.
    pub async fn evaluate(&self, query: &str, offers: Vec<Offer>) -> Option<Verdict> {
        info!(
            event_name = "agent.evaluator.start",
            candidates = offers.len(),
            query = %query,
            "evaluating offers"
        );

        match self.policy.evaluate(query, offers) {
            PolicyOutcome::NoCandidates => {
                warn!(event_name = "agent.evaluator.no_candidates", "no offers provided for evaluation");
                None
            }
            PolicyOutcome::NoSizeMatch { required_mm } => {
                warn!(
                    event_name = "agent.evaluator.size_exhausted",
                    required_mm = %required_mm,
                    "no size-matching offers found"
                );
                Some(Verdict::no_size_match())
            }
            PolicyOutcome::AllHighRisk => {
                warn!(
                    event_name = "agent.evaluator.risk_exhausted",
                    "all size-matching offers were disqualified as high risk"
                );
                Some(Verdict::all_high_risk())
            }
            PolicyOutcome::Ranked(ranked) => Some(self.phrase(query, ranked).await),
        }
    }

    async fn phrase(&self, query: &str, ranked: RankedCandidates) -> Verdict {
        let justification = justify(&self.policy, &ranked);
        let winner = ranked.winner().clone();

        let annotated = match &self.llm {
            None => EvaluatedOffer {
                offer: winner,
                evaluation_reason: justification.reason,
                score_explanation: justification.score_explanation,
                priority_breakdown: justification.priority_breakdown,
            },
            Some(llm) => {
                match self.phrase_with_llm(llm.as_ref(), query, &ranked).await {
                    Some(phrased) => EvaluatedOffer {
                        offer: winner,
                        evaluation_reason: phrased.reason,
                        score_explanation: phrased.score_explanation,
                        priority_breakdown: phrased.priority_breakdown,
                    },
                    None => {
                        // Degraded path: keep the deterministic winner and
                        // attach the deterministic justification.
                        warn!(
                            event_name = "agent.evaluator.phrasing_fallback",
                            supplier = %winner.supplier,
                            "generative phrasing unavailable, using deterministic justification"
                        );
                        EvaluatedOffer {
                            offer: winner,
                            evaluation_reason: justification.reason,
                            score_explanation: justification.score_explanation,
                            priority_breakdown: justification.priority_breakdown,
                        }
                    }
                }
            }
        };

        info!(
            event_name = "agent.evaluator.selected",
            supplier = %annotated.offer.supplier,
            "evaluator selected supplier"
        );
        Verdict::Selected(annotated)
    }

    async fn phrase_with_llm(
        &self,
        llm: &dyn LlmClient,
        query: &str,
        ranked: &RankedCandidates,
    ) -> Option<PhrasedDecision> {
        let candidates = serde_json::to_string_pretty(&ranked.ordered).ok()?;
        let prompt = format!(
            "{PHRASING_PROMPT}\n### User Query:\n{query}\n\n### Deterministic winner:\n{}\n\n\
             ### Ranked candidates (best first, JSON):\n{candidates}\n",
            ranked.winner().supplier,
        );

        let reply = match llm.complete(&prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    event_name = "agent.evaluator.llm_error",
                    error = %error,
                    "justification call failed"
                );
                return None;
            }
        };

        let parsed: PhrasedDecision = match serde_json::from_str(strip_code_fences(&reply)) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(
                    event_name = "agent.evaluator.unparseable_reply",
                    error = %error,
                    "justification reply was not valid JSON"
                );
                return None;
            }
        };

        // Reconcile against the candidate set. A reply naming "No Offer" or a
        // supplier other than the deterministic winner is malformed output:
        // the selection is not the model's to make.
        let named = parsed.supplier.trim().to_lowercase();
        if named == NO_OFFER.to_lowercase()
            || !ranked.winner().supplier.to_lowercase().contains(&named)
            || named.is_empty()
        {
            warn!(
                event_name = "agent.evaluator.reconciliation_failed",
                named_supplier = %parsed.supplier,
                winner = %ranked.winner().supplier,
                "phrased reply does not name the deterministic winner"
            );
            return None;
        }

        Some(parsed)
    }
}
