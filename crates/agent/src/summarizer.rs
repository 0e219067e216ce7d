//! Plain-language summaries of evaluation verdicts.
//!
//! The summarizer never re-ranks or re-evaluates; it restates the verdict.
//! A "No Offer" verdict short-circuits to a fixed summary without a model
//! call, and a failed call degrades to the verdict's own reason text.

use std::sync::Arc;

use tracing::{info, warn};

use offersense_core::evaluate::Verdict;

use crate::llm::LlmClient;

const NO_OFFER_SUMMARY: &str = "No supplier matched the required product specifications or \
                                size. Therefore, no recommendation can be made from the \
                                evaluated offers.";

const SUMMARY_PROMPT: &str = "\
You are a senior procurement analyst summarizing the result of a supplier
evaluation. Clearly explain the decision below without changing or
reinterpreting it. Never invent suppliers, details, or reasoning that are
not present in the decision. Keep the tone factual, concise, and
professional. Reply with the summary text only.
";

pub struct SummarizerAgent {
    llm: Option<Arc<dyn LlmClient>>,
}

impl SummarizerAgent {
    pub fn deterministic() -> Self {
        Self { llm: None }
    }

    pub fn with_llm(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm: Some(llm) }
    }

    pub async fn summarize(&self, query: &str, verdict: &Verdict) -> String {
        let Verdict::Selected(evaluated) = verdict else {
            info!(
                event_name = "agent.summarizer.no_offer",
                "verdict is No Offer, returning fixed summary"
            );
            return NO_OFFER_SUMMARY.to_string();
        };

        let Some(llm) = &self.llm else {
            return evaluated.evaluation_reason.clone();
        };

        let decision = serde_json::to_string_pretty(evaluated)
            .unwrap_or_else(|_| evaluated.evaluation_reason.clone());
        let prompt = format!(
            "{SUMMARY_PROMPT}\n### User Query:\n{query}\n\n### Evaluator Decision:\n{decision}\n"
        );

        match llm.complete(&prompt).await {
            Ok(summary) => summary.trim().to_string(),
            Err(error) => {
                warn!(
                    event_name = "agent.summarizer.llm_error",
                    error = %error,
                    "summarization failed, degrading to the verdict reason"
                );
                evaluated.evaluation_reason.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use offersense_core::evaluate::Verdict;
    use offersense_core::{EvaluatedOffer, OfferDraft};

    use crate::llm::ScriptedLlmClient;

    use super::{SummarizerAgent, NO_OFFER_SUMMARY};

    fn selected() -> Verdict {
        let offer = OfferDraft {
            supplier: "QuickFix".to_string(),
            item: "10mm steel bolt".to_string(),
            raw_text: "QuickFix quotes the 10mm steel bolt.".to_string(),
            ..OfferDraft::default()
        }
        .validate()
        .expect("fixture offer is valid");

        Verdict::Selected(EvaluatedOffer {
            offer,
            evaluation_reason: "QuickFix ranked first on risk.".to_string(),
            score_explanation: String::new(),
            priority_breakdown: String::new(),
        })
    }

    #[tokio::test]
    async fn no_offer_short_circuits_without_a_model_call() {
        // A scripted client with no replies errors if it is ever called.
        let agent = SummarizerAgent::with_llm(Arc::new(ScriptedLlmClient::default()));
        let summary = agent.summarize("8mm fasteners", &Verdict::no_size_match()).await;
        assert_eq!(summary, NO_OFFER_SUMMARY);
    }

    #[tokio::test]
    async fn model_summary_is_returned_trimmed() {
        let agent = SummarizerAgent::with_llm(Arc::new(ScriptedLlmClient::with_replies(vec![
            "  QuickFix was selected for its low risk profile.  ",
        ])));
        let summary = agent.summarize("10mm bolts", &selected()).await;
        assert_eq!(summary, "QuickFix was selected for its low risk profile.");
    }

    #[tokio::test]
    async fn failure_degrades_to_the_verdict_reason() {
        let agent =
            SummarizerAgent::with_llm(Arc::new(ScriptedLlmClient::failing("unreachable")));
        let summary = agent.summarize("10mm bolts", &selected()).await;
        assert_eq!(summary, "QuickFix ranked first on risk.");
    }

    #[tokio::test]
    async fn deterministic_mode_uses_the_verdict_reason() {
        let agent = SummarizerAgent::deterministic();
        let summary = agent.summarize("10mm bolts", &selected()).await;
        assert_eq!(summary, "QuickFix ranked first on risk.");
    }
}
