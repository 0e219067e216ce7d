//! Structured offer extraction from raw quotation text.
//!
//! The model is an information-extraction device only: its reply must be a
//! JSON list of offer drafts, and every draft is pushed through the offer
//! contract before anything downstream sees it. A draft that violates the
//! contract is an upstream contract breach and fails the call.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use offersense_core::{Offer, OfferDraft};

use crate::llm::{strip_code_fences, LlmClient};

const EXTRACTION_PROMPT: &str = "\
You are an information extraction assistant for supplier quotations.
Extract a JSON list of offers from the raw text below.

Each offer must include:
- supplier (string)
- item (string)
- product_id (string or null)
- unit_price (number or null)
- min_quantity (integer or null)
- delivery_days (integer or null)
- payment_terms (string or null)
- risk_note (string or null)
- raw_text (original quoted snippet)

Return ONLY a valid JSON list of offers. No extra text. No commentary.

### Raw quotation text:
";

pub struct ExtractorAgent {
    llm: Arc<dyn LlmClient>,
}

impl ExtractorAgent {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn extract_offers(&self, text: &str) -> Result<Vec<Offer>> {
        info!(event_name = "agent.extractor.start", "starting offer extraction");

        let prompt = format!("{EXTRACTION_PROMPT}{text}");
        let reply =
            self.llm.complete(&prompt).await.context("offer extraction call failed")?;
        let payload = strip_code_fences(&reply);
        let reply_prefix: String = payload.chars().take(300).collect();
        debug!(
            event_name = "agent.extractor.raw_reply",
            reply_prefix = %reply_prefix,
            "received extraction reply"
        );

        let drafts: Vec<OfferDraft> = serde_json::from_str(payload)
            .context("extraction reply was not a valid JSON list of offers")?;

        let offers = drafts
            .into_iter()
            .map(|draft| draft.validate())
            .collect::<Result<Vec<Offer>, _>>()
            .context("extracted offer violated the offer contract")?;

        info!(
            event_name = "agent.extractor.completed",
            offers_extracted = offers.len(),
            "offer extraction completed"
        );
        Ok(offers)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::llm::ScriptedLlmClient;

    use super::ExtractorAgent;

    const VALID_REPLY: &str = r#"```json
[
  {
    "supplier": "QuickFix",
    "item": "10mm steel bolt",
    "product_id": "SB-10",
    "unit_price": 0.75,
    "min_quantity": 1000,
    "delivery_days": 10,
    "payment_terms": "Net 45",
    "risk_note": "Reliable supplier.",
    "raw_text": "QuickFix offers the 10mm steel bolt at $0.75 per unit."
  }
]
```"#;

    #[tokio::test]
    async fn parses_fenced_json_into_validated_offers() {
        let agent = ExtractorAgent::new(Arc::new(ScriptedLlmClient::with_replies(vec![
            VALID_REPLY,
        ])));

        let offers = agent.extract_offers("quotation text").await.expect("extraction succeeds");
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].supplier, "QuickFix");
        assert_eq!(offers[0].min_quantity, Some(1000));
    }

    #[tokio::test]
    async fn malformed_reply_is_an_error() {
        let agent = ExtractorAgent::new(Arc::new(ScriptedLlmClient::with_replies(vec![
            "not json at all",
        ])));

        let error = agent.extract_offers("quotation text").await.expect_err("must fail");
        assert!(error.to_string().contains("valid JSON list"));
    }

    #[tokio::test]
    async fn contract_violating_draft_is_an_error() {
        let reply = r#"[{"supplier": "", "item": "bolt", "raw_text": "snippet"}]"#;
        let agent = ExtractorAgent::new(Arc::new(ScriptedLlmClient::with_replies(vec![reply])));

        let error = agent.extract_offers("quotation text").await.expect_err("must fail");
        assert!(error.to_string().contains("offer contract"));
    }

    #[tokio::test]
    async fn collaborator_failure_propagates() {
        let agent =
            ExtractorAgent::new(Arc::new(ScriptedLlmClient::failing("model unreachable")));
        assert!(agent.extract_offers("quotation text").await.is_err());
    }
}
