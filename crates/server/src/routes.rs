//! JSON API for the offer pipeline.
//!
//! - `POST /api/v1/offers/ingest` — extract structured offers from raw
//!   quotation text and append them to the retrieval store
//! - `POST /api/v1/offers/evaluate` — retrieve, evaluate, and summarize
//!   offers for a natural-language procurement query
//! - `GET  /ping` — liveness probe

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use offersense_agent::{EvaluatorAgent, ExtractorAgent, SummarizerAgent};
use offersense_core::retrieval::OfferIndex;
use offersense_core::rules::RuleBook;
use offersense_core::{ApplicationError, InterfaceError, Offer, RiskLevel};

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<dyn OfferIndex>,
    pub extractor: Arc<ExtractorAgent>,
    pub evaluator: Arc<EvaluatorAgent>,
    pub summarizer: Arc<SummarizerAgent>,
    pub default_top_k: usize,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: String,
    pub offers_added: usize,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct EvaluatedOfferRow {
    pub supplier: String,
    pub item: String,
    pub unit_price: f64,
    pub delivery_days: u32,
    pub risk_assessment: String,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub recommendation: Option<String>,
    pub reasoning: Option<String>,
    pub offers_evaluated: Vec<EvaluatedOfferRow>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/offers/ingest", post(ingest_offers))
        .route("/api/v1/offers/evaluate", post(evaluate_offers))
        .route("/ping", get(ping))
        .with_state(state)
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "message": "offersense API is running" }))
}

async fn ingest_offers(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "server.ingest.received",
        correlation_id = %correlation_id,
        "received ingest request"
    );

    if request.text.trim().is_empty() {
        return Err(bad_request("text must not be empty", &correlation_id));
    }

    let offers = state.extractor.extract_offers(&request.text).await.map_err(|error| {
        warn!(
            event_name = "server.ingest.extraction_failed",
            correlation_id = %correlation_id,
            error = %error,
            "offer extraction failed"
        );
        application_reply(ApplicationError::Integration(error.to_string()), &correlation_id)
    })?;

    if offers.is_empty() {
        return Err(bad_request("no offers could be extracted", &correlation_id));
    }

    state.index.index(&offers).await.map_err(|error| {
        warn!(
            event_name = "server.ingest.store_failed",
            correlation_id = %correlation_id,
            error = %error,
            "failed to store extracted offers"
        );
        application_reply(ApplicationError::Persistence(error.to_string()), &correlation_id)
    })?;

    info!(
        event_name = "server.ingest.completed",
        correlation_id = %correlation_id,
        offers_added = offers.len(),
        "offers extracted and stored"
    );
    Ok(Json(IngestResponse {
        message: "Offers successfully extracted and stored.".to_string(),
        offers_added: offers.len(),
    }))
}

async fn evaluate_offers(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let top_k = request.top_k.unwrap_or(state.default_top_k).clamp(1, 100);

    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty", &correlation_id));
    }

    let retrieved =
        state.index.query(&request.query, top_k).await.map_err(|error| {
            warn!(
                event_name = "server.evaluate.retrieval_failed",
                correlation_id = %correlation_id,
                error = %error,
                "retrieval failed"
            );
            application_reply(ApplicationError::Integration(error.to_string()), &correlation_id)
        })?;

    let offers_evaluated: Vec<EvaluatedOfferRow> =
        retrieved.iter().map(|offer| presentation_row(offer, state.evaluator.policy().rules())).collect();

    let Some(verdict) = state.evaluator.evaluate(&request.query, retrieved).await else {
        // Nothing was retrieved: explicit absence, not the sentinel.
        warn!(
            event_name = "server.evaluate.no_candidates",
            correlation_id = %correlation_id,
            "no offers retrieved for query"
        );
        return Ok(Json(EvaluateResponse {
            recommendation: None,
            reasoning: Some("No supplier offers were retrieved for the given query.".to_string()),
            offers_evaluated: Vec::new(),
        }));
    };

    let reasoning = state.summarizer.summarize(&request.query, &verdict).await;

    info!(
        event_name = "server.evaluate.completed",
        correlation_id = %correlation_id,
        recommendation = %verdict.recommendation(),
        "evaluation completed"
    );
    Ok(Json(EvaluateResponse {
        recommendation: Some(verdict.recommendation().to_string()),
        reasoning: Some(reasoning),
        offers_evaluated,
    }))
}

fn presentation_row(offer: &Offer, rules: &RuleBook) -> EvaluatedOfferRow {
    let item = match &offer.product_id {
        Some(product_id) => format!("{} ({product_id})", offer.item),
        None => offer.item.clone(),
    };
    EvaluatedOfferRow {
        supplier: offer.supplier.clone(),
        item,
        unit_price: offer.unit_price.and_then(|price| price.to_f64()).unwrap_or(0.0),
        delivery_days: offer.delivery_days.unwrap_or(0),
        risk_assessment: RiskLevel::from_note(offer.risk_note.as_deref(), &rules.risk_levels)
            .label()
            .to_string(),
    }
}

fn bad_request(message: &str, correlation_id: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError { error: message.to_string(), correlation_id: correlation_id.to_string() }),
    )
}

/// Collaborator and persistence failures go through the interface-error
/// ladder so callers always get a user-safe message plus a correlation id.
fn application_reply(
    error: ApplicationError,
    correlation_id: &str,
) -> (StatusCode, Json<ApiError>) {
    let interface = error.into_interface(correlation_id);
    let status = match &interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiError {
            error: interface.user_message().to_string(),
            correlation_id: correlation_id.to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::util::ServiceExt;

    use offersense_agent::{EvaluatorAgent, ExtractorAgent, ScriptedLlmClient, SummarizerAgent};
    use offersense_core::RankingPolicy;
    use offersense_db::InMemoryOfferIndex;

    use super::{router, AppState};

    const EXTRACTION_REPLY: &str = r#"[
      {
        "supplier": "QuickFix",
        "item": "10mm steel bolt",
        "product_id": "SB-10",
        "unit_price": 0.75,
        "min_quantity": 1000,
        "delivery_days": 10,
        "payment_terms": "Net 45",
        "risk_note": "Reliable supplier, on-time delivery rate 95%.",
        "raw_text": "QuickFix offers the 10mm steel bolt at $0.75 per unit."
      },
      {
        "supplier": "Premier Metals",
        "item": "10mm steel bolt",
        "product_id": "SB-10",
        "unit_price": 0.70,
        "min_quantity": 500,
        "delivery_days": 8,
        "payment_terms": "Net 60",
        "risk_note": "Major quality issues last year; high risk.",
        "raw_text": "Premier Metals quotes the 10mm steel bolt at $0.70 per unit."
      }
    ]"#;

    fn state_with_scripted_extractor(replies: Vec<&str>) -> AppState {
        AppState {
            index: Arc::new(InMemoryOfferIndex::new()),
            extractor: Arc::new(ExtractorAgent::new(Arc::new(
                ScriptedLlmClient::with_replies(replies),
            ))),
            evaluator: Arc::new(EvaluatorAgent::deterministic(RankingPolicy::default())),
            summarizer: Arc::new(SummarizerAgent::deterministic()),
            default_top_k: 5,
        }
    }

    async fn post_json(
        app: axum::Router,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(path)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("request completes");

        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body collects").to_bytes();
        let json = serde_json::from_slice(&bytes).expect("body is JSON");
        (status, json)
    }

    #[tokio::test]
    async fn ping_responds_ok() {
        let app = router(state_with_scripted_extractor(Vec::new()));
        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).expect("request builds"))
            .await
            .expect("request completes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ingest_then_evaluate_excludes_high_risk_for_critical_orders() {
        let state = state_with_scripted_extractor(vec![EXTRACTION_REPLY]);
        let app = router(state.clone());

        let (status, body) = post_json(
            app,
            "/api/v1/offers/ingest",
            serde_json::json!({ "text": "QuickFix and Premier Metals quotations..." }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["offers_added"], 2);

        let app = router(state);
        let (status, body) = post_json(
            app,
            "/api/v1/offers/evaluate",
            serde_json::json!({ "query": "critical 2000 unit order of 10mm bolts" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        // Premier Metals is cheaper but high risk; the reliability gate makes
        // QuickFix the only eligible supplier.
        assert_eq!(body["recommendation"], "QuickFix");
        assert_eq!(body["offers_evaluated"].as_array().expect("rows").len(), 2);
    }

    #[tokio::test]
    async fn evaluate_with_empty_store_reports_explicit_absence() {
        let app = router(state_with_scripted_extractor(Vec::new()));
        let (status, body) = post_json(
            app,
            "/api/v1/offers/evaluate",
            serde_json::json!({ "query": "10mm bolts" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendation"], serde_json::Value::Null);
        assert!(body["reasoning"]
            .as_str()
            .expect("reasoning present")
            .contains("No supplier offers were retrieved"));
    }

    #[tokio::test]
    async fn evaluate_size_mismatch_returns_the_sentinel() {
        let state = state_with_scripted_extractor(vec![EXTRACTION_REPLY]);
        let app = router(state.clone());
        post_json(
            app,
            "/api/v1/offers/ingest",
            serde_json::json!({ "text": "quotations" }),
        )
        .await;

        let app = router(state);
        let (status, body) = post_json(
            app,
            "/api/v1/offers/evaluate",
            serde_json::json!({ "query": "8mm fasteners" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommendation"], "No Offer");
    }

    #[tokio::test]
    async fn blank_ingest_text_is_a_bad_request() {
        let app = router(state_with_scripted_extractor(Vec::new()));
        let (status, body) =
            post_json(app, "/api/v1/offers/ingest", serde_json::json!({ "text": "  " })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["correlation_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn extraction_failure_maps_to_service_unavailable() {
        let state = AppState {
            extractor: Arc::new(ExtractorAgent::new(Arc::new(ScriptedLlmClient::failing(
                "model unreachable",
            )))),
            ..state_with_scripted_extractor(Vec::new())
        };
        let app = router(state);

        let (status, _) = post_json(
            app,
            "/api/v1/offers/ingest",
            serde_json::json!({ "text": "quotation text" }),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
