//! Deterministic justification assembly.
//!
//! Produces the `reason` / `score_explanation` / `priority_breakdown` fields
//! from an already-ranked candidate set. The generative explainer may rewrite
//! the wording for a human reader, but this module is the fallback and the
//! source of truth: it is built only from the ranked offers themselves.

use crate::domain::offer::Offer;
use crate::evaluate::policy::{Criterion, RankedCandidates, RankingPolicy, CRITERION_CHAIN};
use crate::intent::Intent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Justification {
    pub reason: String,
    pub score_explanation: String,
    pub priority_breakdown: String,
}

fn field_or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

fn describe(policy: &RankingPolicy, offer: &Offer) -> String {
    format!(
        "risk: {}; unit price: {}; delivery: {} days; payment terms: {}; min quantity: {}",
        policy.risk_level_of(offer),
        field_or_na(offer.unit_price.map(|p| format!("${p}"))),
        field_or_na(offer.delivery_days),
        field_or_na(offer.payment_terms.as_deref()),
        field_or_na(offer.min_quantity),
    )
}

fn chain_label() -> String {
    CRITERION_CHAIN.map(|criterion| criterion.label()).join(" \u{2192} ")
}

fn reason_for(policy: &RankingPolicy, ranked: &RankedCandidates) -> String {
    let winner = ranked.winner();
    let mut reason = match ranked.runner_up() {
        None => format!("{} is the only candidate remaining after filtering.", winner.supplier),
        Some(runner_up) => match policy.decisive_criterion(winner, runner_up) {
            Some(Criterion::RiskAssessment) => format!(
                "{} was selected for its {} risk assessment, the top-priority criterion; {} ranked {}.",
                winner.supplier,
                policy.risk_level_of(winner),
                runner_up.supplier,
                policy.risk_level_of(runner_up),
            ),
            Some(Criterion::UnitPrice) => format!(
                "{} was selected on unit price ({}) after tying on risk with {}.",
                winner.supplier,
                field_or_na(winner.unit_price.map(|p| format!("${p}"))),
                runner_up.supplier,
            ),
            Some(Criterion::DeliveryDays) => format!(
                "{} was selected on delivery time ({} days), with risk and price tied against {}.",
                winner.supplier,
                field_or_na(winner.delivery_days),
                runner_up.supplier,
            ),
            Some(Criterion::PaymentTerms) => format!(
                "{} was selected on payment terms ({}), the first criterion separating it from {}.",
                winner.supplier,
                field_or_na(winner.payment_terms.as_deref()),
                runner_up.supplier,
            ),
            Some(Criterion::MinQuantity) => format!(
                "{} was selected on minimum order quantity ({}), the final tie-breaker against {}.",
                winner.supplier,
                field_or_na(winner.min_quantity),
                runner_up.supplier,
            ),
            None => format!(
                "{} ranked first; it ties {} on every criterion and was retrieved first.",
                winner.supplier, runner_up.supplier,
            ),
        },
    };

    if ranked.reliability_gate_applied {
        reason.push_str(" High-risk suppliers were excluded up front for this critical order.");
    }
    reason
}

fn score_explanation_for(policy: &RankingPolicy, ranked: &RankedCandidates) -> String {
    let winner = ranked.winner();
    let intents =
        ranked.intents.iter().map(Intent::to_string).collect::<Vec<_>>().join(", ");

    let mut explanation = format!(
        "Ranked {} candidate(s) for intents [{}]. {}: {}.",
        ranked.ordered.len(),
        intents,
        winner.supplier,
        describe(policy, winner),
    );

    if let Some(runner_up) = ranked.runner_up() {
        explanation.push_str(&format!(
            " Runner-up {}: {}.",
            runner_up.supplier,
            describe(policy, runner_up),
        ));

        // Color the comparison with the declared intents without changing it.
        let runner_cheaper = matches!(
            (winner.unit_price, runner_up.unit_price),
            (Some(w), Some(r)) if r < w
        );
        if ranked.intents.contains(&Intent::Price) && runner_cheaper {
            explanation.push_str(&format!(
                " Although {} quoted a lower unit price, higher-priority criteria decided.",
                runner_up.supplier
            ));
        }
        let runner_faster = matches!(
            (winner.delivery_days, runner_up.delivery_days),
            (Some(w), Some(r)) if r < w
        );
        if ranked.intents.contains(&Intent::Delivery) && runner_faster {
            explanation.push_str(&format!(
                " Although {} quoted faster delivery, the chain ranks risk and price first.",
                runner_up.supplier
            ));
        }
    }
    explanation
}

/// Assemble the full deterministic justification for a ranked candidate set.
pub fn justify(policy: &RankingPolicy, ranked: &RankedCandidates) -> Justification {
    Justification {
        reason: reason_for(policy, ranked),
        score_explanation: score_explanation_for(policy, ranked),
        priority_breakdown: format!(
            "Priority chain: {}. Winner {}: {}.",
            chain_label(),
            ranked.winner().supplier,
            describe(policy, ranked.winner()),
        ),
    }
}
