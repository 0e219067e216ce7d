//! Deterministic offer ranking.
//!
//! Selection is a pure function of (query, candidate list): a reliability
//! gate followed by a strict lexicographic criterion chain. The generative
//! explainer downstream only phrases the outcome; it never picks.

use std::cmp::{Ordering, Reverse};
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::domain::offer::Offer;
use crate::domain::risk::RiskLevel;
use crate::evaluate::risk_screen::is_high_risk;
use crate::evaluate::size::{filter_by_size, SizeFilterOutcome};
use crate::intent::{detect_intents, implies_reliability, Intent};
use crate::rules::RuleBook;

/// The candidate set after filtering, ordered best-first by the criterion
/// chain. The ordering is stable, so equal offers keep their retrieval order
/// and re-evaluating identical input yields the identical winner.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedCandidates {
    pub intents: Vec<Intent>,
    pub reliability_gate_applied: bool,
    pub required_size_mm: Option<String>,
    pub ordered: Vec<Offer>,
}

impl RankedCandidates {
    pub fn winner(&self) -> &Offer {
        &self.ordered[0]
    }

    pub fn runner_up(&self) -> Option<&Offer> {
        self.ordered.get(1)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PolicyOutcome {
    /// No candidates were supplied at all. Distinct from every "No Offer"
    /// sentinel: the caller had nothing to evaluate.
    NoCandidates,
    /// Size filtering removed every candidate; terminal for the query.
    NoSizeMatch { required_mm: String },
    /// The reliability gate disqualified every size-matched candidate.
    AllHighRisk,
    Ranked(RankedCandidates),
}

/// The five ranking criteria, in priority order. Each criterion breaks ties
/// only among offers equal on all higher criteria.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    RiskAssessment,
    UnitPrice,
    DeliveryDays,
    PaymentTerms,
    MinQuantity,
}

impl Criterion {
    pub fn label(&self) -> &'static str {
        match self {
            Self::RiskAssessment => "risk assessment",
            Self::UnitPrice => "unit price",
            Self::DeliveryDays => "delivery days",
            Self::PaymentTerms => "payment terms",
            Self::MinQuantity => "minimum order quantity",
        }
    }
}

pub const CRITERION_CHAIN: [Criterion; 5] = [
    Criterion::RiskAssessment,
    Criterion::UnitPrice,
    Criterion::DeliveryDays,
    Criterion::PaymentTerms,
    Criterion::MinQuantity,
];

fn net_terms_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)net\s*(\d+)").expect("terms pattern is valid"))
}

/// Credit term length in days. Longer terms rank better; strings that carry
/// no recognizable net term count as missing.
pub fn payment_term_days(terms: Option<&str>) -> Option<u32> {
    let captures = net_terms_pattern().captures(terms?)?;
    captures[1].parse().ok()
}

// Missing values must rank strictly worse than any present value, so every
// criterion key leads with a presence flag.
fn ascending<T: Ord>(value: Option<T>) -> (u8, Option<T>) {
    match value {
        Some(value) => (0, Some(value)),
        None => (1, None),
    }
}

fn longest_wins(value: Option<u32>) -> (u8, Reverse<u32>) {
    match value {
        Some(value) => (0, Reverse(value)),
        None => (1, Reverse(0)),
    }
}

type SortKey =
    (RiskLevel, (u8, Option<Decimal>), (u8, Option<u32>), (u8, Reverse<u32>), (u8, Option<u32>));

#[derive(Clone, Debug, Default)]
pub struct RankingPolicy {
    rules: RuleBook,
}

impl RankingPolicy {
    pub fn new(rules: RuleBook) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn risk_level_of(&self, offer: &Offer) -> RiskLevel {
        RiskLevel::from_note(offer.risk_note.as_deref(), &self.rules.risk_levels)
    }

    fn sort_key(&self, offer: &Offer) -> SortKey {
        (
            self.risk_level_of(offer),
            ascending(offer.unit_price),
            ascending(offer.delivery_days),
            longest_wins(payment_term_days(offer.payment_terms.as_deref())),
            ascending(offer.min_quantity),
        )
    }

    /// Total order over offers: risk, then price, then delivery, then payment
    /// terms, then minimum quantity; lower (or longer-term) wins at each step.
    pub fn compare(&self, left: &Offer, right: &Offer) -> Ordering {
        self.sort_key(left).cmp(&self.sort_key(right))
    }

    /// The first criterion on which two offers differ, if any.
    pub fn decisive_criterion(&self, left: &Offer, right: &Offer) -> Option<Criterion> {
        let (l, r) = (self.sort_key(left), self.sort_key(right));
        if l.0 != r.0 {
            Some(Criterion::RiskAssessment)
        } else if l.1 != r.1 {
            Some(Criterion::UnitPrice)
        } else if l.2 != r.2 {
            Some(Criterion::DeliveryDays)
        } else if l.3 != r.3 {
            Some(Criterion::PaymentTerms)
        } else if l.4 != r.4 {
            Some(Criterion::MinQuantity)
        } else {
            None
        }
    }

    /// Run the full deterministic policy: size filter, reliability gate,
    /// lexicographic ranking.
    pub fn evaluate(&self, query: &str, offers: Vec<Offer>) -> PolicyOutcome {
        if offers.is_empty() {
            return PolicyOutcome::NoCandidates;
        }

        let (required_size_mm, sized) = match filter_by_size(query, offers) {
            SizeFilterOutcome::Unconstrained(offers) => (None, offers),
            SizeFilterOutcome::Matched { required_mm, offers } => (Some(required_mm), offers),
            SizeFilterOutcome::Exhausted { required_mm } => {
                return PolicyOutcome::NoSizeMatch { required_mm };
            }
        };

        let reliability_gate_applied = implies_reliability(query, &self.rules);
        let candidates: Vec<Offer> = if reliability_gate_applied {
            sized.into_iter().filter(|offer| !is_high_risk(offer, &self.rules)).collect()
        } else {
            sized
        };
        if candidates.is_empty() {
            return PolicyOutcome::AllHighRisk;
        }

        let mut ordered = candidates;
        ordered.sort_by(|a, b| self.compare(a, b));

        PolicyOutcome::Ranked(RankedCandidates {
            intents: detect_intents(query, &self.rules),
            reliability_gate_applied,
            required_size_mm,
            ordered,
        })
    }
}
