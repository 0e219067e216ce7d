//! Trigger-phrase tables for intent detection, risk screening, and retrieval
//! relevance, kept as swappable data rather than inline literals so the rule
//! sets can be tested and extended independently of the policy logic.

fn phrases(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiskLevelRules {
    pub high: Vec<String>,
    pub low: Vec<String>,
    pub moderate: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentKeywords {
    pub price: Vec<String>,
    pub delivery: Vec<String>,
    pub risk: Vec<String>,
    pub bulk: Vec<String>,
}

/// Item-text markers used by the retrieval relevance soft-filter, one set per
/// detected intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelevanceMarkers {
    pub delivery: Vec<String>,
    pub price: Vec<String>,
    pub risk: Vec<String>,
    pub bulk: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleBook {
    /// Phrases that mark a query as a high-stakes, risk-averse purchase.
    pub reliability_keywords: Vec<String>,
    /// Quantity at or above which a query is treated as reliability-critical.
    pub reliability_quantity_threshold: u64,
    /// Phrases that flag an offer's risk commentary as high risk.
    pub high_risk_phrases: Vec<String>,
    pub risk_levels: RiskLevelRules,
    pub intents: IntentKeywords,
    /// Item-description words an offer must contain to count as a relevant
    /// product at retrieval time.
    pub product_keywords: Vec<String>,
    pub relevance: RelevanceMarkers,
}

impl Default for RuleBook {
    fn default() -> Self {
        Self {
            reliability_keywords: phrases(&[
                "large order",
                "large quantity",
                "critical",
                "important",
                "engineering",
                "lowest risk",
                "reliable",
            ]),
            reliability_quantity_threshold: 1000,
            high_risk_phrases: phrases(&[
                "high risk",
                "quality issues",
                "major quality",
                "production delays",
            ]),
            risk_levels: RiskLevelRules {
                high: phrases(&["high risk", "quality issues"]),
                low: phrases(&["low risk", "reliable", "95%"]),
                moderate: phrases(&["moderate"]),
            },
            intents: IntentKeywords {
                price: phrases(&["price", "cheapest", "cost", "under", "budget"]),
                delivery: phrases(&["delivery", "fast", "quick", "urgent", "asap"]),
                risk: phrases(&["risk", "reliable", "dependable", "trust", "quality"]),
                bulk: phrases(&["bulk", "large order", "quantity"]),
            },
            product_keywords: phrases(&["bolt", "fastener", "steel", "alloy", "component"]),
            relevance: RelevanceMarkers {
                delivery: phrases(&["delivery", "days", "ship", "arrive"]),
                price: phrases(&["price", "unit", "cost", "$"]),
                risk: phrases(&["risk", "reliable", "quality", "defect"]),
                bulk: phrases(&["bulk", "large", "quantity", "min"]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RuleBook;

    #[test]
    fn default_rule_book_carries_the_fixed_sets() {
        let rules = RuleBook::default();
        assert!(rules.reliability_keywords.contains(&"critical".to_string()));
        assert_eq!(rules.reliability_quantity_threshold, 1000);
        assert!(rules.high_risk_phrases.contains(&"production delays".to_string()));
        assert!(rules.risk_levels.low.contains(&"95%".to_string()));
        assert!(rules.product_keywords.contains(&"bolt".to_string()));
    }

    #[test]
    fn rule_book_is_swappable_without_touching_policy_code() {
        let mut rules = RuleBook::default();
        rules.high_risk_phrases.push("recall notice".to_string());
        assert!(rules.high_risk_phrases.iter().any(|p| p == "recall notice"));
    }
}
