use crate::domain::offer::Offer;
use crate::domain::risk::RiskLevel;
use crate::rules::RuleBook;

/// Substring screen over every free-text field that might carry supplier risk
/// commentary, including the derived risk-assessment label.
///
/// This is a phrase match, not a semantic classifier: differently worded risk
/// slips through and an unrelated mention of a trigger phrase flags the
/// offer. Both are accepted limitations of the rule table.
pub fn is_high_risk(offer: &Offer, rules: &RuleBook) -> bool {
    let assessment = RiskLevel::from_note(offer.risk_note.as_deref(), &rules.risk_levels);
    let commentary =
        format!("{} {}", assessment.label(), offer.risk_commentary()).to_lowercase();
    rules.high_risk_phrases.iter().any(|phrase| commentary.contains(phrase))
}

#[cfg(test)]
mod tests {
    use crate::domain::offer::{Offer, OfferDraft};
    use crate::rules::RuleBook;

    use super::is_high_risk;

    fn offer_with_risk(risk_note: Option<&str>) -> Offer {
        OfferDraft {
            supplier: "Premier Metals".to_string(),
            item: "10mm steel bolt".to_string(),
            risk_note: risk_note.map(str::to_string),
            raw_text: "Premier Metals quotes the 10mm steel bolt.".to_string(),
            ..OfferDraft::default()
        }
        .validate()
        .expect("fixture offer is valid")
    }

    #[test]
    fn flags_each_trigger_phrase() {
        let rules = RuleBook::default();
        for note in [
            "Be cautious; high risk.",
            "Major quality issues last year.",
            "Caused production delays at the plant.",
        ] {
            assert!(is_high_risk(&offer_with_risk(Some(note)), &rules), "{note}");
        }
    }

    #[test]
    fn scans_supplier_comments_too() {
        let rules = RuleBook::default();
        let mut offer = offer_with_risk(None);
        offer.supplier_comments = Some("Watch out for quality issues.".to_string());
        assert!(is_high_risk(&offer, &rules));
    }

    #[test]
    fn clean_commentary_is_not_flagged() {
        let rules = RuleBook::default();
        assert!(!is_high_risk(
            &offer_with_risk(Some("Reliable supplier, on-time delivery rate 95%.")),
            &rules
        ));
        assert!(!is_high_risk(&offer_with_risk(None), &rules));
    }

    #[test]
    fn phrase_in_unrelated_context_still_flags() {
        // Known limitation of substring matching.
        let rules = RuleBook::default();
        let offer =
            offer_with_risk(Some("Their competitor had quality issues; this one did not."));
        assert!(is_high_risk(&offer, &rules));
    }
}
