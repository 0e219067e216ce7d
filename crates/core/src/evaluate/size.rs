use std::sync::OnceLock;

use regex::Regex;

use crate::domain::offer::Offer;

fn query_size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)(\d+)\s*mm").expect("size pattern is valid"))
}

/// The millimetre size named by the query, if any.
pub fn required_size(query: &str) -> Option<String> {
    query_size_pattern().captures(query).map(|captures| captures[1].to_string())
}

/// Outcome of the size pre-filter. Size mismatch is never relaxed: an
/// exhausted result is terminal for the query.
#[derive(Clone, Debug, PartialEq)]
pub enum SizeFilterOutcome {
    /// The query names no size; all offers pass through unchanged.
    Unconstrained(Vec<Offer>),
    Matched { required_mm: String, offers: Vec<Offer> },
    Exhausted { required_mm: String },
}

/// Retain only offers whose item description carries the exact size token the
/// query asks for, word-boundary matched with or without a space before "mm".
pub fn filter_by_size(query: &str, offers: Vec<Offer>) -> SizeFilterOutcome {
    let Some(required_mm) = required_size(query) else {
        return SizeFilterOutcome::Unconstrained(offers);
    };

    let item_pattern = Regex::new(&format!(r"(?i)\b{required_mm}\s*mm\b"))
        .expect("interpolated digits keep the pattern valid");

    let matched: Vec<Offer> =
        offers.into_iter().filter(|offer| item_pattern.is_match(&offer.item)).collect();

    if matched.is_empty() {
        SizeFilterOutcome::Exhausted { required_mm }
    } else {
        SizeFilterOutcome::Matched { required_mm, offers: matched }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::offer::OfferDraft;

    use super::{filter_by_size, required_size, SizeFilterOutcome};

    fn offer(supplier: &str, item: &str) -> crate::domain::offer::Offer {
        OfferDraft {
            supplier: supplier.to_string(),
            item: item.to_string(),
            raw_text: format!("{supplier} quotes {item}."),
            ..OfferDraft::default()
        }
        .validate()
        .expect("fixture offer is valid")
    }

    #[test]
    fn extracts_size_with_or_without_space() {
        assert_eq!(required_size("10mm bolts, urgent"), Some("10".to_string()));
        assert_eq!(required_size("need 12 mm fasteners"), Some("12".to_string()));
        assert_eq!(required_size("steel bolts for next month"), None);
    }

    #[test]
    fn keeps_only_matching_sizes() {
        let offers = vec![
            offer("A", "10mm steel bolt"),
            offer("B", "10 mm steel bolt"),
            offer("C", "12mm steel bolt"),
        ];

        match filter_by_size("10mm bolts", offers) {
            SizeFilterOutcome::Matched { required_mm, offers } => {
                assert_eq!(required_mm, "10");
                let suppliers: Vec<&str> =
                    offers.iter().map(|o| o.supplier.as_str()).collect();
                assert_eq!(suppliers, vec!["A", "B"]);
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn size_token_is_word_boundary_matched() {
        // "110mm" must not satisfy a 10mm requirement.
        let offers = vec![offer("A", "110mm rod")];
        assert!(matches!(
            filter_by_size("10mm rod", offers),
            SizeFilterOutcome::Exhausted { .. }
        ));
    }

    #[test]
    fn query_without_size_passes_everything_through() {
        let offers = vec![offer("A", "10mm steel bolt"), offer("B", "12mm steel bolt")];
        match filter_by_size("steel bolts", offers) {
            SizeFilterOutcome::Unconstrained(offers) => assert_eq!(offers.len(), 2),
            other => panic!("expected pass-through, got {other:?}"),
        }
    }

    #[test]
    fn no_matching_size_is_terminal() {
        let offers = vec![offer("A", "10mm steel bolt")];
        assert_eq!(
            filter_by_size("8mm fasteners", offers),
            SizeFilterOutcome::Exhausted { required_mm: "8".to_string() }
        );
    }
}
