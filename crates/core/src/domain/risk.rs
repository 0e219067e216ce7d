use serde::{Deserialize, Serialize};

use crate::rules::RiskLevelRules;

/// Ordinal supplier risk derived from free-text notes.
///
/// Variant order is the ranking order: a lower variant ranks better. Unknown
/// sorts after High on purpose — an explicit bad signal still carries more
/// information than no signal, and an unassessed supplier must never outrank
/// an assessed one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Unknown,
}

impl RiskLevel {
    /// Maps a risk note to an ordinal level via fixed trigger phrases.
    /// Rules are checked in priority order: High before Low before Moderate;
    /// the first matching rule wins.
    pub fn from_note(note: Option<&str>, rules: &RiskLevelRules) -> Self {
        let note = note.unwrap_or_default().to_lowercase();
        if rules.high.iter().any(|phrase| note.contains(phrase)) {
            Self::High
        } else if rules.low.iter().any(|phrase| note.contains(phrase)) {
            Self::Low
        } else if rules.moderate.iter().any(|phrase| note.contains(phrase)) {
            Self::Moderate
        } else {
            Self::Unknown
        }
    }

    /// Presentation label shown in evaluation summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Risk (Major quality issues last year, be cautious)",
            Self::Low => "Low Risk (Reliable supplier, consistent on-time delivery)",
            Self::Moderate => "Moderate Risk (Occasional issues or delays)",
            Self::Unknown => "Unknown Risk (Insufficient data)",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Unknown => "Unknown",
        };
        write!(f, "{name}")
    }
}
