use serde::Serialize;

use super::super::domain::EvaluationRecord;

pub(crate) const SPECIFICS_KEYWORDS: [&str; 4] = ["example", "project", "when", "during"];
pub(crate) const ACTIONABLE_KEYWORDS: [&str; 4] = ["could", "should", "try", "suggest"];

/// Facts derived from the free-text fields that the rule tables match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSignals {
    pub strengths_length: usize,
    pub improvements_length: usize,
    pub has_specifics_in_strengths: bool,
    pub has_actionable_improvement: bool,
}

pub(crate) fn extract(record: &EvaluationRecord) -> TextSignals {
    TextSignals {
        strengths_length: record.strengths.chars().count(),
        improvements_length: record.areas_for_improvement.chars().count(),
        has_specifics_in_strengths: contains_any(&record.strengths, &SPECIFICS_KEYWORDS),
        has_actionable_improvement: contains_any(
            &record.areas_for_improvement,
            &ACTIONABLE_KEYWORDS,
        ),
    }
}

// Plain substring containment: "trying" counts for "try", "whenever" for "when".
fn contains_any(text: &str, needles: &[&str]) -> bool {
    if text.is_empty() {
        return false;
    }
    let lowered = text.to_lowercase();
    needles.iter().any(|needle| lowered.contains(needle))
}
