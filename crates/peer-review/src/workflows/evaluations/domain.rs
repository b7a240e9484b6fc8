use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scoring::{CriteriaViolation, ScoringError};

/// Identifier wrapper for stored peer evaluations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The five rating dimensions every peer evaluation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CriterionKey {
    Teamwork,
    Communication,
    TechnicalSkills,
    ProblemSolving,
    Leadership,
}

impl CriterionKey {
    pub const ALL: [CriterionKey; 5] = [
        CriterionKey::Teamwork,
        CriterionKey::Communication,
        CriterionKey::TechnicalSkills,
        CriterionKey::ProblemSolving,
        CriterionKey::Leadership,
    ];

    /// Wire name used in submitted criteria mappings.
    pub fn key(&self) -> &'static str {
        match self {
            CriterionKey::Teamwork => "teamwork",
            CriterionKey::Communication => "communication",
            CriterionKey::TechnicalSkills => "technicalSkills",
            CriterionKey::ProblemSolving => "problemSolving",
            CriterionKey::Leadership => "leadership",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CriterionKey::Teamwork => "Teamwork & Collaboration",
            CriterionKey::Communication => "Communication Skills",
            CriterionKey::TechnicalSkills => "Technical Skills",
            CriterionKey::ProblemSolving => "Problem Solving",
            CriterionKey::Leadership => "Leadership & Initiative",
        }
    }
}

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Ratings for all five criteria, each guaranteed to sit in `1..=5`.
///
/// Only constructible through validation, so downstream scoring never has to
/// re-check presence or range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaRatings {
    pub teamwork: u8,
    pub communication: u8,
    pub technical_skills: u8,
    pub problem_solving: u8,
    pub leadership: u8,
}

impl CriteriaRatings {
    pub fn new(
        teamwork: u8,
        communication: u8,
        technical_skills: u8,
        problem_solving: u8,
        leadership: u8,
    ) -> Result<Self, ScoringError> {
        let ratings = Self {
            teamwork,
            communication,
            technical_skills,
            problem_solving,
            leadership,
        };
        for key in CriterionKey::ALL {
            let value = ratings.get(key);
            if !(MIN_RATING..=MAX_RATING).contains(&value) {
                return Err(ScoringError::invalid(
                    key,
                    CriteriaViolation::OutOfRange(f64::from(value)),
                ));
            }
        }
        Ok(ratings)
    }

    /// Same value for every criterion; handy for fixtures and demos.
    pub fn uniform(value: u8) -> Result<Self, ScoringError> {
        Self::new(value, value, value, value, value)
    }

    /// Validate a raw JSON mapping. Unknown keys are ignored; integral floats
    /// and numeric strings are coerced, anything else is rejected.
    pub fn from_raw(raw: &BTreeMap<String, Value>) -> Result<Self, ScoringError> {
        let mut values = [0u8; 5];
        for (slot, key) in values.iter_mut().zip(CriterionKey::ALL) {
            let value = raw
                .get(key.key())
                .ok_or_else(|| ScoringError::invalid(key, CriteriaViolation::Missing))?;
            *slot = coerce_rating(key, value)?;
        }
        let [teamwork, communication, technical_skills, problem_solving, leadership] = values;
        Self::new(
            teamwork,
            communication,
            technical_skills,
            problem_solving,
            leadership,
        )
    }

    pub fn get(&self, key: CriterionKey) -> u8 {
        match key {
            CriterionKey::Teamwork => self.teamwork,
            CriterionKey::Communication => self.communication,
            CriterionKey::TechnicalSkills => self.technical_skills,
            CriterionKey::ProblemSolving => self.problem_solving,
            CriterionKey::Leadership => self.leadership,
        }
    }

    /// Values in `CriterionKey::ALL` order.
    pub fn values(&self) -> [u8; 5] {
        CriterionKey::ALL.map(|key| self.get(key))
    }
}

impl<'de> Deserialize<'de> for CriteriaRatings {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        CriteriaRatings::from_raw(&raw).map_err(serde::de::Error::custom)
    }
}

fn coerce_rating(criterion: CriterionKey, value: &Value) -> Result<u8, ScoringError> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
    .ok_or_else(|| {
        ScoringError::invalid(criterion, CriteriaViolation::NonNumeric(value.to_string()))
    })?;

    if number.fract() != 0.0 || number < f64::from(MIN_RATING) || number > f64::from(MAX_RATING) {
        return Err(ScoringError::invalid(
            criterion,
            CriteriaViolation::OutOfRange(number),
        ));
    }

    Ok(number as u8)
}

/// A single peer review as authored, prior to any storage concerns.
///
/// Text fields default to empty when absent so that the scorer can treat a
/// missing field exactly like an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    pub criteria: CriteriaRatings,
    #[serde(default, deserialize_with = "lenient_text")]
    pub strengths: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub areas_for_improvement: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub additional_comments: String,
}

/// Unvalidated evaluation as it arrives over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDraft {
    #[serde(default)]
    pub criteria: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub strengths: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub areas_for_improvement: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub additional_comments: String,
}

impl EvaluationDraft {
    pub fn validate(&self) -> Result<EvaluationRecord, ScoringError> {
        Ok(EvaluationRecord {
            criteria: CriteriaRatings::from_raw(&self.criteria)?,
            strengths: self.strengths.clone(),
            areas_for_improvement: self.areas_for_improvement.clone(),
            additional_comments: self.additional_comments.clone(),
        })
    }
}

impl From<&EvaluationRecord> for EvaluationDraft {
    fn from(record: &EvaluationRecord) -> Self {
        let criteria = CriterionKey::ALL
            .iter()
            .map(|key| (key.key().to_string(), Value::from(record.criteria.get(*key))))
            .collect();
        Self {
            criteria,
            strengths: record.strengths.clone(),
            areas_for_improvement: record.areas_for_improvement.clone(),
            additional_comments: record.additional_comments.clone(),
        }
    }
}

/// Non-string text (null, numbers, objects) collapses to an empty string.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        _ => String::new(),
    })
}

/// Lifecycle of a stored evaluation: `submitted -> reviewed -> graded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Submitted,
    Reviewed,
    Graded,
}

impl EvaluationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            EvaluationStatus::Submitted => "submitted",
            EvaluationStatus::Reviewed => "reviewed",
            EvaluationStatus::Graded => "graded",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submitted" => Some(Self::Submitted),
            "reviewed" => Some(Self::Reviewed),
            "graded" => Some(Self::Graded),
            _ => None,
        }
    }
}

/// Payload a student sends when filing a peer evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationSubmission {
    pub assignment_id: String,
    pub student_id: String,
    pub evaluator_name: String,
    pub peer_name: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub draft: EvaluationDraft,
}

/// Persisted evaluation including teacher-side review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEvaluation {
    pub id: EvaluationId,
    pub assignment_id: String,
    pub student_id: String,
    pub evaluator_name: String,
    pub peer_name: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub record: EvaluationRecord,
    pub status: EvaluationStatus,
    #[serde(default)]
    pub ai_suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_grade: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_comments: Option<String>,
}

impl StudentEvaluation {
    /// Unrounded mean of the five ratings.
    pub fn mean_rating(&self) -> f64 {
        let values = self.record.criteria.values();
        let total: u32 = values.iter().map(|value| u32::from(*value)).sum();
        f64::from(total) / values.len() as f64
    }

    /// Mean rating for display, rounded to one decimal place.
    pub fn average_rating(&self) -> f64 {
        round_to(self.mean_rating(), 1)
    }

    pub fn view(&self) -> EvaluationView {
        EvaluationView {
            id: self.id.clone(),
            assignment_id: self.assignment_id.clone(),
            student_id: self.student_id.clone(),
            evaluator_name: self.evaluator_name.clone(),
            peer_name: self.peer_name.clone(),
            date: self.date,
            status: self.status.label(),
            average_rating: self.average_rating(),
            criteria: self.record.criteria,
            ai_suggestions: self.ai_suggestions.clone(),
            teacher_grade: self.teacher_grade,
            teacher_comments: self.teacher_comments.clone(),
        }
    }
}

/// Sanitized representation of an evaluation for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationView {
    pub id: EvaluationId,
    pub assignment_id: String,
    pub student_id: String,
    pub evaluator_name: String,
    pub peer_name: String,
    pub date: NaiveDate,
    pub status: &'static str,
    pub average_rating: f64,
    pub criteria: CriteriaRatings,
    pub ai_suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_grade: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teacher_comments: Option<String>,
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
