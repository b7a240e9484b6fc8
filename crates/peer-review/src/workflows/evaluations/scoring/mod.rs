//! Deterministic quality heuristics for peer evaluations.
//!
//! Ratings are aggregated and the free text is reduced to a handful of
//! signals; an ordered rule table turns those into suggestions and, for the
//! reviewer-facing variant, a first-match table picks an advisory grade.

mod aggregate;
mod grade;
mod rules;
mod signals;

use std::fmt;

use serde::Serialize;

pub use aggregate::CriteriaAggregate;
pub use grade::{GradeEstimate, GradeTier};
pub use rules::Suggestion;
pub use signals::TextSignals;

use super::domain::{CriterionKey, EvaluationDraft, EvaluationRecord};
use rules::RuleContext;

/// Why a criteria mapping was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum CriteriaViolation {
    Missing,
    NonNumeric(String),
    OutOfRange(f64),
}

impl fmt::Display for CriteriaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriteriaViolation::Missing => write!(f, "is missing"),
            CriteriaViolation::NonNumeric(found) => write!(f, "is not numeric (found {found})"),
            CriteriaViolation::OutOfRange(value) => {
                write!(f, "must be a whole number from 1 to 5 (found {value})")
            }
        }
    }
}

/// The only way scoring can fail; text is never rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid criteria: {} {reason}", .criterion.key())]
    InvalidCriteria {
        criterion: CriterionKey,
        reason: CriteriaViolation,
    },
}

impl ScoringError {
    pub fn invalid(criterion: CriterionKey, reason: CriteriaViolation) -> Self {
        Self::InvalidCriteria { criterion, reason }
    }
}

/// Caller-facing result: ordered suggestion messages plus the advisory grade
/// when the grading variant ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResult {
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_grade: Option<u8>,
}

/// Everything the scorer derived for one record, for views that need more
/// than the message list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub aggregate: CriteriaAggregate,
    pub signals: TextSignals,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<GradeEstimate>,
}

impl QualityReport {
    pub fn messages(&self) -> Vec<String> {
        self.suggestions
            .iter()
            .map(|suggestion| suggestion.message().to_string())
            .collect()
    }

    pub fn to_result(&self) -> ScoringResult {
        ScoringResult {
            suggestions: self.messages(),
            suggested_grade: self.grade.map(|estimate| estimate.grade),
        }
    }
}

/// Stateless scorer shared by the self-service form and the review flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Self-service variant: suggestions only.
    pub fn suggest(&self, record: &EvaluationRecord) -> ScoringResult {
        self.analyze(record, false).to_result()
    }

    /// Reviewer variant: suggestions plus a suggested grade.
    pub fn review(&self, record: &EvaluationRecord) -> ScoringResult {
        self.analyze(record, true).to_result()
    }

    /// Validates the draft's criteria before running the self-service variant.
    pub fn suggest_draft(&self, draft: &EvaluationDraft) -> Result<ScoringResult, ScoringError> {
        Ok(self.suggest(&draft.validate()?))
    }

    /// Validates the draft's criteria before running the reviewer variant.
    pub fn review_draft(&self, draft: &EvaluationDraft) -> Result<ScoringResult, ScoringError> {
        Ok(self.review(&draft.validate()?))
    }

    /// Reviewer report together with its grade tier.
    pub fn grade_report(&self, record: &EvaluationRecord) -> (QualityReport, GradeEstimate) {
        let ctx = Self::context(record);
        let estimate = grade::estimate(&ctx);
        (Self::report(&ctx, Some(estimate)), estimate)
    }

    pub fn analyze(&self, record: &EvaluationRecord, with_grade: bool) -> QualityReport {
        let ctx = Self::context(record);
        let grade = with_grade.then(|| grade::estimate(&ctx));
        Self::report(&ctx, grade)
    }

    fn report(ctx: &RuleContext, grade: Option<GradeEstimate>) -> QualityReport {
        QualityReport {
            aggregate: ctx.aggregate,
            signals: ctx.signals,
            suggestions: rules::synthesize(ctx),
            grade,
        }
    }

    fn context(record: &EvaluationRecord) -> RuleContext {
        RuleContext {
            aggregate: aggregate::aggregate(&record.criteria),
            signals: signals::extract(record),
        }
    }
}
