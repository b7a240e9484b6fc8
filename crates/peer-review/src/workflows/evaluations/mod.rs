//! Peer evaluation intake, quality scoring, and teacher review.
//!
//! Students file evaluations of their teammates; the scorer turns ratings and
//! feedback text into ordered quality suggestions, and teachers review,
//! grade, and export the results.

pub mod analytics;
pub mod domain;
pub mod gradebook;
pub mod insights;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use analytics::EvaluationAnalytics;
pub use domain::{
    CriteriaRatings, CriterionKey, EvaluationDraft, EvaluationId, EvaluationRecord,
    EvaluationStatus, EvaluationSubmission, EvaluationView, StudentEvaluation,
};
pub use gradebook::{write_gradebook, GradebookError};
pub use insights::InsightScheduler;
pub use repository::{
    BlobEvaluationRepository, BlobStore, EvaluationRepository, RepositoryError, EVALUATIONS_KEY,
    SEQUENCE_KEY,
};
pub use router::evaluation_router;
pub use scoring::{
    GradeEstimate, GradeTier, QualityReport, QualityScorer, ScoringError, ScoringResult,
    Suggestion,
};
pub use service::{
    EvaluationService, EvaluationServiceError, GradeDecision, ReviewInsights, SuggestionView,
};
