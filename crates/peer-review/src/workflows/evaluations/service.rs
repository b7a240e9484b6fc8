use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::analytics::EvaluationAnalytics;
use super::domain::{
    EvaluationDraft, EvaluationId, EvaluationStatus, EvaluationSubmission, StudentEvaluation,
};
use super::insights::InsightScheduler;
use super::repository::{EvaluationRepository, RepositoryError};
use super::scoring::{QualityScorer, ScoringError, ScoringResult, Suggestion};

pub const MAX_GRADE: i64 = 100;

/// Teacher's confirmed grade for an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeDecision {
    pub grade: i64,
    #[serde(default)]
    pub comments: String,
}

/// One suggestion rendered for reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionView {
    pub kind: Suggestion,
    pub message: &'static str,
    pub detail: &'static str,
    pub concern: bool,
}

impl From<Suggestion> for SuggestionView {
    fn from(kind: Suggestion) -> Self {
        Self {
            kind,
            message: kind.message(),
            detail: kind.detail(),
            concern: kind.is_concern(),
        }
    }
}

/// Reviewer-facing analysis of a stored evaluation. The suggested grade is
/// advisory and is not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInsights {
    pub evaluation_id: EvaluationId,
    pub status: &'static str,
    pub average_rating: f64,
    pub suggestions: Vec<String>,
    pub findings: Vec<SuggestionView>,
    pub suggested_grade: u8,
    pub grade_rationale: &'static str,
}

/// Service composing the repository, scorer, and insight scheduling.
pub struct EvaluationService<R> {
    repository: Arc<R>,
    scorer: QualityScorer,
    insights: InsightScheduler,
}

impl<R> EvaluationService<R>
where
    R: EvaluationRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_insight_delay(repository, Duration::ZERO)
    }

    pub fn with_insight_delay(repository: Arc<R>, delay: Duration) -> Self {
        Self {
            repository,
            scorer: QualityScorer::new(),
            insights: InsightScheduler::new(delay),
        }
    }

    /// Self-service suggestions for an unsaved draft.
    pub fn suggest(&self, draft: &EvaluationDraft) -> Result<ScoringResult, EvaluationServiceError> {
        Ok(self.scorer.suggest_draft(draft)?)
    }

    /// Reviewer preview for an unsaved draft: suggestions plus a grade.
    pub fn review_draft(
        &self,
        draft: &EvaluationDraft,
    ) -> Result<ScoringResult, EvaluationServiceError> {
        Ok(self.scorer.review_draft(draft)?)
    }

    /// Validate and store a new evaluation with status `submitted`.
    pub fn submit(
        &self,
        submission: EvaluationSubmission,
    ) -> Result<StudentEvaluation, EvaluationServiceError> {
        let record = submission.draft.validate()?;
        require_text("evaluatorName", &submission.evaluator_name)?;
        require_text("peerName", &submission.peer_name)?;
        require_text("strengths", &record.strengths)?;
        require_text("areasForImprovement", &record.areas_for_improvement)?;

        let ai_suggestions = self.scorer.suggest(&record).suggestions;
        let id = self.repository.allocate_id()?;

        let evaluation = StudentEvaluation {
            id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            evaluator_name: submission.evaluator_name.trim().to_string(),
            peer_name: submission.peer_name.trim().to_string(),
            date: submission
                .date
                .unwrap_or_else(|| Local::now().date_naive()),
            record,
            status: EvaluationStatus::Submitted,
            ai_suggestions,
            teacher_grade: None,
            teacher_comments: None,
        };

        let stored = self.repository.insert(evaluation)?;
        info!(evaluation_id = %stored.id, peer = %stored.peer_name, "peer evaluation submitted");
        Ok(stored)
    }

    /// Run the reviewer variant and move a submitted evaluation to `reviewed`.
    pub fn review(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<ReviewInsights, EvaluationServiceError> {
        let evaluation = self.repository.modify(evaluation_id, &|stored| {
            if stored.status == EvaluationStatus::Submitted {
                stored.status = EvaluationStatus::Reviewed;
            }
        })?;
        let (report, estimate) = self.scorer.grade_report(&evaluation.record);

        info!(
            evaluation_id = %evaluation.id,
            suggested_grade = estimate.grade,
            "generated review insights"
        );

        Ok(ReviewInsights {
            evaluation_id: evaluation.id.clone(),
            status: evaluation.status.label(),
            average_rating: report.aggregate.display_mean(),
            suggestions: report.messages(),
            findings: report
                .suggestions
                .iter()
                .copied()
                .map(SuggestionView::from)
                .collect(),
            suggested_grade: estimate.grade,
            grade_rationale: estimate.rationale(),
        })
    }

    /// Review after the configured insight delay. `Ok(None)` means the request
    /// was superseded or cancelled and nothing was applied.
    pub async fn review_when_ready(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<Option<ReviewInsights>, EvaluationServiceError> {
        self.insights
            .run(evaluation_id, || self.review(evaluation_id))
            .await
            .transpose()
    }

    pub fn cancel_review(&self, evaluation_id: &EvaluationId) -> bool {
        self.insights.cancel(evaluation_id)
    }

    /// Record the teacher's confirmed grade and comments.
    pub fn grade(
        &self,
        evaluation_id: &EvaluationId,
        decision: GradeDecision,
    ) -> Result<StudentEvaluation, EvaluationServiceError> {
        if !(0..=MAX_GRADE).contains(&decision.grade) {
            warn!(evaluation_id = %evaluation_id, grade = decision.grade, "rejected out of range grade");
            return Err(EvaluationServiceError::InvalidGrade(decision.grade));
        }

        let comments = decision.comments.trim();
        let comments = (!comments.is_empty()).then(|| comments.to_string());
        let evaluation = self.repository.modify(evaluation_id, &|stored| {
            stored.teacher_grade = Some(decision.grade as u8);
            stored.teacher_comments = comments.clone();
            stored.status = EvaluationStatus::Graded;
        })?;
        info!(evaluation_id = %evaluation.id, grade = decision.grade, "evaluation graded");
        Ok(evaluation)
    }

    /// Fetch an evaluation for API responses.
    pub fn get(
        &self,
        evaluation_id: &EvaluationId,
    ) -> Result<StudentEvaluation, EvaluationServiceError> {
        let evaluation = self
            .repository
            .fetch(evaluation_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(evaluation)
    }

    pub fn list(
        &self,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<StudentEvaluation>, EvaluationServiceError> {
        Ok(self.repository.list(status)?)
    }

    pub fn analytics(&self) -> Result<EvaluationAnalytics, EvaluationServiceError> {
        let evaluations = self.repository.list(None)?;
        Ok(EvaluationAnalytics::from_evaluations(&evaluations))
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), EvaluationServiceError> {
    if value.trim().is_empty() {
        Err(EvaluationServiceError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Error raised by the evaluation service.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("grade must be between 0 and 100 (found {0})")]
    InvalidGrade(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
