use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::workflows::evaluations::domain::{
    EvaluationDraft, EvaluationId, EvaluationStatus, EvaluationSubmission, StudentEvaluation,
};
use crate::workflows::evaluations::repository::{
    BlobEvaluationRepository, BlobStore, EvaluationRepository, RepositoryError,
};
use crate::workflows::evaluations::{evaluation_router, EvaluationService};

pub(super) type MemoryRepository = BlobEvaluationRepository<MemoryBlobStore>;

/// Pad `prefix` with dots up to exactly `len` characters.
pub(super) fn padded(prefix: &str, len: usize) -> String {
    let used = prefix.chars().count();
    assert!(used <= len, "prefix longer than requested length");
    format!("{prefix}{}", ".".repeat(len - used))
}

pub(super) fn draft(ratings: [u8; 5], strengths: &str, improvements: &str) -> EvaluationDraft {
    let [teamwork, communication, technical, problem_solving, leadership] = ratings;
    serde_json::from_value(json!({
        "criteria": {
            "teamwork": teamwork,
            "communication": communication,
            "technicalSkills": technical,
            "problemSolving": problem_solving,
            "leadership": leadership
        },
        "strengths": strengths,
        "areasForImprovement": improvements,
    }))
    .expect("draft parses")
}

pub(super) fn detailed_strengths() -> String {
    padded(
        "For example, during the sprint review Michael walked the class through the API design.",
        120,
    )
}

pub(super) fn actionable_improvements() -> String {
    padded("Michael could improve by sharing progress earlier in the week.", 90)
}

pub(super) fn submission() -> EvaluationSubmission {
    EvaluationSubmission {
        assignment_id: "assign-1".to_string(),
        student_id: "student-7".to_string(),
        evaluator_name: "Sarah Johnson".to_string(),
        peer_name: "Michael Chen".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 11, 28),
        draft: draft([5, 5, 5, 5, 5], &detailed_strengths(), &actionable_improvements()),
    }
}

pub(super) fn build_service() -> (
    EvaluationService<MemoryRepository>,
    Arc<MemoryRepository>,
    Arc<MemoryBlobStore>,
) {
    let blobs = Arc::new(MemoryBlobStore::default());
    let repository = Arc::new(BlobEvaluationRepository::new(blobs.clone()));
    let service = EvaluationService::new(repository.clone());
    (service, repository, blobs)
}

pub(super) fn evaluation_router_with_service(
    service: EvaluationService<MemoryRepository>,
) -> axum::Router {
    evaluation_router(Arc::new(service))
}

#[derive(Default, Clone)]
pub(super) struct MemoryBlobStore {
    pub(super) blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBlobStore {
    pub(super) fn raw(&self, key: &str) -> Option<String> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .get(key)
            .cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, blob: String) -> Result<(), RepositoryError> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .insert(key.to_string(), blob);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl EvaluationRepository for UnavailableRepository {
    fn allocate_id(&self) -> Result<EvaluationId, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn insert(&self, _evaluation: StudentEvaluation) -> Result<StudentEvaluation, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn modify(
        &self,
        _id: &EvaluationId,
        _change: &dyn Fn(&mut StudentEvaluation),
    ) -> Result<StudentEvaluation, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn fetch(&self, _id: &EvaluationId) -> Result<Option<StudentEvaluation>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn list(
        &self,
        _status: Option<EvaluationStatus>,
    ) -> Result<Vec<StudentEvaluation>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }
}

/// Commits a teacher grade immediately before the next modification it
/// forwards, as if a grading request landed while a review was in flight.
pub(super) struct GradeLandsFirst {
    pub(super) inner: Arc<MemoryRepository>,
    pub(super) grade: u8,
}

impl EvaluationRepository for GradeLandsFirst {
    fn allocate_id(&self) -> Result<EvaluationId, RepositoryError> {
        self.inner.allocate_id()
    }

    fn insert(&self, evaluation: StudentEvaluation) -> Result<StudentEvaluation, RepositoryError> {
        self.inner.insert(evaluation)
    }

    fn modify(
        &self,
        id: &EvaluationId,
        change: &dyn Fn(&mut StudentEvaluation),
    ) -> Result<StudentEvaluation, RepositoryError> {
        let grade = self.grade;
        self.inner.modify(id, &|stored| {
            stored.teacher_grade = Some(grade);
            stored.teacher_comments = Some("graded concurrently".to_string());
            stored.status = EvaluationStatus::Graded;
        })?;
        self.inner.modify(id, change)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<StudentEvaluation>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn list(
        &self,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<StudentEvaluation>, RepositoryError> {
        self.inner.list(status)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
