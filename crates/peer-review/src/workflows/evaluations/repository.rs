use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::domain::{EvaluationId, EvaluationStatus, StudentEvaluation};

/// Key holding the serialized evaluation list.
pub const EVALUATIONS_KEY: &str = "teacher_evaluations";
/// Key holding the last allocated evaluation number.
pub const SEQUENCE_KEY: &str = "teacher_evaluation_sequence";

/// Flat key-value persistence, e.g. browser-style local storage or a JSON file.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;
    fn set(&self, key: &str, blob: String) -> Result<(), RepositoryError>;
}

/// Storage abstraction so the service module can be exercised in isolation.
pub trait EvaluationRepository: Send + Sync {
    fn allocate_id(&self) -> Result<EvaluationId, RepositoryError>;
    fn insert(&self, evaluation: StudentEvaluation) -> Result<StudentEvaluation, RepositoryError>;
    /// Apply `change` to the stored evaluation and persist it as one step.
    /// Returns the evaluation as stored afterwards.
    fn modify(
        &self,
        id: &EvaluationId,
        change: &dyn Fn(&mut StudentEvaluation),
    ) -> Result<StudentEvaluation, RepositoryError>;
    fn fetch(&self, id: &EvaluationId) -> Result<Option<StudentEvaluation>, RepositoryError>;
    fn list(&self, status: Option<EvaluationStatus>)
        -> Result<Vec<StudentEvaluation>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored data under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Evaluation repository persisted as JSON blobs in a [`BlobStore`].
///
/// Every mutation is a read-modify-write of the whole list, serialized by an
/// internal lock.
pub struct BlobEvaluationRepository<S> {
    blobs: Arc<S>,
    write_lock: Mutex<()>,
}

impl<S: BlobStore> BlobEvaluationRepository<S> {
    pub fn new(blobs: Arc<S>) -> Self {
        Self {
            blobs,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<StudentEvaluation>, RepositoryError> {
        match self.blobs.get(EVALUATIONS_KEY)? {
            Some(blob) if !blob.trim().is_empty() => {
                serde_json::from_str(&blob).map_err(|source| RepositoryError::Corrupt {
                    key: EVALUATIONS_KEY.to_string(),
                    source,
                })
            }
            _ => Ok(Vec::new()),
        }
    }

    fn save(&self, evaluations: &[StudentEvaluation]) -> Result<(), RepositoryError> {
        self.blobs.set(EVALUATIONS_KEY, to_blob(EVALUATIONS_KEY, evaluations)?)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, RepositoryError> {
        self.write_lock
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))
    }
}

fn to_blob<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|source| RepositoryError::Corrupt {
        key: key.to_string(),
        source,
    })
}

impl<S: BlobStore> EvaluationRepository for BlobEvaluationRepository<S> {
    fn allocate_id(&self) -> Result<EvaluationId, RepositoryError> {
        let _guard = self.lock()?;
        let last = match self.blobs.get(SEQUENCE_KEY)? {
            Some(blob) => serde_json::from_str::<u64>(&blob).map_err(|source| {
                RepositoryError::Corrupt {
                    key: SEQUENCE_KEY.to_string(),
                    source,
                }
            })?,
            None => 0,
        };
        let next = last + 1;
        self.blobs.set(SEQUENCE_KEY, to_blob(SEQUENCE_KEY, &next)?)?;
        Ok(EvaluationId(format!("eval-{next:06}")))
    }

    fn insert(&self, evaluation: StudentEvaluation) -> Result<StudentEvaluation, RepositoryError> {
        let _guard = self.lock()?;
        let mut evaluations = self.load()?;
        if evaluations.iter().any(|existing| existing.id == evaluation.id) {
            return Err(RepositoryError::Conflict);
        }
        evaluations.push(evaluation.clone());
        self.save(&evaluations)?;
        Ok(evaluation)
    }

    fn modify(
        &self,
        id: &EvaluationId,
        change: &dyn Fn(&mut StudentEvaluation),
    ) -> Result<StudentEvaluation, RepositoryError> {
        let _guard = self.lock()?;
        let mut evaluations = self.load()?;
        let slot = evaluations
            .iter_mut()
            .find(|existing| &existing.id == id)
            .ok_or(RepositoryError::NotFound)?;
        change(slot);
        let updated = slot.clone();
        self.save(&evaluations)?;
        Ok(updated)
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<StudentEvaluation>, RepositoryError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|evaluation| &evaluation.id == id))
    }

    fn list(
        &self,
        status: Option<EvaluationStatus>,
    ) -> Result<Vec<StudentEvaluation>, RepositoryError> {
        let mut evaluations: Vec<_> = self
            .load()?
            .into_iter()
            .filter(|evaluation| status.map_or(true, |wanted| evaluation.status == wanted))
            .collect();
        evaluations.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(evaluations)
    }
}
