use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use peer_review::config::AppConfig;
use peer_review::error::AppError;
use peer_review::workflows::evaluations::{
    BlobEvaluationRepository, BlobStore, EvaluationService, RepositoryError,
};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

pub(crate) type AppEvaluationService = EvaluationService<BlobEvaluationRepository<AppBlobStore>>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl BlobStore for InMemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let guard = self.blobs.lock().map_err(|_| poisoned())?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, blob: String) -> Result<(), RepositoryError> {
        let mut guard = self.blobs.lock().map_err(|_| poisoned())?;
        guard.insert(key.to_string(), blob);
        Ok(())
    }
}

/// Blob store persisted as a single JSON object of `key -> blob` on disk.
pub(crate) struct FileBlobStore {
    path: PathBuf,
    blobs: Mutex<BTreeMap<String, String>>,
}

impl FileBlobStore {
    pub(crate) fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let blobs = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            blobs: Mutex::new(blobs),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, blobs: &BTreeMap<String, String>) -> Result<(), RepositoryError> {
        let encoded = serde_json::to_string_pretty(blobs)
            .map_err(|err| RepositoryError::Unavailable(format!("encode store: {err}")))?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::Unavailable(format!("create {}: {err}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, encoded).map_err(|err| {
            RepositoryError::Unavailable(format!("write {}: {err}", self.path.display()))
        })
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let guard = self.blobs.lock().map_err(|_| poisoned())?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, blob: String) -> Result<(), RepositoryError> {
        let mut guard = self.blobs.lock().map_err(|_| poisoned())?;
        let mut staged = guard.clone();
        staged.insert(key.to_string(), blob);
        self.flush(&staged)?;
        *guard = staged;
        Ok(())
    }
}

/// Store selected by `APP_STORAGE_PATH`.
pub(crate) enum AppBlobStore {
    Memory(InMemoryBlobStore),
    File(FileBlobStore),
}

impl AppBlobStore {
    pub(crate) fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        match &config.storage.path {
            Some(path) => Ok(Self::File(FileBlobStore::open(path)?)),
            None => Ok(Self::Memory(InMemoryBlobStore::default())),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            AppBlobStore::Memory(_) => "memory".to_string(),
            AppBlobStore::File(store) => store.path().display().to_string(),
        }
    }
}

impl BlobStore for AppBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        match self {
            AppBlobStore::Memory(store) => store.get(key),
            AppBlobStore::File(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, blob: String) -> Result<(), RepositoryError> {
        match self {
            AppBlobStore::Memory(store) => store.set(key, blob),
            AppBlobStore::File(store) => store.set(key, blob),
        }
    }
}

pub(crate) fn build_service(
    config: &AppConfig,
    store: AppBlobStore,
) -> Arc<AppEvaluationService> {
    let repository = Arc::new(BlobEvaluationRepository::new(Arc::new(store)));
    Arc::new(EvaluationService::with_insight_delay(
        repository,
        config.insights.delay,
    ))
}

pub(crate) fn in_memory_service() -> Arc<AppEvaluationService> {
    let store = AppBlobStore::Memory(InMemoryBlobStore::default());
    let repository = Arc::new(BlobEvaluationRepository::new(Arc::new(store)));
    Arc::new(EvaluationService::new(repository))
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("blob store lock poisoned".to_string())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
