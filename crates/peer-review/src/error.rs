use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::evaluations::router::error_response;
use crate::workflows::evaluations::{EvaluationServiceError, GradebookError, ScoringError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Input(serde_json::Error),
    Evaluation(EvaluationServiceError),
    Gradebook(GradebookError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Input(err) => write!(f, "invalid input: {}", err),
            AppError::Evaluation(err) => write!(f, "evaluation error: {}", err),
            AppError::Gradebook(err) => write!(f, "gradebook error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Input(err) => Some(err),
            AppError::Evaluation(err) => Some(err),
            AppError::Gradebook(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Evaluation(err) => return error_response(err),
            AppError::Input(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Gradebook(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(value)
    }
}

impl From<EvaluationServiceError> for AppError {
    fn from(value: EvaluationServiceError) -> Self {
        Self::Evaluation(value)
    }
}

impl From<ScoringError> for AppError {
    fn from(value: ScoringError) -> Self {
        Self::Evaluation(EvaluationServiceError::Scoring(value))
    }
}

impl From<GradebookError> for AppError {
    fn from(value: GradebookError) -> Self {
        Self::Gradebook(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::evaluations::router::SUGGESTIONS_UNAVAILABLE;
    use crate::workflows::evaluations::scoring::CriteriaViolation;
    use crate::workflows::evaluations::{CriterionKey, RepositoryError};
    use axum::body::to_bytes;

    #[test]
    fn evaluation_errors_map_to_client_or_server_status() {
        let missing = AppError::from(EvaluationServiceError::MissingField("strengths"));
        assert_eq!(
            missing.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let unavailable = AppError::from(EvaluationServiceError::Repository(
            RepositoryError::Unavailable("disk full".to_string()),
        ));
        assert_eq!(
            unavailable.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn display_prefixes_the_failing_layer() {
        let err = AppError::from(EvaluationServiceError::InvalidGrade(140));
        assert_eq!(
            err.to_string(),
            "evaluation error: grade must be between 0 and 100 (found 140)"
        );
    }

    #[tokio::test]
    async fn invalid_criteria_use_the_generic_suggestions_body() {
        let err = AppError::from(ScoringError::invalid(
            CriterionKey::Teamwork,
            CriteriaViolation::Missing,
        ));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = to_bytes(response.into_body(), 1024).await.expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload, json!({ "error": SUGGESTIONS_UNAVAILABLE }));
    }

    #[test]
    fn missing_evaluation_maps_to_not_found() {
        let err = AppError::from(EvaluationServiceError::Repository(RepositoryError::NotFound));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
