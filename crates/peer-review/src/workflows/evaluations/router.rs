use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{EvaluationDraft, EvaluationId, EvaluationStatus, EvaluationSubmission};
use super::repository::{EvaluationRepository, RepositoryError};
use super::service::{EvaluationService, EvaluationServiceError, GradeDecision};

/// Message shown instead of partial output when criteria cannot be scored.
pub const SUGGESTIONS_UNAVAILABLE: &str = "unable to generate suggestions";

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SuggestionQuery {
    #[serde(default)]
    grade: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    status: Option<String>,
}

/// Router builder exposing HTTP endpoints for peer evaluations.
pub fn evaluation_router<R>(service: Arc<EvaluationService<R>>) -> Router
where
    R: EvaluationRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/evaluations",
            post(submit_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/evaluations/suggestions",
            post(suggestions_handler::<R>),
        )
        .route("/api/v1/evaluations/analytics", get(analytics_handler::<R>))
        .route("/api/v1/evaluations/:evaluation_id", get(get_handler::<R>))
        .route(
            "/api/v1/evaluations/:evaluation_id/insights",
            post(insights_handler::<R>).delete(cancel_insights_handler::<R>),
        )
        .route(
            "/api/v1/evaluations/:evaluation_id/grade",
            post(grade_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn suggestions_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Query(query): Query<SuggestionQuery>,
    axum::Json(draft): axum::Json<EvaluationDraft>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let result = if query.grade {
        service.review_draft(&draft)
    } else {
        service.suggest(&draft)
    };

    match result {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    axum::Json(submission): axum::Json<EvaluationSubmission>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.submit(submission) {
        Ok(evaluation) => (StatusCode::ACCEPTED, axum::Json(evaluation.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match EvaluationStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let payload = json!({
                    "error": format!("unknown status '{raw}'"),
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        },
    };

    match service.list(status) {
        Ok(evaluations) => {
            let views: Vec<_> = evaluations.iter().map(|evaluation| evaluation.view()).collect();
            let payload = json!({
                "count": views.len(),
                "evaluations": views,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn analytics_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.analytics() {
        Ok(analytics) => (StatusCode::OK, axum::Json(analytics)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.get(&EvaluationId(evaluation_id)) {
        Ok(evaluation) => (StatusCode::OK, axum::Json(evaluation.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn insights_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    let id = EvaluationId(evaluation_id);
    match service.review_when_ready(&id).await {
        Ok(Some(insights)) => (StatusCode::OK, axum::Json(insights)).into_response(),
        Ok(None) => {
            let payload = json!({
                "evaluationId": id.0,
                "error": "insight request was superseded",
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_insights_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(evaluation_id): Path<String>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    if service.cancel_review(&EvaluationId(evaluation_id)) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        let payload = json!({
            "error": "no pending insight request",
        });
        (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
    }
}

pub(crate) async fn grade_handler<R>(
    State(service): State<Arc<EvaluationService<R>>>,
    Path(evaluation_id): Path<String>,
    axum::Json(decision): axum::Json<GradeDecision>,
) -> Response
where
    R: EvaluationRepository + 'static,
{
    match service.grade(&EvaluationId(evaluation_id), decision) {
        Ok(evaluation) => (StatusCode::OK, axum::Json(evaluation.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: EvaluationServiceError) -> Response {
    let (status, message) = match &error {
        EvaluationServiceError::Scoring(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            SUGGESTIONS_UNAVAILABLE.to_string(),
        ),
        EvaluationServiceError::MissingField(_) | EvaluationServiceError::InvalidGrade(_) => {
            (StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        EvaluationServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, "evaluation not found".to_string())
        }
        EvaluationServiceError::Repository(RepositoryError::Conflict) => {
            (StatusCode::CONFLICT, "evaluation already exists".to_string())
        }
        EvaluationServiceError::Repository(_) => {
            tracing::error!(error = %error, "evaluation repository failure");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    };

    let payload = json!({
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}
