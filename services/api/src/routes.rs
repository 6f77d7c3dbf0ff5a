use crate::demo::{parse_direction, parse_kind, render_sample};
use crate::infra::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use leadflow::submissions::{
    submission_router, BrandProfile, Direction, Notifier, RecordStore, StorageGateway,
    SubmissionPipeline,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_service_routes<S, G, N>(pipeline: Arc<SubmissionPipeline<S, G, N>>) -> Router
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let brand = pipeline.intake.settings().brand.clone();
    let previews = Router::new()
        .route("/api/v1/admin/previews/:kind", get(preview_endpoint))
        .with_state(Arc::new(brand));

    submission_router(pipeline)
        .merge(previews)
        .route("/api/health", get(healthcheck))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "leadflow" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct PreviewQuery {
    #[serde(default)]
    pub(crate) direction: Option<String>,
}

/// Renders the sample e-mail for a kind with the live brand profile.
pub(crate) async fn preview_endpoint(
    State(brand): State<Arc<BrandProfile>>,
    Path(slug): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let kind = match parse_kind(&slug) {
        Ok(kind) => kind,
        Err(message) => return failure(StatusCode::NOT_FOUND, message),
    };
    let direction = match query.direction.as_deref() {
        Some(raw) => match parse_direction(raw) {
            Ok(direction) => direction,
            Err(message) => return failure(StatusCode::BAD_REQUEST, message),
        },
        None => Direction::Staff,
    };

    match render_sample(kind, direction, &brand) {
        Ok(email) => (
            StatusCode::OK,
            [("x-email-subject", email.subject.replace(|c: char| !c.is_ascii(), "?"))],
            Html(email.html),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

fn failure(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}
