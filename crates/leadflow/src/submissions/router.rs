//! HTTP surface of the submission pipeline.
//!
//! [`public_router`] serves the website forms and the published testimonials.
//! [`admin_router`] exposes submitter contact details and mutates records; it
//! performs no authentication of its own and must only be mounted behind the
//! identity provider that guards the admin console.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, FromRequest, Multipart, Path, Query, Request, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::error;

use super::admin::AdminError;
use super::domain::{RecordId, SubmissionKind};
use super::intake::{IntakeError, SubmissionRequest};
use super::moderation::ModerationError;
use super::notifier::Notifier;
use super::storage::{FileSlot, StorageGateway, UploadedFile};
use super::store::{ListFilter, RecordStore, StoreError};
use super::validation::{SubmissionForm, TestimonialForm, ValidationError};
use super::workflow::transition_table;
use super::SubmissionPipeline;

/// Multipart framing on top of the largest accepted file.
const BODY_OVERHEAD_BYTES: usize = 256 * 1024;

/// Public intake endpoints plus the admin console API on one router.
pub fn submission_router<S, G, N>(pipeline: Arc<SubmissionPipeline<S, G, N>>) -> Router
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    public_router(pipeline.clone()).merge(admin_router(pipeline))
}

/// Form submission and the published testimonial feed.
pub fn public_router<S, G, N>(pipeline: Arc<SubmissionPipeline<S, G, N>>) -> Router
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let body_limit = pipeline.intake.settings().limits.largest() + BODY_OVERHEAD_BYTES;

    Router::new()
        .route("/api/v1/submissions/:kind", post(submit_handler::<S, G, N>))
        .route("/api/v1/testimonials", get(public_testimonials_handler::<S, G, N>))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(pipeline)
}

/// Record listing, moderation and deletion under `/api/v1/admin`.
pub fn admin_router<S, G, N>(pipeline: Arc<SubmissionPipeline<S, G, N>>) -> Router
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route("/api/v1/admin/dashboard", get(dashboard_handler::<S, G, N>))
        .route("/api/v1/admin/workflows/:kind", get(workflow_handler))
        .route("/api/v1/admin/submissions/:kind", get(list_handler::<S, G, N>))
        .route(
            "/api/v1/admin/submissions/:kind/:id",
            get(record_handler::<S, G, N>).delete(delete_handler::<S, G, N>),
        )
        .route(
            "/api/v1/admin/submissions/:kind/:id/status",
            post(status_handler::<S, G, N>),
        )
        .route(
            "/api/v1/admin/submissions/:kind/:id/notes",
            axum::routing::put(notes_handler::<S, G, N>),
        )
        .route(
            "/api/v1/admin/testimonials/:id",
            axum::routing::patch(edit_testimonial_handler::<S, G, N>),
        )
        .route(
            "/api/v1/admin/testimonials/:id/approval",
            post(approval_handler::<S, G, N>),
        )
        .route(
            "/api/v1/admin/testimonials/:id/featured",
            post(featured_handler::<S, G, N>),
        )
        .with_state(pipeline)
}

type Pipeline<S, G, N> = State<Arc<SubmissionPipeline<S, G, N>>>;

pub(crate) fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({
        "success": false,
        "message": message.into(),
    });
    (status, Json(payload)).into_response()
}

fn parse_kind(raw: &str) -> Result<SubmissionKind, Response> {
    SubmissionKind::from_slug(raw).ok_or_else(|| {
        failure(
            StatusCode::NOT_FOUND,
            format!("unknown submission kind '{raw}'"),
        )
    })
}

fn parse_id(raw: &str) -> Result<RecordId, Response> {
    raw.parse::<RecordId>()
        .map_err(|_| failure(StatusCode::BAD_REQUEST, format!("'{raw}' is not a valid record id")))
}

fn validation_status(err: &ValidationError) -> StatusCode {
    match err {
        ValidationError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::NotFound | StoreError::Rejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn intake_failure(err: IntakeError) -> Response {
    let status = match &err {
        IntakeError::Validation(inner) => validation_status(inner),
        IntakeError::Storage(_) => StatusCode::BAD_GATEWAY,
        IntakeError::Store(inner) => store_status(inner),
    };
    failure(status, err.to_string())
}

fn moderation_failure(err: ModerationError) -> Response {
    let status = match &err {
        ModerationError::IllegalTransition { .. } | ModerationError::UnsupportedChange { .. } => {
            StatusCode::CONFLICT
        }
        ModerationError::NotFound { .. } => StatusCode::NOT_FOUND,
        ModerationError::Validation(inner) => validation_status(inner),
        ModerationError::Store(inner) => store_status(inner),
    };
    failure(status, err.to_string())
}

fn admin_failure(err: AdminError) -> Response {
    let status = match &err {
        AdminError::NotFound { .. } => StatusCode::NOT_FOUND,
        AdminError::Store(inner) => store_status(inner),
    };
    failure(status, err.to_string())
}

fn malformed_json(rejection: JsonRejection) -> Response {
    failure(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Accepts `application/json`, or `multipart/form-data` with a JSON `data` part
/// (or one text part per field) and the kind's file part.
pub(crate) async fn submit_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path(slug): Path<String>,
    request: Request,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let kind = match parse_kind(&slug) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"));

    let decoded = if is_multipart {
        let slot = FileSlot::for_kind(kind, &pipeline.intake.settings().limits);
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => read_multipart(multipart, slot.map(|slot| slot.field)).await,
            Err(rejection) => Err(failure(StatusCode::BAD_REQUEST, rejection.body_text())),
        }
    } else {
        match Json::<Value>::from_request(request, &()).await {
            Ok(Json(payload)) => Ok((payload, None)),
            Err(rejection) => Err(malformed_json(rejection)),
        }
    };
    let (payload, file) = match decoded {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let form = match SubmissionForm::from_json(kind, payload) {
        Ok(form) => form,
        Err(err) => return failure(validation_status(&err), err.to_string()),
    };

    // Uploads and store writes block, so intake runs off the async workers.
    let request = SubmissionRequest { form, file };
    let intake = pipeline.clone();
    let outcome = match tokio::task::spawn_blocking(move || intake.intake.submit(request)).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(kind = %kind, error = %err, "intake task did not complete");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, "submission could not be processed");
        }
    };
    match outcome {
        Ok(receipt) => {
            let record = receipt.record;
            let payload = json!({
                "success": true,
                "id": record.id,
                "kind": record.kind(),
                "status": record.status_label(),
                "created_at": record.created_at,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => intake_failure(err),
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    file_field: Option<&'static str>,
) -> Result<(Value, Option<UploadedFile>), Response> {
    let malformed = |message: String| failure(StatusCode::BAD_REQUEST, message);
    let mut data: Option<Value> = None;
    let mut fields = Map::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| malformed(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if file_field == Some(name.as_str()) {
            let file_name = field.file_name().unwrap_or(name.as_str()).to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(|err| malformed(err.body_text()))?;
            file = Some(UploadedFile::new(file_name, content_type, bytes.to_vec()));
            continue;
        }

        let text = field.text().await.map_err(|err| malformed(err.body_text()))?;
        if name == "data" {
            let parsed = serde_json::from_str(&text)
                .map_err(|err| malformed(format!("'data' is not valid JSON: {err}")))?;
            data = Some(parsed);
        } else if !name.is_empty() {
            fields.insert(name, Value::String(text));
        }
    }

    Ok((data.unwrap_or(Value::Object(fields)), file))
}

pub(crate) async fn public_testimonials_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    match pipeline.admin.public_testimonials() {
        Ok(testimonials) => {
            let payload = json!({
                "success": true,
                "testimonials": testimonials,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => admin_failure(err),
    }
}

pub(crate) async fn dashboard_handler<S, G, N>(State(pipeline): Pipeline<S, G, N>) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    match pipeline.admin.dashboard() {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => admin_failure(err),
    }
}

pub(crate) async fn workflow_handler(Path(slug): Path<String>) -> Response {
    let kind = match parse_kind(&slug) {
        Ok(kind) => kind,
        Err(response) => return response,
    };

    let payload = match transition_table(kind) {
        Some(table) => json!(table),
        None => json!({
            "kind": kind,
            "initial": "unapproved",
            "statuses": ["unapproved", "approved"],
            "terminal": [],
            "edges": [
                { "from": "unapproved", "to": "approved" },
                { "from": "approved", "to": "unapproved" },
            ],
            "flags": ["approved", "is_featured"],
        }),
    };
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn list_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path(slug): Path<String>,
    filter: Result<Query<ListFilter>, QueryRejection>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let kind = match parse_kind(&slug) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let filter = match filter {
        Ok(Query(filter)) => filter,
        Err(rejection) => return failure(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    match pipeline.admin.list(kind, filter) {
        Ok(records) => {
            let payload = json!({
                "success": true,
                "kind": kind,
                "count": records.len(),
                "records": records,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => admin_failure(err),
    }
}

pub(crate) async fn record_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path((slug, raw_id)): Path<(String, String)>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let (kind, id) = match parse_kind(&slug).and_then(|kind| Ok((kind, parse_id(&raw_id)?))) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let record = match pipeline.admin.get(kind, &id) {
        Ok(record) => record,
        Err(err) => return admin_failure(err),
    };
    let next = super::workflow::next_statuses(&record.submission);
    let payload = json!({
        "success": true,
        "record": record,
        "next_statuses": next,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn delete_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path((slug, raw_id)): Path<(String, String)>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let (kind, id) = match parse_kind(&slug).and_then(|kind| Ok((kind, parse_id(&raw_id)?))) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    match pipeline.moderation.delete(kind, &id) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true, "id": id }))).into_response(),
        Err(err) => moderation_failure(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotesChange {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalChange {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeaturedChange {
    pub featured: bool,
}

fn changed(record: super::domain::StoredRecord) -> Response {
    let payload = json!({
        "success": true,
        "id": record.id,
        "status": record.status_label(),
        "record": record,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn status_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path((slug, raw_id)): Path<(String, String)>,
    body: Result<Json<StatusChange>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let (kind, id) = match parse_kind(&slug).and_then(|kind| Ok((kind, parse_id(&raw_id)?))) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let Json(change) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_json(rejection),
    };

    match pipeline
        .moderation
        .transition(kind, &id, &change.status, change.notes)
    {
        Ok(record) => changed(record),
        Err(err) => moderation_failure(err),
    }
}

pub(crate) async fn notes_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path((slug, raw_id)): Path<(String, String)>,
    body: Result<Json<NotesChange>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let (kind, id) = match parse_kind(&slug).and_then(|kind| Ok((kind, parse_id(&raw_id)?))) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let Json(change) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_json(rejection),
    };

    match pipeline.moderation.annotate(kind, &id, change.notes) {
        Ok(record) => changed(record),
        Err(err) => moderation_failure(err),
    }
}

pub(crate) async fn approval_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path(raw_id): Path<String>,
    body: Result<Json<ApprovalChange>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(change) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_json(rejection),
    };

    match pipeline.moderation.set_approval(&id, change.approved) {
        Ok(record) => changed(record),
        Err(err) => moderation_failure(err),
    }
}

pub(crate) async fn featured_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path(raw_id): Path<String>,
    body: Result<Json<FeaturedChange>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(change) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_json(rejection),
    };

    match pipeline.moderation.set_featured(&id, change.featured) {
        Ok(record) => changed(record),
        Err(err) => moderation_failure(err),
    }
}

pub(crate) async fn edit_testimonial_handler<S, G, N>(
    State(pipeline): Pipeline<S, G, N>,
    Path(raw_id): Path<String>,
    body: Result<Json<TestimonialForm>, JsonRejection>,
) -> Response
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let Json(edit) = match body {
        Ok(body) => body,
        Err(rejection) => return malformed_json(rejection),
    };

    match pipeline.moderation.edit_testimonial(&id, edit) {
        Ok(record) => changed(record),
        Err(err) => moderation_failure(err),
    }
}
