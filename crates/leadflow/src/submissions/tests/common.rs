use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::{json, Value};

use crate::submissions::domain::{RecordId, StoredRecord, Submission, SubmissionKind};
use crate::submissions::intake::{IntakeSettings, NotificationReport, NotificationTicket};
use crate::submissions::memory::InMemoryRecordStore;
use crate::submissions::moderation::TransitionObserver;
use crate::submissions::notifier::{Email, Notifier, NotifyError};
use crate::submissions::storage::{
    ObjectPath, StorageError, StorageGateway, UploadLimits, UploadedFile,
};
use crate::submissions::store::{RecordQuery, RecordStore, StoreError};
use crate::submissions::templates::BrandProfile;
use crate::submissions::validation::SubmissionForm;
use crate::submissions::workflow::RecordPatch;
use crate::submissions::{SubmissionIntake, SubmissionPipeline, SubmissionRequest};

pub(super) const STAFF_INBOX: &str = "staff@acme.test";

pub(super) fn payload(kind: SubmissionKind) -> Value {
    match kind {
        SubmissionKind::ContactMessage => json!({
            "name": "Asha",
            "email": "asha@x.com",
            "phone": "+91 98450 12345",
            "message": "Need a quote",
        }),
        SubmissionKind::Enquiry => json!({
            "name": "Ravi Kumar",
            "email": "ravi@northwind.test",
            "company": "Northwind",
            "service_type": "Web Development",
            "project_description": "Rebuild our storefront with a headless CMS.",
        }),
        SubmissionKind::StudentApplication => json!({
            "full_name": "Meera Nair",
            "email": "meera@college.test",
            "phone": "9876543210",
            "college_university": "State Engineering College",
            "degree": "B.Tech",
            "year_of_study": "3",
            "program_type": "internship",
        }),
        SubmissionKind::JobApplication => json!({
            "job_id": "job-42",
            "job_title": "Backend Engineer",
            "full_name": "Daniel Osei",
            "email": "daniel@mail.test",
            "phone": "+44 20 7946 0018",
            "current_location": "Leeds",
            "willing_to_relocate": true,
            "current_job_title": "Software Engineer",
            "total_experience": "4 years",
            "relevant_skills": "Rust, PostgreSQL, Kubernetes",
            "linkedin_url": "https://www.linkedin.com/in/daniel-osei",
            "project_links": "https://github.com/dosei/ledger\nhttps://github.com/dosei/queue",
            "highest_degree": "MSc Computer Science",
            "university": "University of Leeds",
            "graduation_year": 2019,
            "cover_letter": "I enjoy building reliable services.",
        }),
        SubmissionKind::Testimonial => json!({
            "name": "Priya Shah",
            "email": "priya@brightlabs.test",
            "position": "CTO",
            "company": "Bright Labs",
            "testimonial": "Delivered on time and the platform has been rock solid.",
            "rating": 5,
        }),
    }
}

pub(super) fn required_fields(kind: SubmissionKind) -> &'static [&'static str] {
    match kind {
        SubmissionKind::ContactMessage => &["name", "email", "message"],
        SubmissionKind::Enquiry => &["name", "email", "service_type", "project_description"],
        SubmissionKind::StudentApplication => &[
            "full_name",
            "email",
            "phone",
            "college_university",
            "degree",
            "year_of_study",
            "program_type",
        ],
        SubmissionKind::JobApplication => &[
            "job_id",
            "full_name",
            "email",
            "phone",
            "current_location",
            "current_job_title",
            "total_experience",
            "relevant_skills",
            "highest_degree",
            "university",
            "graduation_year",
        ],
        SubmissionKind::Testimonial => &["name", "email", "position", "testimonial", "rating"],
    }
}

pub(super) fn payload_without(kind: SubmissionKind, field: &str) -> Value {
    let mut payload = payload(kind);
    if let Some(object) = payload.as_object_mut() {
        object.remove(field);
    }
    payload
}

pub(super) fn form(kind: SubmissionKind) -> SubmissionForm {
    SubmissionForm::from_json(kind, payload(kind)).expect("fixture payload decodes")
}

pub(super) fn resume() -> UploadedFile {
    UploadedFile::new(
        "daniel-osei-cv.pdf",
        Some("application/pdf".to_string()),
        b"%PDF-1.7 fixture".to_vec(),
    )
}

pub(super) fn avatar() -> UploadedFile {
    UploadedFile::new(
        "priya.png",
        Some("image/png".to_string()),
        vec![0x89, b'P', b'N', b'G'],
    )
}

/// A complete request for `kind`, with the file its kind expects.
pub(super) fn request(kind: SubmissionKind) -> SubmissionRequest {
    let request = SubmissionRequest::new(form(kind));
    match kind {
        SubmissionKind::JobApplication => request.with_file(resume()),
        _ => request,
    }
}

pub(super) fn settings() -> IntakeSettings {
    IntakeSettings {
        staff_inbox: STAFF_INBOX.to_string(),
        limits: UploadLimits::default(),
        brand: brand(),
    }
}

pub(super) fn brand() -> BrandProfile {
    BrandProfile {
        name: "Acme Digital".to_string(),
        tagline: "Software & Cloud Services".to_string(),
        website: "https://acme.test".to_string(),
        logo_url: Some("https://acme.test/logo.png".to_string()),
        contact_email: "hello@acme.test".to_string(),
        contact_phone: Some("+1 555 0100".to_string()),
        address: Some("1 Harbour Street, Springfield".to_string()),
    }
}

pub(super) fn delivered(ticket: NotificationTicket) -> NotificationReport {
    match ticket {
        NotificationTicket::Delivered(report) => report,
        NotificationTicket::Detached(_) => panic!("expected inline delivery outside a runtime"),
    }
}

pub(super) type TestIntake = SubmissionIntake<InMemoryRecordStore, MemoryStorage, RecordingNotifier>;
pub(super) type TestPipeline =
    SubmissionPipeline<InMemoryRecordStore, MemoryStorage, RecordingNotifier>;

pub(super) struct Harness {
    pub(super) store: Arc<InMemoryRecordStore>,
    pub(super) storage: Arc<MemoryStorage>,
    pub(super) notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self {
            store: Arc::new(InMemoryRecordStore::new()),
            storage: Arc::new(MemoryStorage::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub(super) fn intake(&self) -> TestIntake {
        self.intake_with(settings())
    }

    pub(super) fn intake_with(&self, settings: IntakeSettings) -> TestIntake {
        SubmissionIntake::new(
            self.store.clone(),
            self.storage.clone(),
            self.notifier.clone(),
            settings,
        )
    }

    pub(super) fn pipeline(&self) -> Arc<TestPipeline> {
        Arc::new(SubmissionPipeline::new(
            self.store.clone(),
            self.storage.clone(),
            self.notifier.clone(),
            settings(),
        ))
    }

    /// Inserts a valid record of `kind` straight into the store.
    pub(super) fn seed(&self, kind: SubmissionKind) -> StoredRecord {
        let mut submission = form(kind).validate().expect("fixture validates");
        if kind == SubmissionKind::JobApplication {
            submission.attach_file_url("https://cdn.acme.test/resumes/seed.pdf".to_string());
        }
        self.store.insert(submission).expect("seed insert")
    }

    pub(super) fn stored(&self, kind: SubmissionKind) -> Vec<StoredRecord> {
        self.store
            .query(&RecordQuery::all(kind))
            .expect("query succeeds")
    }
}

#[derive(Default)]
pub(super) struct MemoryStorage {
    objects: Mutex<Vec<(String, UploadedFile)>>,
}

impl MemoryStorage {
    pub(super) fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl StorageGateway for MemoryStorage {
    fn put(&self, path: &ObjectPath, file: &UploadedFile) -> Result<(), StorageError> {
        self.objects
            .lock()
            .expect("storage mutex poisoned")
            .push((path.to_string(), file.clone()));
        Ok(())
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        format!("https://cdn.acme.test/{path}")
    }
}

pub(super) struct FailingStorage;

impl StorageGateway for FailingStorage {
    fn put(&self, _path: &ObjectPath, _file: &UploadedFile) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("bucket offline".to_string()))
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        format!("https://cdn.acme.test/{path}")
    }
}

/// Holds each upload until `expected` uploads are in flight at once, giving up after five seconds.
pub(super) struct RendezvousStorage {
    expected: usize,
    arrived: Mutex<usize>,
    all_in: Condvar,
}

impl RendezvousStorage {
    pub(super) fn new(expected: usize) -> Self {
        Self {
            expected,
            arrived: Mutex::new(0),
            all_in: Condvar::new(),
        }
    }
}

impl StorageGateway for RendezvousStorage {
    fn put(&self, _path: &ObjectPath, _file: &UploadedFile) -> Result<(), StorageError> {
        let mut arrived = self.arrived.lock().expect("storage mutex poisoned");
        *arrived += 1;
        self.all_in.notify_all();
        let (_arrived, wait) = self
            .all_in
            .wait_timeout_while(arrived, Duration::from_secs(5), |arrived| {
                *arrived < self.expected
            })
            .expect("storage mutex poisoned");
        if wait.timed_out() {
            return Err(StorageError::Unavailable("uploads never overlapped".to_string()));
        }
        Ok(())
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        format!("https://cdn.acme.test/{path}")
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<Email>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<Email> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, email: &Email) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}

/// Fails every send but counts the attempts.
#[derive(Default)]
pub(super) struct FailingNotifier {
    attempts: AtomicUsize,
}

impl FailingNotifier {
    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Notifier for FailingNotifier {
    fn send(&self, _email: &Email) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Transport("connection refused".to_string()))
    }
}

/// Fails only the staff copy.
pub(super) struct StaffOnlyFailure {
    pub(super) delivered: Mutex<Vec<String>>,
}

impl Notifier for StaffOnlyFailure {
    fn send(&self, email: &Email) -> Result<(), NotifyError> {
        if email.to == STAFF_INBOX {
            return Err(NotifyError::Transport("staff mailbox full".to_string()));
        }
        self.delivered
            .lock()
            .expect("notifier mutex poisoned")
            .push(email.to.clone());
        Ok(())
    }
}

pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn insert(&self, _submission: Submission) -> Result<StoredRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(
        &self,
        _kind: SubmissionKind,
        _id: &RecordId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _kind: SubmissionKind,
        _id: &RecordId,
        _patch: &RecordPatch,
    ) -> Result<StoredRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _kind: SubmissionKind, _id: &RecordId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn query(&self, _query: &RecordQuery) -> Result<Vec<StoredRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct RecordingObserver {
    changes: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingObserver {
    pub(super) fn changes(&self) -> Vec<(&'static str, String)> {
        self.changes.lock().expect("observer mutex poisoned").clone()
    }
}

impl TransitionObserver for RecordingObserver {
    fn record_changed(&self, patch: &RecordPatch, record: &StoredRecord) {
        self.changes
            .lock()
            .expect("observer mutex poisoned")
            .push((patch.describe(), record.status_label().to_string()));
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}

pub(super) const BOUNDARY: &str = "leadflow-test-boundary";

/// Hand-built `multipart/form-data` body with a JSON `data` part and an optional file part.
pub(super) fn multipart_body(data: &Value, file: Option<(&str, &UploadedFile)>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"data\"\r\n\r\n{data}\r\n"
        )
        .as_bytes(),
    );
    if let Some((field, upload)) = file {
        let content_type = upload
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{}\"\r\nContent-Type: {content_type}\r\n\r\n",
                upload.file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(&upload.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
