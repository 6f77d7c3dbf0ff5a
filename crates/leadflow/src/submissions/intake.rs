use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::domain::{RecordId, StoredRecord, Submission, SubmissionKind};
use super::notifier::{Attachment, Email, Notifier};
use super::storage::{
    FileRequirement, FileSlot, ObjectPath, StorageError, StorageGateway, UploadLimits, UploadedFile,
};
use super::store::{RecordStore, StoreError};
use super::templates::{self, BrandProfile, Direction};
use super::validation::{SubmissionForm, ValidationError};

/// Static settings the intake pipeline needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct IntakeSettings {
    pub staff_inbox: String,
    pub limits: UploadLimits,
    pub brand: BrandProfile,
}

/// One inbound public submission, optionally carrying a file.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub form: SubmissionForm,
    pub file: Option<UploadedFile>,
}

impl SubmissionRequest {
    pub fn new(form: SubmissionForm) -> Self {
        Self { form, file: None }
    }

    pub fn with_file(mut self, file: UploadedFile) -> Self {
        self.file = Some(file);
        self
    }
}

/// Returned once the durable write has succeeded.
#[derive(Debug)]
pub struct IntakeReceipt {
    pub record: StoredRecord,
    pub notifications: NotificationTicket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Sent,
    Failed(String),
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub staff: DeliveryOutcome,
    pub submitter: DeliveryOutcome,
}

impl NotificationReport {
    fn aborted(reason: &str) -> Self {
        Self {
            staff: DeliveryOutcome::Failed(reason.to_string()),
            submitter: DeliveryOutcome::Failed(reason.to_string()),
        }
    }
}

/// Handle on the best-effort notification step of an intake call.
///
/// Inside a Tokio runtime the sends run on the blocking pool and the caller may
/// drop the ticket without waiting; outside one they have already run inline.
#[derive(Debug)]
pub enum NotificationTicket {
    Delivered(NotificationReport),
    Detached(JoinHandle<NotificationReport>),
}

impl NotificationTicket {
    pub async fn settle(self) -> NotificationReport {
        match self {
            NotificationTicket::Delivered(report) => report,
            NotificationTicket::Detached(handle) => handle.await.unwrap_or_else(|err| {
                warn!(error = %err, "notification task did not complete");
                NotificationReport::aborted("notification task did not complete")
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("file upload failed: {0}")]
    Storage(#[from] StorageError),
    #[error("unable to save submission: {0}")]
    Store(#[from] StoreError),
}

/// Validates, uploads, persists, then notifies. Only the first three can fail the call.
pub struct SubmissionIntake<S, G, N> {
    store: Arc<S>,
    storage: Arc<G>,
    notifier: Arc<N>,
    settings: Arc<IntakeSettings>,
}

impl<S, G, N> SubmissionIntake<S, G, N>
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, storage: Arc<G>, notifier: Arc<N>, settings: IntakeSettings) -> Self {
        Self {
            store,
            storage,
            notifier,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &IntakeSettings {
        &self.settings
    }

    pub fn submit(&self, request: SubmissionRequest) -> Result<IntakeReceipt, IntakeError> {
        let kind = request.form.kind();
        let mut submission = request.form.validate().map_err(|err| {
            debug!(kind = %kind, error = %err, "submission rejected by validation");
            err
        })?;
        let upload = self.check_file(kind, request.file)?;

        let attachment = match upload {
            Some((slot, extension, file)) => {
                let path = ObjectPath::generate(slot.prefix, Some(extension), Utc::now());
                self.storage.put(&path, &file).map_err(|err| {
                    error!(kind = %kind, path = %path, error = %err, "file upload failed; submission dropped");
                    err
                })?;
                submission.attach_file_url(self.storage.public_url(&path));
                Some(Attachment {
                    content_type: file.media_type().to_string(),
                    file_name: file.file_name,
                    bytes: file.bytes,
                })
            }
            None => None,
        };

        let record = self.store.insert(submission).map_err(|err| {
            error!(kind = %kind, error = %err, "durable write failed");
            err
        })?;
        info!(
            kind = %kind,
            record_id = %record.id,
            status = record.status_label(),
            "submission recorded"
        );

        let outbox = self.compose(&record.submission, attachment);
        let notifications = self.dispatch(record.id, kind, outbox);

        Ok(IntakeReceipt {
            record,
            notifications,
        })
    }

    /// Applies the kind's upload policy. Empty parts count as no file.
    fn check_file(
        &self,
        kind: SubmissionKind,
        file: Option<UploadedFile>,
    ) -> Result<Option<(FileSlot, &'static str, UploadedFile)>, ValidationError> {
        let file = file.filter(|file| file.size() > 0);
        let Some(slot) = FileSlot::for_kind(kind, &self.settings.limits) else {
            return match file {
                Some(_) => Err(ValidationError::UnexpectedFile { kind }),
                None => Ok(None),
            };
        };

        let Some(file) = file else {
            return match slot.requirement {
                FileRequirement::Required => Err(ValidationError::MissingFile { field: slot.field }),
                FileRequirement::Optional => Ok(None),
            };
        };

        if file.size() > slot.max_bytes {
            return Err(ValidationError::FileTooLarge {
                field: slot.field,
                size: file.size(),
                limit: slot.max_bytes,
            });
        }
        let Some(extension) = slot.acceptance.stored_extension(&file) else {
            return Err(ValidationError::UnsupportedFileType {
                field: slot.field,
                expected: slot.acceptance.describe(),
            });
        };

        Ok(Some((slot, extension, file)))
    }

    fn compose(&self, submission: &Submission, attachment: Option<Attachment>) -> Outbox {
        let now = Utc::now();
        let staff = templates::render(submission, Direction::Staff, &self.settings.brand, now);
        let submitter =
            templates::render(submission, Direction::Submitter, &self.settings.brand, now);

        Outbox {
            staff: Email {
                to: self.settings.staff_inbox.clone(),
                subject: staff.subject,
                html: staff.html,
                attachment,
            },
            submitter: Email {
                to: submission.submitter_email().to_string(),
                subject: submitter.subject,
                html: submitter.html,
                attachment: None,
            },
        }
    }

    fn dispatch(&self, record_id: RecordId, kind: SubmissionKind, outbox: Outbox) -> NotificationTicket {
        let notifier = Arc::clone(&self.notifier);
        match Handle::try_current() {
            Ok(handle) => NotificationTicket::Detached(
                handle.spawn_blocking(move || deliver(notifier.as_ref(), record_id, kind, &outbox)),
            ),
            Err(_) => NotificationTicket::Delivered(deliver(
                notifier.as_ref(),
                record_id,
                kind,
                &outbox,
            )),
        }
    }
}

struct Outbox {
    staff: Email,
    submitter: Email,
}

/// Staff copy first, then the submitter copy; a failure of one never skips the other.
fn deliver<N: Notifier + ?Sized>(
    notifier: &N,
    record_id: RecordId,
    kind: SubmissionKind,
    outbox: &Outbox,
) -> NotificationReport {
    NotificationReport {
        staff: send_one(notifier, record_id, kind, Direction::Staff, &outbox.staff),
        submitter: send_one(notifier, record_id, kind, Direction::Submitter, &outbox.submitter),
    }
}

fn send_one<N: Notifier + ?Sized>(
    notifier: &N,
    record_id: RecordId,
    kind: SubmissionKind,
    direction: Direction,
    email: &Email,
) -> DeliveryOutcome {
    match notifier.send(email) {
        Ok(()) => {
            debug!(
                kind = %kind,
                record_id = %record_id,
                direction = direction.label(),
                "notification sent"
            );
            DeliveryOutcome::Sent
        }
        Err(err) => {
            warn!(
                kind = %kind,
                record_id = %record_id,
                direction = direction.label(),
                error = %err,
                "notification failed; submission kept"
            );
            DeliveryOutcome::Failed(err.to_string())
        }
    }
}
