use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{RecordId, StoredRecord, SubmissionKind};
use super::store::{RecordStore, StoreError};
use super::validation::{TestimonialForm, ValidationError};
use super::workflow::{next_statuses, PatchRejected, RecordPatch, StatusTarget};

/// Notified after every change the engine applies. Hook for status-change e-mails.
pub trait TransitionObserver: Send + Sync {
    fn record_changed(&self, patch: &RecordPatch, record: &StoredRecord);
}

/// Default observer: a structured log line per applied change.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl TransitionObserver for LoggingObserver {
    fn record_changed(&self, patch: &RecordPatch, record: &StoredRecord) {
        info!(
            kind = %record.kind(),
            record_id = %record.id,
            change = patch.describe(),
            status = record.status_label(),
            "moderation change applied"
        );
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    #[error("{kind} cannot move from '{from}' to '{to}'")]
    IllegalTransition {
        kind: SubmissionKind,
        from: String,
        to: String,
    },
    #[error("{kind} records do not support {change} changes")]
    UnsupportedChange {
        kind: SubmissionKind,
        change: &'static str,
    },
    #[error("{kind} {id} not found")]
    NotFound { kind: SubmissionKind, id: RecordId },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("record store failed: {0}")]
    Store(StoreError),
}

impl ModerationError {
    /// True for every rejection that leaves the record unchanged because the change is not allowed.
    pub fn is_illegal(&self) -> bool {
        matches!(
            self,
            ModerationError::IllegalTransition { .. } | ModerationError::UnsupportedChange { .. }
        )
    }
}

/// Applies admin actions to stored records, one atomic store update per action.
///
/// Two admins moving the same record race as last-write-wins, but legality is
/// always checked against the status the store holds at update time.
pub struct ModerationEngine<S> {
    store: Arc<S>,
    observer: Arc<dyn TransitionObserver>,
}

impl<S> ModerationEngine<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_observer(store, Arc::new(LoggingObserver))
    }

    pub fn with_observer(store: Arc<S>, observer: Arc<dyn TransitionObserver>) -> Self {
        Self { store, observer }
    }

    /// Moves a record to `target`. Testimonials accept `approved`/`unapproved`.
    pub fn transition(
        &self,
        kind: SubmissionKind,
        id: &RecordId,
        target: &str,
        notes: Option<String>,
    ) -> Result<StoredRecord, ModerationError> {
        let notes = clean_notes(notes);
        let patch = match kind {
            SubmissionKind::Testimonial if notes.is_some() => {
                self.fetch(kind, id)?;
                warn!(kind = %kind, record_id = %id, "notes are not kept on testimonials");
                return Err(ModerationError::UnsupportedChange {
                    kind,
                    change: "notes",
                });
            }
            SubmissionKind::Testimonial => match target.trim().to_ascii_lowercase().as_str() {
                "approved" => RecordPatch::Approval { approved: true },
                "unapproved" => RecordPatch::Approval { approved: false },
                _ => return Err(self.unknown_target(kind, id, target)),
            },
            _ => match StatusTarget::parse(kind, target) {
                Some(target) => RecordPatch::Status { target, notes },
                None => return Err(self.unknown_target(kind, id, target)),
            },
        };

        self.apply(kind, id, patch)
    }

    /// Approving also activates; unapproving deactivates. `is_featured` is left alone.
    pub fn set_approval(&self, id: &RecordId, approved: bool) -> Result<StoredRecord, ModerationError> {
        self.apply(
            SubmissionKind::Testimonial,
            id,
            RecordPatch::Approval { approved },
        )
    }

    pub fn set_featured(&self, id: &RecordId, featured: bool) -> Result<StoredRecord, ModerationError> {
        self.apply(
            SubmissionKind::Testimonial,
            id,
            RecordPatch::Featured { featured },
        )
    }

    /// Replaces admin notes without touching the status. Blank notes clear them.
    pub fn annotate(
        &self,
        kind: SubmissionKind,
        id: &RecordId,
        notes: Option<String>,
    ) -> Result<StoredRecord, ModerationError> {
        self.apply(
            kind,
            id,
            RecordPatch::Notes {
                notes: clean_notes(notes),
            },
        )
    }

    /// Re-validates and replaces testimonial content; approval flags are untouched.
    pub fn edit_testimonial(
        &self,
        id: &RecordId,
        edit: TestimonialForm,
    ) -> Result<StoredRecord, ModerationError> {
        let content = edit.content()?;
        self.apply(
            SubmissionKind::Testimonial,
            id,
            RecordPatch::TestimonialContent(content),
        )
    }

    /// Hard delete regardless of status. Uploaded files are left in storage.
    pub fn delete(&self, kind: SubmissionKind, id: &RecordId) -> Result<(), ModerationError> {
        self.store
            .delete(kind, id)
            .map_err(|err| self.store_error(kind, id, err))?;
        info!(kind = %kind, record_id = %id, "record deleted");
        Ok(())
    }

    /// Status labels the record can move to next.
    pub fn legal_transitions(
        &self,
        kind: SubmissionKind,
        id: &RecordId,
    ) -> Result<Vec<&'static str>, ModerationError> {
        let record = self.fetch(kind, id)?;
        Ok(next_statuses(&record.submission))
    }

    fn fetch(&self, kind: SubmissionKind, id: &RecordId) -> Result<StoredRecord, ModerationError> {
        self.store
            .fetch(kind, id)
            .map_err(|err| self.store_error(kind, id, err))?
            .ok_or(ModerationError::NotFound { kind, id: *id })
    }

    fn apply(
        &self,
        kind: SubmissionKind,
        id: &RecordId,
        patch: RecordPatch,
    ) -> Result<StoredRecord, ModerationError> {
        let record = self.store.update(kind, id, &patch).map_err(|err| {
            let err = self.store_error(kind, id, err);
            if err.is_illegal() {
                warn!(kind = %kind, record_id = %id, change = patch.describe(), error = %err, "moderation change rejected");
            }
            err
        })?;
        self.observer.record_changed(&patch, &record);
        Ok(record)
    }

    /// Unknown target labels are illegal transitions; a missing record still reports 404.
    fn unknown_target(&self, kind: SubmissionKind, id: &RecordId, target: &str) -> ModerationError {
        let from = match self.fetch(kind, id) {
            Ok(record) => record.status_label().to_string(),
            Err(err) => return err,
        };
        warn!(kind = %kind, record_id = %id, from = %from, to = target, "unknown target status");
        ModerationError::IllegalTransition {
            kind,
            from,
            to: target.trim().to_string(),
        }
    }

    fn store_error(&self, kind: SubmissionKind, id: &RecordId, err: StoreError) -> ModerationError {
        match err {
            StoreError::NotFound => ModerationError::NotFound { kind, id: *id },
            StoreError::Rejected(PatchRejected::IllegalTransition { kind, from, to }) => {
                ModerationError::IllegalTransition {
                    kind,
                    from: from.to_string(),
                    to: to.to_string(),
                }
            }
            StoreError::Rejected(PatchRejected::Unsupported { kind, change }) => {
                ModerationError::UnsupportedChange { kind, change }
            }
            other @ StoreError::Unavailable(_) => ModerationError::Store(other),
        }
    }
}

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|notes| !notes.trim().is_empty())
}
