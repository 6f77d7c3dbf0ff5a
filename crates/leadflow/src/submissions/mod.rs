//! Public lead-capture submissions and their admin moderation workflow.
//!
//! Intake validates a form, uploads its file (if any), commits the record and then
//! hands the e-mails to a detached best-effort task. Moderation moves records through
//! per-kind status tables; the admin console composes read-side queries.

pub mod admin;
pub mod domain;
pub mod intake;
pub mod memory;
pub mod moderation;
pub mod notifier;
pub mod router;
pub mod storage;
pub mod store;
pub mod templates;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use admin::{AdminConsole, AdminError, Dashboard, KindSummary, PublicTestimonial};
pub use domain::{
    ContactMessage, Enquiry, JobApplication, JobId, ProgramType, RecordId, RecordSummary,
    StoredRecord, StudentApplication, Submission, SubmissionKind, Testimonial,
};
pub use intake::{
    DeliveryOutcome, IntakeError, IntakeReceipt, IntakeSettings, NotificationReport,
    NotificationTicket, SubmissionIntake, SubmissionRequest,
};
pub use memory::InMemoryRecordStore;
pub use moderation::{LoggingObserver, ModerationEngine, ModerationError, TransitionObserver};
pub use notifier::{Attachment, Email, Notifier, NotifyError, SmtpNotifier};
pub use router::{admin_router, public_router, submission_router};
pub use storage::{ObjectPath, StorageError, StorageGateway, UploadLimits, UploadedFile};
pub use store::{ListFilter, RecordQuery, RecordStore, StoreError};
pub use templates::{BrandProfile, Direction, RenderedEmail};
pub use validation::{SubmissionForm, ValidationError};
pub use workflow::{
    ContactStatus, EnquiryStatus, JobApplicationStatus, RecordPatch, StatusMachine,
    StudentApplicationStatus, TransitionTable,
};

/// The three pipeline services sharing one record store.
pub struct SubmissionPipeline<S, G, N> {
    pub intake: SubmissionIntake<S, G, N>,
    pub moderation: ModerationEngine<S>,
    pub admin: AdminConsole<S>,
}

impl<S, G, N> SubmissionPipeline<S, G, N>
where
    S: RecordStore + 'static,
    G: StorageGateway + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, storage: Arc<G>, notifier: Arc<N>, settings: IntakeSettings) -> Self {
        Self::with_observer(store, storage, notifier, settings, Arc::new(LoggingObserver))
    }

    pub fn with_observer(
        store: Arc<S>,
        storage: Arc<G>,
        notifier: Arc<N>,
        settings: IntakeSettings,
        observer: Arc<dyn TransitionObserver>,
    ) -> Self {
        Self {
            intake: SubmissionIntake::new(store.clone(), storage, notifier, settings),
            moderation: ModerationEngine::with_observer(store.clone(), observer),
            admin: AdminConsole::new(store),
        }
    }
}
