use serde::Deserialize;

use super::domain::{JobId, RecordId, StoredRecord, Submission, SubmissionKind};
use super::workflow::{PatchRejected, RecordPatch};

/// Durable storage for submissions, one logical table per kind.
///
/// `insert` is the commit point of an intake call. `update` must be a single atomic
/// operation: implementations apply [`RecordPatch::apply`] inside their own
/// transaction (or conditional `UPDATE`) instead of reading and writing separately.
pub trait RecordStore: Send + Sync {
    fn insert(&self, submission: Submission) -> Result<StoredRecord, StoreError>;
    fn fetch(&self, kind: SubmissionKind, id: &RecordId)
        -> Result<Option<StoredRecord>, StoreError>;
    fn update(
        &self,
        kind: SubmissionKind,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<StoredRecord, StoreError>;
    fn delete(&self, kind: SubmissionKind, id: &RecordId) -> Result<(), StoreError>;
    fn query(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Rejected(#[from] PatchRejected),
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Optional filters the admin console applies when listing a kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListFilter {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub active: Option<bool>,
    /// Case-insensitive match against submitter name and email.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub kind: SubmissionKind,
    pub filter: ListFilter,
}

impl RecordQuery {
    pub fn all(kind: SubmissionKind) -> Self {
        Self {
            kind,
            filter: ListFilter::default(),
        }
    }

    pub fn filtered(kind: SubmissionKind, filter: ListFilter) -> Self {
        Self { kind, filter }
    }

    pub fn matches(&self, record: &StoredRecord) -> bool {
        if record.kind() != self.kind {
            return false;
        }

        let filter = &self.filter;
        if let Some(status) = non_blank(filter.status.as_deref()) {
            if !record.status_label().eq_ignore_ascii_case(status) {
                return false;
            }
        }

        if let Some(job_id) = non_blank(filter.job_id.as_deref()) {
            if record.submission.job_id() != Some(&JobId(job_id.to_string())) {
                return false;
            }
        }

        if let Submission::Testimonial(testimonial) = &record.submission {
            let flags = [
                (filter.approved, testimonial.approved),
                (filter.featured, testimonial.is_featured),
                (filter.active, testimonial.is_active),
            ];
            if flags
                .iter()
                .any(|(wanted, actual)| wanted.is_some_and(|wanted| wanted != *actual))
            {
                return false;
            }
        }

        if let Some(needle) = non_blank(filter.search.as_deref()) {
            let needle = needle.to_lowercase();
            let name = record.submission.submitter_name().to_lowercase();
            let email = record.submission.submitter_email().to_lowercase();
            if !name.contains(&needle) && !email.contains(&needle) {
                return false;
            }
        }

        true
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
