use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{RecordId, StoredRecord, Submission, SubmissionKind};
use super::store::{ListFilter, RecordQuery, RecordStore, StoreError};
use super::workflow::transition_table;

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("{kind} {id} not found")]
    NotFound { kind: SubmissionKind, id: RecordId },
    #[error("record store failed: {0}")]
    Store(#[from] StoreError),
}

/// Per-kind counters for the console landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub kind: SubmissionKind,
    pub total: usize,
    /// Records still in the kind's initial state (unapproved, for testimonials).
    pub awaiting_review: usize,
    pub by_status: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub kinds: Vec<KindSummary>,
}

/// Testimonial as shown on the public site; contact details stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicTestimonial {
    pub id: RecordId,
    pub name: String,
    pub position: String,
    pub company: Option<String>,
    pub avatar_url: Option<String>,
    pub testimonial: String,
    pub rating: u8,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Read-side query composition over the record store.
pub struct AdminConsole<S> {
    store: Arc<S>,
}

impl<S> AdminConsole<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Matching records, newest first, truncated to `filter.limit`.
    pub fn list(&self, kind: SubmissionKind, filter: ListFilter) -> Result<Vec<StoredRecord>, AdminError> {
        let limit = filter.limit;
        let mut records = self.store.query(&RecordQuery::filtered(kind, filter))?;
        records.sort_by_key(|record| (Reverse(record.created_at), Reverse(record.id)));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    pub fn get(&self, kind: SubmissionKind, id: &RecordId) -> Result<StoredRecord, AdminError> {
        self.store
            .fetch(kind, id)?
            .ok_or(AdminError::NotFound { kind, id: *id })
    }

    pub fn dashboard(&self) -> Result<Dashboard, AdminError> {
        let mut kinds = Vec::with_capacity(SubmissionKind::ALL.len());
        for kind in SubmissionKind::ALL {
            let records = self.store.query(&RecordQuery::all(kind))?;
            kinds.push(summarize(kind, &records));
        }

        Ok(Dashboard {
            generated_at: Utc::now(),
            total: kinds.iter().map(|summary| summary.total).sum(),
            kinds,
        })
    }

    /// Approved and active testimonials, featured first, then newest first.
    pub fn public_testimonials(&self) -> Result<Vec<PublicTestimonial>, AdminError> {
        let mut records: Vec<(StoredRecord, bool)> = self
            .store
            .query(&RecordQuery::all(SubmissionKind::Testimonial))?
            .into_iter()
            .filter_map(|record| match &record.submission {
                Submission::Testimonial(testimonial) if testimonial.is_public() => {
                    let featured = testimonial.is_featured;
                    Some((record, featured))
                }
                _ => None,
            })
            .collect();
        records.sort_by_key(|(record, featured)| (Reverse(*featured), Reverse(record.created_at)));

        Ok(records
            .into_iter()
            .filter_map(|(record, _)| match record.submission {
                Submission::Testimonial(testimonial) => Some(PublicTestimonial {
                    id: record.id,
                    name: testimonial.name,
                    position: testimonial.position,
                    company: testimonial.company,
                    avatar_url: testimonial.avatar_url,
                    testimonial: testimonial.testimonial,
                    rating: testimonial.rating,
                    is_featured: testimonial.is_featured,
                    created_at: record.created_at,
                }),
                _ => None,
            })
            .collect())
    }
}

fn summarize(kind: SubmissionKind, records: &[StoredRecord]) -> KindSummary {
    let (vocabulary, initial) = match transition_table(kind) {
        Some(table) => (table.statuses, table.initial),
        None => (vec!["unapproved", "approved"], "unapproved"),
    };

    let mut by_status: BTreeMap<&'static str, usize> =
        vocabulary.into_iter().map(|status| (status, 0)).collect();
    for record in records {
        *by_status.entry(record.status_label()).or_default() += 1;
    }

    KindSummary {
        kind,
        total: records.len(),
        awaiting_review: by_status.get(initial).copied().unwrap_or(0),
        by_status,
    }
}
