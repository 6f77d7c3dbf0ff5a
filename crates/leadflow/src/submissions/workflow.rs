//! Status vocabularies and the transition tables the moderation engine enforces.
//!
//! Each status-bearing kind gets a closed enumeration implementing [`StatusMachine`].
//! Legality is checked by [`RecordPatch::apply`], which record stores call inside their
//! own atomic update so a transition is never computed against a stale status.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{StoredRecord, Submission, SubmissionKind};

/// Closed status vocabulary with an explicit successor table.
pub trait StatusMachine: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const KIND: SubmissionKind;
    const INITIAL: Self;
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn successors(self) -> &'static [Self];

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.label().eq_ignore_ascii_case(raw))
    }

    fn permits(self, next: Self) -> bool {
        self.successors().contains(&next)
    }

    fn is_terminal(self) -> bool {
        self.successors().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    New,
    InProgress,
    Resolved,
    Closed,
}

impl StatusMachine for ContactStatus {
    const KIND: SubmissionKind = SubmissionKind::ContactMessage;
    const INITIAL: Self = ContactStatus::New;
    const ALL: &'static [Self] = &[
        ContactStatus::New,
        ContactStatus::InProgress,
        ContactStatus::Resolved,
        ContactStatus::Closed,
    ];

    fn label(self) -> &'static str {
        match self {
            ContactStatus::New => "new",
            ContactStatus::InProgress => "in_progress",
            ContactStatus::Resolved => "resolved",
            ContactStatus::Closed => "closed",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            ContactStatus::New => &[ContactStatus::InProgress],
            ContactStatus::InProgress => &[ContactStatus::Resolved],
            ContactStatus::Resolved => &[ContactStatus::Closed],
            ContactStatus::Closed => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnquiryStatus {
    New,
    Reviewing,
    Quoted,
    Accepted,
    Closed,
}

impl StatusMachine for EnquiryStatus {
    const KIND: SubmissionKind = SubmissionKind::Enquiry;
    const INITIAL: Self = EnquiryStatus::New;
    const ALL: &'static [Self] = &[
        EnquiryStatus::New,
        EnquiryStatus::Reviewing,
        EnquiryStatus::Quoted,
        EnquiryStatus::Accepted,
        EnquiryStatus::Closed,
    ];

    fn label(self) -> &'static str {
        match self {
            EnquiryStatus::New => "new",
            EnquiryStatus::Reviewing => "reviewing",
            EnquiryStatus::Quoted => "quoted",
            EnquiryStatus::Accepted => "accepted",
            EnquiryStatus::Closed => "closed",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            EnquiryStatus::New => &[EnquiryStatus::Reviewing],
            EnquiryStatus::Reviewing => &[EnquiryStatus::Quoted, EnquiryStatus::Accepted],
            EnquiryStatus::Quoted | EnquiryStatus::Accepted => &[EnquiryStatus::Closed],
            EnquiryStatus::Closed => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentApplicationStatus {
    Pending,
    Reviewing,
    Called,
    Shortlisted,
    Rejected,
    Accepted,
}

impl StatusMachine for StudentApplicationStatus {
    const KIND: SubmissionKind = SubmissionKind::StudentApplication;
    const INITIAL: Self = StudentApplicationStatus::Pending;
    const ALL: &'static [Self] = &[
        StudentApplicationStatus::Pending,
        StudentApplicationStatus::Reviewing,
        StudentApplicationStatus::Called,
        StudentApplicationStatus::Shortlisted,
        StudentApplicationStatus::Rejected,
        StudentApplicationStatus::Accepted,
    ];

    fn label(self) -> &'static str {
        match self {
            StudentApplicationStatus::Pending => "pending",
            StudentApplicationStatus::Reviewing => "reviewing",
            StudentApplicationStatus::Called => "called",
            StudentApplicationStatus::Shortlisted => "shortlisted",
            StudentApplicationStatus::Rejected => "rejected",
            StudentApplicationStatus::Accepted => "accepted",
        }
    }

    // Reviewers may decide straight from `reviewing` or after the screening call.
    fn successors(self) -> &'static [Self] {
        use StudentApplicationStatus::*;
        match self {
            Pending => &[Reviewing],
            Reviewing => &[Called, Shortlisted, Rejected],
            Called => &[Shortlisted, Rejected],
            Shortlisted => &[Accepted],
            Rejected | Accepted => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
}

impl StatusMachine for JobApplicationStatus {
    const KIND: SubmissionKind = SubmissionKind::JobApplication;
    const INITIAL: Self = JobApplicationStatus::Pending;
    const ALL: &'static [Self] = &[
        JobApplicationStatus::Pending,
        JobApplicationStatus::Reviewed,
        JobApplicationStatus::Shortlisted,
        JobApplicationStatus::Rejected,
    ];

    fn label(self) -> &'static str {
        match self {
            JobApplicationStatus::Pending => "pending",
            JobApplicationStatus::Reviewed => "reviewed",
            JobApplicationStatus::Shortlisted => "shortlisted",
            JobApplicationStatus::Rejected => "rejected",
        }
    }

    fn successors(self) -> &'static [Self] {
        match self {
            JobApplicationStatus::Pending => &[JobApplicationStatus::Reviewed],
            JobApplicationStatus::Reviewed => {
                &[JobApplicationStatus::Shortlisted, JobApplicationStatus::Rejected]
            }
            JobApplicationStatus::Shortlisted | JobApplicationStatus::Rejected => &[],
        }
    }
}

/// A requested status, already resolved against the kind's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTarget {
    Contact(ContactStatus),
    Enquiry(EnquiryStatus),
    StudentApplication(StudentApplicationStatus),
    JobApplication(JobApplicationStatus),
}

impl StatusTarget {
    /// Resolves a raw label for the given kind. Testimonials have no status vocabulary.
    pub fn parse(kind: SubmissionKind, raw: &str) -> Option<Self> {
        match kind {
            SubmissionKind::ContactMessage => ContactStatus::parse(raw).map(Self::Contact),
            SubmissionKind::Enquiry => EnquiryStatus::parse(raw).map(Self::Enquiry),
            SubmissionKind::StudentApplication => {
                StudentApplicationStatus::parse(raw).map(Self::StudentApplication)
            }
            SubmissionKind::JobApplication => {
                JobApplicationStatus::parse(raw).map(Self::JobApplication)
            }
            SubmissionKind::Testimonial => None,
        }
    }

    pub fn kind(self) -> SubmissionKind {
        match self {
            StatusTarget::Contact(_) => ContactStatus::KIND,
            StatusTarget::Enquiry(_) => EnquiryStatus::KIND,
            StatusTarget::StudentApplication(_) => StudentApplicationStatus::KIND,
            StatusTarget::JobApplication(_) => JobApplicationStatus::KIND,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusTarget::Contact(status) => status.label(),
            StatusTarget::Enquiry(status) => status.label(),
            StatusTarget::StudentApplication(status) => status.label(),
            StatusTarget::JobApplication(status) => status.label(),
        }
    }
}

/// One edge of a kind's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionEdge {
    pub from: &'static str,
    pub to: &'static str,
}

/// Status vocabulary and legal edges for one kind, as exposed to the admin console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionTable {
    pub kind: SubmissionKind,
    pub initial: &'static str,
    pub statuses: Vec<&'static str>,
    pub terminal: Vec<&'static str>,
    pub edges: Vec<TransitionEdge>,
}

fn table_for<M: StatusMachine>() -> TransitionTable {
    let edges = M::ALL
        .iter()
        .flat_map(|from| {
            from.successors().iter().map(move |to| TransitionEdge {
                from: from.label(),
                to: to.label(),
            })
        })
        .collect();

    TransitionTable {
        kind: M::KIND,
        initial: M::INITIAL.label(),
        statuses: M::ALL.iter().map(|status| status.label()).collect(),
        terminal: M::ALL
            .iter()
            .filter(|status| status.is_terminal())
            .map(|status| status.label())
            .collect(),
        edges,
    }
}

/// Returns `None` for testimonials, which are moderated through flags.
pub fn transition_table(kind: SubmissionKind) -> Option<TransitionTable> {
    match kind {
        SubmissionKind::ContactMessage => Some(table_for::<ContactStatus>()),
        SubmissionKind::Enquiry => Some(table_for::<EnquiryStatus>()),
        SubmissionKind::StudentApplication => Some(table_for::<StudentApplicationStatus>()),
        SubmissionKind::JobApplication => Some(table_for::<JobApplicationStatus>()),
        SubmissionKind::Testimonial => None,
    }
}

/// Labels reachable from the record's current status in one step.
pub fn next_statuses(submission: &Submission) -> Vec<&'static str> {
    fn labels<M: StatusMachine>(status: M) -> Vec<&'static str> {
        status.successors().iter().map(|next| next.label()).collect()
    }

    match submission {
        Submission::ContactMessage(record) => labels(record.status),
        Submission::Enquiry(record) => labels(record.status),
        Submission::StudentApplication(record) => labels(record.status),
        Submission::JobApplication(record) => labels(record.status),
        Submission::Testimonial(_) => Vec::new(),
    }
}

/// Editable testimonial content. Approval flags are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestimonialContent {
    pub name: String,
    pub email: String,
    pub position: String,
    pub company: Option<String>,
    pub testimonial: String,
    pub rating: u8,
}

/// A single atomic mutation of a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPatch {
    Status {
        target: StatusTarget,
        notes: Option<String>,
    },
    /// Approval and visibility move together: approving activates, unapproving deactivates.
    Approval { approved: bool },
    Featured { featured: bool },
    Notes { notes: Option<String> },
    TestimonialContent(TestimonialContent),
}

impl RecordPatch {
    pub fn describe(&self) -> &'static str {
        match self {
            RecordPatch::Status { .. } => "status",
            RecordPatch::Approval { .. } => "approval",
            RecordPatch::Featured { .. } => "featured",
            RecordPatch::Notes { .. } => "notes",
            RecordPatch::TestimonialContent(_) => "testimonial content",
        }
    }

    /// Applies the patch in place, or leaves the record untouched and explains why not.
    pub fn apply(&self, record: &mut StoredRecord) -> Result<(), PatchRejected> {
        let kind = record.kind();
        match (self, &mut record.submission) {
            (RecordPatch::Status { target, notes }, submission) => {
                apply_status(submission, *target, notes.as_ref())
            }
            (RecordPatch::Approval { approved }, Submission::Testimonial(testimonial)) => {
                testimonial.approved = *approved;
                testimonial.is_active = *approved;
                Ok(())
            }
            (RecordPatch::Featured { featured }, Submission::Testimonial(testimonial)) => {
                testimonial.is_featured = *featured;
                Ok(())
            }
            (RecordPatch::Notes { notes }, Submission::Enquiry(enquiry)) => {
                enquiry.notes = notes.clone();
                Ok(())
            }
            (RecordPatch::Notes { notes }, Submission::StudentApplication(application)) => {
                application.notes = notes.clone();
                Ok(())
            }
            (RecordPatch::TestimonialContent(content), Submission::Testimonial(testimonial)) => {
                testimonial.name = content.name.clone();
                testimonial.email = content.email.clone();
                testimonial.position = content.position.clone();
                testimonial.company = content.company.clone();
                testimonial.testimonial = content.testimonial.clone();
                testimonial.rating = content.rating;
                Ok(())
            }
            (patch, _) => Err(PatchRejected::Unsupported {
                kind,
                change: patch.describe(),
            }),
        }
    }
}

fn apply_status(
    submission: &mut Submission,
    target: StatusTarget,
    notes: Option<&String>,
) -> Result<(), PatchRejected> {
    fn advance<M: StatusMachine>(current: &mut M, next: M) -> Result<(), PatchRejected> {
        if current.permits(next) {
            *current = next;
            Ok(())
        } else {
            Err(PatchRejected::IllegalTransition {
                kind: M::KIND,
                from: current.label(),
                to: next.label(),
            })
        }
    }

    let kind = submission.kind();
    if notes.is_some()
        && matches!(kind, SubmissionKind::ContactMessage | SubmissionKind::JobApplication)
    {
        return Err(PatchRejected::Unsupported {
            kind,
            change: "notes",
        });
    }

    match (submission, target) {
        (Submission::ContactMessage(record), StatusTarget::Contact(next)) => {
            advance(&mut record.status, next)
        }
        (Submission::Enquiry(record), StatusTarget::Enquiry(next)) => {
            advance(&mut record.status, next)?;
            if let Some(notes) = notes {
                record.notes = Some(notes.clone());
            }
            Ok(())
        }
        (Submission::StudentApplication(record), StatusTarget::StudentApplication(next)) => {
            advance(&mut record.status, next)?;
            if let Some(notes) = notes {
                record.notes = Some(notes.clone());
            }
            Ok(())
        }
        (Submission::JobApplication(record), StatusTarget::JobApplication(next)) => {
            advance(&mut record.status, next)
        }
        (submission, target) => Err(PatchRejected::IllegalTransition {
            kind: submission.kind(),
            from: submission.status_label(),
            to: target.label(),
        }),
    }
}

/// Reason a patch could not be applied; the record is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchRejected {
    #[error("{kind} cannot move from '{from}' to '{to}'")]
    IllegalTransition {
        kind: SubmissionKind,
        from: &'static str,
        to: &'static str,
    },
    #[error("{kind} records do not support {change} changes")]
    Unsupported {
        kind: SubmissionKind,
        change: &'static str,
    },
}
