use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::workflow::{
    ContactStatus, EnquiryStatus, JobApplicationStatus, StatusMachine, StudentApplicationStatus,
};

/// The five lead-capture forms exposed on the public site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    ContactMessage,
    Enquiry,
    StudentApplication,
    JobApplication,
    Testimonial,
}

impl SubmissionKind {
    pub const ALL: [SubmissionKind; 5] = [
        SubmissionKind::ContactMessage,
        SubmissionKind::Enquiry,
        SubmissionKind::StudentApplication,
        SubmissionKind::JobApplication,
        SubmissionKind::Testimonial,
    ];

    /// Stable snake_case label used in payloads and logs.
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionKind::ContactMessage => "contact_message",
            SubmissionKind::Enquiry => "enquiry",
            SubmissionKind::StudentApplication => "student_application",
            SubmissionKind::JobApplication => "job_application",
            SubmissionKind::Testimonial => "testimonial",
        }
    }

    /// URL segment used by the HTTP surface.
    pub const fn slug(self) -> &'static str {
        match self {
            SubmissionKind::ContactMessage => "contact",
            SubmissionKind::Enquiry => "enquiry",
            SubmissionKind::StudentApplication => "student-application",
            SubmissionKind::JobApplication => "job-application",
            SubmissionKind::Testimonial => "testimonial",
        }
    }

    /// Logical table the record store keeps this kind in.
    pub const fn table(self) -> &'static str {
        match self {
            SubmissionKind::ContactMessage => "contact",
            SubmissionKind::Enquiry => "enquiry",
            SubmissionKind::StudentApplication => "student_applications",
            SubmissionKind::JobApplication => "applications",
            SubmissionKind::Testimonial => "testimonials",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            SubmissionKind::ContactMessage => "Contact message",
            SubmissionKind::Enquiry => "Service enquiry",
            SubmissionKind::StudentApplication => "Student application",
            SubmissionKind::JobApplication => "Job application",
            SubmissionKind::Testimonial => "Testimonial",
        }
    }

    /// Accepts either the URL slug or the snake_case label.
    pub fn from_slug(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(raw) || kind.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier assigned by the record store at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim()).map(Self)
    }
}

/// Reference to a job posting managed outside the submission pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

/// Student programs offered through the services page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramType {
    Internship,
    Training,
    Workshop,
    Mentorship,
}

impl ProgramType {
    pub const ALL: [ProgramType; 4] = [
        ProgramType::Internship,
        ProgramType::Training,
        ProgramType::Workshop,
        ProgramType::Mentorship,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ProgramType::Internship => "internship",
            ProgramType::Training => "training",
            ProgramType::Workshop => "workshop",
            ProgramType::Mentorship => "mentorship",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            ProgramType::Internship => "Internship",
            ProgramType::Training => "Training",
            ProgramType::Workshop => "Workshop",
            ProgramType::Mentorship => "Mentorship",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|program| program.label().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: ContactStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enquiry {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service_type: String,
    pub project_description: String,
    pub notes: Option<String>,
    pub status: EnquiryStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub college_university: String,
    pub degree: String,
    pub year_of_study: String,
    pub program_type: ProgramType,
    pub notes: Option<String>,
    pub status: StudentApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobApplication {
    pub job_id: JobId,
    /// Title of the posting at the time of application, used by notifications.
    pub job_title: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub current_location: String,
    pub willing_to_relocate: bool,
    pub current_job_title: String,
    pub total_experience: String,
    pub relevant_skills: Vec<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub resume_url: String,
    pub cover_letter: Option<String>,
    pub project_links: Vec<String>,
    pub highest_degree: String,
    pub university: String,
    pub graduation_year: String,
    pub how_did_you_hear: Option<String>,
    pub additional_info: Option<String>,
    pub status: JobApplicationStatus,
}

impl JobApplication {
    pub fn position_label(&self) -> &str {
        self.job_title
            .as_deref()
            .unwrap_or("the advertised position")
    }
}

/// Customer feedback. Moderated through flags rather than a status machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub name: String,
    pub email: String,
    pub position: String,
    pub company: Option<String>,
    pub avatar_url: Option<String>,
    pub testimonial: String,
    pub rating: u8,
    pub approved: bool,
    pub is_active: bool,
    pub is_featured: bool,
}

impl Testimonial {
    pub fn is_public(&self) -> bool {
        self.approved && self.is_active
    }
}

/// A validated submission of any kind, as written to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Submission {
    ContactMessage(ContactMessage),
    Enquiry(Enquiry),
    StudentApplication(StudentApplication),
    JobApplication(JobApplication),
    Testimonial(Testimonial),
}

impl Submission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            Submission::ContactMessage(_) => SubmissionKind::ContactMessage,
            Submission::Enquiry(_) => SubmissionKind::Enquiry,
            Submission::StudentApplication(_) => SubmissionKind::StudentApplication,
            Submission::JobApplication(_) => SubmissionKind::JobApplication,
            Submission::Testimonial(_) => SubmissionKind::Testimonial,
        }
    }

    /// Current status label. Testimonials report `approved` or `unapproved`.
    pub fn status_label(&self) -> &'static str {
        match self {
            Submission::ContactMessage(record) => record.status.label(),
            Submission::Enquiry(record) => record.status.label(),
            Submission::StudentApplication(record) => record.status.label(),
            Submission::JobApplication(record) => record.status.label(),
            Submission::Testimonial(record) => {
                if record.approved {
                    "approved"
                } else {
                    "unapproved"
                }
            }
        }
    }

    pub fn submitter_name(&self) -> &str {
        match self {
            Submission::ContactMessage(record) => &record.name,
            Submission::Enquiry(record) => &record.name,
            Submission::StudentApplication(record) => &record.full_name,
            Submission::JobApplication(record) => &record.full_name,
            Submission::Testimonial(record) => &record.name,
        }
    }

    pub fn submitter_email(&self) -> &str {
        match self {
            Submission::ContactMessage(record) => &record.email,
            Submission::Enquiry(record) => &record.email,
            Submission::StudentApplication(record) => &record.email,
            Submission::JobApplication(record) => &record.email,
            Submission::Testimonial(record) => &record.email,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            Submission::Enquiry(record) => record.notes.as_deref(),
            Submission::StudentApplication(record) => record.notes.as_deref(),
            _ => None,
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            Submission::JobApplication(record) => Some(&record.job_id),
            _ => None,
        }
    }

    /// URL of the uploaded file referenced by this record, if any.
    pub fn file_url(&self) -> Option<&str> {
        match self {
            Submission::JobApplication(record) if !record.resume_url.is_empty() => {
                Some(&record.resume_url)
            }
            Submission::Testimonial(record) => record.avatar_url.as_deref(),
            _ => None,
        }
    }

    /// Records the public URL of an uploaded file on kinds that carry one.
    pub(crate) fn attach_file_url(&mut self, url: String) {
        match self {
            Submission::JobApplication(record) => record.resume_url = url,
            Submission::Testimonial(record) => record.avatar_url = Some(url),
            _ => {}
        }
    }
}

/// A submission committed to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub submission: Submission,
}

impl StoredRecord {
    pub fn kind(&self) -> SubmissionKind {
        self.submission.kind()
    }

    pub fn status_label(&self) -> &'static str {
        self.submission.status_label()
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id,
            kind: self.kind(),
            status: self.status_label(),
            submitter: self.submission.submitter_name().to_string(),
            created_at: self.created_at,
        }
    }
}

/// Compact view used in acknowledgements and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub kind: SubmissionKind,
    pub status: &'static str,
    pub submitter: String,
    pub created_at: DateTime<Utc>,
}
