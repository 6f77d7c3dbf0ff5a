//! Inbound form shapes and the rules that turn them into [`Submission`]s.
//!
//! Forms deserialize leniently (every field optional) so that a missing field is
//! reported as a [`ValidationError`] naming the field rather than a serde error.

use serde::Deserialize;

use super::domain::{
    ContactMessage, Enquiry, JobApplication, JobId, ProgramType, StudentApplication, Submission,
    SubmissionKind, Testimonial,
};
use super::workflow::{
    ContactStatus, EnquiryStatus, JobApplicationStatus, StatusMachine, StudentApplicationStatus,
    TestimonialContent,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{kind} is missing required field '{field}'")]
    MissingField {
        kind: SubmissionKind,
        field: &'static str,
    },
    #[error("'{value}' is not a valid email address")]
    InvalidEmail { value: String },
    #[error("rating must be between 1 and 5, got {rating}")]
    RatingOutOfRange { rating: i64 },
    #[error("'{value}' is not a recognised value for '{field}'")]
    InvalidValue { field: &'static str, value: String },
    #[error("unknown program type '{value}'")]
    UnknownProgramType { value: String },
    #[error("a {field} file is required")]
    MissingFile { field: &'static str },
    #[error("{field} is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge {
        field: &'static str,
        size: usize,
        limit: usize,
    },
    #[error("{field} must be one of: {expected}")]
    UnsupportedFileType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{kind} submissions do not accept file uploads")]
    UnexpectedFile { kind: SubmissionKind },
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Accepts either a bare string or a number, e.g. `"2021"` and `2021`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Number(number) => number.to_string(),
            Scalar::Text(text) => text,
        }
    }
}

/// Accepts a delimited string or an explicit list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    List(Vec<String>),
    Text(String),
}

impl TextOrList {
    fn split(self, delimiter: char) -> Vec<String> {
        let items: Vec<String> = match self {
            TextOrList::List(items) => items,
            TextOrList::Text(text) => text.split(delimiter).map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }
}

/// Checkbox values arrive as booleans or as `"true"`/`"yes"`/`"on"` strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn into_bool(self) -> Result<bool, ValidationError> {
        match self {
            Flag::Bool(value) => Ok(value),
            Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" | "" => Ok(false),
                _ => Err(ValidationError::InvalidValue {
                    field: "willing_to_relocate",
                    value: text,
                }),
            },
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnquiryForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub service_type: Option<String>,
    pub project_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentApplicationForm {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub college_university: Option<String>,
    pub degree: Option<String>,
    pub year_of_study: Option<Scalar>,
    pub program_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobApplicationForm {
    pub job_id: Option<Scalar>,
    pub job_title: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_location: Option<String>,
    pub willing_to_relocate: Option<Flag>,
    pub current_job_title: Option<String>,
    pub total_experience: Option<Scalar>,
    pub relevant_skills: Option<TextOrList>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub cover_letter: Option<String>,
    pub project_links: Option<TextOrList>,
    pub highest_degree: Option<String>,
    pub university: Option<String>,
    pub graduation_year: Option<Scalar>,
    pub how_did_you_hear: Option<String>,
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestimonialForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub company: Option<String>,
    pub testimonial: Option<String>,
    pub rating: Option<Scalar>,
}

/// An unvalidated submission of a known kind.
#[derive(Debug, Clone)]
pub enum SubmissionForm {
    Contact(ContactForm),
    Enquiry(EnquiryForm),
    StudentApplication(StudentApplicationForm),
    JobApplication(JobApplicationForm),
    Testimonial(TestimonialForm),
}

impl SubmissionForm {
    /// Decodes a JSON document into the form for `kind`.
    pub fn from_json(kind: SubmissionKind, payload: serde_json::Value) -> Result<Self, ValidationError> {
        fn decode<T: serde::de::DeserializeOwned>(
            payload: serde_json::Value,
        ) -> Result<T, ValidationError> {
            serde_json::from_value(payload)
                .map_err(|err| ValidationError::MalformedPayload(err.to_string()))
        }

        if !payload.is_object() {
            return Err(ValidationError::MalformedPayload(
                "expected a JSON object".to_string(),
            ));
        }

        Ok(match kind {
            SubmissionKind::ContactMessage => Self::Contact(decode(payload)?),
            SubmissionKind::Enquiry => Self::Enquiry(decode(payload)?),
            SubmissionKind::StudentApplication => Self::StudentApplication(decode(payload)?),
            SubmissionKind::JobApplication => Self::JobApplication(decode(payload)?),
            SubmissionKind::Testimonial => Self::Testimonial(decode(payload)?),
        })
    }

    pub fn kind(&self) -> SubmissionKind {
        match self {
            SubmissionForm::Contact(_) => SubmissionKind::ContactMessage,
            SubmissionForm::Enquiry(_) => SubmissionKind::Enquiry,
            SubmissionForm::StudentApplication(_) => SubmissionKind::StudentApplication,
            SubmissionForm::JobApplication(_) => SubmissionKind::JobApplication,
            SubmissionForm::Testimonial(_) => SubmissionKind::Testimonial,
        }
    }

    /// Validates and normalizes the form into a submission in its initial state.
    /// File-bearing kinds come back with an empty file reference for intake to fill.
    pub fn validate(self) -> Result<Submission, ValidationError> {
        match self {
            SubmissionForm::Contact(form) => form.validate().map(Submission::ContactMessage),
            SubmissionForm::Enquiry(form) => form.validate().map(Submission::Enquiry),
            SubmissionForm::StudentApplication(form) => {
                form.validate().map(Submission::StudentApplication)
            }
            SubmissionForm::JobApplication(form) => form.validate().map(Submission::JobApplication),
            SubmissionForm::Testimonial(form) => form.validate().map(Submission::Testimonial),
        }
    }
}

struct Fields {
    kind: SubmissionKind,
}

impl Fields {
    fn of(kind: SubmissionKind) -> Self {
        Self { kind }
    }

    fn missing(&self, field: &'static str) -> ValidationError {
        ValidationError::MissingField {
            kind: self.kind,
            field,
        }
    }

    /// Single-line value, trimmed.
    fn line(&self, field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
        optional_line(value).ok_or_else(|| self.missing(field))
    }

    fn scalar(&self, field: &'static str, value: Option<Scalar>) -> Result<String, ValidationError> {
        self.line(field, value.map(Scalar::into_text))
    }

    /// Free text, stored exactly as typed but never blank.
    fn text(&self, field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
        optional_text(value).ok_or_else(|| self.missing(field))
    }

    fn email(&self, value: Option<String>) -> Result<String, ValidationError> {
        let email = self.line("email", value)?;
        if is_plausible_email(&email) {
            Ok(email)
        } else {
            Err(ValidationError::InvalidEmail { value: email })
        }
    }
}

fn optional_line(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

/// `local@domain.tld` with no whitespace; deliverability is the mail server's problem.
pub fn is_plausible_email(candidate: &str) -> bool {
    if candidate.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = candidate.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

fn rating(fields: &Fields, value: Option<Scalar>) -> Result<u8, ValidationError> {
    let raw = fields.scalar("rating", value)?;
    let parsed = raw
        .parse::<i64>()
        .map_err(|_| ValidationError::InvalidValue {
            field: "rating",
            value: raw.clone(),
        })?;
    match u8::try_from(parsed) {
        Ok(rating @ 1..=5) => Ok(rating),
        _ => Err(ValidationError::RatingOutOfRange { rating: parsed }),
    }
}

impl ContactForm {
    pub fn validate(self) -> Result<ContactMessage, ValidationError> {
        let fields = Fields::of(SubmissionKind::ContactMessage);
        Ok(ContactMessage {
            name: fields.line("name", self.name)?,
            email: fields.email(self.email)?,
            phone: optional_line(self.phone),
            message: fields.text("message", self.message)?,
            status: ContactStatus::INITIAL,
        })
    }
}

impl EnquiryForm {
    pub fn validate(self) -> Result<Enquiry, ValidationError> {
        let fields = Fields::of(SubmissionKind::Enquiry);
        Ok(Enquiry {
            name: fields.line("name", self.name)?,
            email: fields.email(self.email)?,
            phone: optional_line(self.phone),
            company: optional_line(self.company),
            service_type: fields.line("service_type", self.service_type)?,
            project_description: fields.text("project_description", self.project_description)?,
            notes: None,
            status: EnquiryStatus::INITIAL,
        })
    }
}

impl StudentApplicationForm {
    pub fn validate(self) -> Result<StudentApplication, ValidationError> {
        let fields = Fields::of(SubmissionKind::StudentApplication);
        let full_name = fields.line("full_name", self.full_name)?;
        let email = fields.email(self.email)?;
        let phone = fields.line("phone", self.phone)?;
        let college_university = fields.line("college_university", self.college_university)?;
        let degree = fields.line("degree", self.degree)?;
        let year_of_study = fields.scalar("year_of_study", self.year_of_study)?;
        let raw_program = fields.line("program_type", self.program_type)?;
        let program_type = ProgramType::parse(&raw_program)
            .ok_or(ValidationError::UnknownProgramType { value: raw_program })?;

        Ok(StudentApplication {
            full_name,
            email,
            phone,
            college_university,
            degree,
            year_of_study,
            program_type,
            notes: None,
            status: StudentApplicationStatus::INITIAL,
        })
    }
}

impl JobApplicationForm {
    pub fn validate(self) -> Result<JobApplication, ValidationError> {
        let fields = Fields::of(SubmissionKind::JobApplication);
        let job_id = JobId(fields.scalar("job_id", self.job_id)?);
        let full_name = fields.line("full_name", self.full_name)?;
        let email = fields.email(self.email)?;
        let phone = fields.line("phone", self.phone)?;
        let current_location = fields.line("current_location", self.current_location)?;
        let willing_to_relocate = match self.willing_to_relocate {
            Some(flag) => flag.into_bool()?,
            None => false,
        };
        let current_job_title = fields.line("current_job_title", self.current_job_title)?;
        let total_experience = fields.scalar("total_experience", self.total_experience)?;
        let relevant_skills = self
            .relevant_skills
            .map(|skills| skills.split(','))
            .filter(|skills| !skills.is_empty())
            .ok_or_else(|| fields.missing("relevant_skills"))?;
        let highest_degree = fields.line("highest_degree", self.highest_degree)?;
        let university = fields.line("university", self.university)?;
        let graduation_year = fields.scalar("graduation_year", self.graduation_year)?;

        Ok(JobApplication {
            job_id,
            job_title: optional_line(self.job_title),
            full_name,
            email,
            phone,
            current_location,
            willing_to_relocate,
            current_job_title,
            total_experience,
            relevant_skills,
            linkedin_url: optional_line(self.linkedin_url),
            portfolio_url: optional_line(self.portfolio_url),
            resume_url: String::new(),
            cover_letter: optional_text(self.cover_letter),
            project_links: self
                .project_links
                .map(|links| links.split('\n'))
                .unwrap_or_default(),
            highest_degree,
            university,
            graduation_year,
            how_did_you_hear: optional_line(self.how_did_you_hear),
            additional_info: optional_text(self.additional_info),
            status: JobApplicationStatus::INITIAL,
        })
    }
}

impl TestimonialForm {
    /// Validated editable content, shared by public intake and admin edits.
    pub fn content(self) -> Result<TestimonialContent, ValidationError> {
        let fields = Fields::of(SubmissionKind::Testimonial);
        Ok(TestimonialContent {
            name: fields.line("name", self.name)?,
            email: fields.email(self.email)?,
            position: fields.line("position", self.position)?,
            company: optional_line(self.company),
            testimonial: fields.text("testimonial", self.testimonial)?,
            rating: rating(&fields, self.rating)?,
        })
    }

    /// New testimonials start unapproved and hidden.
    pub fn validate(self) -> Result<Testimonial, ValidationError> {
        let content = self.content()?;
        Ok(Testimonial {
            name: content.name,
            email: content.email,
            position: content.position,
            company: content.company,
            avatar_url: None,
            testimonial: content.testimonial,
            rating: content.rating,
            approved: false,
            is_active: false,
            is_featured: false,
        })
    }
}
