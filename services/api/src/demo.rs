use crate::infra::build_pipeline;
use chrono::Utc;
use clap::Args;
use leadflow::config::AppConfig;
use leadflow::error::AppError;
use leadflow::submissions::templates::render;
use leadflow::submissions::{
    BrandProfile, Direction, RenderedEmail, Submission, SubmissionForm, SubmissionKind,
    SubmissionRequest, UploadedFile,
};
use serde_json::{json, Value};
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    /// Submission kind (contact, enquiry, student-application, job-application, testimonial)
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: SubmissionKind,
    /// Recipient side: staff or submitter
    #[arg(long, default_value = "staff", value_parser = parse_direction)]
    pub(crate) direction: Direction,
    /// Write the HTML document here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SubmitArgs {
    /// Submission kind (contact, enquiry, student-application, job-application, testimonial)
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: SubmissionKind,
    /// JSON document with the form fields
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Resume or avatar to upload with the submission
    #[arg(long)]
    pub(crate) file: Option<PathBuf>,
}

pub(crate) fn parse_kind(raw: &str) -> Result<SubmissionKind, String> {
    SubmissionKind::from_slug(raw).ok_or_else(|| {
        let known: Vec<&str> = SubmissionKind::ALL.iter().map(|kind| kind.slug()).collect();
        format!("unknown kind '{raw}' (expected one of: {})", known.join(", "))
    })
}

pub(crate) fn parse_direction(raw: &str) -> Result<Direction, String> {
    Direction::parse(raw).ok_or_else(|| format!("unknown direction '{raw}' (staff or submitter)"))
}

fn sample_payload(kind: SubmissionKind) -> Value {
    match kind {
        SubmissionKind::ContactMessage => json!({
            "name": "Jordan Lee",
            "email": "jordan.lee@example.org",
            "phone": "+1 415 555 0134",
            "message": "Could you share availability for a short discovery call next week?",
        }),
        SubmissionKind::Enquiry => json!({
            "name": "Sam Patel",
            "email": "sam@patel-logistics.example",
            "company": "Patel Logistics",
            "service_type": "Cloud Migration",
            "project_description": "Move our dispatch system off two ageing VMs.\nBudget is approved for Q3.",
        }),
        SubmissionKind::StudentApplication => json!({
            "full_name": "Aisha Bello",
            "email": "aisha.bello@students.example",
            "phone": "+234 801 234 5678",
            "college_university": "University of Lagos",
            "degree": "BSc Computer Science",
            "year_of_study": "3",
            "program_type": "internship",
        }),
        SubmissionKind::JobApplication => json!({
            "job_id": "eng-214",
            "job_title": "Senior Backend Engineer",
            "full_name": "Tomás Ortega",
            "email": "tomas.ortega@example.net",
            "phone": "+34 612 345 678",
            "current_location": "Madrid",
            "willing_to_relocate": true,
            "current_job_title": "Backend Engineer",
            "total_experience": "7 years",
            "relevant_skills": "Rust, Kafka, PostgreSQL",
            "linkedin_url": "https://www.linkedin.com/in/tomas-ortega",
            "cover_letter": "I have spent the last four years building event pipelines.",
            "project_links": "https://github.com/tortega/ledger\nhttps://tortega.dev/talks",
            "highest_degree": "MEng",
            "university": "Universidad Politécnica de Madrid",
            "graduation_year": 2016,
        }),
        SubmissionKind::Testimonial => json!({
            "name": "Grace Kim",
            "email": "grace@kimstudio.example",
            "position": "Founder",
            "company": "Kim Studio",
            "testimonial": "They rebuilt our booking flow and conversion doubled within a month.",
            "rating": 5,
        }),
    }
}

/// A representative, already validated submission for template review.
pub(crate) fn sample_submission(kind: SubmissionKind) -> Result<Submission, AppError> {
    let mut submission = SubmissionForm::from_json(kind, sample_payload(kind))
        .and_then(SubmissionForm::validate)
        .map_err(|err| invalid_input(err.to_string()))?;

    match &mut submission {
        Submission::JobApplication(application) => {
            application.resume_url =
                "https://files.example.com/resumes/1700000000000-sample.pdf".to_string();
        }
        Submission::Testimonial(testimonial) => {
            testimonial.avatar_url =
                Some("https://files.example.com/avatars/1700000000000-sample.png".to_string());
        }
        _ => {}
    }
    Ok(submission)
}

pub(crate) fn render_sample(
    kind: SubmissionKind,
    direction: Direction,
    brand: &BrandProfile,
) -> Result<RenderedEmail, AppError> {
    let submission = sample_submission(kind)?;
    Ok(render(&submission, direction, brand, Utc::now()))
}

pub(crate) fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let email = render_sample(args.kind, args.direction, &config.brand)?;

    match args.output {
        Some(path) => {
            fs::write(&path, &email.html)?;
            println!("Subject: {}", email.subject);
            println!("Wrote {} ({} bytes)", path.display(), email.html.len());
        }
        None => {
            println!("Subject: {}", email.subject);
            println!();
            println!("{}", email.html);
        }
    }
    Ok(())
}

/// Pushes one submission through a local pipeline and waits for its notifications.
pub(crate) async fn run_submit(args: SubmitArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    leadflow::telemetry::init(&config.telemetry)?;
    let pipeline = build_pipeline(&config)?;

    let raw = fs::read_to_string(&args.data)?;
    let payload: Value = serde_json::from_str(&raw)
        .map_err(|err| invalid_input(format!("{}: {err}", args.data.display())))?;
    let form = SubmissionForm::from_json(args.kind, payload)
        .map_err(|err| invalid_input(err.to_string()))?;

    let mut request = SubmissionRequest::new(form);
    if let Some(path) = args.file {
        request = request.with_file(load_upload(&path)?);
    }

    let receipt = pipeline
        .intake
        .submit(request)
        .map_err(|err| invalid_input(err.to_string()))?;
    let report = receipt.notifications.settle().await;

    let summary = json!({
        "id": receipt.record.id,
        "kind": receipt.record.kind(),
        "status": receipt.record.status_label(),
        "created_at": receipt.record.created_at,
        "file_url": receipt.record.submission.file_url(),
        "staff_notified": report.staff.is_sent(),
        "submitter_notified": report.submitter.is_sent(),
    });
    let rendered = serde_json::to_string_pretty(&summary)
        .map_err(|err| invalid_input(err.to_string()))?;
    println!("{rendered}");
    Ok(())
}

fn load_upload(path: &Path) -> Result<UploadedFile, AppError> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| invalid_input(format!("{} has no usable file name", path.display())))?
        .to_string();
    let content_type = mime_guess::from_path(path)
        .first()
        .map(|media| media.essence_str().to_string());
    Ok(UploadedFile::new(file_name, content_type, bytes))
}

fn invalid_input(message: String) -> AppError {
    AppError::Io(IoError::new(ErrorKind::InvalidInput, message))
}
