use super::common::*;

use serde_json::json;

use crate::submissions::domain::{JobId, ProgramType, Submission, SubmissionKind};
use crate::submissions::validation::{SubmissionForm, ValidationError};

fn validate(kind: SubmissionKind, payload: serde_json::Value) -> Result<Submission, ValidationError> {
    SubmissionForm::from_json(kind, payload)?.validate()
}

#[test]
fn single_line_fields_are_trimmed_and_blank_optionals_dropped() {
    let submission = validate(
        SubmissionKind::Enquiry,
        json!({
            "name": "  Ravi Kumar ",
            "email": " ravi@northwind.test\t",
            "phone": "   ",
            "company": "",
            "service_type": "Web Development ",
            "project_description": "A storefront",
        }),
    )
    .expect("valid enquiry");

    let Submission::Enquiry(enquiry) = submission else {
        panic!("expected an enquiry");
    };
    assert_eq!(enquiry.name, "Ravi Kumar");
    assert_eq!(enquiry.email, "ravi@northwind.test");
    assert_eq!(enquiry.phone, None);
    assert_eq!(enquiry.company, None);
    assert_eq!(enquiry.service_type, "Web Development");
    assert_eq!(enquiry.notes, None);
}

#[test]
fn free_text_is_kept_verbatim() {
    let message = "  Line one\n\n  Line two  ";
    let submission = validate(
        SubmissionKind::ContactMessage,
        json!({ "name": "Asha", "email": "asha@x.com", "message": message }),
    )
    .expect("valid contact");

    let Submission::ContactMessage(contact) = submission else {
        panic!("expected a contact message");
    };
    assert_eq!(contact.message, message);
}

#[test]
fn whitespace_only_message_counts_as_missing() {
    let err = validate(
        SubmissionKind::ContactMessage,
        json!({ "name": "Asha", "email": "asha@x.com", "message": " \n " }),
    )
    .expect_err("blank message");

    assert_eq!(
        err,
        ValidationError::MissingField {
            kind: SubmissionKind::ContactMessage,
            field: "message",
        }
    );
}

#[test]
fn job_application_normalizes_lists_numbers_and_flags() {
    let mut payload = payload(SubmissionKind::JobApplication);
    if let Some(object) = payload.as_object_mut() {
        object.insert("job_id".to_string(), json!(42));
        object.insert("relevant_skills".to_string(), json!(" Rust ,, Go,"));
        object.insert(
            "project_links".to_string(),
            json!("https://a.test/one\n\n  https://b.test/two  \n"),
        );
        object.insert("willing_to_relocate".to_string(), json!("yes"));
        object.insert("graduation_year".to_string(), json!(2019));
    }

    let Submission::JobApplication(application) =
        validate(SubmissionKind::JobApplication, payload).expect("valid application")
    else {
        panic!("expected a job application");
    };

    assert_eq!(application.job_id, JobId("42".to_string()));
    assert_eq!(application.relevant_skills, vec!["Rust", "Go"]);
    assert_eq!(
        application.project_links,
        vec!["https://a.test/one", "https://b.test/two"]
    );
    assert!(application.willing_to_relocate);
    assert_eq!(application.graduation_year, "2019");
    assert!(application.resume_url.is_empty());
}

#[test]
fn relocation_defaults_to_false_and_rejects_gibberish() {
    let mut payload = payload(SubmissionKind::JobApplication);
    if let Some(object) = payload.as_object_mut() {
        object.remove("willing_to_relocate");
    }
    let Submission::JobApplication(application) =
        validate(SubmissionKind::JobApplication, payload.clone()).expect("valid application")
    else {
        panic!("expected a job application");
    };
    assert!(!application.willing_to_relocate);

    if let Some(object) = payload.as_object_mut() {
        object.insert("willing_to_relocate".to_string(), json!("maybe"));
    }
    let err = validate(SubmissionKind::JobApplication, payload).expect_err("not a flag");
    assert!(matches!(
        err,
        ValidationError::InvalidValue {
            field: "willing_to_relocate",
            ..
        }
    ));
}

#[test]
fn skills_that_split_to_nothing_are_missing() {
    let mut payload = payload(SubmissionKind::JobApplication);
    if let Some(object) = payload.as_object_mut() {
        object.insert("relevant_skills".to_string(), json!(" , ,"));
    }

    let err = validate(SubmissionKind::JobApplication, payload).expect_err("no skills");

    assert_eq!(
        err,
        ValidationError::MissingField {
            kind: SubmissionKind::JobApplication,
            field: "relevant_skills",
        }
    );
}

#[test]
fn rating_accepts_numeric_strings_within_range() {
    let mut payload = payload(SubmissionKind::Testimonial);
    if let Some(object) = payload.as_object_mut() {
        object.insert("rating".to_string(), json!("4"));
    }
    let Submission::Testimonial(testimonial) =
        validate(SubmissionKind::Testimonial, payload).expect("valid testimonial")
    else {
        panic!("expected a testimonial");
    };
    assert_eq!(testimonial.rating, 4);

    for (raw, expected) in [(json!(0), 0), (json!(6), 6), (json!("-2"), -2)] {
        let err = validate(SubmissionKind::Testimonial, payload_with_rating(raw))
            .expect_err("rating out of range");
        assert_eq!(err, ValidationError::RatingOutOfRange { rating: expected });
    }

    let err = validate(SubmissionKind::Testimonial, payload_with_rating(json!("five")))
        .expect_err("not a number");
    assert!(matches!(err, ValidationError::InvalidValue { field: "rating", .. }));
}

fn payload_with_rating(rating: serde_json::Value) -> serde_json::Value {
    let mut payload = payload(SubmissionKind::Testimonial);
    if let Some(object) = payload.as_object_mut() {
        object.insert("rating".to_string(), rating);
    }
    payload
}

#[test]
fn program_type_must_be_offered() {
    let mut payload = payload(SubmissionKind::StudentApplication);
    if let Some(object) = payload.as_object_mut() {
        object.insert("program_type".to_string(), json!("Bootcamp"));
    }
    let err = validate(SubmissionKind::StudentApplication, payload.clone())
        .expect_err("unknown program");
    assert_eq!(
        err,
        ValidationError::UnknownProgramType {
            value: "Bootcamp".to_string()
        }
    );

    if let Some(object) = payload.as_object_mut() {
        object.insert("program_type".to_string(), json!(" TRAINING "));
    }
    let Submission::StudentApplication(application) =
        validate(SubmissionKind::StudentApplication, payload).expect("known program")
    else {
        panic!("expected a student application");
    };
    assert_eq!(application.program_type, ProgramType::Training);
}

#[test]
fn implausible_emails_are_rejected() {
    for email in ["asha", "asha@", "@x.com", "asha@x", "asha @x.com", "a@b@c.com", "asha@x..com"] {
        let err = validate(
            SubmissionKind::ContactMessage,
            json!({ "name": "Asha", "email": email, "message": "hi" }),
        )
        .expect_err("implausible email");
        assert!(
            matches!(err, ValidationError::InvalidEmail { .. }),
            "{email} accepted"
        );
    }
}

#[test]
fn non_object_and_mistyped_payloads_are_malformed() {
    for payload in [json!([]), json!("name=Asha"), json!(null)] {
        let err = SubmissionForm::from_json(SubmissionKind::ContactMessage, payload)
            .expect_err("not an object");
        assert!(matches!(err, ValidationError::MalformedPayload(_)));
    }

    let err = SubmissionForm::from_json(
        SubmissionKind::Enquiry,
        json!({ "name": { "first": "Ravi" } }),
    )
    .expect_err("object where text expected");
    assert!(matches!(err, ValidationError::MalformedPayload(_)));
}

#[test]
fn every_fixture_validates() {
    for kind in SubmissionKind::ALL {
        let submission = form(kind).validate().expect("fixture validates");
        assert_eq!(submission.kind(), kind);
    }
}
