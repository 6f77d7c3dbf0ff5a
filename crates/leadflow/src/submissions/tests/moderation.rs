use super::common::*;
use std::sync::Arc;

use serde_json::json;

use crate::submissions::domain::{RecordId, Submission, SubmissionKind};
use crate::submissions::moderation::{ModerationEngine, ModerationError};
use crate::submissions::store::RecordStore;
use crate::submissions::validation::{TestimonialForm, ValidationError};

fn engine(harness: &Harness) -> ModerationEngine<crate::submissions::InMemoryRecordStore> {
    ModerationEngine::new(harness.store.clone())
}

fn testimonial_flags(harness: &Harness, id: &RecordId) -> (bool, bool, bool) {
    let record = harness
        .store
        .fetch(SubmissionKind::Testimonial, id)
        .expect("fetch")
        .expect("record exists");
    match record.submission {
        Submission::Testimonial(t) => (t.approved, t.is_active, t.is_featured),
        other => panic!("unexpected submission {other:?}"),
    }
}

fn status_of(harness: &Harness, kind: SubmissionKind, id: &RecordId) -> &'static str {
    harness
        .store
        .fetch(kind, id)
        .expect("fetch")
        .expect("record exists")
        .status_label()
}

#[test]
fn contact_scenario_allows_progress_and_rejects_unknown_status() {
    let harness = Harness::new();
    let receipt = harness
        .intake()
        .submit(request(SubmissionKind::ContactMessage))
        .expect("contact accepted");
    let id = receipt.record.id;
    assert_eq!(receipt.record.status_label(), "new");

    let engine = engine(&harness);
    let moved = engine
        .transition(SubmissionKind::ContactMessage, &id, "in_progress", None)
        .expect("new -> in_progress is legal");
    assert_eq!(moved.status_label(), "in_progress");

    let err = engine
        .transition(SubmissionKind::ContactMessage, &id, "archived", None)
        .expect_err("archived is not a contact status");
    assert!(err.is_illegal());
    match err {
        ModerationError::IllegalTransition { from, to, .. } => {
            assert_eq!(from, "in_progress");
            assert_eq!(to, "archived");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(
        status_of(&harness, SubmissionKind::ContactMessage, &id),
        "in_progress"
    );
}

#[test]
fn student_application_cannot_skip_to_accepted() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::StudentApplication);

    let err = engine(&harness)
        .transition(SubmissionKind::StudentApplication, &record.id, "accepted", None)
        .expect_err("pending -> accepted skips the review");

    assert!(matches!(
        err,
        ModerationError::IllegalTransition { ref from, ref to, .. } if from == "pending" && to == "accepted"
    ));
    assert_eq!(
        status_of(&harness, SubmissionKind::StudentApplication, &record.id),
        "pending"
    );
}

#[test]
fn student_application_walks_the_full_path() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::StudentApplication);
    let engine = engine(&harness);

    for status in ["reviewing", "called", "shortlisted", "accepted"] {
        let updated = engine
            .transition(SubmissionKind::StudentApplication, &record.id, status, None)
            .expect("legal step");
        assert_eq!(updated.status_label(), status);
    }

    assert!(engine
        .transition(SubmissionKind::StudentApplication, &record.id, "rejected", None)
        .expect_err("accepted is terminal")
        .is_illegal());
    assert!(engine
        .legal_transitions(SubmissionKind::StudentApplication, &record.id)
        .expect("record exists")
        .is_empty());
}

#[test]
fn self_transitions_are_rejected() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::JobApplication);

    let err = engine(&harness)
        .transition(SubmissionKind::JobApplication, &record.id, "pending", None)
        .expect_err("pending -> pending is not an edge");

    assert!(err.is_illegal());
}

#[test]
fn enquiry_transition_records_notes_atomically() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::Enquiry);
    let engine = engine(&harness);

    engine
        .transition(SubmissionKind::Enquiry, &record.id, "reviewing", None)
        .expect("new -> reviewing");
    let quoted = engine
        .transition(
            SubmissionKind::Enquiry,
            &record.id,
            "Quoted",
            Some("Sent estimate of 40 hours".to_string()),
        )
        .expect("reviewing -> quoted");

    assert_eq!(quoted.status_label(), "quoted");
    assert_eq!(quoted.submission.notes(), Some("Sent estimate of 40 hours"));

    let err = engine
        .transition(
            SubmissionKind::Enquiry,
            &record.id,
            "accepted",
            Some("should not be saved".to_string()),
        )
        .expect_err("quoted -> accepted is not an edge");
    assert!(err.is_illegal());
    let stored = harness
        .store
        .fetch(SubmissionKind::Enquiry, &record.id)
        .expect("fetch")
        .expect("exists");
    assert_eq!(stored.submission.notes(), Some("Sent estimate of 40 hours"));
}

#[test]
fn approving_a_testimonial_activates_it() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::Testimonial);
    let engine = engine(&harness);
    assert_eq!(testimonial_flags(&harness, &record.id), (false, false, false));

    engine.set_approval(&record.id, true).expect("approve");
    assert_eq!(testimonial_flags(&harness, &record.id), (true, true, false));

    engine.set_featured(&record.id, true).expect("feature");
    assert_eq!(testimonial_flags(&harness, &record.id), (true, true, true));

    engine.set_featured(&record.id, false).expect("unfeature");
    assert_eq!(testimonial_flags(&harness, &record.id), (true, true, false));
}

#[test]
fn unapproving_hides_but_keeps_featured_flag() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::Testimonial);
    let engine = engine(&harness);

    engine.set_approval(&record.id, true).expect("approve");
    engine.set_featured(&record.id, true).expect("feature");
    let updated = engine.set_approval(&record.id, false).expect("unapprove");

    assert_eq!(updated.status_label(), "unapproved");
    assert_eq!(testimonial_flags(&harness, &record.id), (false, false, true));
}

#[test]
fn testimonial_status_labels_map_to_approval() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::Testimonial);
    let engine = engine(&harness);

    let approved = engine
        .transition(SubmissionKind::Testimonial, &record.id, "approved", None)
        .expect("approve via status");
    assert_eq!(approved.status_label(), "approved");
    assert_eq!(testimonial_flags(&harness, &record.id), (true, true, false));

    let err = engine
        .transition(SubmissionKind::Testimonial, &record.id, "closed", None)
        .expect_err("testimonials have no closed state");
    assert!(err.is_illegal());
}

#[test]
fn flag_changes_are_limited_to_testimonials() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::ContactMessage);

    // The engine addresses the testimonial table, so a contact id is simply unknown there.
    let err = engine(&harness)
        .set_approval(&record.id, true)
        .expect_err("not a testimonial");
    assert!(matches!(err, ModerationError::NotFound { .. }));
}

#[test]
fn notes_only_on_kinds_that_carry_them() {
    let harness = Harness::new();
    let enquiry = harness.seed(SubmissionKind::Enquiry);
    let contact = harness.seed(SubmissionKind::ContactMessage);
    let engine = engine(&harness);

    let annotated = engine
        .annotate(
            SubmissionKind::Enquiry,
            &enquiry.id,
            Some("Call back Tuesday".to_string()),
        )
        .expect("enquiries carry notes");
    assert_eq!(annotated.submission.notes(), Some("Call back Tuesday"));
    assert_eq!(annotated.status_label(), "new");

    let cleared = engine
        .annotate(SubmissionKind::Enquiry, &enquiry.id, Some("   ".to_string()))
        .expect("blank clears");
    assert_eq!(cleared.submission.notes(), None);

    let err = engine
        .annotate(SubmissionKind::ContactMessage, &contact.id, Some("x".to_string()))
        .expect_err("contacts have no notes");
    assert!(matches!(
        err,
        ModerationError::UnsupportedChange {
            kind: SubmissionKind::ContactMessage,
            change: "notes"
        }
    ));
    assert!(err.is_illegal());
}

#[test]
fn transition_notes_are_refused_where_annotate_refuses_them() {
    let harness = Harness::new();
    let contact = harness.seed(SubmissionKind::ContactMessage);
    let job = harness.seed(SubmissionKind::JobApplication);
    let testimonial = harness.seed(SubmissionKind::Testimonial);
    let engine = engine(&harness);

    for (kind, id, target) in [
        (SubmissionKind::ContactMessage, contact.id, "in_progress"),
        (SubmissionKind::JobApplication, job.id, "reviewed"),
        (SubmissionKind::Testimonial, testimonial.id, "approved"),
    ] {
        let err = engine
            .transition(kind, &id, target, Some("left a voicemail".to_string()))
            .expect_err("kind keeps no notes");
        assert!(matches!(
            err,
            ModerationError::UnsupportedChange { change: "notes", .. }
        ));
    }
    assert_eq!(status_of(&harness, SubmissionKind::ContactMessage, &contact.id), "new");
    assert_eq!(status_of(&harness, SubmissionKind::JobApplication, &job.id), "pending");
    assert_eq!(testimonial_flags(&harness, &testimonial.id), (false, false, false));

    let moved = engine
        .transition(
            SubmissionKind::ContactMessage,
            &contact.id,
            "in_progress",
            Some("  ".to_string()),
        )
        .expect("blank notes count as none");
    assert_eq!(moved.status_label(), "in_progress");
}

#[test]
fn editing_a_testimonial_revalidates_and_keeps_flags() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::Testimonial);
    let engine = engine(&harness);
    engine.set_approval(&record.id, true).expect("approve");

    let edit: TestimonialForm = serde_json::from_value(json!({
        "name": "Priya Shah",
        "email": "priya@brightlabs.test",
        "position": "Chief Technology Officer",
        "testimonial": "Still rock solid a year later.",
        "rating": "4",
    }))
    .expect("edit decodes");
    let updated = engine
        .edit_testimonial(&record.id, edit)
        .expect("edit applied");

    match updated.submission {
        Submission::Testimonial(t) => {
            assert_eq!(t.position, "Chief Technology Officer");
            assert_eq!(t.rating, 4);
            assert_eq!(t.company, None);
            assert!(t.approved && t.is_active);
        }
        other => panic!("unexpected submission {other:?}"),
    }

    let bad: TestimonialForm = serde_json::from_value(json!({
        "name": "Priya Shah",
        "email": "priya@brightlabs.test",
        "position": "CTO",
        "testimonial": "x",
        "rating": 9,
    }))
    .expect("edit decodes");
    let err = engine
        .edit_testimonial(&record.id, bad)
        .expect_err("rating out of range");
    assert!(matches!(
        err,
        ModerationError::Validation(ValidationError::RatingOutOfRange { rating: 9 })
    ));
}

#[test]
fn delete_is_unconditional_and_final() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::JobApplication);
    let engine = engine(&harness);
    engine
        .transition(SubmissionKind::JobApplication, &record.id, "reviewed", None)
        .expect("pending -> reviewed");

    engine
        .delete(SubmissionKind::JobApplication, &record.id)
        .expect("delete in any status");

    assert!(harness.stored(SubmissionKind::JobApplication).is_empty());
    assert!(matches!(
        engine.delete(SubmissionKind::JobApplication, &record.id),
        Err(ModerationError::NotFound { .. })
    ));
    assert!(matches!(
        engine.transition(SubmissionKind::JobApplication, &record.id, "shortlisted", None),
        Err(ModerationError::NotFound { .. })
    ));
}

#[test]
fn unknown_target_on_missing_record_reports_not_found() {
    let harness = Harness::new();
    let err = engine(&harness)
        .transition(SubmissionKind::ContactMessage, &RecordId::generate(), "archived", None)
        .expect_err("no such record");
    assert!(matches!(err, ModerationError::NotFound { .. }));
}

#[test]
fn concurrent_admins_cannot_both_apply_the_same_step() {
    let harness = Harness::new();
    let record = harness.seed(SubmissionKind::ContactMessage);
    let engine = engine(&harness);

    let outcomes: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    engine
                        .transition(SubmissionKind::ContactMessage, &record.id, "in_progress", None)
                        .is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread completes"))
            .collect()
    });

    assert_eq!(outcomes.iter().filter(|applied| **applied).count(), 1);
    assert_eq!(
        status_of(&harness, SubmissionKind::ContactMessage, &record.id),
        "in_progress"
    );
}

#[test]
fn observer_sees_every_applied_change() {
    let harness = Harness::new();
    let observer = Arc::new(RecordingObserver::default());
    let engine = ModerationEngine::with_observer(harness.store.clone(), observer.clone());
    let record = harness.seed(SubmissionKind::JobApplication);

    engine
        .transition(SubmissionKind::JobApplication, &record.id, "reviewed", None)
        .expect("legal");
    let _ = engine.transition(SubmissionKind::JobApplication, &record.id, "pending", None);
    engine
        .transition(SubmissionKind::JobApplication, &record.id, "shortlisted", None)
        .expect("legal");

    assert_eq!(
        observer.changes(),
        vec![
            ("status", "reviewed".to_string()),
            ("status", "shortlisted".to_string()),
        ]
    );
}

#[test]
fn store_outage_is_not_reported_as_illegal() {
    let engine = ModerationEngine::new(Arc::new(UnavailableStore));
    let err = engine
        .transition(SubmissionKind::ContactMessage, &RecordId::generate(), "in_progress", None)
        .expect_err("store offline");
    assert!(matches!(err, ModerationError::Store(_)));
    assert!(!err.is_illegal());
}
