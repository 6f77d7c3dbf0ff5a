use super::markup::{
    bullet_list, callout, external_link, heading, heading_html, mailto, paragraph, quote_block,
    strong, tel, timestamp_line, DetailTable, Html,
};
use super::BrandProfile;
use crate::submissions::domain::{
    ContactMessage, Enquiry, JobApplication, StudentApplication, Submission, Testimonial,
};

type Composed = (String, Html);

pub(super) fn staff(submission: &Submission, brand: &BrandProfile, submitted_at: &str) -> Composed {
    let (subject, mut body) = match submission {
        Submission::ContactMessage(record) => staff_contact(record),
        Submission::Enquiry(record) => staff_enquiry(record),
        Submission::StudentApplication(record) => staff_student(record),
        Submission::JobApplication(record) => staff_job(record),
        Submission::Testimonial(record) => staff_testimonial(record),
    };
    body.push(timestamp_line("Submitted", submitted_at));
    body.push(paragraph(&format!(
        "This alert was generated by the {} website.",
        brand.name
    )));
    (subject, body)
}

pub(super) fn submitter(submission: &Submission, brand: &BrandProfile) -> Composed {
    let (subject, mut body) = match submission {
        Submission::ContactMessage(record) => submitter_contact(record, brand),
        Submission::Enquiry(record) => submitter_enquiry(record, brand),
        Submission::StudentApplication(record) => submitter_student(record, brand),
        Submission::JobApplication(record) => submitter_job(record, brand),
        Submission::Testimonial(record) => submitter_testimonial(record, brand),
    };
    body.push(reach_us(brand));
    (subject, body)
}

fn staff_contact(record: &ContactMessage) -> Composed {
    let mut body = heading(
        "New Contact Form Submission",
        "A visitor sent a message through the contact form.",
    );
    let mut details = DetailTable::new("Contact Information")
        .text("Name", &record.name)
        .html("Email", mailto(&record.email));
    if let Some(phone) = record.phone.as_deref() {
        details = details.html("Phone", tel(phone));
    }
    body.push(details.render());
    body.push(quote_block("Message", &record.message));

    (format!("New Contact - {}", record.name), body)
}

fn staff_enquiry(record: &Enquiry) -> Composed {
    let mut body = heading(
        "New Service Enquiry",
        "A prospective client asked about your services.",
    );
    let mut details = DetailTable::new("Client Information")
        .text("Name", &record.name)
        .html("Email", mailto(&record.email));
    if let Some(phone) = record.phone.as_deref() {
        details = details.html("Phone", tel(phone));
    }
    details = details
        .optional_text("Company", record.company.as_deref())
        .text("Service", &record.service_type);
    body.push(details.render());
    body.push(quote_block("Project Description", &record.project_description));

    (
        format!("New Enquiry - {} - {}", record.service_type, record.name),
        body,
    )
}

fn staff_student(record: &StudentApplication) -> Composed {
    let program = record.program_type.title();
    let mut body = heading("New Student Enquiry", &format!("{program} program"));
    body.push(
        DetailTable::new("Personal Information")
            .text("Full Name", &record.full_name)
            .html("Email", mailto(&record.email))
            .html("Phone", tel(&record.phone))
            .render(),
    );
    body.push(
        DetailTable::new("Academic Information")
            .text("College / University", &record.college_university)
            .text("Degree", &record.degree)
            .text("Year of Study", &record.year_of_study)
            .text("Program", program)
            .render(),
    );

    (
        format!("New Student Enquiry - {program} - {}", record.full_name),
        body,
    )
}

fn staff_job(record: &JobApplication) -> Composed {
    let position = record.position_label();
    let mut subtitle = Html::text("Position: ");
    subtitle.push(strong(position));
    let mut body = heading_html("New Job Application", subtitle);

    body.push(
        DetailTable::new("Personal Information")
            .text("Full Name", &record.full_name)
            .html("Email", mailto(&record.email))
            .html("Phone", tel(&record.phone))
            .text("Current Location", &record.current_location)
            .text(
                "Willing to Relocate",
                if record.willing_to_relocate { "Yes" } else { "No" },
            )
            .render(),
    );

    let mut professional = DetailTable::new("Professional Details")
        .text("Current Job Title", &record.current_job_title)
        .text("Total Experience", &record.total_experience);
    if !record.relevant_skills.is_empty() {
        professional = professional.text("Skills", &record.relevant_skills.join(", "));
    }
    if let Some(url) = record.linkedin_url.as_deref() {
        professional = professional.html("LinkedIn", external_link(url, url));
    }
    if let Some(url) = record.portfolio_url.as_deref() {
        professional = professional.html("Portfolio", external_link(url, url));
    }
    if !record.project_links.is_empty() {
        let mut links = Html::default();
        for (index, url) in record.project_links.iter().enumerate() {
            if index > 0 {
                links.push(Html::trusted("<br>"));
            }
            links.push(external_link(url, url));
        }
        professional = professional.html("Projects", links);
    }
    body.push(professional.render());

    body.push(
        DetailTable::new("Education")
            .text("Highest Degree", &record.highest_degree)
            .text("University", &record.university)
            .text("Graduation Year", &record.graduation_year)
            .optional_text("Heard About Us", record.how_did_you_hear.as_deref())
            .render(),
    );

    if let Some(letter) = record.cover_letter.as_deref() {
        body.push(quote_block("Cover Letter", letter));
    }
    if let Some(info) = record.additional_info.as_deref() {
        body.push(quote_block("Additional Information", info));
    }
    if !record.resume_url.is_empty() {
        body.push(
            DetailTable::new("Resume")
                .html("Stored Copy", external_link(&record.resume_url, "Download resume"))
                .render(),
        );
    }
    body.push(callout(
        "Resume attached to this email.",
        "#ecfdf5",
        "#10b981",
        "#065f46",
    ));

    (
        format!("New Application - {position} - {}", record.full_name),
        body,
    )
}

fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{} ({rating}/5)", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn staff_testimonial(record: &Testimonial) -> Composed {
    let mut body = heading("New Feedback Received", "A client left a testimonial.");
    let mut details = DetailTable::new("Reviewer")
        .text("Name", &record.name)
        .html("Email", mailto(&record.email))
        .text("Position", &record.position)
        .optional_text("Company", record.company.as_deref())
        .text("Rating", &stars(record.rating));
    if let Some(url) = record.avatar_url.as_deref() {
        details = details.html("Photo", external_link(url, "View photo"));
    }
    body.push(details.render());
    body.push(quote_block("Testimonial", &record.testimonial));
    if record.avatar_url.is_some() {
        body.push(callout(
            "Profile photo attached to this email.",
            "#ecfdf5",
            "#10b981",
            "#065f46",
        ));
    }
    body.push(callout(
        "Pending approval: it will not appear on the website until approved.",
        "#fffbeb",
        "#f59e0b",
        "#92400e",
    ));

    (format!("New Feedback - {} Stars - {}", record.rating, record.name), body)
}

fn greeting(title: &str, name: &str) -> Html {
    let mut subtitle = Html::text("Hi ");
    subtitle.push(strong(name));
    subtitle.push(Html::text(","));
    heading_html(title, subtitle)
}

fn reach_us(brand: &BrandProfile) -> Html {
    let mut line = Html::trusted(
        "<p style=\"margin:18px 0 0 0;color:#6b7280;font-size:13px;\">Questions? Reach us at ",
    );
    line.push(mailto(&brand.contact_email));
    if let Some(phone) = brand.contact_phone.as_deref() {
        line.push(Html::text(" or "));
        line.push(tel(phone));
    }
    line.push(Html::trusted(".</p>"));
    line
}

fn submitter_contact(record: &ContactMessage, brand: &BrandProfile) -> Composed {
    let mut body = greeting("Thank you for reaching out!", &record.name);
    body.push(paragraph(&format!(
        "We've received your message and the {} team will get back to you within 24 hours.",
        brand.name
    )));
    body.push(quote_block("Your message", &record.message));

    (format!("Thank you - {}", brand.name), body)
}

fn submitter_enquiry(record: &Enquiry, brand: &BrandProfile) -> Composed {
    let mut body = greeting("We've received your enquiry", &record.name);
    body.push(paragraph(
        "Thanks for telling us about your project. Here is a summary of what you sent.",
    ));
    body.push(
        DetailTable::new("Enquiry Summary")
            .text("Service", &record.service_type)
            .optional_text("Company", record.company.as_deref())
            .render(),
    );
    body.push(bullet_list(
        "What happens next",
        &[
            "Our team reviews your requirements.",
            "We contact you within 24 hours to discuss the details.",
            "You receive a tailored proposal.",
        ],
    ));

    (format!("Your Enquiry - {}", brand.name), body)
}

fn submitter_student(record: &StudentApplication, brand: &BrandProfile) -> Composed {
    let program = record.program_type.title();
    let mut body = greeting("Your enquiry has been received", &record.full_name);
    body.push(paragraph(&format!(
        "Thank you for your interest in our {program} program. Our academic team will review your details shortly."
    )));
    body.push(
        DetailTable::new("Your Details")
            .text("Program", program)
            .text("College / University", &record.college_university)
            .text("Degree", &record.degree)
            .text("Year of Study", &record.year_of_study)
            .render(),
    );
    body.push(bullet_list(
        "What happens next",
        &[
            "We review your academic background.",
            "A coordinator calls you to discuss the program.",
            "Shortlisted students receive onboarding details by e-mail.",
        ],
    ));

    (
        format!("Your Enquiry Received - {program} - {}", brand.name),
        body,
    )
}

fn submitter_job(record: &JobApplication, brand: &BrandProfile) -> Composed {
    let position = record.position_label();
    let mut body = greeting("Application received", &record.full_name);
    let mut applied = Html::text("Thank you for applying for ");
    applied.push(strong(position));
    applied.push(Html::text(&format!(" at {}.", brand.name)));
    body.push(Html::trusted(format!(
        "<p style=\"margin:0 0 16px 0;color:#6b7280;font-size:14px;\">{}</p>",
        applied.as_str()
    )));
    body.push(bullet_list(
        "What happens next",
        &[
            "Our hiring team reviews your application and resume.",
            "If your profile matches, we contact you to schedule an interview.",
        ],
    ));

    (
        format!("Application Received - {position} - {}", brand.name),
        body,
    )
}

fn submitter_testimonial(record: &Testimonial, brand: &BrandProfile) -> Composed {
    let mut body = greeting("Thank you for your feedback", &record.name);
    body.push(paragraph(&format!(
        "We appreciate you taking the time to share your experience with {}.",
        brand.name
    )));
    body.push(
        DetailTable::new("Your Feedback")
            .text("Rating", &stars(record.rating))
            .render(),
    );
    body.push(quote_block("Your testimonial", &record.testimonial));
    body.push(paragraph(
        "Your testimonial will be reviewed by our team before it appears on the website.",
    ));

    (format!("Thank You for Your Feedback - {}", brand.name), body)
}
