//! Branded HTML e-mail rendering for staff alerts and submitter acknowledgements.
//!
//! Every value taken from a submission passes through [`markup::Html::text`] before it
//! reaches the document; the only raw markup comes from this module.

mod content;
mod layout;
pub mod markup;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::domain::Submission;

/// Which side of the conversation an e-mail is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Staff,
    Submitter,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Staff, Direction::Submitter];

    pub fn label(self) -> &'static str {
        match self {
            Direction::Staff => "staff",
            Direction::Submitter => "submitter",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "staff" | "admin" => Some(Direction::Staff),
            "submitter" | "user" => Some(Direction::Submitter),
            _ => None,
        }
    }
}

/// Organisation identity printed in every e-mail header and footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandProfile {
    pub name: String,
    pub tagline: String,
    pub website: String,
    pub logo_url: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
}

impl Default for BrandProfile {
    fn default() -> Self {
        Self {
            name: "Acme Digital".to_string(),
            tagline: "Software & Cloud Services".to_string(),
            website: "https://www.example.com".to_string(),
            logo_url: None,
            contact_email: "hello@example.com".to_string(),
            contact_phone: None,
            address: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Renders the e-mail for one direction. Pure apart from the supplied clock.
pub fn render(
    submission: &Submission,
    direction: Direction,
    brand: &BrandProfile,
    now: DateTime<Utc>,
) -> RenderedEmail {
    let submitted_at = now.format("%d %b %Y, %H:%M UTC").to_string();
    let (subject, body) = match direction {
        Direction::Staff => content::staff(submission, brand, &submitted_at),
        Direction::Submitter => content::submitter(submission, brand),
    };

    RenderedEmail {
        subject: single_line(&subject),
        html: layout::wrap(brand, body, now.year()),
    }
}

/// Header values must not carry line breaks or other control characters.
fn single_line(raw: &str) -> String {
    raw.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_are_collapsed_to_one_line() {
        assert_eq!(single_line("Hello\r\nBcc: x@example.com"), "Hello  Bcc: x@example.com");
    }

    #[test]
    fn direction_parses_aliases() {
        assert_eq!(Direction::parse("Admin"), Some(Direction::Staff));
        assert_eq!(Direction::parse("user"), Some(Direction::Submitter));
        assert_eq!(Direction::parse("both"), None);
    }
}
