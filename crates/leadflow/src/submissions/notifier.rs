use std::fmt;

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::config::SmtpSettings;

/// Outbound e-mail delivery. Failures are reported, never retried here.
pub trait Notifier: Send + Sync {
    fn send(&self, email: &Email) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("unable to build message: {0}")]
    Build(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachment: Option<Attachment>,
}

impl fmt::Debug for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Email")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .field("html_len", &self.html.len())
            .field("attachment", &self.attachment)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// SMTP relay delivery (STARTTLS/TLS handled by the relay builder).
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, NotifyError> {
        let from = parse_mailbox(from)?;
        let credentials = Credentials::new(settings.username.clone(), settings.password.clone());
        let transport = SmtpTransport::relay(&settings.host)
            .map_err(|err| NotifyError::Transport(err.to_string()))?
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &Email) -> Result<Message, NotifyError> {
        let builder = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&email.to)?)
            .subject(email.subject.clone());

        let html = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone());

        let message = match &email.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .map_err(|err| NotifyError::Build(err.to_string()))?;
                let part = MailAttachment::new(attachment.file_name.clone())
                    .body(attachment.bytes.clone(), content_type);
                builder.multipart(MultiPart::mixed().singlepart(html).singlepart(part))
            }
            None => builder.singlepart(html),
        };

        message.map_err(|err| NotifyError::Build(err.to_string()))
    }
}

impl fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let message = self.build_message(email)?;
        self.transport
            .send(&message)
            .map(|_| ())
            .map_err(|err| NotifyError::Transport(err.to_string()))
    }
}

fn parse_mailbox(raw: &str) -> Result<Mailbox, NotifyError> {
    raw.trim()
        .parse::<Mailbox>()
        .map_err(|_| NotifyError::InvalidAddress(raw.to_string()))
}
