use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::domain::SubmissionKind;

/// Blob store holding resumes and avatar images.
pub trait StorageGateway: Send + Sync {
    fn put(&self, path: &ObjectPath, file: &UploadedFile) -> Result<(), StorageError>;
    fn public_url(&self, path: &ObjectPath) -> String;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload rejected by storage: {0}")]
    Rejected(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A file received alongside a submission. Contents are never inspected.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercase extension of the original file name, restricted to ASCII alphanumerics.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    }

    /// Declared content type, falling back to one derived from the extension.
    pub fn media_type(&self) -> mime::Mime {
        self.content_type
            .as_deref()
            .and_then(|raw| raw.parse::<mime::Mime>().ok())
            .unwrap_or_else(|| match self.extension().as_deref() {
                Some("pdf") => mime::APPLICATION_PDF,
                Some("png") => mime::IMAGE_PNG,
                Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG,
                Some("gif") => mime::IMAGE_GIF,
                Some("bmp") => mime::IMAGE_BMP,
                Some("webp") => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
                Some("doc") => "application/msword"
                    .parse()
                    .unwrap_or(mime::APPLICATION_OCTET_STREAM),
                Some("docx") => {
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                        .parse()
                        .unwrap_or(mime::APPLICATION_OCTET_STREAM)
                }
                _ => mime::APPLICATION_OCTET_STREAM,
            })
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Collision-free object key: `<prefix>/<unix-millis>-<uuid>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn generate(prefix: &str, extension: Option<&str>, now: DateTime<Utc>) -> Self {
        let token = Uuid::new_v4().simple();
        let stamp = now.timestamp_millis();
        match extension {
            Some(ext) => Self(format!("{prefix}/{stamp}-{token}.{ext}")),
            None => Self(format!("{prefix}/{stamp}-{token}")),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRequirement {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAcceptance {
    Documents,
    Images,
}

impl FileAcceptance {
    /// Extension the stored object is given, or `None` when the file is refused.
    ///
    /// Image objects only ever get a raster extension from a fixed list, so a
    /// declared `image/*` type cannot smuggle another suffix into `/uploads`.
    /// A declared image type and the file name must agree when both are given.
    pub fn stored_extension(self, file: &UploadedFile) -> Option<&'static str> {
        let named = file.extension();
        match self {
            FileAcceptance::Documents => match named.as_deref()? {
                "pdf" => Some("pdf"),
                "doc" => Some("doc"),
                "docx" => Some("docx"),
                _ => None,
            },
            FileAcceptance::Images => {
                let declared = file
                    .content_type
                    .as_deref()
                    .and_then(|raw| raw.parse::<mime::Mime>().ok())
                    .filter(|media| media.type_() == mime::IMAGE);
                match declared {
                    Some(media) => {
                        let extension = Self::image_extension_for_type(&media)?;
                        match named.as_deref() {
                            None => Some(extension),
                            Some(name) => (Self::image_extension_for_name(name) == Some(extension))
                                .then_some(extension),
                        }
                    }
                    None => named.as_deref().and_then(Self::image_extension_for_name),
                }
            }
        }
    }

    pub fn accepts(self, file: &UploadedFile) -> bool {
        self.stored_extension(file).is_some()
    }

    pub fn describe(self) -> &'static str {
        match self {
            FileAcceptance::Documents => "PDF, DOC or DOCX documents",
            FileAcceptance::Images => "PNG, JPEG, GIF, WEBP or BMP images",
        }
    }

    fn image_extension_for_name(extension: &str) -> Option<&'static str> {
        match extension {
            "png" => Some("png"),
            "jpg" | "jpeg" => Some("jpg"),
            "gif" => Some("gif"),
            "webp" => Some("webp"),
            "bmp" => Some("bmp"),
            _ => None,
        }
    }

    // Scriptable image formats such as svg+xml have no entry.
    fn image_extension_for_type(media: &mime::Mime) -> Option<&'static str> {
        match media.subtype().as_str() {
            "png" => Some("png"),
            "jpeg" | "pjpeg" => Some("jpg"),
            "gif" => Some("gif"),
            "webp" => Some("webp"),
            "bmp" | "x-ms-bmp" => Some("bmp"),
            _ => None,
        }
    }
}

/// Size limits applied before anything is uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_resume_bytes: usize,
    pub max_avatar_bytes: usize,
}

impl UploadLimits {
    pub const DEFAULT_MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;
    pub const DEFAULT_MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

    pub fn largest(&self) -> usize {
        self.max_resume_bytes.max(self.max_avatar_bytes)
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_resume_bytes: Self::DEFAULT_MAX_RESUME_BYTES,
            max_avatar_bytes: Self::DEFAULT_MAX_AVATAR_BYTES,
        }
    }
}

/// Describes the file a kind may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSlot {
    pub field: &'static str,
    pub prefix: &'static str,
    pub requirement: FileRequirement,
    pub acceptance: FileAcceptance,
    pub max_bytes: usize,
}

impl FileSlot {
    pub fn for_kind(kind: SubmissionKind, limits: &UploadLimits) -> Option<Self> {
        match kind {
            SubmissionKind::JobApplication => Some(Self {
                field: "resume",
                prefix: "resumes",
                requirement: FileRequirement::Required,
                acceptance: FileAcceptance::Documents,
                max_bytes: limits.max_resume_bytes,
            }),
            SubmissionKind::Testimonial => Some(Self {
                field: "avatar",
                prefix: "avatars",
                requirement: FileRequirement::Optional,
                acceptance: FileAcceptance::Images,
                max_bytes: limits.max_avatar_bytes,
            }),
            SubmissionKind::ContactMessage
            | SubmissionKind::Enquiry
            | SubmissionKind::StudentApplication => None,
        }
    }
}
