use leadflow::config::{AppConfig, NotifierConfig, StorageConfig};
use leadflow::error::AppError;
use leadflow::submissions::{
    Email, InMemoryRecordStore, IntakeSettings, Notifier, NotifyError, ObjectPath, SmtpNotifier,
    StorageError, StorageGateway, SubmissionPipeline, UploadedFile,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub(crate) type ServicePipeline =
    SubmissionPipeline<InMemoryRecordStore, LocalDirectoryStorage, MailNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stores uploads under a local directory that the server also exposes read-only.
#[derive(Debug, Clone)]
pub(crate) struct LocalDirectoryStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDirectoryStorage {
    pub(crate) fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl StorageGateway for LocalDirectoryStorage {
    fn put(&self, path: &ObjectPath, file: &UploadedFile) -> Result<(), StorageError> {
        let target = self.root.join(path.as_str());
        let parent = target
            .parent()
            .ok_or_else(|| StorageError::Rejected(format!("object path '{path}' has no parent")))?;
        fs::create_dir_all(parent).map_err(|err| StorageError::Unavailable(err.to_string()))?;

        // Readers never observe a half-written object.
        let staging = parent.join(format!(".{}.part", Uuid::new_v4().simple()));
        fs::write(&staging, &file.bytes).map_err(|err| match err.kind() {
            ErrorKind::PermissionDenied => StorageError::Rejected(err.to_string()),
            _ => StorageError::Unavailable(err.to_string()),
        })?;
        fs::rename(&staging, &target).map_err(|err| {
            let _ = fs::remove_file(&staging);
            StorageError::Unavailable(err.to_string())
        })
    }

    fn public_url(&self, path: &ObjectPath) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}

/// Writes outgoing mail to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, email: &Email) -> Result<(), NotifyError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            html_bytes = email.html.len(),
            attachment = email.attachment.as_ref().map(|file| file.file_name.as_str()),
            "mail delivery disabled; message logged"
        );
        Ok(())
    }
}

pub(crate) enum MailNotifier {
    Smtp(SmtpNotifier),
    Log(LogNotifier),
}

impl MailNotifier {
    pub(crate) fn from_config(config: &NotifierConfig) -> Result<Self, NotifyError> {
        match &config.smtp {
            Some(settings) => {
                info!(host = %settings.host, from = %config.from_address, "smtp delivery enabled");
                SmtpNotifier::new(settings, &config.from_address).map(MailNotifier::Smtp)
            }
            None => {
                info!("no smtp credentials configured; notifications are logged only");
                Ok(MailNotifier::Log(LogNotifier))
            }
        }
    }
}

impl Notifier for MailNotifier {
    fn send(&self, email: &Email) -> Result<(), NotifyError> {
        match self {
            MailNotifier::Smtp(notifier) => notifier.send(email),
            MailNotifier::Log(notifier) => notifier.send(email),
        }
    }
}

pub(crate) fn build_pipeline(config: &AppConfig) -> Result<ServicePipeline, AppError> {
    let notifier = MailNotifier::from_config(&config.notifier).map_err(AppError::Notifier)?;
    let storage = LocalDirectoryStorage::new(&config.storage);
    let settings = IntakeSettings {
        staff_inbox: config.notifier.staff_inbox.clone(),
        limits: config.uploads,
        brand: config.brand.clone(),
    };

    Ok(SubmissionPipeline::new(
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(storage),
        Arc::new(notifier),
        settings,
    ))
}
