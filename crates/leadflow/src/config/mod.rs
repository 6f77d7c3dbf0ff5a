use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::submissions::storage::UploadLimits;
use crate::submissions::templates::BrandProfile;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration, resolved once at startup and handed to collaborators.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub cors: CorsConfig,
    pub notifier: NotifierConfig,
    pub storage: StorageConfig,
    pub uploads: UploadLimits,
    pub brand: BrandProfile,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let allowed_origins = optional_var("APP_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let smtp = match (
            optional_var("SMTP_HOST"),
            optional_var("SMTP_USERNAME"),
            optional_var("SMTP_PASSWORD"),
        ) {
            (Some(host), Some(username), Some(password)) => Some(SmtpSettings {
                host,
                username,
                password,
            }),
            (None, None, None) => None,
            _ => return Err(ConfigError::IncompleteSmtp),
        };

        let from_address = optional_var("MAIL_FROM")
            .or_else(|| smtp.as_ref().map(|settings| settings.username.clone()))
            .unwrap_or_else(|| "no-reply@localhost".to_string());
        let staff_inbox = optional_var("MAIL_STAFF_INBOX").unwrap_or_else(|| from_address.clone());

        let storage = StorageConfig {
            root: PathBuf::from(optional_var("STORAGE_ROOT").unwrap_or_else(|| "./uploads".to_string())),
            public_base_url: optional_var("STORAGE_PUBLIC_URL")
                .unwrap_or_else(|| format!("http://127.0.0.1:{port}/uploads")),
        };

        let uploads = UploadLimits {
            max_resume_bytes: numeric_var("UPLOAD_MAX_RESUME_BYTES")?
                .unwrap_or(UploadLimits::DEFAULT_MAX_RESUME_BYTES),
            max_avatar_bytes: numeric_var("UPLOAD_MAX_AVATAR_BYTES")?
                .unwrap_or(UploadLimits::DEFAULT_MAX_AVATAR_BYTES),
        };

        let defaults = BrandProfile::default();
        let brand = BrandProfile {
            name: optional_var("BRAND_NAME").unwrap_or(defaults.name),
            tagline: optional_var("BRAND_TAGLINE").unwrap_or(defaults.tagline),
            website: optional_var("BRAND_WEBSITE").unwrap_or(defaults.website),
            logo_url: optional_var("BRAND_LOGO_URL").or(defaults.logo_url),
            contact_email: optional_var("BRAND_CONTACT_EMAIL").unwrap_or(defaults.contact_email),
            contact_phone: optional_var("BRAND_CONTACT_PHONE").or(defaults.contact_phone),
            address: optional_var("BRAND_ADDRESS").or(defaults.address),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            cors: CorsConfig { allowed_origins },
            notifier: NotifierConfig {
                smtp,
                from_address,
                staff_inbox,
            },
            storage,
            uploads,
            brand,
        })
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn numeric_var(name: &'static str) -> Result<Option<usize>, ConfigError> {
    optional_var(name)
        .map(|raw| {
            raw.parse::<usize>()
                .map_err(|_| ConfigError::InvalidNumber { var: name })
        })
        .transpose()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Browser origins allowed to post forms and drive the admin console.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outbound mail settings. Without SMTP credentials the service logs mail instead.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub smtp: Option<SmtpSettings>,
    pub from_address: String,
    pub staff_inbox: String,
}

/// Local blob storage root and the base URL it is served under.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub public_base_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    IncompleteSmtp,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative integer byte count")
            }
            ConfigError::IncompleteSmtp => write!(
                f,
                "SMTP_HOST, SMTP_USERNAME and SMTP_PASSWORD must be set together"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::IncompleteSmtp => None,
        }
    }
}
