//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

use secrecy::SecretString;

/// A moderator who receives review-request emails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeratorContact {
    pub id: String,
    pub email: String,
}

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Key for signed email-action links.
    pub email_action_secret: SecretString,
    /// Origin used to build links in emails.
    pub public_base_url: String,
    /// Moderators notified of review requests.
    pub moderators: Vec<ModeratorContact>,
    /// Model for the yes/no classifiers; the client default when unset.
    pub classifier_model: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `WEB_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:educator.db?mode=rwc` |
    /// | `EMAIL_ACTION_SECRET` | HMAC key for email links | (required) |
    /// | `PUBLIC_BASE_URL` | Origin for links in emails | `http://127.0.0.1:8790` |
    /// | `MODERATORS` | `id:email` pairs, comma separated | (none) |
    /// | `CLASSIFIER_MODEL` | Model for the safety classifiers | `OPENAI_MODEL` |
    ///
    /// The content checker (`BLOCK_SEVERITY`), the model client (`OPENAI_*`)
    /// and the mailer (`SMTP_*`) read their own variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("WEB_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:educator.db?mode=rwc".to_string());

        let email_action_secret = env::var("EMAIL_ACTION_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(SecretString::from)
            .ok_or(ConfigError::MissingSecret)?;

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}", addr))
            .trim_end_matches('/')
            .to_string();

        let moderators = match env::var("MODERATORS") {
            Ok(raw) => parse_moderators(&raw)?,
            Err(_) => Vec::new(),
        };

        let classifier_model = env::var("CLASSIFIER_MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            addr,
            database_url,
            email_action_secret,
            public_base_url,
            moderators,
            classifier_model,
        })
    }
}

/// Parse `id:email,id:email`.
pub fn parse_moderators(raw: &str) -> Result<Vec<ModeratorContact>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, email) = entry
                .split_once(':')
                .ok_or_else(|| ConfigError::InvalidModerator(entry.to_string()))?;
            let (id, email) = (id.trim(), email.trim());
            if id.is_empty() || database::validation::validate_email(email).is_err() {
                return Err(ConfigError::InvalidModerator(entry.to_string()));
            }
            Ok(ModeratorContact {
                id: id.to_string(),
                email: email.to_string(),
            })
        })
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid WEB_ADDR format")]
    InvalidAddr,

    #[error("EMAIL_ACTION_SECRET environment variable is required")]
    MissingSecret,

    #[error("Invalid MODERATORS entry '{0}', expected id:email")]
    InvalidModerator(String),
}
