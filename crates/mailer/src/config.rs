use secrecy::{ExposeSecret, SecretString};
use std::env;

use crate::MailerError;

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP relay host
    pub host: String,
    /// SMTP port (default: 587)
    pub port: u16,
    /// Login name for the relay
    pub username: String,
    /// Relay password
    password: SecretString,
    /// Sender address (default: the username)
    pub from_address: String,
}

impl SmtpConfig {
    /// Create a new configuration with explicit values.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        Self {
            host: host.into(),
            port,
            from_address: username.clone(),
            username,
            password: SecretString::from(password.into()),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Returns `Ok(None)` when `SMTP_HOST` is unset, meaning mail should only
    /// be logged.
    ///
    /// With `SMTP_HOST` set, these are required:
    /// - `SMTP_USERNAME` - Relay login
    /// - `SMTP_PASSWORD` - Relay password
    ///
    /// Optional (with defaults):
    /// - `SMTP_PORT` - Default: 587
    /// - `SMTP_FROM` - Default: `SMTP_USERNAME`
    pub fn from_env() -> Result<Option<Self>, MailerError> {
        let Ok(host) = env::var("SMTP_HOST") else {
            return Ok(None);
        };

        let port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|e| MailerError::Config(format!("Invalid SMTP_PORT: {}", e)))?;

        let username =
            env::var("SMTP_USERNAME").map_err(|_| MailerError::MissingEnvVar("SMTP_USERNAME".to_string()))?;

        let password =
            env::var("SMTP_PASSWORD").map_err(|_| MailerError::MissingEnvVar("SMTP_PASSWORD".to_string()))?;

        let from_address = env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());

        Ok(Some(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            from_address,
        }))
    }

    /// Get the password (exposes the secret).
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Builder method to set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder method to set the sender address.
    pub fn with_from_address(mut self, from: impl Into<String>) -> Self {
        self.from_address = from.into();
        self
    }
}
