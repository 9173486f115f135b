//! Failures on the outbound notification path.

use thiserror::Error;

/// Errors raised while configuring the relay or sending a message.
#[derive(Debug, Error)]
pub enum MailerError {
    /// The SMTP relay could not be set up.
    #[error("smtp relay unavailable: {0}")]
    Transport(String),

    #[error("relay rejected message: {0}")]
    Send(String),

    /// The message itself is malformed (no recipients, bad body).
    #[error("could not assemble message: {0}")]
    BuildEmail(String),

    #[error("bad mailbox {0}")]
    InvalidAddress(String),

    #[error("mailer misconfigured: {0}")]
    Config(String),

    /// `SMTP_HOST` was set but a credential variable was not.
    #[error("{0} must be set when SMTP_HOST is configured")]
    MissingEnvVar(String),
}
