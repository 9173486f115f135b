//! # mailer
//!
//! Outbound notification email for the moderation workflow.
//!
//! [`SmtpMailer`] delivers through an SMTP relay; [`LogMailer`] only logs,
//! and is used when no relay is configured.
//!
//! ```no_run
//! use mailer::{Email, EmailSender, SmtpConfig, SmtpMailer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mailer::MailerError> {
//!     let config = SmtpConfig::new("smtp.example.com", 587, "alerts@example.com", "secret");
//!     let mailer = SmtpMailer::new(config)?;
//!
//!     let email = Email::new("teacher@school.test", "Review complete", "Your quiz was approved.")
//!         .with_metadata("metrics_id", "5b0b5f7e");
//!     mailer.send(&email).await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::{EmailSender, LogMailer, SmtpMailer};
pub use config::SmtpConfig;
pub use error::MailerError;
pub use types::Email;
