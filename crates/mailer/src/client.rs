use std::sync::Mutex;

use async_trait::async_trait;
use lettre::{
    message::{MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument};

use crate::{Email, MailerError, SmtpConfig};

/// Something that can deliver an [`Email`].
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailerError>;
}

/// Sends email through an SMTP relay.
///
/// Uses connection pooling for efficient batch sending.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new mailer with the given configuration.
    pub fn new(config: SmtpConfig) -> Result<Self, MailerError> {
        let creds = Credentials::new(config.username.clone(), config.password().to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| MailerError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(creds)
            .build();

        info!(
            host = %config.host,
            port = config.port,
            from = %config.from_address,
            "Created SMTP mailer"
        );

        Ok(Self {
            transport,
            from_address: config.from_address,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    #[instrument(skip(self, email), fields(to = ?email.to, subject = %email.subject, metadata = ?email.metadata))]
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        let message = build_message(&self.from_address, email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::Send(e.to_string()))?;

        info!(to = ?email.to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

/// Build a lettre Message from our Email type.
fn build_message(from_address: &str, email: &Email) -> Result<Message, MailerError> {
    let from = from_address
        .parse()
        .map_err(|e| MailerError::InvalidAddress(format!("From: {}", e)))?;

    let mut builder = Message::builder().from(from).subject(&email.subject);

    if email.to.is_empty() {
        return Err(MailerError::BuildEmail("no recipients".to_string()));
    }

    for to in &email.to {
        let addr = to
            .parse()
            .map_err(|e| MailerError::InvalidAddress(format!("To '{}': {}", to, e)))?;
        builder = builder.to(addr);
    }

    let message = if let Some(html) = &email.html_body {
        // Multipart alternative: text + HTML
        builder.multipart(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(email.body.clone()))
                .singlepart(SinglePart::html(html.clone())),
        )
    } else {
        builder.body(email.body.clone())
    };

    message.map_err(|e| MailerError::BuildEmail(e.to_string()))
}

/// Logs email instead of sending it, keeping a copy of each message.
///
/// Used when no SMTP relay is configured, and in tests.
#[derive(Debug, Default)]
pub struct LogMailer {
    outbox: Mutex<Vec<Email>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every email "sent" so far.
    pub fn sent(&self) -> Vec<Email> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        info!(
            to = ?email.to,
            subject = %email.subject,
            metadata = ?email.metadata,
            "SMTP not configured; logging email instead of sending"
        );

        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(email.clone());
        }
        Ok(())
    }
}
