//! HTTP service for educator AI tools.
//!
//! Every tool request passes the content checks before it reaches the
//! generation model. Blocked requests can be sent to moderators for review,
//! in the app or through signed links in email.

mod auth;
mod config;
mod error;
mod notify;
mod routes;
mod signing;
mod state;
mod tools;

use std::sync::Arc;

use content_safety::{BlockPolicy, ClassifierBank, ContentChecker};
use database::Database;
use mailer::{EmailSender, LogMailer, SmtpConfig, SmtpMailer};
use openai_client::OpenAiClient;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::notify::Notifier;
use crate::signing::LinkSigner;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, moderators = config.moderators.len(), "Starting educator tools server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Hosted models
    let client = Arc::new(OpenAiClient::from_env()?);
    let mut bank = ClassifierBank::new(client.clone(), client.clone());
    if let Some(model) = &config.classifier_model {
        bank = bank.with_classifier_model(model.clone());
    }
    let checker = ContentChecker::new(bank, BlockPolicy::from_env()?);

    // Outbound email
    let mailer: Arc<dyn EmailSender> = match SmtpConfig::from_env()? {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            warn!("SMTP_HOST not set; moderation emails will only be logged");
            Arc::new(LogMailer::new())
        }
    };
    let notifier = Notifier::new(
        mailer,
        LinkSigner::new(config.email_action_secret.clone()),
        config.moderators.clone(),
        config.public_base_url.clone(),
    );

    // Build application state
    let state = AppState::new(db, checker, client, notifier);

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Educator tools server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
