//! Moderation emails.
//!
//! Delivery is best effort: a failed send is logged and never fails the
//! request that triggered it.

use std::sync::Arc;

use askama::Template;
use database::MetricsRecord;
use mailer::{Email, EmailSender};
use safety_core::ModerationStatus;
use tracing::{info, warn};

use crate::config::ModeratorContact;
use crate::signing::LinkSigner;

/// Review request sent to each moderator.
#[derive(Template)]
#[template(path = "email/review_request.html")]
struct ReviewRequestEmail<'a> {
    metrics_id: &'a str,
    tool: &'a str,
    flags: Vec<&'static str>,
    approve_url: String,
    decline_url: String,
}

/// Outcome sent to the content owner.
#[derive(Template)]
#[template(path = "email/decision.html")]
struct DecisionEmail<'a> {
    tool: &'a str,
    approved: bool,
    notes: Option<&'a str>,
}

/// Sends moderation emails.
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn EmailSender>,
    signer: LinkSigner,
    moderators: Arc<Vec<ModeratorContact>>,
    public_base_url: String,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn EmailSender>,
        signer: LinkSigner,
        moderators: Vec<ModeratorContact>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            signer,
            moderators: Arc::new(moderators),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn signer(&self) -> &LinkSigner {
        &self.signer
    }

    /// Email every moderator signed approve and decline links for `record`.
    pub async fn review_requested(&self, record: &MetricsRecord) {
        if self.moderators.is_empty() {
            warn!(metrics_id = %record.id, "Review requested but no moderators are configured");
            return;
        }

        let flags: Vec<&'static str> = record
            .content_flags
            .raised()
            .into_iter()
            .map(|flag| flag.label())
            .collect();

        for moderator in self.moderators.iter().filter(|m| m.id != record.user_id) {
            let link = |action: &str| {
                self.signer
                    .action_url(&self.public_base_url, &record.id, action, &moderator.id)
            };
            let template = ReviewRequestEmail {
                metrics_id: &record.id,
                tool: &record.prompt_type,
                flags: flags.clone(),
                approve_url: link(ModerationStatus::Approved.as_str()),
                decline_url: link(ModerationStatus::Declined.as_str()),
            };

            let body = format!(
                "Flagged {} content is awaiting review.\n\nApprove: {}\nDecline: {}\n",
                record.prompt_type, template.approve_url, template.decline_url
            );
            let email = Email::new(
                moderator.email.clone(),
                format!("Review requested: {} content", record.prompt_type),
                body,
            )
            .with_metadata("kind", "review_request")
            .with_metadata("metrics_id", record.id.clone())
            .with_metadata("moderator_id", moderator.id.clone());

            self.deliver(email, template.render()).await;
        }
    }

    /// Tell the owner of `record` about the moderator's decision.
    pub async fn decision_made(&self, record: &MetricsRecord) {
        let Some(owner_email) = record.owner_email.as_deref() else {
            info!(metrics_id = %record.id, "No owner email on record; skipping decision email");
            return;
        };

        let approved = record.moderator_approval == ModerationStatus::Approved;
        let template = DecisionEmail {
            tool: &record.prompt_type,
            approved,
            notes: record.moderator_notes.as_deref(),
        };

        let verdict = if approved { "approved" } else { "declined" };
        let mut body = format!("Your {} request was {} by a moderator.\n", record.prompt_type, verdict);
        if let Some(notes) = &record.moderator_notes {
            body.push_str(&format!("\nNotes: {}\n", notes));
        }

        let email = Email::new(
            owner_email,
            format!("Your {} request was {}", record.prompt_type, verdict),
            body,
        )
        .with_metadata("kind", "decision")
        .with_metadata("metrics_id", record.id.clone());

        self.deliver(email, template.render()).await;
    }

    async fn deliver(&self, email: Email, html: Result<String, askama::Error>) {
        let email = match html {
            Ok(html) => email.with_html(html),
            Err(e) => {
                warn!(error = %e, "Failed to render email template; sending plain text");
                email
            }
        };

        if let Err(e) = self.mailer.send(&email).await {
            warn!(error = %e, to = ?email.to, metadata = ?email.metadata, "Failed to send moderation email");
        }
    }
}
