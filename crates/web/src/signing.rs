//! HMAC-SHA256 tokens for one-click moderation links in emails.
//!
//! A token is the lowercase hex HMAC-SHA256 of `{id}:{action}:{moderatorId}`
//! keyed with `EMAIL_ACTION_SECRET`. Links carry no expiry; replaying a link
//! repeats a decision that has already been applied, which is a no-op.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Path of the email-action endpoint.
pub const EMAIL_ACTION_PATH: &str = "/api/moderator/email-action";

/// Signs and verifies email-action links.
#[derive(Clone)]
pub struct LinkSigner {
    secret: SecretString,
}

impl LinkSigner {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    fn mac(&self, id: &str, action: &str, moderator_id: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()).ok()?;
        mac.update(format!("{}:{}:{}", id, action, moderator_id).as_bytes());
        Some(mac)
    }

    /// Hex token for the given link parameters.
    pub fn sign(&self, id: &str, action: &str, moderator_id: &str) -> String {
        self.mac(id, action, moderator_id)
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
            .unwrap_or_default()
    }

    /// Check `token` against the parameters in constant time.
    pub fn verify(&self, id: &str, action: &str, moderator_id: &str, token: &str) -> bool {
        let Ok(expected) = hex::decode(token) else {
            return false;
        };
        let Some(mac) = self.mac(id, action, moderator_id) else {
            return false;
        };
        mac.verify_slice(&expected).is_ok()
    }

    /// Absolute link a moderator can click to apply `action`.
    pub fn action_url(&self, base_url: &str, id: &str, action: &str, moderator_id: &str) -> String {
        format!(
            "{}{}?id={}&action={}&moderatorId={}&token={}",
            base_url.trim_end_matches('/'),
            EMAIL_ACTION_PATH,
            urlencoding::encode(id),
            urlencoding::encode(action),
            urlencoding::encode(moderator_id),
            self.sign(id, action, moderator_id),
        )
    }
}

impl std::fmt::Debug for LinkSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSigner").finish_non_exhaustive()
    }
}
