use std::collections::BTreeMap;

/// An email message to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Email {
    /// Primary recipients
    pub to: Vec<String>,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Optional HTML body
    pub html_body: Option<String>,
    /// Correlation data for logs (e.g. `metrics_id`, `kind`); never sent
    pub metadata: BTreeMap<String, String>,
}

impl Email {
    /// Create a new email with a single recipient.
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    /// Set the HTML body (creates multipart alternative with text fallback).
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = Some(html.into());
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
