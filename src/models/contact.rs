//! Contact form submissions.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Minimum message length, counted in characters after trimming.
pub const MIN_MESSAGE_LEN: usize = 20;

/// A stored contact message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Raw form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    /// Validate the form, returning per-field messages on failure.
    pub fn validate(&self) -> Result<(), BTreeMap<&'static str, &'static str>> {
        let mut errors = BTreeMap::new();

        if self.name.trim().is_empty() {
            errors.insert("name", "Name is required");
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            errors.insert("email", "Please enter a valid email address");
        }
        if self.message.trim().chars().count() < MIN_MESSAGE_LEN {
            errors.insert("message", "Message must be at least 20 characters");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Convert a validated form into a message ready to store.
    pub fn into_message(self) -> ContactMessage {
        ContactMessage {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            subject: self
                .subject
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            message: self.message.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}
