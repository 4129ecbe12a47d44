//! Contact message model
//!
//! Messages are contact-form submissions. They are only ever created and
//! listed newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MESSAGE_NAME_MAX_LEN: usize = 64;
pub const MESSAGE_SUBJECT_MAX_LEN: usize = 128;
pub const MESSAGE_IP_MAX_LEN: usize = 32;

/// Contact message entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique identifier
    pub id: i64,
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Subject line, may be empty
    #[serde(default)]
    pub subject: String,
    /// Message body
    pub message: String,
    /// Submission timestamp
    pub created_at: DateTime<Utc>,
    /// Sender IP address, if known
    #[serde(default)]
    pub ip_address: Option<String>,
}

impl Message {
    pub fn new(name: String, email: String, subject: String, message: String) -> Self {
        Self {
            id: 0, // Will be set by database
            name,
            email,
            subject,
            message,
            created_at: Utc::now(),
            ip_address: None,
        }
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }
}

/// Filter for listing messages. Unset fields don't restrict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageFilter {
    pub email: Option<String>,
    pub ip_address: Option<String>,
}

impl MessageFilter {
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ip_address: None,
        }
    }

    pub fn by_ip(ip_address: impl Into<String>) -> Self {
        Self {
            email: None,
            ip_address: Some(ip_address.into()),
        }
    }
}
