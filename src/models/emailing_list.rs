//! Emailing list model
//!
//! The subscriber addresses are stored as a JSON array in a text column.
//! An empty column means no subscribers.

use serde::{Deserialize, Serialize};

/// Emailing list entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailingList {
    /// Unique identifier
    pub id: i64,
    /// List name, one of the configured list names
    pub name: String,
    /// Subscriber addresses as stored (JSON array text)
    pub emails: String,
}

impl EmailingList {
    /// Create a new, empty list
    pub fn new(name: String) -> Self {
        Self {
            id: 0, // Will be set by database
            name,
            emails: String::new(),
        }
    }

    /// Decode the stored subscriber addresses, in subscription order
    pub fn emails_list(&self) -> Result<Vec<String>, serde_json::Error> {
        if self.emails.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.emails)
    }

    /// Replace the stored subscriber addresses
    pub fn set_emails_list(&mut self, emails: &[String]) -> Result<(), serde_json::Error> {
        self.emails = serde_json::to_string(emails)?;
        Ok(())
    }
}
