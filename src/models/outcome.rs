//! Business outcomes
//!
//! Expected business failures (permission denial, rate limiting, unknown
//! subscriber) are not errors: they are returned as `Outcome::Rejected`
//! together with a user-facing message. `Err` is left for storage failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an operation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    PermissionDenied,
    RateLimited,
    NotFound,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionKind::PermissionDenied => write!(f, "permission denied"),
            RejectionKind::RateLimited => write!(f, "rate limited"),
            RejectionKind::NotFound => write!(f, "not found"),
        }
    }
}

/// A refused operation and the message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub message: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::PermissionDenied, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::RateLimited, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RejectionKind::NotFound, message)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of a business operation that may be refused
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success { value: T, message: String },
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn success(value: T, message: impl Into<String>) -> Self {
        Outcome::Success {
            value,
            message: message.into(),
        }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Outcome::Rejected(rejection)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The user-facing message, whichever way the operation went
    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message, .. } => message,
            Outcome::Rejected(rejection) => &rejection.message,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success { value, .. } => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Rejected(rejection) => Some(rejection),
        }
    }

    /// Map the success value, keeping the message
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success { value, message } => Outcome::Success {
                value: f(value),
                message,
            },
            Outcome::Rejected(rejection) => Outcome::Rejected(rejection),
        }
    }

    /// Collapse into the `(success, message)` pair
    pub fn into_pair(self) -> (bool, String) {
        match self {
            Outcome::Success { message, .. } => (true, message),
            Outcome::Rejected(rejection) => (false, rejection.message),
        }
    }
}

impl<T> From<Rejection> for Outcome<T> {
    fn from(rejection: Rejection) -> Self {
        Outcome::Rejected(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_pair() {
        let outcome = Outcome::success(42, "done");
        assert!(outcome.is_success());
        assert_eq!(outcome.value(), Some(&42));
        assert_eq!(outcome.message(), "done");
        assert_eq!(outcome.into_pair(), (true, "done".to_string()));
    }

    #[test]
    fn test_rejected_pair() {
        let outcome: Outcome<()> = Rejection::rate_limited("slow down").into();
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.rejection().map(|r| r.kind),
            Some(RejectionKind::RateLimited)
        );
        assert_eq!(outcome.into_pair(), (false, "slow down".to_string()));
    }

    #[test]
    fn test_map_keeps_message() {
        let outcome = Outcome::success(2, "ok").map(|v| v * 10);
        assert_eq!(outcome.into_value(), Some(20));

        let rejected: Outcome<i32> = Rejection::not_found("gone").into();
        let mapped = rejected.map(|v| v + 1);
        assert_eq!(mapped.message(), "gone");
        assert!(mapped.into_value().is_none());
    }

    #[test]
    fn test_rejection_display() {
        let rejection = Rejection::permission_denied("nope");
        assert_eq!(rejection.to_string(), "permission denied: nope");
    }
}
