//! Read models returned by the link service.

use serde::Serialize;

use crate::domain::entities::{Click, Link};

/// Answer to a live custom-key availability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyAvailability {
    pub available: bool,
    pub message: String,
}

impl KeyAvailability {
    pub fn available() -> Self {
        Self {
            available: true,
            message: "Available!".to_string(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
        }
    }
}

/// A link with its short URL and latest clicks, as shown to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct LinkDetail {
    pub link: Link,
    pub short_url: String,
    pub recent_clicks: Vec<Click>,
    pub is_expired: bool,
}
