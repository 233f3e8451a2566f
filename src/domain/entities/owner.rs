//! Opaque principal reference attached to every link.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the principal that created a link.
///
/// The engine never authenticates principals; it only compares them through
/// [`crate::domain::collaborators::AccessPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Aggregate figures over every link of one owner.
///
/// A link counts as active while it has no expiry or `now` has not passed
/// `expires_at`, the same boundary resolution uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OwnerStats {
    pub total_links: i64,
    pub total_clicks: i64,
    pub active_links: i64,
    pub expired_links: i64,
}
