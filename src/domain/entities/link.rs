//! Link entity representing a short key to target URL mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::OwnerId;

/// A shortened URL with its accounting and lifecycle metadata.
///
/// `short_key` and `is_custom` never change after creation. `click_count`
/// only moves through the store's atomic increment.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Link {
    pub id: i64,
    pub owner: OwnerId,
    pub target_url: String,
    pub short_key: String,
    pub is_custom: bool,
    pub click_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub qr_code_ref: Option<String>,
}

/// Input data for inserting a new link.
///
/// Timestamps come from the service clock so that expiry and ordering stay
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub owner: OwnerId,
    pub target_url: String,
    pub short_key: String,
    pub is_custom: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewLink {
    /// Materializes the stored record once the store has assigned an id.
    pub fn into_link(self, id: i64) -> Link {
        Link {
            id,
            owner: self.owner,
            target_url: self.target_url,
            short_key: self.short_key,
            is_custom: self.is_custom,
            click_count: 0,
            created_at: self.created_at,
            updated_at: self.created_at,
            expires_at: self.expires_at,
            qr_code_ref: None,
        }
    }
}

/// Partial update for an existing link.
///
/// `None` fields are left unchanged.
/// `expires_at: Some(None)` clears the expiry; `Some(Some(t))` sets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub target_url: Option<String>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
    pub qr_code_ref: Option<String>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none() && self.expires_at.is_none() && self.qr_code_ref.is_none()
    }

    /// Applies the patch in place and stamps `updated_at`.
    pub fn apply(self, link: &mut Link, at: DateTime<Utc>) {
        if let Some(url) = self.target_url {
            link.target_url = url;
        }
        if let Some(expires_at) = self.expires_at {
            link.expires_at = expires_at;
        }
        if let Some(qr) = self.qr_code_ref {
            link.qr_code_ref = Some(qr);
        }
        link.updated_at = at;
    }
}
