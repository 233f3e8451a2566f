//! Input for link creation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use crate::domain::entities::OwnerId;

/// Request to create one short link.
///
/// Field-level limits are checked with `validator`; the URL scheme and the
/// custom key alphabet are checked by the service afterwards.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLink {
    pub owner: OwnerId,

    /// Destination URL (must be HTTP or HTTPS).
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub target_url: String,

    /// Optional custom short key. Never regenerated on collision.
    ///
    /// Surrounding whitespace is ignored and a blank key means none. The
    /// trimmed key's length and alphabet are checked by the service.
    #[validate(length(max = 2048, message = "Custom key is too long"))]
    pub custom_key: Option<String>,

    /// After this instant, resolution returns `Expired`.
    pub expires_at: Option<DateTime<Utc>>,

    /// When true, a QR reference is attached right after creation.
    #[serde(default)]
    pub generate_qr: bool,
}

impl CreateLink {
    pub fn new(owner: impl Into<OwnerId>, target_url: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            target_url: target_url.into(),
            custom_key: None,
            expires_at: None,
            generate_qr: false,
        }
    }

    pub fn with_custom_key(mut self, key: impl Into<String>) -> Self {
        self.custom_key = Some(key.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_qr_code(mut self) -> Self {
        self.generate_qr = true;
        self
    }
}
