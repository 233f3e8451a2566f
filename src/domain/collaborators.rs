//! Interfaces to external collaborators.
//!
//! The engine never authenticates principals or renders images. It only asks
//! an [`AccessPolicy`] whether a principal owns a link, and hands a finished
//! short URL to a [`QrCodeGenerator`] that returns an opaque reference.

use async_trait::async_trait;

use crate::domain::entities::{Link, OwnerId};
use crate::error::AppError;

/// Ownership check used by edit, delete and detail operations.
pub trait AccessPolicy: Send + Sync {
    fn is_owner(&self, link: &Link, principal: &OwnerId) -> bool;
}

/// Grants access when the principal is the link's recorded owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerMatch;

impl AccessPolicy for OwnerMatch {
    fn is_owner(&self, link: &Link, principal: &OwnerId) -> bool {
        &link.owner == principal
    }
}

/// Produces a QR artifact for a fully qualified short URL.
///
/// Implementations store the image wherever they like and return an opaque
/// reference (path, object key, URL) that the engine persists verbatim.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QrCodeGenerator: Send + Sync {
    async fn render(&self, short_url: &str) -> Result<String, AppError>;
}

/// Generator used when no QR backend is configured.
///
/// Returns a deterministic reference derived from the short URL, following
/// the `qr_codes/qr_<key>.png` naming the artifact store expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathQrCodeGenerator;

#[async_trait]
impl QrCodeGenerator for PathQrCodeGenerator {
    async fn render(&self, short_url: &str) -> Result<String, AppError> {
        let key = short_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(short_url);
        Ok(format!("qr_codes/qr_{key}.png"))
    }
}
