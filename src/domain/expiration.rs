//! Link expiration rules.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::domain::entities::Link;
use crate::error::AppError;

/// Shortest relative expiry accepted from callers, in days.
pub const MIN_EXPIRY_DAYS: i64 = 1;
/// Longest relative expiry accepted from callers, in days.
pub const MAX_EXPIRY_DAYS: i64 = 365;

/// Returns true if the link is past its expiry at `now`.
///
/// A link without `expires_at` never expires. A link is still valid at the
/// exact instant of its expiry.
pub fn is_expired(link: &Link, now: DateTime<Utc>) -> bool {
    link.expires_at.is_some_and(|expires_at| now > expires_at)
}

/// Converts a relative expiry in days into an absolute deadline.
///
/// # Errors
///
/// Returns [`AppError::InvalidFormat`] unless `days` is within
/// [`MIN_EXPIRY_DAYS`]..=[`MAX_EXPIRY_DAYS`].
pub fn expiry_from_days(days: i64, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    if !(MIN_EXPIRY_DAYS..=MAX_EXPIRY_DAYS).contains(&days) {
        return Err(AppError::invalid_format(
            "Expiry must be between 1 and 365 days",
            json!({ "days": days }),
        ));
    }
    Ok(now + Duration::days(days))
}
