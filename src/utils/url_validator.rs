//! Target URL validation.
//!
//! Target URLs are stored as submitted (minus surrounding whitespace) once
//! they pass validation, so a resolve returns exactly what the creator gave.

use serde_json::json;
use url::Url;

use crate::error::AppError;

/// Maximum length of a target URL.
pub const MAX_URL_LEN: usize = 2048;

/// Errors that can occur during URL validation.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum UrlValidationError {
    #[error("URL cannot be empty")]
    Empty,

    #[error("URL is longer than {MAX_URL_LEN} characters")]
    TooLong,

    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,

    #[error("URL must include a host")]
    MissingHost,
}

impl From<UrlValidationError> for AppError {
    fn from(e: UrlValidationError) -> Self {
        AppError::invalid_format(
            "Please enter a valid URL (including http:// or https://)",
            json!({ "reason": e.to_string() }),
        )
    }
}

/// Validates a target URL and returns its trimmed form.
///
/// # Rules
///
/// 1. Not empty after trimming, at most [`MAX_URL_LEN`] characters
/// 2. Parses as an absolute URL
/// 3. **Protocol**: only HTTP and HTTPS
/// 4. **Host**: must be present
///
/// # Security
///
/// Rejects potentially dangerous protocols like `javascript:`, `data:`, `file:`, etc.
///
/// # Examples
///
/// ```
/// use url_shortener_core::utils::url_validator::validate_target_url;
///
/// assert_eq!(
///     validate_target_url("  https://example.com/a/very/long/path ").unwrap(),
///     "https://example.com/a/very/long/path"
/// );
/// assert!(validate_target_url("javascript:alert(1)").is_err());
/// ```
pub fn validate_target_url(input: &str) -> Result<String, UrlValidationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlValidationError::Empty);
    }
    if trimmed.chars().count() > MAX_URL_LEN {
        return Err(UrlValidationError::TooLong);
    }

    let url =
        Url::parse(trimmed).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(UrlValidationError::UnsupportedProtocol),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(trimmed.to_string())
}
