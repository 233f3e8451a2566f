//! Input for link edits.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_with::serde_as;
use validator::Validate;

/// Partial edit of a link's mutable fields.
///
/// The short key and the custom flag are never editable.
///
/// # `expires_at` semantics
///
/// - **Absent** → leave existing value unchanged
/// - **`null`** → clear expiry (link never expires)
/// - **Timestamp** → set new expiry
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EditLink {
    #[validate(length(min = 1, max = 2048, message = "URL must be 1-2048 characters"))]
    pub target_url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl EditLink {
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none() && self.expires_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_expiry_means_unchanged() {
        let edit: EditLink = serde_json::from_str(r#"{"target_url": "https://a.io"}"#).unwrap();
        assert_eq!(edit.expires_at, None);
        assert!(!edit.is_empty());
    }

    #[test]
    fn test_null_expiry_clears() {
        let edit: EditLink = serde_json::from_str(r#"{"expires_at": null}"#).unwrap();
        assert_eq!(edit.expires_at, Some(None));
    }

    #[test]
    fn test_timestamp_expiry_sets() {
        let edit: EditLink =
            serde_json::from_str(r#"{"expires_at": "2030-01-01T00:00:00Z"}"#).unwrap();
        assert!(matches!(edit.expires_at, Some(Some(_))));
    }

    #[test]
    fn test_empty_body_is_empty() {
        let edit: EditLink = serde_json::from_str("{}").unwrap();
        assert!(edit.is_empty());
    }
}
