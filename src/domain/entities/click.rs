//! Click entity representing a single resolution of a link.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;

const MAX_REFERRER_LEN: usize = 2048;
const MAX_USER_AGENT_LEN: usize = 1024;

/// A recorded access of a short link.
///
/// Metadata fields are optional: a click is never rejected because the
/// client withheld headers.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Click {
    pub id: i64,
    pub link_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Best-effort client metadata captured at resolve time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickMetadata {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

impl ClickMetadata {
    /// Builds sanitized metadata from raw request values.
    ///
    /// - `client_ip` accepts a forwarded list and keeps the first entry, and
    ///   only if it parses as an IP address
    /// - empty strings become `None`
    /// - referrer and user agent are truncated to their column widths
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let meta = ClickMetadata::new(Some("203.0.113.7, 10.0.0.1"), Some(""), None);
    /// assert_eq!(meta.client_ip.as_deref(), Some("203.0.113.7"));
    /// assert!(meta.user_agent.is_none());
    /// ```
    pub fn new(client_ip: Option<&str>, user_agent: Option<&str>, referrer: Option<&str>) -> Self {
        Self {
            client_ip: client_ip.and_then(parse_client_ip),
            user_agent: non_empty(user_agent).map(|s| truncate(s, MAX_USER_AGENT_LEN)),
            referrer: non_empty(referrer).map(|s| truncate(s, MAX_REFERRER_LEN)),
        }
    }
}

/// Input data for appending a click to the log.
#[derive(Debug, Clone)]
pub struct NewClick {
    pub link_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub metadata: ClickMetadata,
}

impl NewClick {
    pub fn into_click(self, id: i64) -> Click {
        Click {
            id,
            link_id: self.link_id,
            occurred_at: self.occurred_at,
            client_ip: self.metadata.client_ip,
            user_agent: self.metadata.user_agent,
            referrer: self.metadata.referrer,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_client_ip(raw: &str) -> Option<String> {
    let first = raw.split(',').next()?.trim();
    first.parse::<IpAddr>().ok().map(|ip| ip.to_string())
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
