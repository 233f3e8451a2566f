//! Click event model for asynchronous click recording.

use chrono::{DateTime, Utc};

use crate::domain::entities::{ClickMetadata, NewClick};

/// An in-flight click waiting to be recorded.
///
/// Created by the resolve path after the redirect decision has been made and
/// handed to the click recorder, either directly or through the bounded
/// channel drained by [`crate::domain::click_worker::run_click_worker`].
///
/// `occurred_at` is captured at resolve time, so events keep their true order
/// even when the worker picks them up late.
#[derive(Debug, Clone)]
pub struct ClickEvent {
    pub link_id: i64,
    pub short_key: String,
    pub occurred_at: DateTime<Utc>,
    pub metadata: ClickMetadata,
}

impl ClickEvent {
    pub fn new(
        link_id: i64,
        short_key: impl Into<String>,
        occurred_at: DateTime<Utc>,
        metadata: ClickMetadata,
    ) -> Self {
        Self {
            link_id,
            short_key: short_key.into(),
            occurred_at,
            metadata,
        }
    }
}

impl From<ClickEvent> for NewClick {
    fn from(event: ClickEvent) -> Self {
        NewClick {
            link_id: event.link_id,
            occurred_at: event.occurred_at,
            metadata: event.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_event_into_new_click() {
        let now = Utc::now();
        let event = ClickEvent::new(
            42,
            "abc123",
            now,
            ClickMetadata::new(Some("192.168.1.1"), Some("Mozilla/5.0"), None),
        );

        assert_eq!(event.short_key, "abc123");

        let new_click: NewClick = event.into();
        assert_eq!(new_click.link_id, 42);
        assert_eq!(new_click.occurred_at, now);
        assert_eq!(
            new_click.metadata.client_ip,
            Some("192.168.1.1".to_string())
        );
    }
}
