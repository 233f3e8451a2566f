//! Click recording and dispatch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::click_event::ClickEvent;
use crate::domain::entities::{Click, ClickMetadata, NewClick};
use crate::domain::repositories::ClickStore;
use crate::error::AppError;

/// Records click events against a [`ClickStore`].
///
/// One call to [`ClickRecorder::record`] appends the event and increments the
/// link counter as a single unit. The call is bounded by a timeout; a timed
/// out append is abandoned and its transaction rolled back, so the counter
/// and the log never disagree.
pub struct ClickRecorder<C: ClickStore + ?Sized> {
    store: Arc<C>,
    timeout: Duration,
}

impl<C: ClickStore + ?Sized> ClickRecorder<C> {
    pub fn new(store: Arc<C>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Appends one click and bumps the link's counter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link was deleted meanwhile.
    /// Returns [`AppError::Unavailable`] if the store did not answer in time.
    pub async fn record(
        &self,
        link_id: i64,
        occurred_at: DateTime<Utc>,
        metadata: ClickMetadata,
    ) -> Result<Click, AppError> {
        let new_click = NewClick {
            link_id,
            occurred_at,
            metadata,
        };

        match tokio::time::timeout(self.timeout, self.store.append_click(new_click)).await {
            Ok(Ok(click)) => {
                metrics::counter!("clicks_recorded_total").increment(1);
                Ok(click)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AppError::unavailable(
                "Click recording timed out",
                json!({ "link_id": link_id, "timeout_ms": self.timeout.as_millis() as u64 }),
            )),
        }
    }

    pub async fn record_event(&self, event: ClickEvent) -> Result<Click, AppError> {
        self.record(event.link_id, event.occurred_at, event.metadata)
            .await
    }

    /// Records an event and swallows any failure.
    ///
    /// Returns `true` if the click was stored. Failures are logged and counted
    /// and never retried.
    pub async fn record_best_effort(&self, event: ClickEvent) -> bool {
        let short_key = event.short_key.clone();
        match self.record_event(event).await {
            Ok(click) => {
                debug!("Recorded click {} for {}", click.id, short_key);
                true
            }
            Err(e) => {
                warn!("Dropping click for {}: {}", short_key, e);
                metrics::counter!("clicks_dropped_total", "reason" => e.code()).increment(1);
                false
            }
        }
    }

    /// Latest clicks of a link, newest first.
    pub async fn recent_clicks(&self, link_id: i64, limit: i64) -> Result<Vec<Click>, AppError> {
        self.store.recent_clicks(link_id, limit).await
    }

    pub async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError> {
        self.store.count_clicks(link_id).await
    }
}

/// How the resolve path hands clicks to the recorder.
pub enum ClickDispatch<C: ClickStore + ?Sized> {
    /// Record on the caller's task, bounded by the recorder timeout.
    Inline(Arc<ClickRecorder<C>>),
    /// Enqueue for the background worker; a full queue drops the click.
    Queued(mpsc::Sender<ClickEvent>),
}

impl<C: ClickStore + ?Sized> ClickDispatch<C> {
    /// Dispatches a click. Never fails: analytics must not affect the redirect.
    pub async fn dispatch(&self, event: ClickEvent) {
        match self {
            ClickDispatch::Inline(recorder) => {
                recorder.record_best_effort(event).await;
            }
            ClickDispatch::Queued(tx) => {
                if let Err(e) = tx.try_send(event) {
                    let reason = match e {
                        mpsc::error::TrySendError::Full(_) => "queue_full",
                        mpsc::error::TrySendError::Closed(_) => "queue_closed",
                    };
                    warn!("Dropping click event: {}", reason);
                    metrics::counter!("clicks_dropped_total", "reason" => reason).increment(1);
                }
            }
        }
    }
}
