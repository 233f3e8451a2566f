//! Background worker that drains queued click events.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::application::services::ClickRecorder;
use crate::domain::click_event::ClickEvent;
use crate::domain::repositories::ClickStore;

/// Records queued click events until every sender is dropped.
///
/// Each event gets exactly one attempt through
/// [`ClickRecorder::record_best_effort`]; failures are logged and dropped.
/// Returns the number of clicks stored, once the queue is closed and drained.
pub async fn run_click_worker<C>(
    mut rx: mpsc::Receiver<ClickEvent>,
    recorder: Arc<ClickRecorder<C>>,
) -> u64
where
    C: ClickStore + ?Sized,
{
    let mut recorded = 0u64;
    let mut dropped = 0u64;

    while let Some(event) = rx.recv().await {
        if recorder.record_best_effort(event).await {
            recorded += 1;
        } else {
            dropped += 1;
        }
    }

    info!(
        "Click worker stopped: {} recorded, {} dropped",
        recorded, dropped
    );
    recorded
}
