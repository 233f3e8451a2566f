//! Store trait for the click log.

use crate::domain::entities::{Click, NewClick};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage interface for click events.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickStore`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickStore: Send + Sync {
    /// Appends a click and increments the link's `click_count`.
    ///
    /// Both effects happen in one transaction: either the event is logged and
    /// the counter moves, or neither happens.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link no longer exists.
    /// Returns [`AppError::Internal`] or [`AppError::Unavailable`] on storage errors.
    async fn append_click(&self, new_click: NewClick) -> Result<Click, AppError>;

    /// Most recent clicks of a link, newest `occurred_at` first.
    async fn recent_clicks(&self, link_id: i64, limit: i64) -> Result<Vec<Click>, AppError>;

    /// Number of logged clicks for a link.
    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError>;
}
