//! Store trait for link records.

use crate::domain::entities::{Link, LinkPatch, NewLink, OwnerId, OwnerStats};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::str::FromStr;

/// Field used to order an owner's links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkSortKey {
    #[default]
    CreatedAt,
    ClickCount,
    TargetUrl,
}

impl LinkSortKey {
    /// Column name in the `links` table.
    pub fn column(&self) -> &'static str {
        match self {
            LinkSortKey::CreatedAt => "created_at",
            LinkSortKey::ClickCount => "click_count",
            LinkSortKey::TargetUrl => "target_url",
        }
    }
}

impl FromStr for LinkSortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(LinkSortKey::CreatedAt),
            "click_count" => Ok(LinkSortKey::ClickCount),
            "target_url" => Ok(LinkSortKey::TargetUrl),
            other => Err(AppError::invalid_format(
                "Unknown sort key",
                json!({ "sort": other, "allowed": ["created_at", "click_count", "target_url"] }),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::invalid_format(
                "Unknown sort direction",
                json!({ "direction": other }),
            )),
        }
    }
}

/// One page of an owner listing.
///
/// Ties on the sort key are broken by `id` in the same direction, so pages
/// never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: LinkSortKey,
    pub direction: SortDirection,
    pub offset: i64,
    pub limit: i64,
}

impl ListQuery {
    pub fn new(sort: LinkSortKey, direction: SortDirection) -> Self {
        Self {
            sort,
            direction,
            offset: 0,
            limit: 50,
        }
    }

    pub fn page(mut self, offset: i64, limit: i64) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::new(LinkSortKey::default(), SortDirection::default())
    }
}

/// Storage interface for links.
///
/// The store is the only shared mutable resource of the engine. It must
/// provide three atomic guarantees regardless of backend:
///
/// - [`LinkStore::insert`] is the sole uniqueness gate for `short_key`
/// - [`LinkStore::increment_click_count`] never loses updates
/// - [`LinkStore::delete`] removes the link and its clicks as one unit
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkStore`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::MemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateKey`] if `short_key` is already stored.
    /// Returns [`AppError::Internal`] or [`AppError::Unavailable`] on storage errors.
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short key.
    async fn get_by_key(&self, short_key: &str) -> Result<Option<Link>, AppError>;

    /// Finds a link by id.
    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Advisory existence check. Never reserves the key.
    async fn key_exists(&self, short_key: &str) -> Result<bool, AppError>;

    /// Atomically increments `click_count` and returns the new value.
    ///
    /// Bumps the counter alone. Resolution goes through
    /// [`ClickStore::append_click`](super::ClickStore::append_click), which
    /// performs the same increment together with the click insert.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this key.
    async fn increment_click_count(
        &self,
        short_key: &str,
        at: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Partially updates a link and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    async fn update(&self, id: i64, patch: LinkPatch, at: DateTime<Utc>)
    -> Result<Link, AppError>;

    /// Deletes a link together with all of its clicks.
    ///
    /// Returns `Ok(false)` if the link did not exist.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Lists one page of an owner's links in the requested order.
    async fn list_by_owner(&self, owner: &OwnerId, query: ListQuery)
    -> Result<Vec<Link>, AppError>;

    /// Counts an owner's links.
    async fn count_by_owner(&self, owner: &OwnerId) -> Result<i64, AppError>;

    /// Link, click, active and expired totals of an owner as of `now`.
    async fn owner_stats(&self, owner: &OwnerId, now: DateTime<Utc>)
    -> Result<OwnerStats, AppError>;
}
