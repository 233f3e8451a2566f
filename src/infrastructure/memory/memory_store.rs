//! In-memory implementation of the link and click stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::json;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::entities::{Click, Link, LinkPatch, NewClick, NewLink, OwnerId, OwnerStats};
use crate::domain::expiration::is_expired;
use crate::domain::repositories::{ClickStore, LinkSortKey, LinkStore, ListQuery, SortDirection};
use crate::error::{AppError, SHORT_KEY_CONSTRAINT};

#[derive(Default)]
struct Tables {
    links: HashMap<i64, Link>,
    keys: HashMap<String, i64>,
    clicks: HashMap<i64, Vec<Click>>,
    next_link_id: i64,
    next_click_id: i64,
}

/// Link and click store held in process memory.
///
/// Every mutating operation runs under one write lock, which gives the same
/// guarantees as the PostgreSQL stores: a key is inserted at most once, a
/// counter increment never loses an update, a click is appended together
/// with its counter bump, and a delete removes the link and its clicks in a
/// single step.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.tables.read().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn bump_click_count(link: &mut Link, at: DateTime<Utc>) -> i64 {
    link.click_count += 1;
    link.updated_at = at;
    link.click_count
}

fn compare(a: &Link, b: &Link, sort: LinkSortKey) -> Ordering {
    let primary = match sort {
        LinkSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        LinkSortKey::ClickCount => a.click_count.cmp(&b.click_count),
        LinkSortKey::TargetUrl => a.target_url.cmp(&b.target_url),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut tables = self.tables.write();

        if tables.keys.contains_key(&new_link.short_key) {
            return Err(AppError::duplicate_key(
                "Short key already exists",
                json!({ "key": new_link.short_key, "constraint": SHORT_KEY_CONSTRAINT }),
            ));
        }

        tables.next_link_id += 1;
        let link = new_link.into_link(tables.next_link_id);
        tables.keys.insert(link.short_key.clone(), link.id);
        tables.links.insert(link.id, link.clone());

        Ok(link)
    }

    async fn get_by_key(&self, short_key: &str) -> Result<Option<Link>, AppError> {
        let tables = self.tables.read();
        Ok(tables
            .keys
            .get(short_key)
            .and_then(|id| tables.links.get(id))
            .cloned())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        Ok(self.tables.read().links.get(&id).cloned())
    }

    async fn key_exists(&self, short_key: &str) -> Result<bool, AppError> {
        Ok(self.tables.read().keys.contains_key(short_key))
    }

    async fn increment_click_count(
        &self,
        short_key: &str,
        at: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let mut tables = self.tables.write();
        let not_found = || AppError::not_found("Short link not found", json!({ "key": short_key }));

        let id = tables.keys.get(short_key).copied().ok_or_else(not_found)?;
        let link = tables.links.get_mut(&id).ok_or_else(not_found)?;

        Ok(bump_click_count(link, at))
    }

    async fn update(&self, id: i64, patch: LinkPatch, at: DateTime<Utc>) -> Result<Link, AppError> {
        let mut tables = self.tables.write();
        let link = tables
            .links
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": id })))?;

        patch.apply(link, at);
        Ok(link.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write();

        let Some(link) = tables.links.remove(&id) else {
            return Ok(false);
        };
        tables.keys.remove(&link.short_key);
        tables.clicks.remove(&id);

        Ok(true)
    }

    async fn list_by_owner(&self, owner: &OwnerId, query: ListQuery) -> Result<Vec<Link>, AppError> {
        let tables = self.tables.read();

        let mut links: Vec<&Link> = tables
            .links
            .values()
            .filter(|link| &link.owner == owner)
            .collect();

        links.sort_by(|a, b| match query.direction {
            SortDirection::Asc => compare(a, b, query.sort),
            SortDirection::Desc => compare(b, a, query.sort),
        });

        Ok(links
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_by_owner(&self, owner: &OwnerId) -> Result<i64, AppError> {
        let tables = self.tables.read();
        Ok(tables.links.values().filter(|l| &l.owner == owner).count() as i64)
    }

    async fn owner_stats(
        &self,
        owner: &OwnerId,
        now: DateTime<Utc>,
    ) -> Result<OwnerStats, AppError> {
        let tables = self.tables.read();

        let stats = tables
            .links
            .values()
            .filter(|link| &link.owner == owner)
            .fold(OwnerStats::default(), |mut stats, link| {
                stats.total_links += 1;
                stats.total_clicks += link.click_count;
                if is_expired(link, now) {
                    stats.expired_links += 1;
                } else {
                    stats.active_links += 1;
                }
                stats
            });

        Ok(stats)
    }
}

#[async_trait]
impl ClickStore for MemoryStore {
    async fn append_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut tables = self.tables.write();
        let link_id = new_click.link_id;

        let link = tables
            .links
            .get_mut(&link_id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link_id })))?;
        bump_click_count(link, new_click.occurred_at);

        tables.next_click_id += 1;
        let click = new_click.into_click(tables.next_click_id);
        tables.clicks.entry(link_id).or_default().push(click.clone());

        Ok(click)
    }

    async fn recent_clicks(&self, link_id: i64, limit: i64) -> Result<Vec<Click>, AppError> {
        let tables = self.tables.read();
        let mut clicks: Vec<Click> = tables.clicks.get(&link_id).cloned().unwrap_or_default();

        clicks.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        clicks.truncate(limit.max(0) as usize);

        Ok(clicks)
    }

    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError> {
        let tables = self.tables.read();
        Ok(tables.clicks.get(&link_id).map_or(0, Vec::len) as i64)
    }
}
