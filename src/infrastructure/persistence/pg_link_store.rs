//! PostgreSQL implementation of the link store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use super::click_counter::{CounterTarget, bump_click_count};
use crate::domain::entities::{Link, LinkPatch, NewLink, OwnerId, OwnerStats};
use crate::domain::repositories::{LinkStore, ListQuery};
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, owner, target_url, short_key, is_custom, click_count, \
                            created_at, updated_at, expires_at, qr_code_ref";

/// PostgreSQL store for links.
///
/// Key uniqueness is enforced by the `links_short_key_key` constraint, so a
/// racing insert surfaces as [`AppError::DuplicateKey`] rather than a second
/// row. Counter increments are single `UPDATE ... SET click_count =
/// click_count + 1` statements and never lose updates.
pub struct PgLinkStore {
    pool: Arc<PgPool>,
}

impl PgLinkStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkStore for PgLinkStore {
    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            INSERT INTO links (owner, target_url, short_key, is_custom, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $5, $6)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(&new_link.owner)
            .bind(&new_link.target_url)
            .bind(&new_link.short_key)
            .bind(new_link.is_custom)
            .bind(new_link.created_at)
            .bind(new_link.expires_at)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn get_by_key(&self, short_key: &str) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE short_key = $1");

        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(short_key)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM links WHERE id = $1");

        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(link)
    }

    async fn key_exists(&self, short_key: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM links WHERE short_key = $1)")
                .bind(short_key)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(exists)
    }

    async fn increment_click_count(
        &self,
        short_key: &str,
        at: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count =
            bump_click_count(self.pool.as_ref(), CounterTarget::Key(short_key), at).await?;

        count.ok_or_else(|| {
            AppError::not_found("Short link not found", json!({ "key": short_key }))
        })
    }

    async fn update(&self, id: i64, patch: LinkPatch, at: DateTime<Utc>) -> Result<Link, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET target_url  = COALESCE($2, target_url),
                expires_at  = CASE WHEN $3 THEN $4 ELSE expires_at END,
                qr_code_ref = COALESCE($5, qr_code_ref),
                updated_at  = $6
            WHERE id = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let link = sqlx::query_as::<_, Link>(&sql)
            .bind(id)
            .bind(patch.target_url)
            .bind(patch.expires_at.is_some())
            .bind(patch.expires_at.flatten())
            .bind(patch.qr_code_ref)
            .bind(at)
            .fetch_optional(self.pool.as_ref())
            .await?;

        link.ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": id })))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM link_clicks WHERE link_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM links WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner: &OwnerId, query: ListQuery) -> Result<Vec<Link>, AppError> {
        // Both fragments come from enums, never from caller input.
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS}
            FROM links
            WHERE owner = $1
            ORDER BY {column} {direction}, id {direction}
            LIMIT $2 OFFSET $3
            "#,
            column = query.sort.column(),
            direction = query.direction.sql(),
        );

        let links = sqlx::query_as::<_, Link>(&sql)
            .bind(owner)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(links)
    }

    async fn count_by_owner(&self, owner: &OwnerId) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE owner = $1")
            .bind(owner)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn owner_stats(
        &self,
        owner: &OwnerId,
        now: DateTime<Utc>,
    ) -> Result<OwnerStats, AppError> {
        let stats = sqlx::query_as::<_, OwnerStats>(
            r#"
            SELECT COUNT(*) AS total_links,
                   COALESCE(SUM(click_count), 0)::BIGINT AS total_clicks,
                   COUNT(*) FILTER (WHERE expires_at IS NULL OR expires_at >= $2) AS active_links,
                   COUNT(*) FILTER (WHERE expires_at < $2) AS expired_links
            FROM links
            WHERE owner = $1
            "#,
        )
        .bind(owner)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(stats)
    }
}
