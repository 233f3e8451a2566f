//! PostgreSQL implementation of the click store.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use super::click_counter::{CounterTarget, bump_click_count};
use crate::domain::entities::{Click, NewClick};
use crate::domain::repositories::ClickStore;
use crate::error::AppError;

/// PostgreSQL store for the click log.
///
/// Each append runs in one transaction that first bumps the parent link's
/// counter, which row-locks the link, and then inserts the click. A
/// concurrent delete therefore either sees the click or prevents it.
pub struct PgClickStore {
    pool: Arc<PgPool>,
}

impl PgClickStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClickStore for PgClickStore {
    async fn append_click(&self, new_click: NewClick) -> Result<Click, AppError> {
        let mut tx = self.pool.begin().await?;

        let bumped = bump_click_count(
            &mut *tx,
            CounterTarget::Id(new_click.link_id),
            new_click.occurred_at,
        )
        .await?;

        if bumped.is_none() {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "link_id": new_click.link_id }),
            ));
        }

        let click = sqlx::query_as::<_, Click>(
            r#"
            INSERT INTO link_clicks (link_id, occurred_at, client_ip, user_agent, referrer)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, link_id, occurred_at, client_ip, user_agent, referrer
            "#,
        )
        .bind(new_click.link_id)
        .bind(new_click.occurred_at)
        .bind(new_click.metadata.client_ip)
        .bind(new_click.metadata.user_agent)
        .bind(new_click.metadata.referrer)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(click)
    }

    async fn recent_clicks(&self, link_id: i64, limit: i64) -> Result<Vec<Click>, AppError> {
        let clicks = sqlx::query_as::<_, Click>(
            r#"
            SELECT id, link_id, occurred_at, client_ip, user_agent, referrer
            FROM link_clicks
            WHERE link_id = $1
            ORDER BY occurred_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(link_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(clicks)
    }

    async fn count_clicks(&self, link_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks WHERE link_id = $1")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
