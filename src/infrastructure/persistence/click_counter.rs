//! Click counter increment shared by the link and click stores.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Postgres};

use crate::error::AppError;

/// Row whose counter is bumped.
#[derive(Debug, Clone, Copy)]
pub(crate) enum CounterTarget<'a> {
    Id(i64),
    Key(&'a str),
}

impl CounterTarget<'_> {
    fn column(&self) -> &'static str {
        match self {
            CounterTarget::Id(_) => "id",
            CounterTarget::Key(_) => "short_key",
        }
    }
}

/// Adds one to `click_count`, refreshes `updated_at` and returns the new
/// count, or `None` if no link matches.
///
/// A single `UPDATE` statement, so concurrent bumps never lose an update.
/// Inside a transaction it also holds the link's row lock until commit.
pub(crate) async fn bump_click_count<'e, E>(
    executor: E,
    target: CounterTarget<'_>,
    at: DateTime<Utc>,
) -> Result<Option<i64>, AppError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        UPDATE links
        SET click_count = click_count + 1, updated_at = $2
        WHERE {} = $1
        RETURNING click_count
        "#,
        target.column()
    );

    let query = sqlx::query_scalar::<Postgres, i64>(&sql);
    let query = match target {
        CounterTarget::Id(id) => query.bind(id),
        CounterTarget::Key(key) => query.bind(key),
    };

    let count = query.bind(at).fetch_optional(executor).await?;
    Ok(count)
}
