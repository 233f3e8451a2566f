//! Lazy, restartable iteration over an owner's links.

use std::sync::Arc;

use super::link_store::{LinkSortKey, LinkStore, ListQuery, SortDirection};
use crate::domain::entities::{Link, OwnerId};
use crate::error::AppError;

/// Page-by-page cursor over [`LinkStore::list_by_owner`].
///
/// Nothing is fetched until [`LinkPager::next_page`] is awaited. The pager
/// can be rewound with [`LinkPager::restart`], which re-reads from the store
/// and therefore observes links created or deleted in the meantime.
pub struct LinkPager<L: LinkStore + ?Sized> {
    store: Arc<L>,
    owner: OwnerId,
    sort: LinkSortKey,
    direction: SortDirection,
    page_size: i64,
    offset: i64,
    done: bool,
}

impl<L: LinkStore + ?Sized> LinkPager<L> {
    pub fn new(
        store: Arc<L>,
        owner: OwnerId,
        sort: LinkSortKey,
        direction: SortDirection,
        page_size: i64,
    ) -> Self {
        Self {
            store,
            owner,
            sort,
            direction,
            page_size: page_size.max(1),
            offset: 0,
            done: false,
        }
    }

    /// Fetches the next page, or `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Link>>, AppError> {
        if self.done {
            return Ok(None);
        }

        let query = ListQuery::new(self.sort, self.direction).page(self.offset, self.page_size);
        let page = self.store.list_by_owner(&self.owner, query).await?;

        if (page.len() as i64) < self.page_size {
            self.done = true;
        }
        if page.is_empty() {
            return Ok(None);
        }

        self.offset += page.len() as i64;
        Ok(Some(page))
    }

    /// Rewinds to the first page.
    pub fn restart(&mut self) {
        self.offset = 0;
        self.done = false;
    }

    /// Drains the remaining pages into one vector.
    pub async fn collect_all(&mut self) -> Result<Vec<Link>, AppError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.extend(page);
        }
        Ok(all)
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }
}
