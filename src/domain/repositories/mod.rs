//! Store trait definitions for the domain layer.
//!
//! These traits abstract data access following the Repository pattern and are
//! implemented in the infrastructure layer.
//!
//! # Architecture
//!
//! - Traits define the contract for data operations
//! - Implementations live in `crate::infrastructure::persistence` (PostgreSQL)
//!   and `crate::infrastructure::memory` (in-process)
//! - Mock implementations are auto-generated via `mockall` for testing
//!
//! # Available Stores
//!
//! - [`LinkStore`] - Link records, uniqueness gate and atomic counter
//! - [`ClickStore`] - Click log with atomic append-and-count
//!
//! [`LinkPager`] turns [`LinkStore::list_by_owner`] into a lazy, restartable
//! sequence.

pub mod click_store;
pub mod link_store;
pub mod pager;

pub use click_store::ClickStore;
pub use link_store::{LinkSortKey, LinkStore, ListQuery, SortDirection};
pub use pager::LinkPager;

#[cfg(test)]
pub use click_store::MockClickStore;
#[cfg(test)]
pub use link_store::MockLinkStore;
