//! PostgreSQL store implementations.
//!
//! Concrete implementations of the domain store traits using SQLx runtime
//! queries with bound parameters.
//!
//! # Stores
//!
//! - [`PgLinkStore`] - Link storage, key uniqueness and counters
//! - [`PgClickStore`] - Click log appends and reads

mod click_counter;
pub mod pg_click_store;
pub mod pg_link_store;

pub use pg_click_store::PgClickStore;
pub use pg_link_store::PgLinkStore;
