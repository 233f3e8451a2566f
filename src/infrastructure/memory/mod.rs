//! In-process store implementations.
//!
//! - [`MemoryStore`] - Link and click store behind a single lock, used for
//!   embedding and for tests that need no database

pub mod memory_store;

pub use memory_store::MemoryStore;
