//! Core domain entities representing the engine's data model.
//!
//! # Entity Types
//!
//! - [`Link`] - A short key to target URL mapping
//! - [`Click`] - One recorded resolution of a link
//! - [`OwnerId`] - Opaque reference to the principal owning a link
//! - [`OwnerStats`] - Totals over one owner's links
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with separate structs for creation:
//! - `NewLink`, `NewClick` - For inserting new records
//! - `LinkPatch` - For partial updates

pub mod click;
pub mod link;
pub mod owner;

pub use click::{Click, ClickMetadata, NewClick};
pub use link::{Link, LinkPatch, NewLink};
pub use owner::{OwnerId, OwnerStats};
