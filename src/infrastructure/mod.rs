//! Infrastructure layer for external integrations.
//!
//! This layer implements the store traits defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL store implementations
//! - [`memory`] - In-process store implementation

pub mod memory;
pub mod persistence;
