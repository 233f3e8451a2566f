//! Utility functions shared across the engine.
//!
//! - [`key_generator`] - Short key generation and custom key validation
//! - [`url_validator`] - Target URL validation
//! - [`retry`] - Bounded retry for idempotent reads

pub mod key_generator;
pub mod retry;
pub mod url_validator;
