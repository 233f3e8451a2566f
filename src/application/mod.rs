//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating store calls,
//! validation, and business rules. Services consume store traits and expose
//! a transport-agnostic API.
//!
//! # Available Services
//!
//! - [`services::link_service::LinkService`] - Link lifecycle and resolution
//! - [`services::click_recorder::ClickRecorder`] - Click recording and analytics reads
//!
//! Request and response types live in [`dto`].

pub mod dto;
pub mod services;
