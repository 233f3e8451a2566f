//! Domain layer containing entities, store contracts and pure rules.
//!
//! Nothing in this layer knows about PostgreSQL or any transport.
//!
//! # Architecture
//!
//! - [`entities`] - Core data structures
//! - [`repositories`] - Store trait definitions
//! - [`expiration`] - Link validity rules
//! - [`clock`] - Injectable time source
//! - [`collaborators`] - Identity and QR interfaces
//! - [`click_event`] - In-flight click model
//! - [`click_worker`] - Asynchronous click processing worker
//!
//! # Click Processing Flow
//!
//! 1. [`crate::application::services::LinkService::resolve`] decides the redirect
//! 2. A [`click_event::ClickEvent`] is recorded inline or sent to a bounded channel
//! 3. [`click_worker::run_click_worker`] records queued events, one attempt each
//! 4. The click and the counter increment are persisted via [`repositories::ClickStore`]

pub mod click_event;
pub mod click_worker;
pub mod clock;
pub mod collaborators;
pub mod entities;
pub mod expiration;
pub mod repositories;
