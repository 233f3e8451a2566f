//! Business logic services for the application layer.

pub mod click_recorder;
pub mod link_service;

pub use click_recorder::{ClickDispatch, ClickRecorder};
pub use link_service::{LinkService, LinkServiceConfig};
