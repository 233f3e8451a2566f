//! Input and output types of the link service.

pub mod create_link;
pub mod edit_link;
pub mod views;

pub use create_link::CreateLink;
pub use edit_link::EditLink;
pub use views::{KeyAvailability, LinkDetail};
