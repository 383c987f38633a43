//! # warden-shared
//!
//! Domain models shared by every Warden crate: the authenticated principal
//! and its roles/permissions, conversations and messages, id newtypes, and
//! the validation rules enforced before anything reaches the network.

pub mod constants;
pub mod models;
pub mod types;

mod error;

pub use error::ValidationError;
pub use models::*;
pub use types::*;
