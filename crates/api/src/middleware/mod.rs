//! Request extractors shared by the route handlers.

pub mod auth;
pub mod body;

pub use auth::{AdminUser, AuthUser};
pub use body::{ApiForm, ApiJson};
