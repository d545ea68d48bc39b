//! Shared identifiers and data model for the bookstore backend.

pub mod models;
pub mod types;

pub use models::{Address, Book, Order, OrderLine, Shipping, User};
pub use types::{BookId, OrderId, OrderLineId, UserId};
