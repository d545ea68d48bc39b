//! Domain layer for the bookstore backend.
//!
//! This crate provides:
//! - Order creation with a bounded, concurrent line-item fan-out
//! - Order queries and pagination
//! - The book catalog service
//! - Registration, login and JWT authentication

pub mod auth;
pub mod catalog;
pub mod error;
pub mod order;
pub mod pagination;

pub use auth::{AuthService, Claims, JwtConfig, Principal, Registration, TokenPair, TokenType};
pub use catalog::{BookInput, BookService, HomeBooks};
pub use error::{DomainError, Result};
pub use order::{
    CreateOrderPayload, FanOutReport, LineItemFailure, LineItemFanOut, OrderDraft, OrderService,
    PartialFailure,
};
pub use pagination::{Page, PageRequest, Pagination};
