//! Data model shared by the persistence gateway, the domain layer and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BookId, OrderId, OrderLineId, UserId};

/// Shipping destination, embedded in an order by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    #[serde(default)]
    pub province: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zipcode: String,
}

/// Courier selection made at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipping {
    pub shipping_type: String,
    pub shipping_service: String,
    pub shipping_cost: i64,
}

/// A catalog entry. Read-only from the order workflow's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub trending: bool,
    pub old_price: f64,
    pub new_price: f64,
    pub cover_image: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// A checkout, with its purchased books and owner eagerly attached.
///
/// `books` holds one entry per order line, so a book bought twice appears twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub email: String,
    pub address: Address,
    pub phone: String,
    pub total_price: f64,
    pub user_id: UserId,
    pub shipping: Shipping,
    pub ordered_at: DateTime<Utc>,
    pub books: Vec<Book>,
    pub user: Option<User>,
}

/// Association record: one purchased copy of one book within one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub book_id: BookId,
}
