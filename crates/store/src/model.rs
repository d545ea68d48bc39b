//! Write-side inputs accepted by the persistence gateway.

use chrono::{DateTime, Utc};
use common::{Address, Shipping, User, UserId};

/// A fully assembled order ready to be persisted. Lines are created separately.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub name: String,
    pub email: String,
    pub address: Address,
    pub phone: String,
    pub total_price: f64,
    pub user_id: UserId,
    pub shipping: Shipping,
    pub ordered_at: DateTime<Utc>,
}

/// A catalog entry to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub category: String,
    pub trending: bool,
    pub old_price: f64,
    pub new_price: f64,
    pub cover_image: String,
}

/// Replacement values for an existing catalog entry.
///
/// `cover_image` is left untouched when `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct BookUpdate {
    pub title: String,
    pub description: String,
    pub category: String,
    pub trending: bool,
    pub old_price: f64,
    pub new_price: f64,
    pub cover_image: Option<String>,
}

/// A user to register. The password is already hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// A stored user together with its credential hash.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}
