use async_trait::async_trait;
use common::{Book, BookId, Order, OrderId, OrderLine, OrderLineId, User, UserId};

use crate::{BookUpdate, NewBook, NewOrder, NewUser, PageQuery, Result, UserRecord};

/// Persistence of orders and their line items.
///
/// All implementations must be thread-safe (Send + Sync): line items for one
/// order are written from many tasks at once.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists the parent order row and returns its identifier.
    async fn create_order(&self, order: NewOrder) -> Result<OrderId>;

    /// Persists one order line.
    ///
    /// Fails with `MissingReference` when either the order or the book does not
    /// exist. Several lines may reference the same book in the same order.
    async fn create_order_line(&self, order_id: OrderId, book_id: BookId) -> Result<OrderLineId>;

    /// Loads one order with its books and owner attached.
    ///
    /// Fails with `NotFound` when no row matches.
    async fn get_order_by_id(&self, id: OrderId) -> Result<Order>;

    /// Loads one page of orders (ordered by id) and the total order count.
    async fn list_orders(&self, query: PageQuery) -> Result<(Vec<Order>, u64)>;

    /// Loads every order owned by a user, ordered by id. Empty when none.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Loads the raw line records of an order, ordered by line id.
    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>>;
}

/// Persistence of the book catalog.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Inserts a book and returns the stored row.
    async fn create_book(&self, book: NewBook) -> Result<Book>;

    /// Loads one book. Fails with `NotFound` when no row matches.
    async fn get_book(&self, id: BookId) -> Result<Book>;

    /// Loads one page of books (ordered by id) and the total book count.
    async fn list_books(&self, query: PageQuery) -> Result<(Vec<Book>, u64)>;

    /// Replaces a book's fields and returns the stored row.
    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<Book>;

    /// Removes a book. Fails with `InUse` while order lines reference it.
    async fn delete_book(&self, id: BookId) -> Result<()>;

    /// Loads one page of trending books and the total trending count.
    async fn list_trending_books(&self, query: PageQuery) -> Result<(Vec<Book>, u64)>;

    /// Loads every non-trending book whose id is not in `excluding`.
    async fn list_recommended_books(&self, excluding: &[BookId]) -> Result<Vec<Book>>;

    /// Counts every book in the catalog.
    async fn count_books(&self) -> Result<u64>;
}

/// Persistence of registered users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `Duplicate` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Loads a user by id.
    async fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Loads a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
}

/// The full persistence gateway consumed by the services.
pub trait Store: OrderStore + BookStore + UserStore + Clone + 'static {}

// Blanket implementation for every type providing all three gateways
impl<T> Store for T where T: OrderStore + BookStore + UserStore + Clone + 'static {}
