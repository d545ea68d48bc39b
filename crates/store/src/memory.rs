use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::{Book, BookId, Order, OrderId, OrderLine, OrderLineId, User, UserId};
use tokio::sync::RwLock;

use crate::{
    BookUpdate, NewBook, NewOrder, NewUser, PageQuery, Result, StoreError, UserRecord,
    store::{BookStore, OrderStore, UserStore},
};

#[derive(Debug, Default)]
struct MemoryState {
    orders: BTreeMap<OrderId, NewOrder>,
    lines: Vec<OrderLine>,
    books: BTreeMap<BookId, Book>,
    users: BTreeMap<UserId, UserRecord>,
    next_id: i64,
    fail_on_create_order: bool,
    failing_books: HashSet<BookId>,
    line_latency: Option<Duration>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn assemble(&self, row: &NewOrder, id: OrderId) -> Order {
        let books = self
            .lines
            .iter()
            .filter(|line| line.order_id == id)
            .filter_map(|line| self.books.get(&line.book_id).cloned())
            .collect();

        Order {
            id,
            name: row.name.clone(),
            email: row.email.clone(),
            address: row.address.clone(),
            phone: row.phone.clone(),
            total_price: row.total_price,
            user_id: row.user_id,
            shipping: row.shipping.clone(),
            ordered_at: row.ordered_at,
            books,
            user: self.users.get(&row.user_id).map(|r| r.user.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct LineCounters {
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// In-memory persistence gateway for tests and local runs.
///
/// Enforces the same referential rules as the PostgreSQL schema and offers
/// failure injection for exercising partial-failure paths.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
    counters: Arc<LineCounters>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create_order` call fail.
    pub async fn set_fail_on_create_order(&self, fail: bool) {
        self.state.write().await.fail_on_create_order = fail;
    }

    /// Makes every `create_order_line` call for `book_id` fail.
    pub async fn fail_lines_for_book(&self, book_id: BookId) {
        self.state.write().await.failing_books.insert(book_id);
    }

    /// Clears all injected line failures.
    pub async fn clear_line_failures(&self) {
        self.state.write().await.failing_books.clear();
    }

    /// Delays each line write, so concurrent writes overlap.
    pub async fn set_line_latency(&self, latency: Option<Duration>) {
        self.state.write().await.line_latency = latency;
    }

    /// Returns the total number of order lines stored.
    pub async fn line_count(&self) -> usize {
        self.state.read().await.lines.len()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns how many `create_order_line` calls were made, successful or not.
    pub fn line_attempts(&self) -> usize {
        self.counters.attempts.load(Ordering::SeqCst)
    }

    /// Returns the highest number of line writes observed in flight at once.
    pub fn max_concurrent_line_writes(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    async fn write_line(&self, order_id: OrderId, book_id: BookId) -> Result<OrderLineId> {
        let latency = self.state.read().await.line_latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.write().await;

        if state.failing_books.contains(&book_id) {
            return Err(StoreError::Unavailable(format!(
                "injected failure for book {book_id}"
            )));
        }
        if !state.orders.contains_key(&order_id) {
            return Err(StoreError::MissingReference {
                entity: "order",
                id: order_id.as_i64(),
            });
        }
        if !state.books.contains_key(&book_id) {
            return Err(StoreError::MissingReference {
                entity: "book",
                id: book_id.as_i64(),
            });
        }

        let id = OrderLineId::new(state.next_id());
        state.lines.push(OrderLine {
            id,
            order_id,
            book_id,
        });
        Ok(id)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderId> {
        let mut state = self.state.write().await;

        if state.fail_on_create_order {
            return Err(StoreError::Unavailable(
                "injected failure for create_order".to_string(),
            ));
        }
        if !state.users.contains_key(&order.user_id) {
            return Err(StoreError::MissingReference {
                entity: "user",
                id: order.user_id.as_i64(),
            });
        }

        let id = OrderId::new(state.next_id());
        state.orders.insert(id, order);
        Ok(id)
    }

    async fn create_order_line(&self, order_id: OrderId, book_id: BookId) -> Result<OrderLineId> {
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);
        let now = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.write_line(order_id, book_id).await;

        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn get_order_by_id(&self, id: OrderId) -> Result<Order> {
        let state = self.state.read().await;
        state
            .orders
            .get(&id)
            .map(|row| state.assemble(row, id))
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: id.as_i64(),
            })
    }

    async fn list_orders(&self, query: PageQuery) -> Result<(Vec<Order>, u64)> {
        let state = self.state.read().await;
        let orders = state
            .orders
            .iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .map(|(id, row)| state.assemble(row, *id))
            .collect();
        Ok((orders, state.orders.len() as u64))
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|(_, row)| row.user_id == user_id)
            .map(|(id, row)| state.assemble(row, *id))
            .collect())
    }

    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let state = self.state.read().await;
        Ok(state
            .lines
            .iter()
            .filter(|line| line.order_id == order_id)
            .copied()
            .collect())
    }
}

#[async_trait]
impl BookStore for InMemoryStore {
    async fn create_book(&self, book: NewBook) -> Result<Book> {
        let mut state = self.state.write().await;
        let id = BookId::new(state.next_id());
        let stored = Book {
            id,
            title: book.title,
            description: book.description,
            category: book.category,
            trending: book.trending,
            old_price: book.old_price,
            new_price: book.new_price,
            cover_image: book.cover_image,
            created_at: Utc::now(),
        };
        state.books.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_book(&self, id: BookId) -> Result<Book> {
        self.state
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "book",
                id: id.as_i64(),
            })
    }

    async fn list_books(&self, query: PageQuery) -> Result<(Vec<Book>, u64)> {
        let state = self.state.read().await;
        let books = state
            .books
            .values()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .cloned()
            .collect();
        Ok((books, state.books.len() as u64))
    }

    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<Book> {
        let mut state = self.state.write().await;
        let book = state.books.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "book",
            id: id.as_i64(),
        })?;

        book.title = update.title;
        book.description = update.description;
        book.category = update.category;
        book.trending = update.trending;
        book.old_price = update.old_price;
        book.new_price = update.new_price;
        if let Some(cover_image) = update.cover_image {
            book.cover_image = cover_image;
        }
        Ok(book.clone())
    }

    async fn delete_book(&self, id: BookId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.lines.iter().any(|line| line.book_id == id) {
            return Err(StoreError::InUse {
                entity: "book",
                id: id.as_i64(),
            });
        }
        state
            .books
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                entity: "book",
                id: id.as_i64(),
            })
    }

    async fn list_trending_books(&self, query: PageQuery) -> Result<(Vec<Book>, u64)> {
        let state = self.state.read().await;
        let trending: Vec<&Book> = state.books.values().filter(|b| b.trending).collect();
        let total = trending.len() as u64;
        let page = trending
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit() as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn list_recommended_books(&self, excluding: &[BookId]) -> Result<Vec<Book>> {
        let state = self.state.read().await;
        Ok(state
            .books
            .values()
            .filter(|b| !b.trending && !excluding.contains(&b.id))
            .cloned()
            .collect())
    }

    async fn count_books(&self) -> Result<u64> {
        Ok(self.state.read().await.books.len() as u64)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|r| r.user.email == user.email) {
            return Err(StoreError::Duplicate {
                entity: "user",
                key: user.email,
            });
        }

        let id = UserId::new(state.next_id());
        let stored = User {
            id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        };
        state.users.insert(
            id,
            UserRecord {
                user: stored.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(stored)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|r| r.user.email == email)
            .cloned())
    }
}
