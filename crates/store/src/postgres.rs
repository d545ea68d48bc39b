use std::collections::HashMap;

use async_trait::async_trait;
use common::{Address, Book, BookId, Order, OrderId, OrderLine, OrderLineId, Shipping, User, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    BookUpdate, NewBook, NewOrder, NewUser, PageQuery, Result, StoreError, UserRecord,
    store::{BookStore, OrderStore, UserStore},
};

const ORDER_COLUMNS: &str = "id, name, email, city, province, state, zipcode, phone, total_price, \
     user_id, shipping_type, shipping_service, shipping_cost, ordered_at";

const BOOK_COLUMNS: &str =
    "id, title, description, category, trending, old_price, new_price, cover_image, created_at";

/// PostgreSQL-backed persistence gateway.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_book(row: &PgRow) -> Result<Book> {
        Ok(Book {
            id: BookId::new(row.try_get("id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            trending: row.try_get("trending")?,
            old_price: row.try_get("old_price")?,
            new_price: row.try_get("new_price")?,
            cover_image: row.try_get("cover_image")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            is_admin: row.try_get("is_admin")?,
        })
    }

    fn row_to_user_record(row: &PgRow) -> Result<UserRecord> {
        Ok(UserRecord {
            user: Self::row_to_user(row)?,
            password_hash: row.try_get("password_hash")?,
        })
    }

    /// Attaches books and owners to a batch of order rows with two queries,
    /// whatever the batch size.
    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let user_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("user_id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let book_rows = sqlx::query(
            r#"
            SELECT ol.order_id, b.id, b.title, b.description, b.category, b.trending,
                   b.old_price, b.new_price, b.cover_image, b.created_at
            FROM order_lines ol
            JOIN books b ON b.id = ol.book_id
            WHERE ol.order_id = ANY($1)
            ORDER BY ol.id ASC
            "#,
        )
        .bind(order_ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut books_by_order: HashMap<i64, Vec<Book>> = HashMap::new();
        for row in &book_rows {
            let order_id: i64 = row.try_get("order_id")?;
            books_by_order
                .entry(order_id)
                .or_default()
                .push(Self::row_to_book(row)?);
        }

        let user_rows = sqlx::query("SELECT id, name, email, is_admin FROM users WHERE id = ANY($1)")
            .bind(user_ids.as_slice())
            .fetch_all(&self.pool)
            .await?;
        let users = user_rows
            .iter()
            .map(|row| Self::row_to_user(row).map(|u| (u.id, u)))
            .collect::<Result<HashMap<_, _>>>()?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                let user_id = UserId::new(row.try_get("user_id")?);
                Ok(Order {
                    id: OrderId::new(id),
                    name: row.try_get("name")?,
                    email: row.try_get("email")?,
                    address: Address {
                        city: row.try_get("city")?,
                        province: row.try_get("province")?,
                        state: row.try_get("state")?,
                        zipcode: row.try_get("zipcode")?,
                    },
                    phone: row.try_get("phone")?,
                    total_price: row.try_get("total_price")?,
                    user_id,
                    shipping: Shipping {
                        shipping_type: row.try_get("shipping_type")?,
                        shipping_service: row.try_get("shipping_service")?,
                        shipping_cost: row.try_get("shipping_cost")?,
                    },
                    ordered_at: row.try_get("ordered_at")?,
                    books: books_by_order.remove(&id).unwrap_or_default(),
                    user: users.get(&user_id).cloned(),
                })
            })
            .collect()
    }
}

/// Translates constraint violations into gateway errors.
fn map_constraint(err: sqlx::Error, order_id: i64, book_id: i64) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.constraint() {
            Some("order_lines_order_id_fkey") => {
                return StoreError::MissingReference {
                    entity: "order",
                    id: order_id,
                };
            }
            Some("order_lines_book_id_fkey") => {
                return StoreError::MissingReference {
                    entity: "book",
                    id: book_id,
                };
            }
            _ => {}
        }
    }
    StoreError::Database(err)
}

fn count(total: i64) -> u64 {
    u64::try_from(total).unwrap_or(0)
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderId> {
        let user_id = order.user_id.as_i64();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (name, email, city, province, state, zipcode, phone, total_price,
                                user_id, shipping_type, shipping_service, shipping_cost, ordered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&order.name)
        .bind(&order.email)
        .bind(&order.address.city)
        .bind(&order.address.province)
        .bind(&order.address.state)
        .bind(&order.address.zipcode)
        .bind(&order.phone)
        .bind(order.total_price)
        .bind(user_id)
        .bind(&order.shipping.shipping_type)
        .bind(&order.shipping.shipping_service)
        .bind(order.shipping.shipping_cost)
        .bind(order.ordered_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_user_id_fkey")
            {
                return StoreError::MissingReference {
                    entity: "user",
                    id: user_id,
                };
            }
            StoreError::Database(e)
        })?;

        Ok(OrderId::new(id))
    }

    async fn create_order_line(&self, order_id: OrderId, book_id: BookId) -> Result<OrderLineId> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO order_lines (order_id, book_id) VALUES ($1, $2) RETURNING id")
                .bind(order_id.as_i64())
                .bind(book_id.as_i64())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(%order_id, %book_id, error = %e, "failed to insert order line");
                    map_constraint(e, order_id.as_i64(), book_id.as_i64())
                })?;

        Ok(OrderLineId::new(id))
    }

    async fn get_order_by_id(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "order",
                id: id.as_i64(),
            })?;

        let mut orders = self.hydrate(vec![row]).await?;
        orders.pop().ok_or(StoreError::NotFound {
            entity: "order",
            id: id.as_i64(),
        })
    }

    async fn list_orders(&self, query: PageQuery) -> Result<(Vec<Order>, u64)> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok((self.hydrate(rows).await?, count(total)))
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY id ASC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query(
            "SELECT id, order_id, book_id FROM order_lines WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OrderLine {
                    id: OrderLineId::new(row.try_get("id")?),
                    order_id: OrderId::new(row.try_get("order_id")?),
                    book_id: BookId::new(row.try_get("book_id")?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl BookStore for PostgresStore {
    async fn create_book(&self, book: NewBook) -> Result<Book> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO books (title, description, category, trending, old_price, new_price, cover_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&book.title)
        .bind(&book.description)
        .bind(&book.category)
        .bind(book.trending)
        .bind(book.old_price)
        .bind(book.new_price)
        .bind(&book.cover_image)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_book(&row)
    }

    async fn get_book(&self, id: BookId) -> Result<Book> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "book",
                id: id.as_i64(),
            })?;

        Self::row_to_book(&row)
    }

    async fn list_books(&self, query: PageQuery) -> Result<(Vec<Book>, u64)> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let books = rows.iter().map(Self::row_to_book).collect::<Result<Vec<_>>>()?;
        Ok((books, self.count_books().await?))
    }

    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<Book> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE books
            SET title = $2, description = $3, category = $4, trending = $5,
                old_price = $6, new_price = $7, cover_image = COALESCE($8, cover_image)
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.category)
        .bind(update.trending)
        .bind(update.old_price)
        .bind(update.new_price)
        .bind(update.cover_image.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            entity: "book",
            id: id.as_i64(),
        })?;

        Self::row_to_book(&row)
    }

    async fn delete_book(&self, id: BookId) -> Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("order_lines_book_id_fkey")
                {
                    return StoreError::InUse {
                        entity: "book",
                        id: id.as_i64(),
                    };
                }
                StoreError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "book",
                id: id.as_i64(),
            });
        }
        Ok(())
    }

    async fn list_trending_books(&self, query: PageQuery) -> Result<(Vec<Book>, u64)> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE trending = TRUE ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE trending = TRUE")
            .fetch_one(&self.pool)
            .await?;

        let books = rows.iter().map(Self::row_to_book).collect::<Result<Vec<_>>>()?;
        Ok((books, count(total)))
    }

    async fn list_recommended_books(&self, excluding: &[BookId]) -> Result<Vec<Book>> {
        let excluded: Vec<i64> = excluding.iter().map(BookId::as_i64).collect();
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE trending = FALSE AND NOT (id = ANY($1)) ORDER BY id ASC"
        ))
        .bind(excluded.as_slice())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_book).collect()
    }

    async fn count_books(&self) -> Result<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count(total))
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, is_admin
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("users_email_key")
            {
                return StoreError::Duplicate {
                    entity: "user",
                    key: user.email.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        Self::row_to_user(&row)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, name, email, is_admin, password_hash FROM users WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user_record).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row =
            sqlx::query("SELECT id, name, email, is_admin, password_hash FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        row.as_ref().map(Self::row_to_user_record).transpose()
    }
}
