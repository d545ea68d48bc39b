pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{BookUpdate, NewBook, NewOrder, NewUser, UserRecord};
pub use postgres::PostgresStore;
pub use query::PageQuery;
pub use store::{BookStore, OrderStore, Store, UserStore};
