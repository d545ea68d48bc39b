//! Shared application state.

use std::sync::Arc;

use courier::CourierService;
use domain::{AuthService, BookService, LineItemFanOut, OrderService};
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub books: BookService<S>,
    pub auth: AuthService<S>,
    pub courier: Arc<dyn CourierService>,
}

impl<S: Store> AppState<S> {
    /// Wires every service over one store.
    pub fn new(
        store: S,
        auth: AuthService<S>,
        fanout: LineItemFanOut,
        courier: Arc<dyn CourierService>,
    ) -> Self {
        Self {
            orders: OrderService::with_fanout(store.clone(), fanout),
            books: BookService::new(store),
            auth,
            courier,
        }
    }
}
