//! Order service: checkout workflow and order queries.

use std::collections::HashMap;

use chrono::Utc;
use common::{BookId, Order, OrderId, UserId};
use store::OrderStore;

use crate::auth::Principal;
use crate::error::{DomainError, Result};
use crate::pagination::{Page, PageRequest};

use super::builder::{CreateOrderPayload, build_order, parse_payload};
use super::fanout::LineItemFanOut;

/// Service for placing and reading orders.
///
/// Order creation is not atomic: the parent row is committed before its
/// lines, and failed lines are reported rather than rolled back.
#[derive(Clone)]
pub struct OrderService<S: OrderStore> {
    store: S,
    fanout: LineItemFanOut,
}

impl<S: OrderStore + Clone + 'static> OrderService<S> {
    /// Creates a service with the default line concurrency.
    pub fn new(store: S) -> Self {
        Self::with_fanout(store, LineItemFanOut::default())
    }

    /// Creates a service with an explicit fan-out policy.
    pub fn with_fanout(store: S, fanout: LineItemFanOut) -> Self {
        Self { store, fanout }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for the authenticated caller.
    ///
    /// Validation and authentication happen before any write. Once the
    /// parent order is stored, one line is attempted per requested book; if
    /// any fail the result is [`DomainError::PartialFailure`] carrying the
    /// order id, otherwise the freshly loaded order.
    #[tracing::instrument(skip(self, principal, payload), fields(user_id))]
    pub async fn create_order(
        &self,
        principal: Option<&Principal>,
        payload: CreateOrderPayload,
    ) -> Result<Order> {
        let draft = build_order(payload, principal, Utc::now())?;
        tracing::Span::current().record("user_id", draft.order.user_id.as_i64());

        let order_id = self.store.create_order(draft.order).await?;
        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(%order_id, lines = draft.book_ids.len(), "Order created");

        self.fanout
            .run(&self.store, order_id, &draft.book_ids)
            .await
            .into_result(order_id)?;

        Ok(self.store.get_order_by_id(order_id).await?)
    }

    /// Same as [`create_order`](Self::create_order), from a raw JSON body.
    pub async fn create_order_from_json(
        &self,
        principal: Option<&Principal>,
        body: &[u8],
    ) -> Result<Order> {
        let Some(principal) = principal else {
            return Err(DomainError::Unauthenticated(
                "authentication is required to place an order".to_string(),
            ));
        };
        let payload = parse_payload(body)?;
        self.create_order(Some(principal), payload).await
    }

    /// Loads one order with its books and owner.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        Ok(self.store.get_order_by_id(id).await?)
    }

    /// Lists one page of all orders.
    ///
    /// `page` must be at least 1 and `page_size` between 1 and 100.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, page: i64, page_size: i64) -> Result<Page<Order>> {
        let request = PageRequest::new(page, page_size)?;
        let (orders, total) = self.store.list_orders(request.query()).await?;
        Ok(Page::new(orders, total, request))
    }

    /// Lists every order owned by `user_id`. Empty when there are none.
    #[tracing::instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.list_orders_for_user(user_id).await?)
    }

    /// Attaches whichever of `book_ids` the order does not already hold.
    ///
    /// The comparison counts copies, so requesting `[a, a]` for an order
    /// holding one `a` adds exactly one more. Running the same request twice
    /// adds nothing the second time. Only the owner or an admin may repair.
    #[tracing::instrument(skip(self, principal, book_ids), fields(user_id = %principal.user_id))]
    pub async fn repair_missing_lines(
        &self,
        principal: &Principal,
        order_id: OrderId,
        book_ids: Vec<BookId>,
    ) -> Result<Order> {
        let order = self.store.get_order_by_id(order_id).await?;
        if order.user_id != principal.user_id && !principal.is_admin {
            return Err(DomainError::Forbidden(
                "only the owner may repair an order".to_string(),
            ));
        }

        let lines = self.store.get_order_lines(order_id).await?;
        let mut held: HashMap<BookId, usize> = HashMap::new();
        for line in &lines {
            *held.entry(line.book_id).or_default() += 1;
        }

        let missing: Vec<BookId> = book_ids
            .into_iter()
            .filter(|book_id| match held.get_mut(book_id) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    false
                }
                _ => true,
            })
            .collect();

        if !missing.is_empty() {
            tracing::info!(%order_id, missing = missing.len(), "Repairing order lines");
            self.fanout
                .run(&self.store, order_id, &missing)
                .await
                .into_result(order_id)?;
        }

        Ok(self.store.get_order_by_id(order_id).await?)
    }
}
