//! Concurrent creation of order lines with partial-failure aggregation.

use std::sync::Arc;
use std::time::Instant;

use common::{BookId, OrderId, OrderLineId};
use serde::Serialize;
use store::OrderStore;
use thiserror::Error;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

/// Default number of line writes in flight per order.
pub const DEFAULT_LINE_CONCURRENCY: usize = 16;

/// One book that could not be attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItemFailure {
    pub book_id: BookId,
    #[serde(rename = "error")]
    pub reason: String,
}

/// The parent order was persisted but some of its lines were not.
///
/// The order is not rolled back; `order_id` lets the caller inspect it or
/// repair the missing lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{} of {} order lines could not be created for order {}",
    .failures.len(),
    .attempted,
    .order_id
)]
pub struct PartialFailure {
    pub order_id: OrderId,
    pub attempted: usize,
    pub failures: Vec<LineItemFailure>,
}

/// Outcome of one fan-out, in request order.
#[derive(Debug, Clone, Default)]
pub struct FanOutReport {
    pub created: Vec<(BookId, OrderLineId)>,
    pub failures: Vec<LineItemFailure>,
}

impl FanOutReport {
    /// True when every requested line was created.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of lines attempted.
    pub fn attempted(&self) -> usize {
        self.created.len() + self.failures.len()
    }

    /// Converts the report into an error when any line failed.
    pub fn into_result(self, order_id: OrderId) -> Result<Vec<OrderLineId>, PartialFailure> {
        if self.is_complete() {
            return Ok(self.created.into_iter().map(|(_, id)| id).collect());
        }
        Err(PartialFailure {
            order_id,
            attempted: self.attempted(),
            failures: self.failures,
        })
    }
}

enum Outcome {
    Created(OrderLineId),
    Failed(String),
}

/// Writes one line per book concurrently, bounded by a semaphore.
///
/// Every task is spawned before any is awaited, so all lines are attempted
/// even when some fail. The call returns only after every task has finished.
///
/// Clones share one set of permits, so the limit holds across every order
/// being written at the same time, not per order.
#[derive(Debug, Clone)]
pub struct LineItemFanOut {
    max_concurrency: usize,
    permits: Arc<Semaphore>,
}

impl LineItemFanOut {
    /// A zero limit is raised to 1.
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            max_concurrency,
            permits: Arc::new(Semaphore::new(max_concurrency)),
        }
    }

    /// The number of writes allowed in flight.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Creates one line per entry of `book_ids` under `order_id`.
    ///
    /// Duplicate ids produce duplicate lines. A task that panics or is
    /// cancelled is reported as a failure for its book.
    #[tracing::instrument(skip(self, store, book_ids), fields(lines = book_ids.len()))]
    pub async fn run<S>(&self, store: &S, order_id: OrderId, book_ids: &[BookId]) -> FanOutReport
    where
        S: OrderStore + Clone + 'static,
    {
        if book_ids.is_empty() {
            return FanOutReport::default();
        }

        let started = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Outcome)>();
        let mut tasks = JoinSet::new();

        for (index, &book_id) in book_ids.iter().enumerate() {
            let store = store.clone();
            let permits = Arc::clone(&self.permits);
            let tx = tx.clone();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let outcome = match store.create_order_line(order_id, book_id).await {
                    Ok(line_id) => Outcome::Created(line_id),
                    Err(e) => {
                        tracing::warn!(%order_id, %book_id, error = %e, "Order line write failed");
                        Outcome::Failed(e.to_string())
                    }
                };
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(%order_id, error = %e, "Order line task did not complete");
            }
        }

        let mut outcomes: Vec<Option<Outcome>> = book_ids.iter().map(|_| None).collect();
        while let Some((index, outcome)) = rx.recv().await {
            if let Some(slot) = outcomes.get_mut(index) {
                *slot = Some(outcome);
            }
        }

        let mut report = FanOutReport::default();
        for (&book_id, outcome) in book_ids.iter().zip(outcomes) {
            match outcome {
                Some(Outcome::Created(line_id)) => report.created.push((book_id, line_id)),
                Some(Outcome::Failed(reason)) => {
                    report.failures.push(LineItemFailure { book_id, reason })
                }
                None => report.failures.push(LineItemFailure {
                    book_id,
                    reason: "order line task aborted before completion".to_string(),
                }),
            }
        }

        metrics::counter!("order_lines_created_total").increment(report.created.len() as u64);
        metrics::counter!("order_line_failures_total").increment(report.failures.len() as u64);
        metrics::histogram!("order_fanout_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        tracing::debug!(
            %order_id,
            created = report.created.len(),
            failed = report.failures.len(),
            "Order line fan-out finished"
        );

        report
    }
}

impl Default for LineItemFanOut {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_CONCURRENCY)
    }
}
