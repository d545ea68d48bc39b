//! Order creation, line-item fan-out and order queries.

mod builder;
mod fanout;
mod service;

pub use builder::{
    CreateOrderPayload, MAX_PHONE_LENGTH, MAX_TEXT_LENGTH, OrderDraft, build_order, parse_payload,
};
pub use fanout::{
    DEFAULT_LINE_CONCURRENCY, FanOutReport, LineItemFailure, LineItemFanOut, PartialFailure,
};
pub use service::OrderService;
