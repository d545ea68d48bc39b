//! Shipping-rate lookups.
//!
//! [`CourierService`] is the seam the HTTP layer talks to; the RajaOngkir
//! client forwards upstream JSON documents unchanged.

pub mod error;
pub mod memory;
pub mod rajaongkir;
pub mod service;

pub use error::{CourierError, Result};
pub use memory::InMemoryCourierService;
pub use rajaongkir::{DEFAULT_BASE_URL, RajaOngkirClient};
pub use service::{CostQuery, CourierService};
