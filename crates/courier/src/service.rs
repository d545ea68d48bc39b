//! Courier service trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CourierError, Result};

/// A shipping-cost lookup: origin and destination city ids, weight in grams
/// and a courier code such as `jne`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostQuery {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub courier: String,
}

impl CostQuery {
    /// Every field is required.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            &self.origin,
            &self.destination,
            &self.weight,
            &self.courier,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(CourierError::Validation(
                "All fields are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for shipping-rate lookups.
///
/// Results are the provider's JSON documents, passed through untouched.
#[async_trait]
pub trait CourierService: Send + Sync {
    /// Lists provinces.
    async fn provinces(&self) -> Result<Value>;

    /// Lists the cities of one province.
    async fn cities(&self, province_id: &str) -> Result<Value>;

    /// Quotes shipping costs.
    async fn costs(&self, query: &CostQuery) -> Result<Value>;
}
