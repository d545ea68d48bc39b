//! In-memory courier service for testing.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{CourierError, Result};
use crate::service::{CostQuery, CourierService};

#[derive(Debug, Default)]
struct InMemoryCourierState {
    fail: bool,
    cost_queries: Vec<CostQuery>,
}

/// Canned courier responses shaped like the provider's documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCourierService {
    state: Arc<RwLock<InMemoryCourierState>>,
}

impl InMemoryCourierService {
    /// Creates a new in-memory courier service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to fail every lookup.
    pub fn set_fail(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail = fail;
        }
    }

    /// Returns the cost queries received so far.
    pub fn cost_queries(&self) -> Vec<CostQuery> {
        self.state
            .read()
            .map(|s| s.cost_queries.clone())
            .unwrap_or_default()
    }

    fn check(&self) -> Result<()> {
        match self.state.read() {
            Ok(state) if !state.fail => Ok(()),
            _ => Err(CourierError::Unavailable(
                "courier lookups are disabled".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CourierService for InMemoryCourierService {
    async fn provinces(&self) -> Result<Value> {
        self.check()?;
        Ok(json!({
            "rajaongkir": {
                "status": {"code": 200, "description": "OK"},
                "results": [
                    {"province_id": "1", "province": "Bali"},
                    {"province_id": "9", "province": "Jawa Barat"}
                ]
            }
        }))
    }

    async fn cities(&self, province_id: &str) -> Result<Value> {
        self.check()?;
        if province_id.trim().is_empty() {
            return Err(CourierError::Validation(
                "province_id is required".to_string(),
            ));
        }
        Ok(json!({
            "rajaongkir": {
                "query": {"province": province_id},
                "status": {"code": 200, "description": "OK"},
                "results": [
                    {"city_id": "23", "province_id": province_id, "type": "Kota", "city_name": "Bandung", "postal_code": "40111"}
                ]
            }
        }))
    }

    async fn costs(&self, query: &CostQuery) -> Result<Value> {
        query.validate()?;
        self.check()?;
        if let Ok(mut state) = self.state.write() {
            state.cost_queries.push(query.clone());
        }
        Ok(json!({
            "rajaongkir": {
                "query": query,
                "status": {"code": 200, "description": "OK"},
                "results": [{
                    "code": query.courier,
                    "costs": [{"service": "REG", "cost": [{"value": 9000, "etd": "2-3", "note": ""}]}]
                }]
            }
        }))
    }
}
