//! HTTP client for the RajaOngkir starter API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::{CourierError, Result};
use crate::service::{CostQuery, CourierService};

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.rajaongkir.com/starter";

/// RajaOngkir client. The API key travels in a `key` header.
#[derive(Clone)]
pub struct RajaOngkirClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for RajaOngkirClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RajaOngkirClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RajaOngkirClient {
    /// Create a client for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn decode(response: Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "RajaOngkir request failed");
            return Err(CourierError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CourierService for RajaOngkirClient {
    #[instrument(skip(self))]
    async fn provinces(&self) -> Result<Value> {
        let response = self
            .client
            .get(self.url("province"))
            .header("key", self.api_key.expose_secret())
            .send()
            .await?;

        debug!(status = %response.status(), "Provinces fetched");
        Self::decode(response).await
    }

    #[instrument(skip(self))]
    async fn cities(&self, province_id: &str) -> Result<Value> {
        if province_id.trim().is_empty() {
            return Err(CourierError::Validation(
                "province_id is required".to_string(),
            ));
        }

        let response = self
            .client
            .get(self.url("city"))
            .query(&[("province", province_id)])
            .header("key", self.api_key.expose_secret())
            .send()
            .await?;

        debug!(status = %response.status(), "Cities fetched");
        Self::decode(response).await
    }

    #[instrument(skip(self), fields(courier = %query.courier))]
    async fn costs(&self, query: &CostQuery) -> Result<Value> {
        query.validate()?;

        let response = self
            .client
            .post(self.url("cost"))
            .header("key", self.api_key.expose_secret())
            .form(query)
            .send()
            .await?;

        debug!(status = %response.status(), "Costs fetched");
        Self::decode(response).await
    }
}
