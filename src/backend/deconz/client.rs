use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use deconz::api::{GatewayConfig, Light, Sensor};

use crate::config::DeconzServer;
use crate::error::{ApiError, ApiResult};

/// Stateless REST accessor for the gateway api.
///
/// Host, port and api key are fixed at construction; rotating the key means
/// building a new client. No call here retries: failures carry the operation
/// name and the caller decides what to do.
pub struct DeconzClient {
    base_url: Url,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct LightStateUpdate {
    on: bool,
}

impl DeconzClient {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn new(server: &DeconzServer) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|err| ApiError::hub_request("client setup", err))?;

        let base_url = Url::parse(&deconz::api_base(
            &server.host,
            server.port,
            &server.api_key,
        ))?;

        Ok(Self { base_url, http })
    }

    fn endpoint_url(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn check_status(
        response: reqwest::Response,
        operation: &str,
    ) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(ApiError::HubStatus {
            operation: operation.to_string(),
            status,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, operation: &str) -> ApiResult<T> {
        let url = self.endpoint_url(path)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::hub_request(operation, err))?;
        let response = Self::check_status(response, operation).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::hub_request(operation, err))
    }

    pub async fn get_lights(&self) -> ApiResult<HashMap<String, Light>> {
        self.get_json("lights", "GET /lights").await
    }

    pub async fn get_light(&self, id: &str) -> ApiResult<Light> {
        self.get_json(&format!("lights/{id}"), "GET /lights/{id}")
            .await
    }

    pub async fn get_sensors(&self) -> ApiResult<HashMap<String, Sensor>> {
        self.get_json("sensors", "GET /sensors").await
    }

    pub async fn get_gateway_config(&self) -> ApiResult<GatewayConfig> {
        self.get_json("config", "GET /config").await
    }

    /// Switch a light. The reply body (a per-field success list) is not
    /// inspected; the await still sequences overlapping writes to the same
    /// light.
    pub async fn set_light_on(&self, id: &str, on: bool) -> ApiResult<()> {
        let operation = "PUT /lights/{id}/state";
        let url = self.endpoint_url(&format!("lights/{id}/state"))?;
        let response = self
            .http
            .put(url)
            .json(&LightStateUpdate { on })
            .send()
            .await
            .map_err(|err| ApiError::hub_request(operation, err))?;
        Self::check_status(response, operation).await?;
        Ok(())
    }
}
