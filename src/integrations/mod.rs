use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{CapabilityError, Result};
use crate::interfaces::integrations::{IntegrationInvoker, IntegrationRequest, IntegrationResult};

const API_KEY_HEADER: &str = "x-openserv-key";

/// Calls integrations through the platform's proxy endpoint.
#[derive(Clone)]
pub struct HttpIntegrationInvoker {
    base_url: String,
    api_key: String,
    client: Client,
}

impl HttpIntegrationInvoker {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CapabilityError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    fn proxy_url(&self, request: &IntegrationRequest) -> String {
        format!(
            "{}/workspaces/{}/integration/{}/proxy",
            self.base_url, request.workspace_id, request.integration_id
        )
    }

    fn proxy_body(request: &IntegrationRequest) -> Value {
        let mut body = json!({
            "endpoint": request.endpoint,
            "method": request.method.to_uppercase(),
        });
        if let Some(data) = &request.data {
            body["data"] = data.clone();
        }
        body
    }
}

#[async_trait]
impl IntegrationInvoker for HttpIntegrationInvoker {
    async fn invoke(&self, request: IntegrationRequest) -> Result<IntegrationResult> {
        let url = self.proxy_url(&request);
        info!(
            integration = %request.integration_id,
            workspace = request.workspace_id,
            endpoint = %request.endpoint,
            method = %request.method,
            "integration call"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&Self::proxy_body(&request))
            .send()
            .await
            .map_err(|e| CapabilityError::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            warn!(
                integration = %request.integration_id,
                endpoint = %request.endpoint,
                status,
                "integration call rejected"
            );
            return Err(CapabilityError::Integration {
                status,
                message: format!("Request failed with status code {status}"),
            });
        }

        response
            .json::<IntegrationResult>()
            .await
            .map_err(|e| CapabilityError::Serialization(e.to_string()))
    }
}
