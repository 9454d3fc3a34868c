use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrationRequest {
    pub workspace_id: u64,
    pub integration_id: String,
    pub endpoint: String,
    pub method: String,
    pub data: Option<Value>,
}

impl IntegrationRequest {
    pub fn get(workspace_id: u64, integration_id: &str, endpoint: &str) -> Self {
        Self {
            workspace_id,
            integration_id: integration_id.to_string(),
            endpoint: endpoint.to_string(),
            method: "GET".to_string(),
            data: None,
        }
    }

    pub fn post(workspace_id: u64, integration_id: &str, endpoint: &str, data: Value) -> Self {
        Self {
            workspace_id,
            integration_id: integration_id.to_string(),
            endpoint: endpoint.to_string(),
            method: "POST".to_string(),
            data: Some(data),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IntegrationOutput {
    #[serde(default)]
    pub data: Option<Value>,
    /// Either a provider message or an encoded error envelope.
    #[serde(default)]
    pub message: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IntegrationResult {
    #[serde(default)]
    pub output: IntegrationOutput,
}

impl IntegrationResult {
    pub fn with_data(data: Value) -> Self {
        Self {
            output: IntegrationOutput {
                data: Some(data),
                message: None,
            },
        }
    }

    pub fn data_field(&self, field: &str) -> Option<&Value> {
        self.output.data.as_ref().and_then(|data| data.get(field))
    }
}

#[async_trait]
pub trait IntegrationInvoker: Send + Sync {
    async fn invoke(&self, request: IntegrationRequest) -> Result<IntegrationResult>;
}
