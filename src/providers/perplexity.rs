use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{CapabilityError, Result};

const MODEL: &str = "sonar-pro";
const SYSTEM_PROMPT: &str = "Be precise and concise.";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .map(|choice| choice.message.content.as_str())
    }
}

#[derive(Clone)]
pub struct PerplexityClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl PerplexityClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CapabilityError::Http(e.to_string()))?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn error_message(body: &Value) -> Option<String> {
        body.get("error")
            .and_then(|error| error.get("message").or(Some(error)))
            .or_else(|| body.get("message"))
            .and_then(|message| message.as_str())
            .map(|message| message.to_string())
    }

    pub async fn search(&self, query: &str) -> Result<ChatCompletionResponse> {
        let payload = json!({
            "model": MODEL,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": query}
            ],
            "temperature": 0.2,
            "top_p": 0.9,
            "return_citations": true,
            "return_related_questions": false,
            "search_recency_filter": "month"
        });

        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, "perplexity search request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CapabilityError::Http(format!("Perplexity API error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = Self::error_message(&body)
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            warn!(status = status.as_u16(), "perplexity search rejected");
            return Err(CapabilityError::Integration {
                status: status.as_u16(),
                message: format!("Perplexity API error: {message}"),
            });
        }

        response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| CapabilityError::Serialization(format!("Perplexity API error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_nested_error() {
        let body = json!({"error": {"message": "invalid key", "type": "auth"}});
        assert_eq!(
            PerplexityClient::error_message(&body).as_deref(),
            Some("invalid key")
        );
        let body = json!({"message": "rate limited"});
        assert_eq!(
            PerplexityClient::error_message(&body).as_deref(),
            Some("rate limited")
        );
        assert_eq!(PerplexityClient::error_message(&Value::Null), None);
    }
}
