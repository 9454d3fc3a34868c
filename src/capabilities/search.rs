use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::interfaces::capabilities::{Capability, Invocation};
use crate::normalize::{normalize_failure, FailureContext};
use crate::providers::perplexity::PerplexityClient;

pub struct SearchCapability {
    client: PerplexityClient,
    failure: FailureContext,
}

impl SearchCapability {
    pub fn new(client: PerplexityClient) -> Self {
        Self {
            client,
            failure: FailureContext::new("Perplexity", "search")
                .with_hint("Please check your Perplexity API key."),
        }
    }

    fn format_citations(citations: &[String]) -> String {
        let lines: Vec<String> = citations
            .iter()
            .enumerate()
            .map(|(idx, url)| format!("[{}] {}", idx + 1, url))
            .collect();
        format!("\n\nCitations:\n{}", lines.join("\n"))
    }
}

#[async_trait]
impl Capability for SearchCapability {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search for information using Perplexity Sonar Pro API"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" }
            },
            "required": ["query"]
        })
    }

    async fn run(&self, invocation: Invocation) -> String {
        let query = invocation.arg_str("query").unwrap_or_default();
        info!(capability = self.name(), "search requested");

        match self.client.search(query).await {
            Ok(response) => {
                let Some(content) = response.first_content() else {
                    return "No results returned by Perplexity.".to_string();
                };
                let mut content = content.to_string();
                if !response.citations.is_empty() {
                    content.push_str(&Self::format_citations(&response.citations));
                }
                content
            }
            Err(err) => normalize_failure(&err, &self.failure),
        }
    }
}
