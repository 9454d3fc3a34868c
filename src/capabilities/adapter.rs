use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info_span, Instrument};

use crate::capabilities::overrides::{OverrideTable, TrustedContext};
use crate::interfaces::capabilities::{Capability, Invocation};
use crate::interfaces::plugins::Tool;
use crate::normalize::{normalize_failure, render_value, FailureContext};

/// Exposes a tool as a capability with the same name, description and schema.
pub struct ToolCapability {
    tool: Arc<dyn Tool>,
    failure: FailureContext,
}

impl ToolCapability {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        let failure = FailureContext::for_tool(tool.name());
        Self { tool, failure }
    }
}

#[async_trait]
impl Capability for ToolCapability {
    fn name(&self) -> &str {
        self.tool.name()
    }

    fn description(&self) -> &str {
        self.tool.description()
    }

    fn schema(&self) -> Value {
        self.tool.parameters()
    }

    async fn run(&self, invocation: Invocation) -> String {
        let span = info_span!("tool_capability", tool = %self.tool.name());
        async move {
            match self.tool.execute(invocation.args).await {
                Ok(value) => {
                    debug!("tool returned");
                    render_value(&value)
                }
                Err(error) => normalize_failure(&error, &self.failure),
            }
        }
        .instrument(span)
        .await
    }
}

/// One capability per tool, in input order.
pub fn adapt_tools(tools: Vec<Arc<dyn Tool>>) -> Vec<Arc<dyn Capability>> {
    tools
        .into_iter()
        .map(|tool| Arc::new(ToolCapability::new(tool)) as Arc<dyn Capability>)
        .collect()
}

/// Applies the override table with the trusted context, then adapts every tool.
pub fn adapt_tools_with_overrides(
    tools: Vec<Arc<dyn Tool>>,
    table: &OverrideTable,
    context: &TrustedContext,
) -> Vec<Arc<dyn Capability>> {
    adapt_tools(table.apply(tools, context))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::error::{CapabilityError, Result};

    struct FixedTool {
        name: &'static str,
        output: Value,
    }

    #[async_trait]
    impl Tool for FixedTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "fixed"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _params: Value) -> Result<Value> {
            if self.output.is_null() {
                return Err(CapabilityError::Runtime("rpc unavailable".to_string()));
            }
            Ok(self.output.clone())
        }
    }

    #[tokio::test]
    async fn structured_output_is_pretty_printed() {
        let capability = ToolCapability::new(Arc::new(FixedTool {
            name: "get_chain",
            output: json!({"type": "solana"}),
        }));
        let out = capability.run(Invocation::new(json!({}))).await;
        assert_eq!(out, "{\n  \"type\": \"solana\"\n}");
    }

    #[tokio::test]
    async fn failures_are_rendered_not_propagated() {
        let capability = ToolCapability::new(Arc::new(FixedTool {
            name: "send_sol",
            output: Value::Null,
        }));
        let out = capability.run(Invocation::new(json!({}))).await;
        assert_eq!(out, "Error: Unable to execute send_sol. Details: rpc unavailable");
    }
}
