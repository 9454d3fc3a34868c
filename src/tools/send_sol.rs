use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{CapabilityError, Result};
use crate::interfaces::plugins::{PluginContext, Tool, ToolPlugin};
use crate::solana_rpc::{parse_units, SOL_DECIMALS};
use crate::wallet::SolanaWallet;

#[derive(Debug, Clone, Copy, Default)]
pub struct SolTransferPlugin;

impl ToolPlugin for SolTransferPlugin {
    fn name(&self) -> &str {
        "send_sol"
    }

    fn tools(&self, context: &PluginContext) -> Vec<Arc<dyn Tool>> {
        vec![Arc::new(SendSolTool {
            wallet: context.wallet.clone(),
        })]
    }
}

pub struct SendSolTool {
    wallet: Arc<SolanaWallet>,
}

#[async_trait]
impl Tool for SendSolTool {
    fn name(&self) -> &str {
        "send_sol"
    }

    fn description(&self) -> &str {
        "Send SOL from the wallet to an address"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "to": { "type": "string", "description": "Destination Solana address" },
                "amount": { "type": "string", "description": "Amount of SOL, e.g. \"0.25\"" }
            },
            "required": ["to", "amount"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let to = params
            .get("to")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CapabilityError::Runtime("Missing to".to_string()))?;
        let amount = params
            .get("amount")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CapabilityError::Runtime("Missing amount".to_string()))?;
        let lamports = parse_units(amount, SOL_DECIMALS)
            .ok_or_else(|| CapabilityError::Runtime(format!("Invalid SOL amount: {amount}")))?;

        let signature = self.wallet.send_sol(to, lamports).await?;
        Ok(Value::String(signature))
    }
}
