use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{CapabilityError, Result};
use crate::interfaces::plugins::Tool;
use crate::interfaces::wallet::WalletClient;

/// Tools every wallet exposes regardless of plugins.
pub fn core_wallet_tools(wallet: Arc<dyn WalletClient>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(GetAddressTool {
            wallet: wallet.clone(),
        }),
        Arc::new(GetChainTool {
            wallet: wallet.clone(),
        }),
        Arc::new(GetBalanceTool { wallet }),
    ]
}

pub struct GetAddressTool {
    wallet: Arc<dyn WalletClient>,
}

#[async_trait]
impl Tool for GetAddressTool {
    fn name(&self) -> &str {
        "get_address"
    }

    fn description(&self) -> &str {
        "Get the address of the wallet"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<Value> {
        Ok(Value::String(self.wallet.address()))
    }
}

pub struct GetChainTool {
    wallet: Arc<dyn WalletClient>,
}

#[async_trait]
impl Tool for GetChainTool {
    fn name(&self) -> &str {
        "get_chain"
    }

    fn description(&self) -> &str {
        "Get the chain and cluster the wallet is connected to"
    }

    fn parameters(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _params: Value) -> Result<Value> {
        Ok(serde_json::to_value(self.wallet.chain())?)
    }
}

pub struct GetBalanceTool {
    wallet: Arc<dyn WalletClient>,
}

#[async_trait]
impl Tool for GetBalanceTool {
    fn name(&self) -> &str {
        "get_balance"
    }

    fn description(&self) -> &str {
        "Get the native SOL balance of an address"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "address": { "type": "string", "description": "The address to get the balance of" }
            },
            "required": ["address"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let address = params
            .get("address")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CapabilityError::Runtime("Missing address".to_string()))?;
        let balance = self.wallet.balance_of(address).await?;
        Ok(json!({
            "address": address,
            "value": balance.value,
            "symbol": balance.symbol,
        }))
    }
}
