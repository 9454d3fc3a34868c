use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::TokenConfig;
use crate::error::{CapabilityError, Result};
use crate::interfaces::plugins::{PluginContext, Tool, ToolPlugin};
use crate::solana_rpc::format_units;
use crate::wallet::SolanaWallet;

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CapabilityError::Runtime(format!("Missing {key}")))
}

/// Token tools over the configured token list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplTokenPlugin;

impl ToolPlugin for SplTokenPlugin {
    fn name(&self) -> &str {
        "spl_token"
    }

    fn tools(&self, context: &PluginContext) -> Vec<Arc<dyn Tool>> {
        let tokens: Arc<[TokenConfig]> = context.tokens.clone().into();
        vec![
            Arc::new(TokenInfoTool {
                tokens: tokens.clone(),
            }),
            Arc::new(TokenBalanceTool {
                wallet: context.wallet.clone(),
                tokens,
            }),
            Arc::new(TokenTransferTool {
                wallet: context.wallet.clone(),
            }),
        ]
    }
}

pub struct TokenInfoTool {
    tokens: Arc<[TokenConfig]>,
}

#[async_trait]
impl Tool for TokenInfoTool {
    fn name(&self) -> &str {
        "get_token_info_by_symbol"
    }

    fn description(&self) -> &str {
        "Get the mint address, name and decimals of a token by its symbol"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol": { "type": "string", "description": "Token symbol, e.g. USDC" }
            },
            "required": ["symbol"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let symbol = required_str(&params, "symbol")?;
        let token = self
            .tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
            .ok_or_else(|| {
                CapabilityError::Runtime(format!("Token with symbol {symbol} not found"))
            })?;
        Ok(serde_json::to_value(token)?)
    }
}

pub struct TokenBalanceTool {
    wallet: Arc<SolanaWallet>,
    tokens: Arc<[TokenConfig]>,
}

#[async_trait]
impl Tool for TokenBalanceTool {
    fn name(&self) -> &str {
        "get_token_balance"
    }

    fn description(&self) -> &str {
        "Get the balance of a token for a wallet"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "wallet": { "type": "string", "description": "Owner address" },
                "mint": { "type": "string", "description": "Token mint address" }
            },
            "required": ["wallet", "mint"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let owner = required_str(&params, "wallet")?;
        let mint = required_str(&params, "mint")?;
        let known = self.tokens.iter().find(|token| token.mint == mint);

        let (amount, account_decimals) = self.wallet.token_balance(owner, mint).await?;
        let decimals = known
            .map(|token| token.decimals)
            .or(account_decimals)
            .unwrap_or(0);

        Ok(json!({
            "wallet": owner,
            "mint": mint,
            "symbol": known.map(|token| token.symbol.clone()),
            "amount": amount.to_string(),
            "decimals": decimals,
            "balance": format_units(amount, decimals),
        }))
    }
}

pub struct TokenTransferTool {
    wallet: Arc<SolanaWallet>,
}

#[async_trait]
impl Tool for TokenTransferTool {
    fn name(&self) -> &str {
        "transfer"
    }

    fn description(&self) -> &str {
        "Transfer an amount of a token to an address"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "mint": { "type": "string", "description": "Token mint address" },
                "to": { "type": "string", "description": "Recipient address" },
                "amount": { "type": "string", "description": "Amount in base units, e.g. \"1000000\" for 1 USDC" }
            },
            "required": ["mint", "to", "amount"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let mint = required_str(&params, "mint")?;
        let to = required_str(&params, "to")?;
        let raw_amount = required_str(&params, "amount")?;
        let amount = raw_amount
            .parse::<u64>()
            .map_err(|_| CapabilityError::Runtime(format!("Invalid token amount: {raw_amount}")))?;

        let signature = self.wallet.send_token(mint, to, amount).await?;
        Ok(Value::String(signature))
    }
}
