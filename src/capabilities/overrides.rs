//! Binds trusted wallet context into tools whose identity arguments must not come
//! from generated input.
//!
//! Overrides are declared in an [`OverrideTable`] keyed by tool name and applied once
//! while tools are adapted. A name with no matching tool is skipped. Wrapped tools
//! keep the name, description and parameter schema of the tool they replace.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::Result;
use crate::interfaces::plugins::Tool;
use crate::interfaces::wallet::WalletClient;
use crate::normalize::render_value;

pub const TRANSFER_TOOL: &str = "transfer";
pub const BALANCE_TOOL: &str = "get_balance";
pub const DESTINATION_FIELD: &str = "to";

/// Values derived from the wallet at startup, never from invocation arguments.
#[derive(Clone)]
pub struct TrustedContext {
    pub address: String,
    pub wallet: Arc<dyn WalletClient>,
}

impl TrustedContext {
    pub fn from_wallet(wallet: Arc<dyn WalletClient>) -> Self {
        Self {
            address: wallet.address(),
            wallet,
        }
    }
}

/// Builds the replacement for a tool from the original and the trusted context.
pub type OverrideStrategy = fn(Arc<dyn Tool>, &TrustedContext) -> Arc<dyn Tool>;

#[derive(Clone, Default)]
pub struct OverrideTable {
    strategies: HashMap<String, OverrideStrategy>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `transfer` gets the wallet address as destination, `get_balance` reads the
    /// wallet balance directly.
    pub fn wallet_defaults() -> Self {
        Self::new()
            .with(TRANSFER_TOOL, bind_transfer_destination)
            .with(BALANCE_TOOL, bind_balance_query)
    }

    pub fn with(mut self, tool_name: &str, strategy: OverrideStrategy) -> Self {
        self.strategies.insert(tool_name.to_string(), strategy);
        self
    }

    pub fn apply(&self, tools: Vec<Arc<dyn Tool>>, context: &TrustedContext) -> Vec<Arc<dyn Tool>> {
        tools
            .into_iter()
            .map(|tool| match self.strategies.get(tool.name()) {
                Some(strategy) => {
                    info!(tool = %tool.name(), "binding trusted wallet context");
                    strategy(tool, context)
                }
                None => tool,
            })
            .collect()
    }
}

pub fn bind_transfer_destination(tool: Arc<dyn Tool>, context: &TrustedContext) -> Arc<dyn Tool> {
    Arc::new(AddressBoundTransfer {
        inner: tool,
        address: context.address.clone(),
    })
}

pub fn bind_balance_query(tool: Arc<dyn Tool>, context: &TrustedContext) -> Arc<dyn Tool> {
    Arc::new(WalletBalanceQuery {
        inner: tool,
        wallet: context.wallet.clone(),
        address: context.address.clone(),
    })
}

/// Transfer whose destination is always the trusted address.
pub struct AddressBoundTransfer {
    inner: Arc<dyn Tool>,
    address: String,
}

#[async_trait]
impl Tool for AddressBoundTransfer {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters(&self) -> Value {
        self.inner.parameters()
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let mut args = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(previous) = args.get(DESTINATION_FIELD) {
            debug!(
                tool = %self.inner.name(),
                replaced = %previous,
                "discarding generated destination"
            );
        }
        args.insert(
            DESTINATION_FIELD.to_string(),
            Value::String(self.address.clone()),
        );

        let result = self.inner.execute(Value::Object(args)).await?;
        Ok(Value::String(format!(
            "Transaction sent: {}",
            render_value(&result)
        )))
    }
}

/// Balance lookup that ignores its arguments and asks the wallet for its own balance.
pub struct WalletBalanceQuery {
    inner: Arc<dyn Tool>,
    wallet: Arc<dyn WalletClient>,
    address: String,
}

#[async_trait]
impl Tool for WalletBalanceQuery {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters(&self) -> Value {
        self.inner.parameters()
    }

    async fn execute(&self, _params: Value) -> Result<Value> {
        let balance = self.wallet.balance_of(&self.address).await?;
        Ok(Value::String(format!("{} {}", balance.value, balance.symbol)))
    }
}
