use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::TokenConfig;
use crate::error::Result;
use crate::wallet::SolanaWallet;

/// An externally supplied callable, before it is adapted into a capability.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments accepted by `execute`.
    fn parameters(&self) -> Value;
    async fn execute(&self, params: Value) -> Result<Value>;
}

/// Shared, read-only state handed to every plugin when tools are collected.
#[derive(Clone)]
pub struct PluginContext {
    pub wallet: Arc<SolanaWallet>,
    pub tokens: Vec<TokenConfig>,
}

pub trait ToolPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn tools(&self, context: &PluginContext) -> Vec<Arc<dyn Tool>>;
}
