use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::interfaces::plugins::{PluginContext, Tool, ToolPlugin};
use crate::interfaces::wallet::WalletClient;
use crate::tools::send_sol::SolTransferPlugin;
use crate::tools::spl_token::SplTokenPlugin;
use crate::tools::wallet::core_wallet_tools;

/// Ordered, name-unique tool list gathered from the wallet and its plugins.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    names: HashSet<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and keeps the existing tool when the name is taken.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> bool {
        let name = tool.name().to_string();
        if !self.names.insert(name.clone()) {
            warn!(tool = %name, "duplicate tool name ignored");
            return false;
        }
        self.tools.push(tool);
        true
    }

    pub fn register_plugin(&mut self, plugin: &dyn ToolPlugin, context: &PluginContext) -> usize {
        let registered = plugin
            .tools(context)
            .into_iter()
            .filter(|tool| self.register_tool(tool.clone()))
            .count();
        info!(plugin = %plugin.name(), tools = registered, "plugin loaded");
        registered
    }

    pub fn into_tools(self) -> Vec<Arc<dyn Tool>> {
        self.tools
    }
}

/// The plugins loaded by the wallet agent.
pub fn default_plugins() -> Vec<Box<dyn ToolPlugin>> {
    vec![Box::new(SolTransferPlugin), Box::new(SplTokenPlugin)]
}

/// Core wallet tools followed by every plugin's tools, in plugin order.
pub fn get_tools(context: &PluginContext, plugins: &[Box<dyn ToolPlugin>]) -> Vec<Arc<dyn Tool>> {
    let mut registry = ToolRegistry::new();
    let wallet: Arc<dyn WalletClient> = context.wallet.clone();
    for tool in core_wallet_tools(wallet) {
        registry.register_tool(tool);
    }
    for plugin in plugins {
        registry.register_plugin(plugin.as_ref(), context);
    }
    registry.into_tools()
}
