use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::capabilities::adapter::adapt_tools_with_overrides;
use crate::capabilities::overrides::{OverrideTable, TrustedContext};
use crate::capabilities::search::SearchCapability;
use crate::capabilities::twitter::marketing_capabilities;
use crate::capabilities::CapabilitySet;
use crate::config::{
    AgentProfile, Config, OPENSERV_API_KEY, PERPLEXITY_API_KEY, RPC_PROVIDER_URL,
    WALLET_PRIVATE_KEY,
};
use crate::error::Result;
use crate::host::{CapabilityHost, HostConfig};
use crate::integrations::HttpIntegrationInvoker;
use crate::interfaces::plugins::PluginContext;
use crate::interfaces::wallet::WalletClient;
use crate::plugins::registry::{default_plugins, get_tools};
use crate::providers::perplexity::PerplexityClient;
use crate::wallet::SolanaWallet;

pub struct CapabilityAgentFactory;

impl CapabilityAgentFactory {
    /// Validates the configuration for `profile`, then derives its capability set.
    /// Nothing is constructed when a required key is missing.
    pub fn build_capabilities(profile: AgentProfile, config: &Config) -> Result<CapabilitySet> {
        config.validate(profile)?;
        let timeout = Duration::from_secs(config.timeout_seconds());

        let set = match profile {
            AgentProfile::Wallet => {
                let wallet = Arc::new(SolanaWallet::from_secret(
                    config.require(WALLET_PRIVATE_KEY)?,
                    config.require(RPC_PROVIDER_URL)?,
                    config.cluster(),
                )?);
                let context = PluginContext {
                    wallet: wallet.clone(),
                    tokens: config.tokens(),
                };
                let tools = get_tools(&context, &default_plugins());

                let client: Arc<dyn WalletClient> = wallet;
                let trusted = TrustedContext::from_wallet(client);
                info!(address = %trusted.address, tools = tools.len(), "wallet tools loaded");

                CapabilitySet::builder()
                    .extend(adapt_tools_with_overrides(
                        tools,
                        &OverrideTable::wallet_defaults(),
                        &trusted,
                    ))
                    .build()?
            }
            AgentProfile::Marketing => {
                let invoker = Arc::new(HttpIntegrationInvoker::new(
                    config.openserv_api_url(),
                    config.require(OPENSERV_API_KEY)?,
                    timeout,
                )?);
                CapabilitySet::builder()
                    .extend(marketing_capabilities(invoker))
                    .build()?
            }
            AgentProfile::Search => {
                let client = PerplexityClient::new(
                    config.require(PERPLEXITY_API_KEY)?,
                    config.perplexity_api_url(),
                    timeout,
                )?;
                CapabilitySet::builder()
                    .add(Arc::new(SearchCapability::new(client)))
                    .build()?
            }
        };

        info!(profile = profile.as_str(), capabilities = ?set.names(), "capabilities registered");
        Ok(set)
    }

    pub fn create_from_config(profile: AgentProfile, config: &Config) -> Result<CapabilityHost> {
        let capabilities = Self::build_capabilities(profile, config)?;
        Ok(CapabilityHost::new(
            HostConfig::from_config(config),
            capabilities,
        ))
    }
}
