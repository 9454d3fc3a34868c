use std::fmt;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::error::{CapabilityError, Result};

pub const WALLET_PRIVATE_KEY: &str = "WALLET_PRIVATE_KEY";
pub const RPC_PROVIDER_URL: &str = "RPC_PROVIDER_URL";
pub const SOLANA_CLUSTER: &str = "SOLANA_CLUSTER";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENSERV_API_KEY: &str = "OPENSERV_API_KEY";
pub const OPENSERV_API_URL: &str = "OPENSERV_API_URL";
pub const PERPLEXITY_API_KEY: &str = "PERPLEXITY_API_KEY";
pub const PERPLEXITY_API_URL: &str = "PERPLEXITY_API_URL";
pub const AGENT_AUTH_TOKEN: &str = "AGENT_AUTH_TOKEN";
pub const HOST: &str = "HOST";
pub const PORT: &str = "PORT";

const DEFAULT_OPENSERV_API_URL: &str = "https://api.openserv.ai";
const DEFAULT_PERPLEXITY_API_URL: &str = "https://api.perplexity.ai";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 7378;
const DEFAULT_CLUSTER: &str = "mainnet-beta";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Which capability set the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AgentProfile {
    Wallet,
    Marketing,
    Search,
}

impl AgentProfile {
    /// Keys that must be present before any capability is registered, in check order.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::Wallet => &[
                WALLET_PRIVATE_KEY,
                RPC_PROVIDER_URL,
                OPENAI_API_KEY,
                OPENSERV_API_KEY,
            ],
            Self::Marketing => &[OPENSERV_API_KEY],
            Self::Search => &[PERPLEXITY_API_KEY],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wallet => "wallet",
            Self::Marketing => "marketing",
            Self::Search => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub mint: String,
}

impl TokenConfig {
    pub fn usdc() -> Self {
        Self {
            name: "USD Coin".to_string(),
            symbol: "USDC".to_string(),
            decimals: 6,
            mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
        }
    }
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub wallet_private_key: Option<String>,
    pub rpc_provider_url: Option<String>,
    pub solana_cluster: Option<String>,
    pub openai_api_key: Option<String>,
    pub openserv_api_key: Option<String>,
    pub openserv_api_url: Option<String>,
    pub perplexity_api_key: Option<String>,
    pub perplexity_api_url: Option<String>,
    pub auth_token: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "[REDACTED]"
            } else {
                "<unset>"
            }
        }

        f.debug_struct("Config")
            .field("wallet_private_key", &redact(&self.wallet_private_key))
            .field("rpc_provider_url", &self.rpc_provider_url)
            .field("solana_cluster", &self.solana_cluster)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openserv_api_key", &redact(&self.openserv_api_key))
            .field("openserv_api_url", &self.openserv_api_url)
            .field("perplexity_api_key", &redact(&self.perplexity_api_key))
            .field("perplexity_api_url", &self.perplexity_api_url)
            .field("auth_token", &redact(&self.auth_token))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("tokens", &self.tokens)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| CapabilityError::Config(format!("failed to read {path}: {e}")))?;
        serde_json::from_str(&raw).map_err(|e| CapabilityError::Config(e.to_string()))
    }

    /// Builds a config from a key lookup such as the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));
        let port = match get(PORT) {
            Some(raw) => Some(
                raw.parse::<u16>()
                    .map_err(|_| CapabilityError::Config(format!("{PORT} must be a port number")))?,
            ),
            None => None,
        };

        Ok(Self {
            wallet_private_key: get(WALLET_PRIVATE_KEY),
            rpc_provider_url: get(RPC_PROVIDER_URL),
            solana_cluster: get(SOLANA_CLUSTER),
            openai_api_key: get(OPENAI_API_KEY),
            openserv_api_key: get(OPENSERV_API_KEY),
            openserv_api_url: get(OPENSERV_API_URL),
            perplexity_api_key: get(PERPLEXITY_API_KEY),
            perplexity_api_url: get(PERPLEXITY_API_URL),
            auth_token: get(AGENT_AUTH_TOKEN),
            host: get(HOST),
            port,
            timeout_seconds: None,
            tokens: Vec::new(),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Fields set in `other` win over the ones in `self`.
    pub fn overlay(self, other: Config) -> Self {
        Self {
            wallet_private_key: other.wallet_private_key.or(self.wallet_private_key),
            rpc_provider_url: other.rpc_provider_url.or(self.rpc_provider_url),
            solana_cluster: other.solana_cluster.or(self.solana_cluster),
            openai_api_key: other.openai_api_key.or(self.openai_api_key),
            openserv_api_key: other.openserv_api_key.or(self.openserv_api_key),
            openserv_api_url: other.openserv_api_url.or(self.openserv_api_url),
            perplexity_api_key: other.perplexity_api_key.or(self.perplexity_api_key),
            perplexity_api_url: other.perplexity_api_url.or(self.perplexity_api_url),
            auth_token: other.auth_token.or(self.auth_token),
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            timeout_seconds: other.timeout_seconds.or(self.timeout_seconds),
            tokens: if other.tokens.is_empty() {
                self.tokens
            } else {
                other.tokens
            },
        }
    }

    fn value_for(&self, key: &str) -> Option<&str> {
        let value = match key {
            WALLET_PRIVATE_KEY => &self.wallet_private_key,
            RPC_PROVIDER_URL => &self.rpc_provider_url,
            SOLANA_CLUSTER => &self.solana_cluster,
            OPENAI_API_KEY => &self.openai_api_key,
            OPENSERV_API_KEY => &self.openserv_api_key,
            OPENSERV_API_URL => &self.openserv_api_url,
            PERPLEXITY_API_KEY => &self.perplexity_api_key,
            PERPLEXITY_API_URL => &self.perplexity_api_url,
            AGENT_AUTH_TOKEN => &self.auth_token,
            HOST => &self.host,
            _ => return None,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Returns the value for `key` or the startup error naming it.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.value_for(key)
            .ok_or_else(|| CapabilityError::Config(format!("{key} is not set")))
    }

    pub fn validate(&self, profile: AgentProfile) -> Result<()> {
        for key in profile.required_keys() {
            self.require(key)?;
        }
        Ok(())
    }

    pub fn openserv_api_url(&self) -> &str {
        self.value_for(OPENSERV_API_URL)
            .unwrap_or(DEFAULT_OPENSERV_API_URL)
    }

    pub fn perplexity_api_url(&self) -> &str {
        self.value_for(PERPLEXITY_API_URL)
            .unwrap_or(DEFAULT_PERPLEXITY_API_URL)
    }

    pub fn cluster(&self) -> &str {
        self.value_for(SOLANA_CLUSTER).unwrap_or(DEFAULT_CLUSTER)
    }

    pub fn bind_host(&self) -> &str {
        self.value_for(HOST).unwrap_or(DEFAULT_HOST)
    }

    pub fn bind_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.value_for(AGENT_AUTH_TOKEN)
    }

    /// Configured tokens, or USDC when none are listed.
    pub fn tokens(&self) -> Vec<TokenConfig> {
        if self.tokens.is_empty() {
            vec![TokenConfig::usdc()]
        } else {
            self.tokens.clone()
        }
    }
}
