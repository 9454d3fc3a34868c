use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Balance {
    pub value: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub cluster: String,
}

/// Trusted source of the caller's identity and native balance.
#[async_trait]
pub trait WalletClient: Send + Sync {
    fn address(&self) -> String;
    fn chain(&self) -> ChainInfo;
    async fn balance_of(&self, address: &str) -> Result<Balance>;
}
