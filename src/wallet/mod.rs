use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use tracing::info;
use zeroize::Zeroizing;

use crate::error::{CapabilityError, Result};
use crate::interfaces::wallet::{Balance, ChainInfo, WalletClient};
use crate::solana_rpc::{self, format_units, SOL_DECIMALS};

pub const NATIVE_SYMBOL: &str = "SOL";

/// Accepts a base58 32-byte seed, a base58 64-byte keypair, or a JSON byte array
/// as written by the Solana CLI.
pub fn decode_secret(secret: &str) -> Result<Zeroizing<[u8; 32]>> {
    let trimmed = secret.trim();
    let bytes: Zeroizing<Vec<u8>> = if trimmed.starts_with('[') {
        Zeroizing::new(
            serde_json::from_str::<Vec<u8>>(trimmed)
                .map_err(|_| CapabilityError::Config("invalid wallet key byte array".to_string()))?,
        )
    } else {
        Zeroizing::new(
            bs58::decode(trimmed)
                .into_vec()
                .map_err(|_| CapabilityError::Config("invalid base58 wallet key".to_string()))?,
        )
    };

    if bytes.len() != 32 && bytes.len() != 64 {
        return Err(CapabilityError::Config(
            "wallet key must be a 32-byte seed or a 64-byte keypair".to_string(),
        ));
    }
    let mut seed = Zeroizing::new([0u8; 32]);
    seed.copy_from_slice(&bytes[..32]);
    Ok(seed)
}

/// Signing wallet backed by a Solana JSON-RPC endpoint.
pub struct SolanaWallet {
    seed: Zeroizing<[u8; 32]>,
    address: String,
    endpoint: String,
    cluster: String,
}

impl SolanaWallet {
    pub fn from_secret(secret: &str, endpoint: &str, cluster: &str) -> Result<Self> {
        let seed = decode_secret(secret)?;
        let key = SigningKey::from_bytes(&seed);
        let address = bs58::encode(key.verifying_key().to_bytes()).into_string();
        Ok(Self {
            seed,
            address,
            endpoint: endpoint.trim().to_string(),
            cluster: cluster.to_string(),
        })
    }

    pub async fn send_sol(&self, to: &str, lamports: u64) -> Result<String> {
        let blockhash = solana_rpc::get_latest_blockhash(&self.endpoint).await?;
        let (tx, from) =
            solana_rpc::build_transfer_transaction_base64(&self.seed, to, lamports, &blockhash)?;
        let signature = solana_rpc::send_transaction(&self.endpoint, &tx).await?;
        info!(from = %from, to = %to, lamports, signature = %signature, "native transfer submitted");
        Ok(signature)
    }

    /// Moves `amount` base units of `mint` between the first token accounts of the
    /// wallet and of `to`.
    pub async fn send_token(&self, mint: &str, to: &str, amount: u64) -> Result<String> {
        let source = self.first_token_account(&self.address, mint).await?;
        let destination = self.first_token_account(to, mint).await?;
        if source.amount < amount {
            return Err(CapabilityError::Runtime(format!(
                "insufficient token balance: have {}, need {}",
                source.amount, amount
            )));
        }

        let blockhash = solana_rpc::get_latest_blockhash(&self.endpoint).await?;
        let (tx, from) = solana_rpc::build_spl_transfer_transaction_base64(
            &self.seed,
            &source.address,
            mint,
            &destination.address,
            amount,
            source.decimals,
            &blockhash,
        )?;
        let signature = solana_rpc::send_transaction(&self.endpoint, &tx).await?;
        info!(from = %from, to = %to, mint = %mint, amount, signature = %signature, "token transfer submitted");
        Ok(signature)
    }

    pub async fn token_balance(&self, owner: &str, mint: &str) -> Result<(u64, Option<u8>)> {
        let accounts = solana_rpc::get_token_accounts_by_owner(&self.endpoint, owner, mint).await?;
        let total = accounts.iter().map(|account| account.amount).sum();
        Ok((total, accounts.first().map(|account| account.decimals)))
    }

    async fn first_token_account(
        &self,
        owner: &str,
        mint: &str,
    ) -> Result<solana_rpc::TokenAccount> {
        solana_rpc::get_token_accounts_by_owner(&self.endpoint, owner, mint)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                CapabilityError::Runtime(format!("no token account for mint {mint} owned by {owner}"))
            })
    }
}

#[async_trait]
impl WalletClient for SolanaWallet {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn chain(&self) -> ChainInfo {
        ChainInfo {
            kind: "solana".to_string(),
            cluster: self.cluster.clone(),
        }
    }

    async fn balance_of(&self, address: &str) -> Result<Balance> {
        let lamports = solana_rpc::get_balance(&self.endpoint, address).await?;
        Ok(Balance {
            value: format_units(lamports, SOL_DECIMALS),
            symbol: NATIVE_SYMBOL.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_and_keypair_encodings_agree() {
        let seed = [3u8; 32];
        let key = SigningKey::from_bytes(&seed);
        let mut keypair = seed.to_vec();
        keypair.extend_from_slice(&key.verifying_key().to_bytes());

        let from_seed = decode_secret(&bs58::encode(seed).into_string()).unwrap();
        let from_keypair = decode_secret(&bs58::encode(&keypair).into_string()).unwrap();
        let from_json = decode_secret(&serde_json::to_string(&keypair).unwrap()).unwrap();
        assert_eq!(*from_seed, seed);
        assert_eq!(*from_keypair, seed);
        assert_eq!(*from_json, seed);
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(decode_secret("0OIl").is_err());
        assert!(decode_secret(&bs58::encode([1u8; 16]).into_string()).is_err());
        assert!(decode_secret("[1, 2").is_err());
    }

    #[test]
    fn address_is_base58_public_key() {
        let seed = [5u8; 32];
        let wallet =
            SolanaWallet::from_secret(&bs58::encode(seed).into_string(), "http://rpc", "devnet")
                .unwrap();
        let expected = bs58::encode(SigningKey::from_bytes(&seed).verifying_key().to_bytes())
            .into_string();
        assert_eq!(wallet.address(), expected);
        assert_eq!(wallet.chain().cluster, "devnet");
    }
}
