use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use solana_system_interface::instruction as system_instruction;

use crate::error::{CapabilityError, Result};

pub const COMMITMENT: &str = "confirmed";
pub const SOL_DECIMALS: u8 = 9;
const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccount {
    pub address: String,
    pub amount: u64,
    pub decimals: u8,
}

fn normalize_rpc_result(value: Value, method: &str) -> Result<Value> {
    if let Some(error) = value.get("error") {
        return Err(CapabilityError::Runtime(format!(
            "solana rpc {method} error: {error}"
        )));
    }

    value
        .get("result")
        .cloned()
        .ok_or_else(|| CapabilityError::Runtime(format!("solana rpc {method} missing result")))
}

pub async fn rpc_call(endpoint: &str, method: &str, params: Value) -> Result<Value> {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });

    let response = reqwest::Client::new()
        .post(endpoint)
        .json(&request)
        .send()
        .await
        .map_err(|e| CapabilityError::Http(format!("solana rpc transport failure: {e}")))?;

    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| CapabilityError::Runtime(format!("solana rpc decode failure: {e}")))?;

    if !status.is_success() {
        return Err(CapabilityError::Integration {
            status: status.as_u16(),
            message: format!("solana rpc http {status}: {body}"),
        });
    }

    normalize_rpc_result(body, method)
}

pub async fn get_balance(endpoint: &str, address: &str) -> Result<u64> {
    let result = rpc_call(
        endpoint,
        "getBalance",
        json!([address, {"commitment": COMMITMENT}]),
    )
    .await?;

    result
        .get("value")
        .and_then(|value| value.as_u64())
        .ok_or_else(|| CapabilityError::Runtime("solana rpc getBalance missing value".to_string()))
}

pub async fn get_latest_blockhash(endpoint: &str) -> Result<String> {
    let result = rpc_call(
        endpoint,
        "getLatestBlockhash",
        json!([{ "commitment": COMMITMENT }]),
    )
    .await?;

    result
        .get("value")
        .and_then(|value| value.get("blockhash"))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .ok_or_else(|| {
            CapabilityError::Runtime("solana rpc getLatestBlockhash missing blockhash".to_string())
        })
}

pub async fn get_token_accounts_by_owner(
    endpoint: &str,
    owner: &str,
    mint: &str,
) -> Result<Vec<TokenAccount>> {
    let result = rpc_call(
        endpoint,
        "getTokenAccountsByOwner",
        json!([owner, {"mint": mint}, {"encoding": "jsonParsed", "commitment": COMMITMENT}]),
    )
    .await?;

    let entries = result
        .get("value")
        .and_then(|value| value.as_array())
        .cloned()
        .unwrap_or_default();

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let address = entry.get("pubkey")?.as_str()?.to_string();
            let amount = entry.pointer("/account/data/parsed/info/tokenAmount")?;
            Some(TokenAccount {
                address,
                amount: amount.get("amount")?.as_str()?.parse().ok()?,
                decimals: u8::try_from(amount.get("decimals")?.as_u64()?).ok()?,
            })
        })
        .collect())
}

pub async fn send_transaction(endpoint: &str, tx_base64: &str) -> Result<String> {
    let result = rpc_call(
        endpoint,
        "sendTransaction",
        json!([tx_base64, {"encoding": "base64", "preflightCommitment": COMMITMENT}]),
    )
    .await?;

    result
        .as_str()
        .map(|signature| signature.to_string())
        .ok_or_else(|| CapabilityError::Runtime("solana rpc sendTransaction missing signature".to_string()))
}

fn parse_pubkey(label: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value)
        .map_err(|e| CapabilityError::Runtime(format!("invalid {label} pubkey: {e}")))
}

fn sign_and_encode(signer: &Keypair, instructions: &[Instruction], blockhash: &str) -> Result<String> {
    let recent_blockhash = Hash::from_str(blockhash)
        .map_err(|e| CapabilityError::Runtime(format!("invalid blockhash: {e}")))?;
    let message = Message::new(instructions, Some(&signer.pubkey()));
    let tx = Transaction::new(&[signer], message, recent_blockhash);

    let bytes = wincode::serialize(&tx)
        .map_err(|e| CapabilityError::Serialization(format!("failed to serialize tx: {e}")))?;
    Ok(STANDARD.encode(bytes))
}

/// Signed native transfer, returned with the sender address.
pub fn build_transfer_transaction_base64(
    from_seed: &[u8; 32],
    to_address: &str,
    lamports: u64,
    latest_blockhash: &str,
) -> Result<(String, String)> {
    let signer = Keypair::new_from_array(*from_seed);
    let destination = parse_pubkey("destination", to_address)?;
    let instructions = [system_instruction::transfer(
        &signer.pubkey(),
        &destination,
        lamports,
    )];
    let tx = sign_and_encode(&signer, &instructions, latest_blockhash)?;
    Ok((tx, signer.pubkey().to_string()))
}

/// Signed SPL `TransferChecked` between two existing token accounts.
pub fn build_spl_transfer_transaction_base64(
    from_seed: &[u8; 32],
    source_token_account: &str,
    mint: &str,
    destination_token_account: &str,
    amount: u64,
    decimals: u8,
    latest_blockhash: &str,
) -> Result<(String, String)> {
    let signer = Keypair::new_from_array(*from_seed);
    let source = parse_pubkey("source token account", source_token_account)?;
    let mint = parse_pubkey("mint", mint)?;
    let destination = parse_pubkey("destination token account", destination_token_account)?;
    let token_program = parse_pubkey("token program", TOKEN_PROGRAM_ID)?;

    // TransferChecked: discriminator 12, amount u64 LE, decimals u8
    let mut data = Vec::with_capacity(10);
    data.push(12u8);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(decimals);

    let instructions = [Instruction {
        program_id: token_program,
        accounts: vec![
            AccountMeta::new(source, false),
            AccountMeta::new_readonly(mint, false),
            AccountMeta::new(destination, false),
            AccountMeta::new_readonly(signer.pubkey(), true),
        ],
        data,
    }];
    let tx = sign_and_encode(&signer, &instructions, latest_blockhash)?;
    Ok((tx, signer.pubkey().to_string()))
}

/// Decimal string for an atomic amount, without trailing zeros.
pub fn format_units(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let scale = 10u128.pow(u32::from(decimals));
    let amount = u128::from(amount);
    let whole = amount / scale;
    let fraction = amount % scale;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{fraction:0width$}", width = usize::from(decimals));
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// Atomic amount for a decimal string; rejects more fraction digits than `decimals`.
pub fn parse_units(raw: &str, decimals: u8) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('-') {
        return None;
    }
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if fraction.len() > usize::from(decimals)
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || (whole.is_empty() && fraction.is_empty())
    {
        return None;
    }
    let scale = 10u64.checked_pow(u32::from(decimals))?;
    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let padded = format!("{fraction:0<width$}", width = usize::from(decimals));
    let fraction: u64 = if padded.is_empty() { 0 } else { padded.parse().ok()? };
    whole.checked_mul(scale)?.checked_add(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_units_trims_zeros() {
        assert_eq!(format_units(1_500_000_000, SOL_DECIMALS), "1.5");
        assert_eq!(format_units(0, SOL_DECIMALS), "0");
        assert_eq!(format_units(5_000_000, 6), "5");
        assert_eq!(format_units(1, 6), "0.000001");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn parse_units_handles_decimals() {
        assert_eq!(parse_units("1.5", SOL_DECIMALS), Some(1_500_000_000));
        assert_eq!(parse_units("0.000001", 6), Some(1));
        assert_eq!(parse_units(".5", 1), Some(5));
        assert_eq!(parse_units("3", 0), Some(3));
        assert_eq!(parse_units("0.0000001", 6), None);
        assert_eq!(parse_units("-1", 6), None);
        assert_eq!(parse_units("abc", 6), None);
        assert_eq!(parse_units(".", 6), None);
    }

    #[test]
    fn rpc_error_is_surfaced() {
        let err = normalize_rpc_result(json!({"error": {"code": -32602}}), "getBalance").unwrap_err();
        assert!(err.to_string().contains("getBalance error"));
        let ok = normalize_rpc_result(json!({"result": 5}), "getBalance").unwrap();
        assert_eq!(ok, json!(5));
    }

    #[test]
    fn transfer_transaction_is_signed_by_seed_owner() {
        let seed = [7u8; 32];
        let destination = Keypair::new_from_array([9u8; 32]).pubkey().to_string();
        let blockhash = Hash::new_from_array([1u8; 32]).to_string();
        let (tx, from) =
            build_transfer_transaction_base64(&seed, &destination, 10, &blockhash).unwrap();
        assert_eq!(from, Keypair::new_from_array(seed).pubkey().to_string());
        assert!(STANDARD.decode(tx).is_ok());

        assert!(build_transfer_transaction_base64(&seed, "not-a-key", 10, &blockhash).is_err());
    }
}
