use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{ChainError, TotalSupplySource};
use crate::config::EXTERNAL_CALL_TIMEOUT;

/// SPL mint account layout constants. The mint layout is 82 bytes; supply
/// sits at bytes 36..44 (little-endian u64), decimals at 44, and the
/// initialized flag at 45.
const MINT_ACCOUNT_LEN: usize = 82;
const SUPPLY_OFFSET: usize = 36;
const DECIMALS_OFFSET: usize = 44;
const INITIALIZED_OFFSET: usize = 45;

/// Solana address format check: 32 to 44 characters that base58-decode to
/// exactly 32 raw bytes.
pub fn is_valid_solana_address(address: &str) -> bool {
    if address.len() < 32 || address.len() > 44 {
        return false;
    }
    match bs58::decode(address).into_vec() {
        Ok(decoded) => decoded.len() == 32,
        Err(_) => false,
    }
}

/// Read-only client for Solana mint accounts via `getAccountInfo`.
pub struct SolanaClient {
    http_client: Client,
}

impl SolanaClient {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Decode a base64 mint account blob into its supply. Structural
    /// violations (short buffer, uninitialized, decimals out of range) are
    /// reported as invalid responses, which the dispatch layer downgrades
    /// to zero supply.
    fn decode_mint_supply(account_data: &[u8]) -> Result<u64, ChainError> {
        if account_data.len() < MINT_ACCOUNT_LEN {
            return Err(ChainError::InvalidResponse(format!(
                "account data too short for a mint: {} bytes",
                account_data.len()
            )));
        }

        let decimals = account_data[DECIMALS_OFFSET];
        let initialized = account_data[INITIALIZED_OFFSET] == 1;
        if !initialized || decimals == 0 || decimals > 18 {
            return Err(ChainError::InvalidResponse(format!(
                "not an initialized mint: init {} decimals {}",
                initialized, decimals
            )));
        }

        let supply_bytes: [u8; 8] = account_data[SUPPLY_OFFSET..SUPPLY_OFFSET + 8]
            .try_into()
            .expect("slice is exactly 8 bytes");
        Ok(u64::from_le_bytes(supply_bytes))
    }
}

impl Default for SolanaClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl TotalSupplySource for SolanaClient {
    fn is_valid_address(&self, address: &str) -> bool {
        is_valid_solana_address(address)
    }

    async fn total_supply(&self, rpc_url: &str, address: &str) -> Result<u128, ChainError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getAccountInfo",
            "params": [address, { "encoding": "base64" }],
        });

        let response = tokio::time::timeout(
            EXTERNAL_CALL_TIMEOUT,
            self.http_client.post(rpc_url).json(&payload).send(),
        )
        .await
        .map_err(|_| ChainError::Timeout(EXTERNAL_CALL_TIMEOUT))??
        .error_for_status()?;

        let body: Value = response.json().await?;
        let account_value = body.pointer("/result/value").ok_or_else(|| {
            ChainError::InvalidResponse("missing result.value field".into())
        })?;
        if account_value.is_null() {
            return Err(ChainError::InvalidResponse(format!(
                "mint account {} not found",
                address
            )));
        }

        let encoded = account_value
            .pointer("/data/0")
            .and_then(|d| d.as_str())
            .ok_or_else(|| ChainError::InvalidResponse("missing account data".into()))?;
        let account_data = BASE64
            .decode(encoded)
            .map_err(|e| ChainError::InvalidResponse(format!("bad base64 account data: {}", e)))?;

        let supply = Self::decode_mint_supply(&account_data)?;
        debug!("{} mint supply {}", address, supply);
        Ok(supply as u128)
    }
}
