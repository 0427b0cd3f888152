use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{ChainError, TotalSupplySource};
use crate::config::EXTERNAL_CALL_TIMEOUT;

/// ERC-20 `totalSupply()` function selector.
const TOTAL_SUPPLY_SELECTOR: &str = "0x18160ddd";

/// EVM address format check: exactly 42 characters with a `0x` prefix,
/// case-insensitive. No checksum validation; the chain call is the real
/// existence test.
pub fn is_valid_evm_address(address: &str) -> bool {
    address.len() == 42 && address.to_lowercase().starts_with("0x")
}

/// Read-only client for the EVM family (eth, base, vana). One `eth_call`
/// per lookup, no retries; the caller treats any fault as zero supply.
/// Holds a shared `reqwest::Client` so all lookups reuse one pool.
pub struct EvmClient {
    http_client: Client,
}

impl EvmClient {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }

    /// Parse the hex quantity an `eth_call` returns. Empty return data
    /// (`"0x"`) means the contract answered with nothing, treated as zero.
    fn parse_supply_hex(hex_value: &str) -> Result<u128, ChainError> {
        let trimmed = hex_value.trim_start_matches("0x");
        if trimmed.is_empty() {
            return Ok(0);
        }
        // A 256-bit supply that overflows u128 is not a value any real
        // token carries; reject it as malformed rather than truncate.
        u128::from_str_radix(trimmed, 16)
            .map_err(|_| ChainError::InvalidResponse(format!("bad hex quantity: {}", hex_value)))
    }
}

impl Default for EvmClient {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl TotalSupplySource for EvmClient {
    fn is_valid_address(&self, address: &str) -> bool {
        is_valid_evm_address(address)
    }

    async fn total_supply(&self, rpc_url: &str, address: &str) -> Result<u128, ChainError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                { "to": address, "data": TOTAL_SUPPLY_SELECTOR },
                "latest",
            ],
            "id": 1,
        });

        let response = tokio::time::timeout(
            EXTERNAL_CALL_TIMEOUT,
            self.http_client.post(rpc_url).json(&payload).send(),
        )
        .await
        .map_err(|_| ChainError::Timeout(EXTERNAL_CALL_TIMEOUT))??
        .error_for_status()?;

        let body: Value = response.json().await?;
        let result = body
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| ChainError::InvalidResponse("missing result field".into()))?;

        let supply = Self::parse_supply_hex(result)?;
        debug!("{} totalSupply {}", address, supply);
        Ok(supply)
    }
}
