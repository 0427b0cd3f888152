pub mod evm;
pub mod solana;

pub use evm::{is_valid_evm_address, EvmClient};
pub use solana::{is_valid_solana_address, SolanaClient};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::config::ProofConfig;
use crate::types::Chain;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("malformed RPC response: {0}")]
    InvalidResponse(String),
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
    #[error("no RPC endpoint configured for chain {0}")]
    NoEndpoint(String),
}

/// Outcome of a total-supply lookup. External faults never abort the
/// pipeline; they surface here as `Defaulted` so callers (and tests) can
/// tell a genuine zero supply from a downgraded one.
#[derive(Debug, Clone, PartialEq)]
pub enum SupplyLookup {
    Confirmed(u128),
    Defaulted { reason: String },
}

impl SupplyLookup {
    pub fn supply(&self) -> u128 {
        match self {
            SupplyLookup::Confirmed(v) => *v,
            SupplyLookup::Defaulted { .. } => 0,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, SupplyLookup::Defaulted { .. })
    }
}

/// Read-only lookup against one chain family. Implementations validate the
/// address format locally before issuing any network call.
#[async_trait]
pub trait TotalSupplySource: Send + Sync {
    /// Cheap local format check; no network involved.
    fn is_valid_address(&self, address: &str) -> bool;

    async fn total_supply(&self, rpc_url: &str, address: &str) -> Result<u128, ChainError>;
}

/// Long-lived chain clients sharing one HTTP connection pool for the whole
/// pipeline run.
pub struct ChainClients {
    evm: EvmClient,
    solana: SolanaClient,
}

impl ChainClients {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            evm: EvmClient::new(http_client.clone()),
            solana: SolanaClient::new(http_client),
        }
    }

    fn source(&self, chain: Chain) -> &dyn TotalSupplySource {
        if chain.is_evm() {
            &self.evm
        } else {
            &self.solana
        }
    }
}

impl Default for ChainClients {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

/// Dispatch a supply lookup by chain, converting every failure mode into a
/// `SupplyLookup::Defaulted` logged once here at the boundary.
pub async fn lookup_total_supply(
    clients: &ChainClients,
    config: &ProofConfig,
    chain: Chain,
    address: &str,
) -> SupplyLookup {
    let client = clients.source(chain);

    if !client.is_valid_address(address) {
        let e = ChainError::InvalidAddress(format!("{} on {}", address, chain.as_str()));
        return SupplyLookup::Defaulted {
            reason: e.to_string(),
        };
    }

    let rpc_url = match config.rpc_url(chain) {
        Some(url) => url,
        None => {
            let e = ChainError::NoEndpoint(chain.as_str().to_string());
            warn!("{}", e);
            return SupplyLookup::Defaulted {
                reason: e.to_string(),
            };
        }
    };

    match client.total_supply(rpc_url, address).await {
        Ok(supply) => SupplyLookup::Confirmed(supply),
        Err(e) => {
            warn!(
                "supply lookup failed for {} on {}: {}",
                address,
                chain.as_str(),
                e
            );
            SupplyLookup::Defaulted {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaulted_lookup_reads_as_zero() {
        let lookup = SupplyLookup::Defaulted {
            reason: "timeout".into(),
        };
        assert_eq!(lookup.supply(), 0);
        assert!(lookup.is_defaulted());

        let confirmed = SupplyLookup::Confirmed(1000);
        assert_eq!(confirmed.supply(), 1000);
        assert!(!confirmed.is_defaulted());
    }
}
