use std::collections::HashMap;
use std::time::Duration;

use crate::metrics::MetricsPolicy;
use crate::oracle::UniquenessPolicy;
use crate::scoring::QualityPolicy;
use crate::types::Chain;

/// Shared timeout for every external call (chain RPC and uniqueness oracle).
pub const EXTERNAL_CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Runtime configuration for one pipeline invocation, sourced from the
/// environment. RPC endpoints are injected here rather than hardcoded in the
/// chain clients so tests and deployments can point them anywhere.
#[derive(Debug, Clone)]
pub struct ProofConfig {
    pub dlp_id: u64,
    pub input_dir: String,
    pub output_dir: String,
    /// Identity the submitter claims (email or wallet, depending on schema).
    pub user_email: Option<String>,
    pub wallet_address: Option<String>,
    pub rpc_endpoints: HashMap<Chain, String>,
    pub oracle_url: String,
    /// Denominator for the linear uniqueness variant.
    pub max_reward_tokens: u64,
    /// Reward unit granted per qualifying token; reported to the caller,
    /// not used inside the scoring math.
    pub reward_per_token: f64,
    pub metrics_policy: MetricsPolicy,
    pub quality_policy: QualityPolicy,
    pub uniqueness_policy: UniquenessPolicy,
}

impl ProofConfig {
    /// Load configuration from environment variables, falling back to
    /// public defaults for anything unset.
    pub fn from_env() -> Self {
        let mut rpc_endpoints = HashMap::new();
        rpc_endpoints.insert(
            Chain::Eth,
            std::env::var("ETH_RPC_URL")
                .unwrap_or_else(|_| "https://cloudflare-eth.com".to_string()),
        );
        rpc_endpoints.insert(
            Chain::Base,
            std::env::var("BASE_RPC_URL")
                .unwrap_or_else(|_| "https://mainnet.base.org".to_string()),
        );
        rpc_endpoints.insert(
            Chain::Vana,
            std::env::var("VANA_RPC_URL")
                .unwrap_or_else(|_| "https://rpc.vana.org".to_string()),
        );
        rpc_endpoints.insert(
            Chain::Solana,
            std::env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
        );

        Self {
            dlp_id: std::env::var("DLP_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            input_dir: std::env::var("INPUT_DIR").unwrap_or_else(|_| "/input".to_string()),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "/output".to_string()),
            user_email: std::env::var("USER_EMAIL").ok(),
            wallet_address: std::env::var("WALLET_ADDRESS").ok(),
            rpc_endpoints,
            oracle_url: std::env::var("ORACLE_URL")
                .unwrap_or_else(|_| "https://deoracle.io/api/token/verify".to_string()),
            max_reward_tokens: std::env::var("MAX_REWARD_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            reward_per_token: std::env::var("REWARD_PER_TOKEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            metrics_policy: MetricsPolicy::from_env_name(
                std::env::var("METRICS_POLICY").ok().as_deref(),
            ),
            quality_policy: QualityPolicy::from_env_name(
                std::env::var("QUALITY_POLICY").ok().as_deref(),
            ),
            uniqueness_policy: UniquenessPolicy::from_env_name(
                std::env::var("UNIQUENESS_POLICY").ok().as_deref(),
            ),
        }
    }

    pub fn rpc_url(&self, chain: Chain) -> Option<&str> {
        self.rpc_endpoints.get(&chain).map(|s| s.as_str())
    }
}
