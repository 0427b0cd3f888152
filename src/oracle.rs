use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{info, warn};

use crate::config::{ProofConfig, EXTERNAL_CALL_TIMEOUT};
use crate::types::SubmittedRecord;

/// How the uniqueness dimension is computed. The oracle variant asks an
/// external service per content fingerprint; the linear variant scales
/// locally with the number of distinct qualifying records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniquenessPolicy {
    Oracle,
    LinearLocal,
}

impl UniquenessPolicy {
    pub fn from_env_name(name: Option<&str>) -> Self {
        match name.map(|n| n.to_lowercase()).as_deref() {
            Some("linear") | Some("linear_local") => UniquenessPolicy::LinearLocal,
            _ => UniquenessPolicy::Oracle,
        }
    }
}

/// Content fingerprint the oracle is keyed on: SHA-256 over
/// `"{identity}-{chain}-{contract}"`.
pub fn content_fingerprint(identity: &str, chain: &str, contract: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}-{}-{}", identity, chain, contract));
    hex::encode(hasher.finalize())
}

/// Client for the external uniqueness oracle.
///
/// Fail-open by design: a transport fault or malformed body counts as "not
/// a repeat" so a flaky oracle never blocks scoring. Anyone leaning on
/// uniqueness as an anti-fraud control needs to know about this bias.
pub struct UniquenessOracle {
    http_client: Client,
    endpoint: String,
}

impl UniquenessOracle {
    pub fn new(http_client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }

    /// Returns true when the fingerprint has not been seen before.
    pub async fn check_unique(&self, fingerprint: &str) -> bool {
        let payload = serde_json::json!({ "hash": fingerprint });

        let response = match tokio::time::timeout(
            EXTERNAL_CALL_TIMEOUT,
            self.http_client.post(&self.endpoint).json(&payload).send(),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                warn!("uniqueness oracle request failed, treating as unique: {}", e);
                return true;
            }
            Err(_) => {
                warn!(
                    "uniqueness oracle timed out after {:?}, treating as unique",
                    EXTERNAL_CALL_TIMEOUT
                );
                return true;
            }
        };

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("uniqueness oracle returned error status, treating as unique: {}", e);
                return true;
            }
        };

        match response.json::<Value>().await {
            Ok(body) => {
                let already_seen = body.get("data").map(is_truthy).unwrap_or(false);
                info!("oracle fingerprint seen-before: {}", already_seen);
                !already_seen
            }
            Err(e) => {
                warn!("uniqueness oracle body unreadable, treating as unique: {}", e);
                true
            }
        }
    }
}

/// Truthiness of the oracle's `data` field. The service is loosely typed:
/// any present, non-empty, non-zero value counts as "already seen", while
/// absent, null, `false`, `0` and empty values do not.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Local linear uniqueness for multi-record bundles: distinct
/// (chain, contract) pairs among qualifying records, scaled by the reward
/// denominator and clamped to [0, 1].
pub fn linear_uniqueness(records: &[&SubmittedRecord], config: &ProofConfig) -> f64 {
    if config.max_reward_tokens == 0 {
        return 0.0;
    }
    let distinct: HashSet<(String, String)> = records
        .iter()
        .map(|r| {
            (
                r.chain.to_lowercase(),
                r.contract_address.to_lowercase(),
            )
        })
        .collect();
    (distinct.len() as f64 / config.max_reward_tokens as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsPolicy;
    use crate::scoring::QualityPolicy;
    use std::collections::HashMap;

    fn test_config(max_reward_tokens: u64) -> ProofConfig {
        ProofConfig {
            dlp_id: 24,
            input_dir: "./input".into(),
            output_dir: "./output".into(),
            user_email: None,
            wallet_address: None,
            rpc_endpoints: HashMap::new(),
            oracle_url: "http://127.0.0.1:1/verify".into(),
            max_reward_tokens,
            reward_per_token: 1.0,
            metrics_policy: MetricsPolicy::StrictPresence,
            quality_policy: QualityPolicy::ReasonAndSuggestion,
            uniqueness_policy: UniquenessPolicy::Oracle,
        }
    }

    fn record(chain: &str, contract: &str) -> SubmittedRecord {
        SubmittedRecord {
            chain: chain.into(),
            contract_address: contract.into(),
            ..Default::default()
        }
    }

    #[test]
    fn fingerprint_is_stable_sha256_hex() {
        let fp = content_fingerprint("dev@test.com", "eth", "0xabc");
        assert_eq!(fp.len(), 64);
        assert_eq!(fp, content_fingerprint("dev@test.com", "eth", "0xabc"));
        assert_ne!(fp, content_fingerprint("dev@test.com", "eth", "0xdef"));
    }

    #[tokio::test]
    async fn oracle_fails_open_on_unreachable_endpoint() {
        // Nothing listens on port 1; the request errors immediately.
        let oracle = UniquenessOracle::new(Client::new(), "http://127.0.0.1:1/verify");
        assert!(oracle.check_unique("deadbeef").await);
    }

    #[test]
    fn truthiness_follows_loose_oracle_typing() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&serde_json::json!(false)));
        assert!(!is_truthy(&serde_json::json!(0)));
        assert!(!is_truthy(&serde_json::json!("")));
        assert!(!is_truthy(&serde_json::json!([])));
        assert!(!is_truthy(&serde_json::json!({})));

        assert!(is_truthy(&serde_json::json!(true)));
        assert!(is_truthy(&serde_json::json!(1)));
        assert!(is_truthy(&serde_json::json!("seen")));
        assert!(is_truthy(&serde_json::json!(["x"])));
        assert!(is_truthy(&serde_json::json!({"hash": "x"})));
    }

    #[test]
    fn linear_uniqueness_counts_distinct_pairs() {
        let a = record("eth", "0xAAA");
        let a_dup = record("ETH", "0xaaa");
        let b = record("solana", "mint");
        let config = test_config(10);

        let score = linear_uniqueness(&[&a, &a_dup, &b], &config);
        assert!((score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn linear_uniqueness_clamps_to_one() {
        let a = record("eth", "0xAAA");
        let b = record("eth", "0xBBB");
        let c = record("eth", "0xCCC");
        let config = test_config(2);
        assert_eq!(linear_uniqueness(&[&a, &b, &c], &config), 1.0);
        assert_eq!(linear_uniqueness(&[&a], &test_config(0)), 0.0);
    }
}
