use std::collections::BTreeMap;

use futures::future::join_all;
use tracing::info;

use crate::chain::ChainClients;
use crate::config::ProofConfig;
use crate::oracle::{self, UniquenessOracle, UniquenessPolicy};
use crate::ownership::OwnershipVerifier;
use crate::scoring;
use crate::types::{ProofResult, ScoredRecord, SubmissionBundle};

/// Reduces a parsed submission into the final proof. The result is built
/// once here as a value; no partially filled report is ever visible to
/// callers.
pub struct ProofAggregator<'a> {
    config: &'a ProofConfig,
    chain_clients: ChainClients,
    oracle: UniquenessOracle,
}

impl<'a> ProofAggregator<'a> {
    pub fn new(config: &'a ProofConfig) -> Self {
        // One HTTP client backs every outbound call for the proof run;
        // clones share the underlying connection pool.
        let http_client = reqwest::Client::new();
        Self {
            config,
            chain_clients: ChainClients::new(http_client.clone()),
            oracle: UniquenessOracle::new(http_client, config.oracle_url.clone()),
        }
    }

    pub async fn aggregate(&self, bundle: &SubmissionBundle) -> ProofResult {
        let ownership = OwnershipVerifier::new(self.config).verify(bundle);

        // Records are independent; score them concurrently against the
        // read-only config.
        let scored: Vec<ScoredRecord> = join_all(
            bundle
                .records
                .iter()
                .enumerate()
                .map(|(i, record)| scoring::score_record(self.config, &self.chain_clients, record, i)),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        let authenticity = average(scored.iter().map(|s| s.authenticity));
        let quality = average(scored.iter().map(|s| s.quality));

        let (uniqueness, uniqueness_factor) = self.uniqueness(bundle, &scored).await;

        let score = combine_score(ownership, authenticity, quality, uniqueness_factor);
        let valid = ownership != 0.0 && score >= 0.0;

        info!(
            "proof: ownership {} authenticity {} quality {} uniqueness {} score {} valid {}",
            ownership, authenticity, quality, uniqueness, score, valid
        );

        let email_verified = match (
            self.config.user_email.as_deref(),
            bundle.claimed_email.as_deref(),
        ) {
            (Some(expected), Some(claimed)) => expected == claimed,
            _ => false,
        };

        let mut attributes = BTreeMap::new();
        attributes.insert("total_score".to_string(), score.into());
        attributes.insert("score_threshold".to_string(), quality.into());
        attributes.insert("email_verified".to_string(), email_verified.into());
        attributes.insert(
            "reward_per_token".to_string(),
            self.config.reward_per_token.into(),
        );

        let mut metadata = BTreeMap::new();
        metadata.insert("dlp_id".to_string(), self.config.dlp_id.into());

        ProofResult {
            dlp_id: self.config.dlp_id,
            ownership,
            authenticity,
            quality,
            uniqueness,
            score,
            valid,
            attributes,
            metadata,
        }
    }

    /// Compute the uniqueness dimension and the factor it contributes to
    /// the combined score. The boolean oracle discounts a repeat to x0.2;
    /// the linear variant scales the score directly.
    async fn uniqueness(
        &self,
        bundle: &SubmissionBundle,
        scored: &[ScoredRecord],
    ) -> (f64, f64) {
        match self.config.uniqueness_policy {
            UniquenessPolicy::Oracle => {
                // One oracle call per submission, keyed on the first scored
                // record's content fingerprint.
                let Some(first) = scored.first().map(|s| &bundle.records[s.record_index]) else {
                    return (0.0, 0.2);
                };
                let identity = bundle
                    .claimed_email
                    .as_deref()
                    .or(bundle.claimed_wallet.as_deref())
                    .unwrap_or_default();
                let fingerprint = oracle::content_fingerprint(
                    identity,
                    &first.chain.to_lowercase(),
                    &first.contract_address,
                );
                let unique = self.oracle.check_unique(&fingerprint).await;
                if unique {
                    (1.0, 1.0)
                } else {
                    (0.0, 0.2)
                }
            }
            UniquenessPolicy::LinearLocal => {
                let qualifying: Vec<_> = scored
                    .iter()
                    .filter(|s| s.authenticity > 0.0)
                    .map(|s| &bundle.records[s.record_index])
                    .collect();
                let score = oracle::linear_uniqueness(&qualifying, self.config);
                (score, score)
            }
        }
    }
}

/// Multiplicative combination: any zeroed dimension collapses the score;
/// a non-unique submission is only discounted through its factor.
fn combine_score(ownership: f64, authenticity: f64, quality: f64, uniqueness_factor: f64) -> f64 {
    quality * uniqueness_factor * ownership * authenticity
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsPolicy;
    use crate::scoring::QualityPolicy;
    use std::collections::HashMap;

    fn test_config() -> ProofConfig {
        ProofConfig {
            dlp_id: 24,
            input_dir: "./input".into(),
            output_dir: "./output".into(),
            user_email: Some("dev@test.com".into()),
            wallet_address: None,
            rpc_endpoints: HashMap::new(),
            // Unreachable endpoint: the oracle fails open in tests.
            oracle_url: "http://127.0.0.1:1/verify".into(),
            max_reward_tokens: 10,
            reward_per_token: 1.0,
            metrics_policy: MetricsPolicy::StrictPresence,
            quality_policy: QualityPolicy::ReasonAndSuggestion,
            uniqueness_policy: UniquenessPolicy::Oracle,
        }
    }

    #[tokio::test]
    async fn empty_record_set_yields_zero_averages() {
        let config = test_config();
        let mut bundle = SubmissionBundle::default();
        bundle.claimed_email = Some("dev@test.com".into());

        let result = ProofAggregator::new(&config).aggregate(&bundle).await;
        assert_eq!(result.ownership, 1.0);
        assert_eq!(result.authenticity, 0.0);
        assert_eq!(result.quality, 0.0);
        assert_eq!(result.score, 0.0);
        // Ownership holds and the score is non-negative.
        assert!(result.valid);
    }

    #[tokio::test]
    async fn unknown_identity_invalidates_proof() {
        let config = test_config();
        let bundle = SubmissionBundle::default();
        let result = ProofAggregator::new(&config).aggregate(&bundle).await;
        assert_eq!(result.ownership, 0.0);
        assert_eq!(result.score, 0.0);
        assert!(!result.valid);
    }

    #[tokio::test]
    async fn reward_rate_is_reported_in_attributes() {
        let mut config = test_config();
        config.reward_per_token = 2.5;
        let mut bundle = SubmissionBundle::default();
        bundle.claimed_email = Some("dev@test.com".into());

        let result = ProofAggregator::new(&config).aggregate(&bundle).await;
        assert_eq!(
            result.attributes.get("reward_per_token"),
            Some(&serde_json::json!(2.5))
        );
    }

    #[test]
    fn combined_score_rises_with_each_dimension() {
        // Raising any one dimension, holding the rest fixed, never lowers
        // the score.
        let base = combine_score(1.0, 0.5, 0.5, 0.2);
        assert!(combine_score(1.0, 0.8, 0.5, 0.2) >= base);
        assert!(combine_score(1.0, 0.5, 0.9, 0.2) >= base);
        assert!(combine_score(1.0, 0.5, 0.5, 1.0) >= base);
    }

    #[test]
    fn zeroed_dimension_collapses_combined_score() {
        assert_eq!(combine_score(0.0, 1.0, 1.0, 1.0), 0.0);
        assert_eq!(combine_score(1.0, 0.0, 1.0, 1.0), 0.0);
        assert_eq!(combine_score(1.0, 1.0, 0.0, 1.0), 0.0);
        // A repeat submission is discounted, not zeroed.
        assert_eq!(combine_score(1.0, 1.0, 1.0, 0.2), 0.2);
    }

    #[test]
    fn average_of_empty_iterator_is_zero() {
        assert_eq!(average(std::iter::empty()), 0.0);
        assert_eq!(average([1.0, 0.0].into_iter()), 0.5);
    }
}
