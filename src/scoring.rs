use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chain::{self, ChainClients, SupplyLookup};
use crate::config::ProofConfig;
use crate::types::{Chain, ScoredRecord, SubmittedRecord};

/// Fixed vocabulary of marketing/technical attributes. A record must claim
/// at least one of these to qualify for authenticity scoring.
pub const QUALIFYING_ATTRIBUTES: [&str; 9] = [
    "momentum-surge",
    "high-liquidity",
    "utility-driven",
    "backed-by-major-investors",
    "community-powered",
    "verified-contracts",
    "disruptive-tech",
    "major-integrations",
    "limited-supply",
];

/// Fixed category taxonomy. A record carrying a category outside this list
/// is rejected outright, the same as an unknown chain.
pub const CATEGORY_TAXONOMY: [&str; 8] = [
    "meme",
    "defi",
    "gaming",
    "ai",
    "infrastructure",
    "stablecoin",
    "nft",
    "rwa",
];

/// Text-quality heuristic. The default grades reason and suggestion text
/// separately; the bucketed variant serves the older reason-only schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityPolicy {
    /// +0.5 for reason text over 10 chars, +0.5 for suggestion text over
    /// 10 chars, both gated on non-zero authenticity.
    ReasonAndSuggestion,
    /// Length buckets over the reason text only.
    ReasonBuckets,
}

impl QualityPolicy {
    pub fn from_env_name(name: Option<&str>) -> Self {
        match name.map(|n| n.to_lowercase()).as_deref() {
            Some("buckets") | Some("reason_buckets") => QualityPolicy::ReasonBuckets,
            _ => QualityPolicy::ReasonAndSuggestion,
        }
    }

    fn score_text(&self, record: &SubmittedRecord) -> f64 {
        match self {
            QualityPolicy::ReasonAndSuggestion => {
                let mut quality: f64 = 0.0;
                if record.reason_text.trim().len() > 10 {
                    quality += 0.5;
                }
                if record
                    .suggestion_text
                    .as_deref()
                    .map(|s| s.trim().len() > 10)
                    .unwrap_or(false)
                {
                    quality += 0.5;
                }
                quality.clamp(0.0, 1.0)
            }
            QualityPolicy::ReasonBuckets => match record.reason_text.trim().len() {
                len if len >= 30 => 1.0,
                15..=28 => 0.5,
                6..=13 => 0.1,
                _ => 0.0,
            },
        }
    }
}

fn has_qualifying_attribute(record: &SubmittedRecord) -> bool {
    record
        .attribute_tags
        .iter()
        .any(|tag| QUALIFYING_ATTRIBUTES.contains(&tag.to_lowercase().as_str()))
}

fn category_allowed(record: &SubmittedRecord) -> bool {
    match record.category.as_deref() {
        Some(category) => CATEGORY_TAXONOMY.contains(&category.to_lowercase().as_str()),
        None => true,
    }
}

fn address_format_valid(chain: Chain, address: &str) -> bool {
    if chain.is_evm() {
        chain::is_valid_evm_address(address)
    } else {
        chain::is_valid_solana_address(address)
    }
}

/// Validate a record against the chain allow-list, category taxonomy and
/// address format. Returns the parsed chain, or `None` when the record is
/// rejected (excluded from scoring, not scored zero).
pub fn admit_record(record: &SubmittedRecord) -> Option<Chain> {
    let chain = match Chain::from_str(&record.chain) {
        Some(chain) => chain,
        None => {
            debug!("rejecting record: unknown chain {:?}", record.chain);
            return None;
        }
    };
    if !category_allowed(record) {
        debug!("rejecting record: category {:?} outside taxonomy", record.category);
        return None;
    }
    if !address_format_valid(chain, &record.contract_address) {
        debug!(
            "rejecting record: bad {} address {:?}",
            chain.as_str(),
            record.contract_address
        );
        return None;
    }
    Some(chain)
}

/// Score one admitted record. Pure given its inputs, except for the chain
/// lookup used when the record carries no metrics bundle.
pub async fn score_record(
    config: &ProofConfig,
    clients: &ChainClients,
    record: &SubmittedRecord,
    record_index: usize,
) -> Option<ScoredRecord> {
    let chain = admit_record(record)?;

    let authenticity = if !has_qualifying_attribute(record) {
        0.0
    } else if record.metrics.is_some() {
        config.metrics_policy.validate(record.metrics.as_ref())
    } else {
        // Bare chain+contract submission: fall back to an on-chain
        // existence check.
        let lookup =
            chain::lookup_total_supply(clients, config, chain, &record.contract_address).await;
        supply_authenticity(&lookup, record, chain)
    };

    // Quality is gated by authenticity under every policy.
    let quality = if authenticity > 0.0 {
        config.quality_policy.score_text(record)
    } else {
        0.0
    };

    info!(
        "scored record {} ({} on {}): authenticity {} quality {}",
        record_index,
        record.contract_address,
        chain.as_str(),
        authenticity,
        quality
    );

    Some(ScoredRecord {
        record_index,
        authenticity,
        quality,
    })
}

fn supply_authenticity(lookup: &SupplyLookup, record: &SubmittedRecord, chain: Chain) -> f64 {
    if lookup.is_defaulted() {
        debug!(
            "supply lookup defaulted for {} on {}",
            record.contract_address,
            chain.as_str()
        );
    }
    if lookup.supply() > 0 {
        1.0
    } else {
        0.0
    }
}
