use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Chain {
    Eth,
    Base,
    Vana,
    Solana,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Eth => "eth",
            Chain::Base => "base",
            Chain::Vana => "vana",
            Chain::Solana => "solana",
        }
    }

    /// Case-insensitive lookup against the chain allow-list. Anything
    /// outside the list is a rejection, not an error.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eth" | "ethereum" => Some(Chain::Eth),
            "base" => Some(Chain::Base),
            "vana" => Some(Chain::Vana),
            "solana" | "sol" => Some(Chain::Solana),
            _ => None,
        }
    }

    pub fn is_evm(&self) -> bool {
        !matches!(self, Chain::Solana)
    }

    pub fn all() -> [Chain; 4] {
        [Chain::Eth, Chain::Base, Chain::Vana, Chain::Solana]
    }
}

/// Numeric metrics bundle attached to richer submissions. Every field is
/// optional so a missing or mistyped value downgrades the score instead of
/// failing deserialization of the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetrics {
    pub price: Option<f64>,
    #[serde(rename = "marketCap", alias = "market_cap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "volume24h", alias = "volume_24h")]
    pub volume_24h: Option<f64>,
    #[serde(rename = "circulatingSupply", alias = "circulating_supply")]
    pub circulating_supply: Option<f64>,
    #[serde(rename = "volatility24h", alias = "volatility_24h")]
    pub volatility_24h: Option<f64>,
    #[serde(rename = "riskScore", alias = "risk_score")]
    pub risk_score: Option<f64>,
}

/// One claimed contribution: a token recommendation tied to a chain and
/// contract address, with free-text justification and optional metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmittedRecord {
    #[serde(default)]
    pub chain: String,
    #[serde(rename = "contract", alias = "contractAddress", default)]
    pub contract_address: String,
    #[serde(rename = "reason", alias = "reason_recommend", default)]
    pub reason_text: String,
    #[serde(rename = "suggestion", alias = "suggestionText", default)]
    pub suggestion_text: Option<String>,
    #[serde(rename = "attributes", alias = "attributeTags", default)]
    pub attribute_tags: Vec<String>,
    #[serde(default)]
    pub metrics: Option<TokenMetrics>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Everything parsed from one input directory. Immutable after parsing and
/// owned exclusively by the pipeline run.
#[derive(Debug, Clone, Default)]
pub struct SubmissionBundle {
    /// Email claimed inside the submitted data, if any.
    pub claimed_email: Option<String>,
    /// Wallet address claimed inside the submitted data, if any.
    pub claimed_wallet: Option<String>,
    /// Author line parsed from a companion signed attestation file, if any.
    pub attestation_author: Option<String>,
    pub records: Vec<SubmittedRecord>,
}

/// Per-record output of the scorer. Keeps an index back into the bundle's
/// record list for lookup only.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record_index: usize,
    pub authenticity: f64,
    pub quality: f64,
}

/// Final report, built once by the aggregator and serialized verbatim as
/// `results.json`. The field set is the write-side contract for downstream
/// on-chain submission and must stay stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofResult {
    pub dlp_id: u64,
    pub ownership: f64,
    pub authenticity: f64,
    pub quality: f64,
    pub uniqueness: f64,
    pub score: f64,
    pub valid: bool,
    pub attributes: BTreeMap<String, serde_json::Value>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_from_str_is_case_insensitive() {
        assert_eq!(Chain::from_str("Eth"), Some(Chain::Eth));
        assert_eq!(Chain::from_str("SOLANA"), Some(Chain::Solana));
        assert_eq!(Chain::from_str("base"), Some(Chain::Base));
        assert_eq!(Chain::from_str("dogecoin"), None);
    }

    #[test]
    fn record_accepts_both_schema_spellings() {
        let rich: SubmittedRecord = serde_json::from_str(
            r#"{
                "chain": "eth",
                "contractAddress": "0xdAC17F958D2ee523a2206206994597C13D831ec7",
                "reason_recommend": "strong fundamentals",
                "attributeTags": ["momentum-surge"],
                "metrics": {"price": 1.0, "marketCap": 100.0}
            }"#,
        )
        .unwrap();
        assert_eq!(rich.chain, "eth");
        assert_eq!(rich.attribute_tags, vec!["momentum-surge"]);
        assert_eq!(rich.metrics.as_ref().unwrap().market_cap, Some(100.0));

        let flat: SubmittedRecord = serde_json::from_str(
            r#"{"chain": "Solana", "contract": "abc", "reason": "short"}"#,
        )
        .unwrap();
        assert_eq!(flat.contract_address, "abc");
        assert!(flat.metrics.is_none());
    }
}
