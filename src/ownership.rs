use tracing::{debug, info};

use crate::config::ProofConfig;
use crate::types::SubmissionBundle;

/// Confirms the submission is attributable to the configured identity.
/// Every mode degrades to 0 on mismatch or missing data; nothing here can
/// fail the pipeline.
pub struct OwnershipVerifier<'a> {
    config: &'a ProofConfig,
}

impl<'a> OwnershipVerifier<'a> {
    pub fn new(config: &'a ProofConfig) -> Self {
        Self { config }
    }

    /// Returns 1.0 when the bundle's claimed identity matches the
    /// configured one, else 0.0. Emails compare case-sensitively, wallet
    /// addresses case-insensitively. When the bundle carries a signed
    /// attestation, its author line must also match the on-record wallet.
    pub fn verify(&self, bundle: &SubmissionBundle) -> f64 {
        let identity_matches = self.identity_matches(bundle);
        let attestation_ok = self.attestation_matches(bundle);

        let ownership = if identity_matches && attestation_ok {
            1.0
        } else {
            0.0
        };
        info!(
            "ownership {} (identity match {}, attestation ok {})",
            ownership, identity_matches, attestation_ok
        );
        ownership
    }

    fn identity_matches(&self, bundle: &SubmissionBundle) -> bool {
        if let (Some(expected), Some(claimed)) =
            (self.config.user_email.as_deref(), bundle.claimed_email.as_deref())
        {
            return expected == claimed;
        }
        if let (Some(expected), Some(claimed)) = (
            self.config.wallet_address.as_deref(),
            bundle.claimed_wallet.as_deref(),
        ) {
            return expected.eq_ignore_ascii_case(claimed);
        }
        debug!("no identity claim present in bundle or config");
        false
    }

    /// An attestation file is optional; when present its author must match
    /// the wallet claimed in the records.
    fn attestation_matches(&self, bundle: &SubmissionBundle) -> bool {
        match (
            bundle.attestation_author.as_deref(),
            bundle.claimed_wallet.as_deref(),
        ) {
            (Some(author), Some(wallet)) => author.eq_ignore_ascii_case(wallet),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// Parse a signed attestation of `key: value` lines and return the author
/// value. Missing key or malformed lines yield `None` rather than an error;
/// the verifier treats that as ownership 0.
pub fn parse_attestation_author(contents: &str) -> Option<String> {
    for line in contents.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if key.trim().eq_ignore_ascii_case("author") {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricsPolicy;
    use crate::oracle::UniquenessPolicy;
    use crate::scoring::QualityPolicy;
    use std::collections::HashMap;

    fn config_with(email: Option<&str>, wallet: Option<&str>) -> ProofConfig {
        ProofConfig {
            dlp_id: 24,
            input_dir: "./input".into(),
            output_dir: "./output".into(),
            user_email: email.map(String::from),
            wallet_address: wallet.map(String::from),
            rpc_endpoints: HashMap::new(),
            oracle_url: "http://127.0.0.1:1/verify".into(),
            max_reward_tokens: 10,
            reward_per_token: 1.0,
            metrics_policy: MetricsPolicy::StrictPresence,
            quality_policy: QualityPolicy::ReasonAndSuggestion,
            uniqueness_policy: UniquenessPolicy::Oracle,
        }
    }

    #[test]
    fn email_match_is_case_sensitive() {
        let config = config_with(Some("dev@test.com"), None);
        let verifier = OwnershipVerifier::new(&config);

        let mut bundle = SubmissionBundle::default();
        bundle.claimed_email = Some("dev@test.com".into());
        assert_eq!(verifier.verify(&bundle), 1.0);

        bundle.claimed_email = Some("Dev@Test.com".into());
        assert_eq!(verifier.verify(&bundle), 0.0);
    }

    #[test]
    fn wallet_match_is_case_insensitive() {
        let config = config_with(None, Some("0x418C36a32B9A0ec93d5f613FFA92DA1474612E26"));
        let verifier = OwnershipVerifier::new(&config);

        let mut bundle = SubmissionBundle::default();
        bundle.claimed_wallet = Some("0x418c36a32b9a0ec93d5f613ffa92da1474612e26".into());
        assert_eq!(verifier.verify(&bundle), 1.0);

        bundle.claimed_wallet = Some("0x0000000000000000000000000000000000000000".into());
        assert_eq!(verifier.verify(&bundle), 0.0);
    }

    #[test]
    fn missing_identity_claim_is_zero() {
        let config = config_with(Some("dev@test.com"), None);
        let verifier = OwnershipVerifier::new(&config);
        assert_eq!(verifier.verify(&SubmissionBundle::default()), 0.0);
    }

    #[test]
    fn attestation_author_must_match_wallet() {
        let config = config_with(None, Some("0xABC0000000000000000000000000000000000abc"));
        let verifier = OwnershipVerifier::new(&config);

        let mut bundle = SubmissionBundle::default();
        bundle.claimed_wallet = Some("0xabc0000000000000000000000000000000000ABC".into());
        bundle.attestation_author = Some("0xABC0000000000000000000000000000000000abc".into());
        assert_eq!(verifier.verify(&bundle), 1.0);

        bundle.attestation_author = Some("0xsomebody-else".into());
        assert_eq!(verifier.verify(&bundle), 0.0);
    }

    #[test]
    fn attestation_parsing_is_lenient() {
        assert_eq!(
            parse_attestation_author("signed: yes\nauthor: 0xABC\n"),
            Some("0xABC".to_string())
        );
        assert_eq!(
            parse_attestation_author("Author:   0xDEF  "),
            Some("0xDEF".to_string())
        );
        assert_eq!(parse_attestation_author("no structured lines here"), None);
        assert_eq!(parse_attestation_author("author:"), None);
        assert_eq!(parse_attestation_author(""), None);
    }
}
