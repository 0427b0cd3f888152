pub mod aggregator;
pub mod chain;
pub mod config;
pub mod input;
pub mod metrics;
pub mod oracle;
pub mod ownership;
pub mod scoring;
pub mod types;

pub use aggregator::ProofAggregator;
pub use config::ProofConfig;
pub use types::{ProofResult, SubmissionBundle, SubmittedRecord};
