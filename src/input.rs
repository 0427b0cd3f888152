use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::ownership::parse_attestation_author;
use crate::types::{SubmissionBundle, SubmittedRecord};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("input directory {0} does not exist")]
    MissingDirectory(String),
    #[error("no input files found in {0}")]
    EmptyDirectory(String),
    #[error("failed to read input directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Walk the input directory and assemble a `SubmissionBundle`.
///
/// A missing or empty directory is the one fatal condition in the whole
/// pipeline. Everything else degrades: unreadable or malformed files are
/// logged and skipped.
pub fn read_submission(input_dir: &str) -> Result<SubmissionBundle, InputError> {
    let dir = Path::new(input_dir);
    if !dir.is_dir() {
        return Err(InputError::MissingDirectory(input_dir.to_string()));
    }

    let mut bundle = SubmissionBundle::default();
    let mut saw_file = false;

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();

    for path in entries {
        if !path.is_file() {
            continue;
        }
        saw_file = true;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("skipping unreadable input file {:?}: {}", path, e);
                continue;
            }
        };

        if name.ends_with(".txt") {
            match parse_attestation_author(&contents) {
                Some(author) => {
                    info!("attestation author: {}", author);
                    bundle.attestation_author = Some(author);
                }
                None => warn!("attestation file {:?} has no author line", path),
            }
            continue;
        }

        // Both JSON payload shapes end in .json; the legacy packaged form
        // keeps its .zip name but carries the same flat JSON payload.
        if name.ends_with(".json") || name == "decrypted_file.zip" {
            match serde_json::from_str::<Value>(&contents) {
                Ok(value) => absorb_json(&mut bundle, &value),
                Err(e) => warn!("skipping malformed JSON file {:?}: {}", path, e),
            }
        }
    }

    if !saw_file {
        return Err(InputError::EmptyDirectory(input_dir.to_string()));
    }

    info!(
        "parsed {} record(s), email claim {:?}, wallet claim {:?}",
        bundle.records.len(),
        bundle.claimed_email,
        bundle.claimed_wallet
    );
    Ok(bundle)
}

/// Fold one parsed JSON document into the bundle. Supported shapes: a bare
/// array of records, an object with a `tokens` array, or the flat
/// single-record form with `email`/`chain`/`contract`/`reason` at top level.
fn absorb_json(bundle: &mut SubmissionBundle, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                push_record(bundle, item);
            }
        }
        Value::Object(map) => {
            if let Some(email) = map.get("email").and_then(|v| v.as_str()) {
                bundle.claimed_email = Some(email.to_string());
            }
            if let Some(wallet) = map
                .get("wallet_address")
                .or_else(|| map.get("walletAddress"))
                .and_then(|v| v.as_str())
            {
                bundle.claimed_wallet = Some(wallet.to_string());
            }
            if let Some(tokens) = map.get("tokens").and_then(|v| v.as_array()) {
                for item in tokens {
                    push_record(bundle, item);
                }
            } else if map.contains_key("chain") || map.contains_key("contract") {
                push_record(bundle, value);
            }
        }
        _ => warn!("ignoring JSON payload that is neither object nor array"),
    }
}

fn push_record(bundle: &mut SubmissionBundle, value: &Value) {
    match serde_json::from_value::<SubmittedRecord>(value.clone()) {
        Ok(record) => bundle.records.push(record),
        Err(e) => warn!("skipping malformed record: {}", e),
    }
}
