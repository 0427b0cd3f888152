use anyhow::Context;
use tracing::{error, info};

use proof_engine::{input, ProofAggregator, ProofConfig};

/// Score one submission: read the input directory, run the pipeline and
/// write `results.json`. Only a missing or empty input directory aborts.
async fn run() -> anyhow::Result<()> {
    let config = ProofConfig::from_env();
    info!(
        "starting proof generation (dlp_id {}, input {})",
        config.dlp_id, config.input_dir
    );

    let bundle = input::read_submission(&config.input_dir)?;
    let result = ProofAggregator::new(&config).aggregate(&bundle).await;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating output directory {}", config.output_dir))?;
    let output_path = std::path::Path::new(&config.output_dir).join("results.json");
    let json = serde_json::to_string_pretty(&result)?;
    std::fs::write(&output_path, json)
        .with_context(|| format!("writing {}", output_path.display()))?;

    info!(
        "proof generation complete: score {} valid {} -> {}",
        result.score,
        result.valid,
        output_path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        error!("proof generation failed: {:#}", e);
        std::process::exit(1);
    }
}
