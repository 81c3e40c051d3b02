use clap::Args;
use serde_json::Value;

use retail_bench_core::peers::{self, PeerInput};

use crate::input;

/// Arguments for synthetic peer cohort generation
#[derive(Args)]
pub struct PeersArgs {
    /// Path to JSON/YAML file with characteristics and current metrics
    #[arg(long)]
    pub input: Option<String>,

    /// Fixed seed for a reproducible cohort
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skew of the revenue variation within a tier band
    #[arg(long)]
    pub skewness: Option<f64>,
}

pub fn run_peers(args: PeersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut peer_input: PeerInput = input::load(&args.input, "peer input")?;
    if args.seed.is_some() {
        peer_input.seed = args.seed;
    }
    if let Some(skewness) = args.skewness {
        peer_input.skewness = skewness;
    }

    let result = peers::synthesize_peer_cohort(&peer_input)?;
    Ok(serde_json::to_value(result)?)
}
