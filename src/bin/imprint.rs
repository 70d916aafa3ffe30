use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use imprint::{BatchOpts, BatchSpec, Registry, VariationStep, run_batch};
use tracing_subscriber::EnvFilter;

/// Generate image variations: text overlays plus one output per
/// configured operation.
#[derive(Debug, Parser)]
#[command(name = "imprint", version)]
struct Cli {
    /// Batch configuration document (JSON).
    config: PathBuf,

    /// Number of variation indices to produce.
    #[arg(short = 'n', default_value_t = 10)]
    count: u32,

    /// Variation steps document (JSON); without it only baselines are written.
    #[arg(short = 't', value_name = "PATH")]
    steps: Option<PathBuf>,

    /// Master seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let spec = read_batch_spec(&cli.config)?;
    let steps = match &cli.steps {
        Some(path) => read_variation_steps(path)?,
        None => {
            tracing::info!("no variation document given, producing baselines only");
            Vec::new()
        }
    };

    let compiled = Registry::new().compile_batch(&steps)?;
    let stats = run_batch(
        &spec,
        &compiled,
        BatchOpts {
            count: cli.count,
            seed: cli.seed,
        },
    )?;

    eprintln!("wrote {} files under {}", stats.files_written, spec.out_folder);
    Ok(())
}

fn read_batch_spec(path: &Path) -> anyhow::Result<BatchSpec> {
    let file = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
    let spec = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse config '{}'", path.display()))?;
    Ok(spec)
}

fn read_variation_steps(path: &Path) -> anyhow::Result<Vec<VariationStep>> {
    let file = File::open(path).with_context(|| format!("open variations '{}'", path.display()))?;
    let steps = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse variations '{}'", path.display()))?;
    Ok(steps)
}
