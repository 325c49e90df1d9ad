use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use signmap::{load_sequence, Config, SignMapBuilder, DEFAULT_REPORT_NAME};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "signmap",
    about = "Consolidate per-frame text detections into prominent sign landmarks"
)]
struct Args {
    /// Sequence directory holding the association list, images and text files
    sequence: PathBuf,

    /// Association list, relative to the sequence directory
    #[arg(long, default_value = "rgb.txt")]
    associations: PathBuf,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where to write the sign report
    #[arg(long, default_value = DEFAULT_REPORT_NAME)]
    report: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    let entries = load_sequence(&args.sequence.join(&args.associations), &args.sequence)?;
    log::info!("Images in the sequence: {}", entries.len());

    let signs = SignMapBuilder::from_config(config).build();
    let start = Instant::now();
    for entry in &entries {
        let frame = signs
            .ingest_image(&entry.image_path, entry.timestamp)
            .with_context(|| format!("processing {}", entry.image_path.display()))?;
        if let Some(frame) = frame {
            log::debug!("Frame {}: {} words", frame.name(), frame.texts().len());
        }
    }
    log::info!(
        "Ingested {} of {} frames into {} signs in {:?}",
        signs.frame_count(),
        entries.len(),
        signs.sign_count(),
        start.elapsed()
    );

    let registry = signs.finish();
    for sign in &registry.signs {
        if let Some(best) = sign.best_sighting() {
            log::debug!(
                "{:?}: {} sightings, best in frame {}",
                sign.canonical(),
                sign.frames().len(),
                best.name()
            );
        }
    }
    registry.write_report(&args.report)?;
    log::info!("Report written to {}", args.report.display());
    Ok(())
}
