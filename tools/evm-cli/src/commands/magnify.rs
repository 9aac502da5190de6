//! Magnify a PNG frame sequence.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evm_common::error::{EvmError, EvmResult};
use evm_core::{
    ColorParams, EvmConfig, EvmPipeline, MagnifyMode, ModeKind, MotionParams, RunSummary,
};

use crate::frames::{PngDirSink, PngDirSource};

/// Command-line values that replace fields of the base configuration.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub mode: Option<ModeKind>,
    pub levels: Option<usize>,
    pub alpha: Option<f64>,
    pub lambda_c: Option<f64>,
    pub r1: Option<f64>,
    pub r2: Option<f64>,
    pub fl: Option<f64>,
    pub fh: Option<f64>,
    pub chrom_attenuation: Option<f64>,
}

pub async fn run(
    input: PathBuf,
    output: PathBuf,
    fps: f64,
    prefix: &str,
    config_path: Option<PathBuf>,
    overrides: Overrides,
) -> anyhow::Result<()> {
    let base = match config_path {
        Some(path) => load_config(&path)?,
        None => EvmConfig::default_for(overrides.mode.unwrap_or(ModeKind::Motion)),
    };
    let config = apply_overrides(base, &overrides)?;

    let mut source = PngDirSource::open(&input, fps)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", input.display()))?;
    if source.is_empty() {
        anyhow::bail!("No PNG frames found in {}", input.display());
    }
    let mut sink = PngDirSink::create(&output, prefix)?;

    println!("Magnifying {} frame(s) from: {}", source.len(), input.display());
    println!("  Output: {}", output.display());
    println!("  Mode: {}", config.mode.kind());
    println!(
        "  Levels: {}, alpha: {}, lambda_c: {}, chroma: {}",
        config.levels, config.alpha, config.lambda_c, config.chrom_attenuation
    );
    match config.mode {
        MagnifyMode::Motion(MotionParams { r1, r2 }) => println!("  IIR rates: r1={r1}, r2={r2}"),
        MagnifyMode::Color(ColorParams { fl, fh }) => {
            println!("  Band: {fl}-{fh} Hz @ {fps} fps");
            println!("  Color mode reads the whole sequence before writing output.");
        }
    }
    println!("Press Ctrl+C to stop...");
    println!();

    let stop = Arc::new(AtomicBool::new(false));
    let signal_stop = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, stopping after the current frame");
            signal_stop.store(true, Ordering::Relaxed);
        }
    });

    let result = tokio::task::spawn_blocking(move || -> EvmResult<RunSummary> {
        let mut pipeline = EvmPipeline::new(config)?;
        pipeline.run(&mut source, &mut sink, &stop)
    })
    .await?;

    match result {
        Ok(summary) => {
            println!(
                "Done: {} frame(s) at {}x{} written to {}",
                summary.frames_out,
                summary.width,
                summary.height,
                output.display()
            );
            Ok(())
        }
        Err(EvmError::Cancelled { frames_processed }) => {
            println!("Stopped after {frames_processed} frame(s); output is partial.");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Magnification failed: {e}")),
    }
}

fn load_config(path: &Path) -> anyhow::Result<EvmConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    EvmConfig::from_json(&content)
        .map_err(|e| anyhow::anyhow!("Invalid config {}: {e}", path.display()))
}

/// Merge flags into `base`. Switching mode starts from that mode's defaults.
pub fn apply_overrides(base: EvmConfig, o: &Overrides) -> anyhow::Result<EvmConfig> {
    let mut config = base;
    if let Some(kind) = o.mode {
        if kind != config.mode.kind() {
            config.mode = EvmConfig::default_for(kind).mode;
        }
    }

    if let Some(levels) = o.levels {
        config.levels = levels;
    }
    if let Some(alpha) = o.alpha {
        config.alpha = alpha;
    }
    if let Some(lambda_c) = o.lambda_c {
        config.lambda_c = lambda_c;
    }
    if let Some(chrom) = o.chrom_attenuation {
        config.chrom_attenuation = chrom;
    }

    match &mut config.mode {
        MagnifyMode::Motion(params) => {
            if o.fl.is_some() || o.fh.is_some() {
                anyhow::bail!("--fl/--fh apply to color mode only");
            }
            params.r1 = o.r1.unwrap_or(params.r1);
            params.r2 = o.r2.unwrap_or(params.r2);
        }
        MagnifyMode::Color(params) => {
            if o.r1.is_some() || o.r2.is_some() {
                anyhow::bail!("--r1/--r2 apply to motion mode only");
            }
            params.fl = o.fl.unwrap_or(params.fl);
            params.fh = o.fh.unwrap_or(params.fh);
        }
    }

    config.validate()?;
    Ok(config)
}
