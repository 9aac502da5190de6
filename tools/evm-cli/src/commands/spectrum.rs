//! Inspect the temporal spectrum of one pixel.

use std::path::PathBuf;

use evm_core::temporal::{bin_frequency, dominant_frequency, spectrum_magnitude};
use evm_core::{ColorSpaceConverter, FrameSource};

use crate::frames::PngDirSource;

pub fn run(input: PathBuf, x: usize, y: usize, fps: f64) -> anyhow::Result<()> {
    let mut source = PngDirSource::open(&input, fps)
        .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", input.display()))?;
    let converter = ColorSpaceConverter::new();

    let mut series = Vec::with_capacity(source.len());
    while let Some(frame) = source.next_frame()? {
        let px = frame.get(x, y).ok_or_else(|| {
            anyhow::anyhow!(
                "Pixel ({x}, {y}) is outside the {}x{} frame",
                frame.width(),
                frame.height()
            )
        })?;
        series.push(converter.forward_pixel(px)[0]);
    }
    if series.len() < 2 {
        anyhow::bail!("Need at least 2 frames, found {}", series.len());
    }

    let n = series.len();
    println!("Luma spectrum of pixel ({x}, {y}) over {n} frame(s) @ {fps}fps:");
    let magnitude = spectrum_magnitude(&series);
    for (k, m) in magnitude.iter().enumerate().take(n / 2 + 1) {
        let bar = "#".repeat((m * 40.0).round() as usize);
        println!("  {:>8.3} Hz  {m:.3}  {bar}", bin_frequency(k, n, fps));
    }

    match dominant_frequency(&series, fps) {
        Some(f) => println!("Dominant frequency: {f:.3} Hz"),
        None => println!("Dominant frequency: none"),
    }
    Ok(())
}
