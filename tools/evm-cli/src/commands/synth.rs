//! Generate a synthetic pulse sequence.

use std::path::PathBuf;

use evm_core::{Frame, FrameSink};

use crate::frames::PngDirSink;

const BACKGROUND: f32 = 0.5;

#[allow(clippy::too_many_arguments)]
pub fn run(
    output: PathBuf,
    prefix: &str,
    width: usize,
    height: usize,
    frames: usize,
    fps: f64,
    freq: f64,
    amplitude: f64,
) -> anyhow::Result<()> {
    if width == 0 || height == 0 || frames == 0 {
        anyhow::bail!("width, height and frame count must be non-zero");
    }
    if !(fps.is_finite() && fps > 0.0) {
        anyhow::bail!("fps must be positive, got {fps}");
    }

    println!("Writing {frames} synthetic frame(s) to: {}", output.display());
    println!("  Resolution: {width}x{height} @ {fps}fps");
    println!("  Pulse: {freq} Hz, amplitude {amplitude}");

    let mut sink = PngDirSink::create(&output, prefix)?;
    for t in 0..frames {
        sink.write_frame(pulse_frame(width, height, t, fps, freq, amplitude))?;
    }
    sink.finish()?;

    println!("Done.");
    Ok(())
}

/// Gray background with a centered disc whose brightness follows a sine.
pub fn pulse_frame(
    width: usize,
    height: usize,
    t: usize,
    fps: f64,
    freq: f64,
    amplitude: f64,
) -> Frame {
    let phase = 2.0 * std::f64::consts::PI * freq * t as f64 / fps;
    let level = BACKGROUND + (amplitude * phase.sin()) as f32;

    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let radius = width.min(height) as f32 / 4.0;

    let mut frame = Frame::new_fill(width, height, [BACKGROUND; 3]);
    for y in 0..height {
        for x in 0..width {
            let (dx, dy) = (x as f32 - cx, y as f32 - cy);
            if dx * dx + dy * dy <= radius * radius {
                if let Some(px) = frame.get_mut(x, y) {
                    *px = [level; 3];
                }
            }
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disc_pulses_and_background_stays() {
        let peak = pulse_frame(32, 32, 3, 12.0, 1.0, 0.1);
        assert_eq!(peak.get(0, 0), Some(&[BACKGROUND; 3]));
        let center = peak.get(16, 16).unwrap()[0];
        assert!((center - 0.6).abs() < 1e-6);

        let rest = pulse_frame(32, 32, 0, 12.0, 1.0, 0.1);
        assert_eq!(rest.get(16, 16), Some(&[BACKGROUND; 3]));
    }
}
