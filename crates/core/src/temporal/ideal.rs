//! Batch band-pass: rectangular mask in the temporal frequency domain.
//!
//! Every (pixel, channel) time series of a [`TemporalStack`] is transformed
//! with an N-point DFT, bins outside `[fl, fh]` are zeroed, and the real part
//! of the inverse transform replaces the series. The whole sequence must be
//! buffered before anything can be emitted.

use evm_common::error::{EvmError, EvmResult};
use rustfft::{num_complex::Complex, FftPlanner};

use crate::frame::Frame;

/// Frames re-laid out as one contiguous time series per pixel and channel.
///
/// Row `(y * width + x) * 3 + c` holds channel `c` of pixel `(x, y)` for
/// frames `0..len`.
#[derive(Debug, Clone)]
pub struct TemporalStack {
    width: usize,
    height: usize,
    len: usize,
    samples: Vec<f32>,
}

impl TemporalStack {
    /// Concatenate equally sized frames along time.
    pub fn from_frames(frames: &[Frame]) -> EvmResult<Self> {
        let first = frames
            .first()
            .ok_or_else(|| EvmError::degenerate_input("temporal stack needs at least one frame"))?;
        let (width, height) = first.dims();
        let len = frames.len();

        let mut samples = vec![0.0f32; width * height * 3 * len];
        for (t, frame) in frames.iter().enumerate() {
            if frame.dims() != (width, height) {
                return Err(EvmError::degenerate_input(format!(
                    "frame {t} is {}x{}, expected {width}x{height}",
                    frame.width(),
                    frame.height()
                )));
            }
            for (p, px) in frame.data().iter().enumerate() {
                for (c, &v) in px.iter().enumerate() {
                    samples[(p * 3 + c) * len + t] = v;
                }
            }
        }

        Ok(Self {
            width,
            height,
            len,
            samples,
        })
    }

    /// Number of time samples per series.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of series (`width * height * 3`).
    pub fn rows(&self) -> usize {
        self.width * self.height * 3
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Time series of channel `c` at pixel `(x, y)`.
    pub fn series(&self, x: usize, y: usize, c: usize) -> &[f32] {
        assert!(x < self.width && y < self.height && c < 3, "series index out of bounds");
        let row = (y * self.width + x) * 3 + c;
        &self.samples[row * self.len..(row + 1) * self.len]
    }

    fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, f32> {
        self.samples.chunks_exact_mut(self.len)
    }

    /// Split back into one frame per time step.
    pub fn into_frames(self) -> Vec<Frame> {
        let mut frames: Vec<Frame> = (0..self.len)
            .map(|_| Frame::zeros(self.width, self.height))
            .collect();
        for (row, series) in self.samples.chunks_exact(self.len).enumerate() {
            let (p, c) = (row / 3, row % 3);
            for (frame, &v) in frames.iter_mut().zip(series.iter()) {
                frame.data_mut()[p][c] = v;
            }
        }
        frames
    }
}

/// Ideal (rectangular) temporal band-pass between `fl` and `fh` Hz.
#[derive(Debug, Clone, Copy)]
pub struct IdealBandpass {
    fl: f64,
    fh: f64,
    frame_rate: f64,
}

impl IdealBandpass {
    pub fn new(fl: f64, fh: f64, frame_rate: f64) -> EvmResult<Self> {
        validate_band(fl, fh)?;
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(EvmError::invalid_config(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }
        Ok(Self { fl, fh, frame_rate })
    }

    /// Pass mask for an `n`-point DFT.
    pub fn mask(&self, n: usize) -> Vec<bool> {
        (0..n)
            .map(|k| {
                let f = bin_frequency(k, n, self.frame_rate);
                f >= self.fl && f <= self.fh
            })
            .collect()
    }

    /// Band-pass every series of `stack` in place.
    pub fn filter(&self, stack: &mut TemporalStack) -> EvmResult<()> {
        let n = stack.len();
        if n < 2 {
            return Err(EvmError::degenerate_input(format!(
                "ideal band-pass needs at least 2 frames, got {n}"
            )));
        }

        let mask = self.mask(n);
        let passed = mask.iter().filter(|&&m| m).count();
        tracing::debug!(
            n,
            passed,
            fl = self.fl,
            fh = self.fh,
            rate = self.frame_rate,
            "Ideal band-pass mask"
        );
        if passed == 0 {
            tracing::warn!(
                fl = self.fl,
                fh = self.fh,
                n,
                "Pass band selects no DFT bin; temporal signal is zero"
            );
            stack.samples.fill(0.0);
            return Ok(());
        }

        let mut planner = FftPlanner::<f32>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let mut scratch = vec![Complex::new(0.0f32, 0.0); scratch_len];
        let mut buf = vec![Complex::new(0.0f32, 0.0); n];
        let norm = 1.0 / n as f32;

        for series in stack.rows_mut() {
            for (b, &v) in buf.iter_mut().zip(series.iter()) {
                *b = Complex::new(v, 0.0);
            }
            forward.process_with_scratch(&mut buf, &mut scratch);
            for (b, &keep) in buf.iter_mut().zip(mask.iter()) {
                if !keep {
                    *b = Complex::new(0.0, 0.0);
                }
            }
            inverse.process_with_scratch(&mut buf, &mut scratch);
            for (v, b) in series.iter_mut().zip(buf.iter()) {
                *v = b.re * norm;
            }
        }
        Ok(())
    }
}

/// Physical frequency (Hz) of DFT bin `k` for `n` samples at `rate` Hz.
///
/// Bins past `n / 2` are the negative-frequency mirrors of the lower ones.
pub fn bin_frequency(k: usize, n: usize, rate: f64) -> f64 {
    let folded = k.min(n - k);
    folded as f64 * rate / n as f64
}

/// `ln(1 + |X_k|)` of a series, rescaled to `[0, 1]`.
pub fn spectrum_magnitude(series: &[f32]) -> Vec<f32> {
    let mag: Vec<f32> = dft(series)
        .iter()
        .map(|c| (1.0 + c.norm()).ln())
        .collect();

    let (lo, hi) = mag
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = hi - lo;
    if range.is_nan() || range <= 0.0 {
        return vec![0.0; mag.len()];
    }
    mag.iter().map(|v| (v - lo) / range).collect()
}

/// Frequency (Hz) of the strongest non-DC component, if any.
pub fn dominant_frequency(series: &[f32], rate: f64) -> Option<f64> {
    let n = series.len();
    if n < 2 {
        return None;
    }
    let spectrum = dft(series);
    (1..=n / 2)
        .max_by(|&a, &b| spectrum[a].norm().total_cmp(&spectrum[b].norm()))
        .map(|k| bin_frequency(k, n, rate))
}

fn dft(series: &[f32]) -> Vec<Complex<f32>> {
    let mut buf: Vec<Complex<f32>> = series.iter().map(|&v| Complex::new(v, 0.0)).collect();
    if buf.is_empty() {
        return buf;
    }
    let mut planner = FftPlanner::<f32>::new();
    planner.plan_fft_forward(buf.len()).process(&mut buf);
    buf
}

pub(crate) fn validate_band(fl: f64, fh: f64) -> EvmResult<()> {
    if !(fl.is_finite() && fh.is_finite()) || fl < 0.0 || fh < 0.0 {
        return Err(EvmError::invalid_config(format!(
            "cutoff frequencies must be finite and non-negative, got fl={fl}, fh={fh}"
        )));
    }
    if fl >= fh {
        return Err(EvmError::invalid_config(format!(
            "low cutoff fl={fl} must be below high cutoff fh={fh}"
        )));
    }
    Ok(())
}
