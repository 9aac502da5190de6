//! End-to-end magnification.
//!
//! Motion mode streams: every input frame produces one output frame as soon
//! as it arrives. Color mode is a batch barrier: nothing is emitted until the
//! whole sequence has been read and band-passed.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use evm_common::error::{EvmError, EvmResult};

use crate::amplify::AmplificationPolicy;
use crate::color::ColorSpaceConverter;
use crate::config::{ColorParams, EvmConfig, MagnifyMode, ModeKind, MotionParams};
use crate::frame::Frame;
use crate::pyramid::{build_gaussian, build_laplacian, check_levels, expand_to_base, reconstruct};
use crate::stream::{FrameSink, FrameSource};
use crate::temporal::{IdealBandpass, IirBandpass, TemporalStack};

/// Frames whose intensity range is below this are clamped, not stretched.
const FLAT_RANGE: f32 = 1e-6;

/// Streaming frame transform with internal temporal state.
pub trait FrameProcessor: Send {
    /// Consume the next frame in sequence order and produce its output.
    fn process(&mut self, frame: Frame) -> EvmResult<Frame>;

    /// Forget all temporal state; the next frame starts a new sequence.
    fn reset(&mut self);
}

/// Laplacian pyramid + IIR band-pass magnifier.
#[derive(Debug, Clone)]
pub struct MotionMagnifier {
    levels: usize,
    chrom_attenuation: f32,
    policy: AmplificationPolicy,
    converter: ColorSpaceConverter,
    filter: IirBandpass,
    dims: Option<(usize, usize)>,
}

impl MotionMagnifier {
    pub fn new(config: &EvmConfig) -> EvmResult<Self> {
        config.validate()?;
        let MagnifyMode::Motion(MotionParams { r1, r2 }) = config.mode else {
            return Err(EvmError::invalid_config(
                "motion magnifier needs a motion-mode configuration",
            ));
        };
        Ok(Self {
            levels: config.levels,
            chrom_attenuation: config.chrom_attenuation as f32,
            policy: AmplificationPolicy::new(config.alpha, config.lambda_c)?,
            converter: ColorSpaceConverter::new(),
            filter: IirBandpass::new(r1, r2)?,
            dims: None,
        })
    }

    /// Dimensions fixed by the first frame since the last reset.
    pub fn dims(&self) -> Option<(usize, usize)> {
        self.dims
    }

    /// Advance the filter with one YIQ frame and return the amplified signal.
    fn signal_for(&mut self, yiq: &Frame) -> EvmResult<Frame> {
        let laplacian = build_laplacian(yiq, self.levels)?;
        let band = self.filter.filter(&laplacian)?;
        let mut signal = reconstruct(self.policy.apply(band));
        signal.scale_channels([1.0, self.chrom_attenuation, self.chrom_attenuation]);
        Ok(signal)
    }
}

impl FrameProcessor for MotionMagnifier {
    fn process(&mut self, frame: Frame) -> EvmResult<Frame> {
        match self.dims {
            Some(dims) if dims != frame.dims() => {
                return Err(EvmError::degenerate_input(format!(
                    "frame is {}x{}, sequence started at {}x{}",
                    frame.width(),
                    frame.height(),
                    dims.0,
                    dims.1
                )));
            }
            Some(_) => {}
            None => {
                check_levels(frame.width(), frame.height(), self.levels)?;
                self.dims = Some(frame.dims());
            }
        }

        let mut yiq = self.converter.forward(frame);
        let signal = self.signal_for(&yiq)?;
        yiq.add_assign(&signal);
        Ok(normalize_min_max(self.converter.inverse(yiq)))
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.dims = None;
    }
}

/// Gaussian pyramid + ideal band-pass magnifier over a complete sequence.
#[derive(Debug, Clone)]
pub struct ColorMagnifier {
    levels: usize,
    alpha: f32,
    chrom_attenuation: f32,
    band: ColorParams,
    converter: ColorSpaceConverter,
}

impl ColorMagnifier {
    pub fn new(config: &EvmConfig) -> EvmResult<Self> {
        config.validate()?;
        let MagnifyMode::Color(band) = config.mode else {
            return Err(EvmError::invalid_config(
                "color magnifier needs a color-mode configuration",
            ));
        };
        Ok(Self {
            levels: config.levels,
            alpha: config.alpha as f32,
            chrom_attenuation: config.chrom_attenuation as f32,
            band,
            converter: ColorSpaceConverter::new(),
        })
    }

    /// Amplified YIQ signal for every frame, at full resolution.
    ///
    /// This is what gets added to each frame before conversion back to RGB.
    pub fn amplified_signal(&self, frames: &[Frame], frame_rate: f64) -> EvmResult<Vec<Frame>> {
        let yiq: Vec<Frame> = frames
            .iter()
            .map(|f| self.converter.forward(f.clone()))
            .collect();
        self.signal_for(&yiq, frame_rate)
    }

    /// Magnify a whole sequence; output has the same length and order.
    pub fn process_batch(&self, frames: Vec<Frame>, frame_rate: f64) -> EvmResult<Vec<Frame>> {
        let yiq: Vec<Frame> = frames
            .into_iter()
            .map(|f| self.converter.forward(f))
            .collect();
        let signal = self.signal_for(&yiq, frame_rate)?;

        Ok(yiq
            .into_iter()
            .zip(signal)
            .map(|(mut frame, s)| {
                frame.add_assign(&s);
                normalize_min_max(self.converter.inverse(frame))
            })
            .collect())
    }

    fn signal_for(&self, yiq: &[Frame], frame_rate: f64) -> EvmResult<Vec<Frame>> {
        let filter = IdealBandpass::new(self.band.fl, self.band.fh, frame_rate)?;
        let first = yiq
            .first()
            .ok_or_else(|| EvmError::degenerate_input("color magnification needs frames"))?;
        let dims = first.dims();
        check_levels(dims.0, dims.1, self.levels)?;

        let mut sizes = Vec::new();
        let mut coarse = Vec::with_capacity(yiq.len());
        for (t, frame) in yiq.iter().enumerate() {
            if frame.dims() != dims {
                return Err(EvmError::degenerate_input(format!(
                    "frame {t} is {}x{}, sequence started at {}x{}",
                    frame.width(),
                    frame.height(),
                    dims.0,
                    dims.1
                )));
            }
            let gaussian = build_gaussian(frame, self.levels)?;
            sizes = gaussian.sizes();
            coarse.push(gaussian.coarsest().clone());
        }

        let mut stack = TemporalStack::from_frames(&coarse)?;
        drop(coarse);
        filter.filter(&mut stack)?;

        let gains = [
            self.alpha,
            self.alpha * self.chrom_attenuation,
            self.alpha * self.chrom_attenuation,
        ];
        let signal = stack
            .into_frames()
            .into_iter()
            .map(|mut s| {
                s.scale_channels(gains);
                expand_to_base(s, &sizes)
            })
            .collect();
        Ok(signal)
    }
}

/// Linear rescale of all samples into [0, 1] using the frame's own min/max.
///
/// Each frame is normalized independently, so overall brightness can jump
/// between frames. Flat frames are only clamped.
pub fn normalize_min_max(mut frame: Frame) -> Frame {
    let (lo, hi) = frame.min_max();
    let range = hi - lo;
    if range < FLAT_RANGE {
        for px in frame.data_mut() {
            for v in px.iter_mut() {
                *v = v.clamp(0.0, 1.0);
            }
        }
        return frame;
    }

    let scale = 1.0 / range;
    for px in frame.data_mut() {
        for v in px.iter_mut() {
            *v = (*v - lo) * scale;
        }
    }
    frame
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub mode: ModeKind,
    pub frames_in: u64,
    pub frames_out: u64,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone)]
enum Engine {
    Motion(MotionMagnifier),
    Color(ColorMagnifier),
}

/// Owns the magnifier for one configuration and drives it over a source.
#[derive(Debug, Clone)]
pub struct EvmPipeline {
    config: EvmConfig,
    engine: Engine,
}

impl EvmPipeline {
    pub fn new(config: EvmConfig) -> EvmResult<Self> {
        let engine = match config.mode {
            MagnifyMode::Motion(_) => Engine::Motion(MotionMagnifier::new(&config)?),
            MagnifyMode::Color(_) => Engine::Color(ColorMagnifier::new(&config)?),
        };
        Ok(Self { config, engine })
    }

    pub fn config(&self) -> &EvmConfig {
        &self.config
    }

    /// Discard temporal state from any previous run.
    pub fn reset(&mut self) {
        if let Engine::Motion(m) = &mut self.engine {
            m.reset();
        }
    }

    /// Process every frame from `source` into `sink`.
    ///
    /// `stop` is polled between frames in motion mode and before the batch
    /// transform in color mode; a set flag ends the run with
    /// [`EvmError::Cancelled`] and drops all filter state.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        stop: &AtomicBool,
    ) -> EvmResult<RunSummary> {
        self.reset();
        let kind = self.config.mode.kind();
        tracing::info!(
            mode = %kind,
            levels = self.config.levels,
            alpha = self.config.alpha,
            lambda_c = self.config.lambda_c,
            chrom_attenuation = self.config.chrom_attenuation,
            frame_rate = source.frame_rate(),
            "Starting magnification run"
        );

        let result = match &mut self.engine {
            Engine::Motion(magnifier) => run_streaming(magnifier, &self.config, source, sink, stop),
            Engine::Color(magnifier) => run_batch(magnifier, &self.config, source, sink, stop),
        };
        if result.is_err() {
            self.reset();
        }
        let summary = result?;

        tracing::info!(
            mode = %summary.mode,
            frames_in = summary.frames_in,
            frames_out = summary.frames_out,
            width = summary.width,
            height = summary.height,
            "Magnification run complete"
        );
        Ok(summary)
    }
}

fn run_streaming(
    magnifier: &mut MotionMagnifier,
    config: &EvmConfig,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    stop: &AtomicBool,
) -> EvmResult<RunSummary> {
    let mut summary = RunSummary {
        mode: ModeKind::Motion,
        frames_in: 0,
        frames_out: 0,
        width: 0,
        height: 0,
    };

    loop {
        if stop.load(Ordering::Relaxed) {
            tracing::info!(frames = summary.frames_out, "Stop requested");
            return Err(EvmError::cancelled(summary.frames_out));
        }
        let Some(frame) = source.next_frame()? else {
            break;
        };
        if summary.frames_in == 0 {
            config.validate_for_frame(frame.width(), frame.height())?;
            (summary.width, summary.height) = frame.dims();
        }
        summary.frames_in += 1;

        let out = magnifier.process(frame)?;
        sink.write_frame(out)?;
        summary.frames_out += 1;

        if summary.frames_out % 100 == 0 {
            tracing::debug!(frames = summary.frames_out, "Motion magnification progress");
        }
    }

    if summary.frames_in == 0 {
        tracing::warn!("Frame source was empty");
    }
    sink.finish()?;
    Ok(summary)
}

fn run_batch(
    magnifier: &ColorMagnifier,
    config: &EvmConfig,
    source: &mut dyn FrameSource,
    sink: &mut dyn FrameSink,
    stop: &AtomicBool,
) -> EvmResult<RunSummary> {
    let frame_rate = source.frame_rate();
    let mut frames = Vec::with_capacity(source.len_hint().unwrap_or(0));
    let mut dims = None;

    while let Some(frame) = source.next_frame()? {
        if stop.load(Ordering::Relaxed) {
            tracing::info!(buffered = frames.len(), "Stop requested while buffering");
            return Err(EvmError::cancelled(0));
        }
        match dims {
            None => {
                config.validate_for_frame(frame.width(), frame.height())?;
                dims = Some(frame.dims());
            }
            Some((w, h)) if frame.dims() != (w, h) => {
                return Err(EvmError::degenerate_input(format!(
                    "frame {} is {}x{}, sequence started at {w}x{h}",
                    frames.len(),
                    frame.width(),
                    frame.height()
                )));
            }
            Some(_) => {}
        }
        frames.push(frame);
    }

    let frames_in = frames.len() as u64;
    if frames.len() < 2 {
        return Err(EvmError::degenerate_input(format!(
            "color magnification needs at least 2 frames, got {}",
            frames.len()
        )));
    }
    if stop.load(Ordering::Relaxed) {
        tracing::info!(buffered = frames.len(), "Stop requested before batch transform");
        return Err(EvmError::cancelled(0));
    }

    tracing::info!(frames = frames_in, frame_rate, "Sequence buffered; running ideal band-pass");
    let (width, height) = dims.unwrap_or((0, 0));
    let output = magnifier.process_batch(frames, frame_rate)?;

    let mut frames_out = 0u64;
    for frame in output {
        sink.write_frame(frame)?;
        frames_out += 1;
    }
    sink.finish()?;

    Ok(RunSummary {
        mode: ModeKind::Color,
        frames_in,
        frames_out,
        width,
        height,
    })
}
