//! EVM Core: Eulerian Video Magnification
//!
//! Reveals small temporal variations in video by filtering each pixel's time
//! series and amplifying the result:
//! - **Color space:** RGB <-> YIQ so luma and chroma can be treated separately
//! - **Pyramids:** Gaussian/Laplacian decomposition and collapse
//! - **Temporal filters:** streaming IIR band-pass and batch ideal (FFT) band-pass
//! - **Amplification:** per-level gain bounded by the spatial cutoff wavelength
//! - **Pipeline:** motion (Laplacian + IIR) and color (Gaussian + ideal) modes
//!
//! This crate is pure computation. Frames come in and go out through the
//! [`FrameSource`] / [`FrameSink`] traits; decoding and encoding live elsewhere.

pub mod amplify;
pub mod color;
pub mod config;
pub mod frame;
pub mod pipeline;
pub mod pyramid;
pub mod stream;
pub mod temporal;

pub use amplify::AmplificationPolicy;
pub use color::ColorSpaceConverter;
pub use config::{ColorParams, EvmConfig, MagnifyMode, ModeKind, MotionParams};
pub use frame::{Frame, Pixel};
pub use pipeline::{
    normalize_min_max, ColorMagnifier, EvmPipeline, FrameProcessor, MotionMagnifier, RunSummary,
};
pub use pyramid::Pyramid;
pub use stream::{FrameSink, FrameSource, VecSink, VecSource};
pub use temporal::{FilterState, IdealBandpass, IirBandpass, TemporalStack};
