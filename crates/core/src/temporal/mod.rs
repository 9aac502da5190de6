//! Temporal filter bank.
//!
//! Two strategies, fixed per run:
//! - [`IirBandpass`]: causal, frame-by-frame, O(1) state per pyramid level.
//! - [`IdealBandpass`]: batch, needs the full sequence as a [`TemporalStack`].

pub mod ideal;
pub mod iir;

pub use ideal::{bin_frequency, dominant_frequency, spectrum_magnitude, IdealBandpass, TemporalStack};
pub use iir::{FilterState, IirBandpass};
