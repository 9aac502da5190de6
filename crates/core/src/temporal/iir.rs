//! Streaming band-pass: difference of two single-pole low-pass filters.
//!
//! ```text
//! fast[n] = (1 - r1) * fast[n-1] + r1 * x[n]
//! slow[n] = (1 - r2) * slow[n-1] + r2 * x[n]      (r1 > r2)
//! y[n]    = fast[n] - slow[n]
//! ```
//!
//! The first pyramid after construction or [`IirBandpass::reset`] seeds both
//! low-pass pyramids and yields an all-zero band.

use evm_common::error::{EvmError, EvmResult};

use crate::frame::Frame;
use crate::pyramid::Pyramid;

/// Per-level low-pass state carried between frames.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub lowpass_fast: Pyramid,
    pub lowpass_slow: Pyramid,
}

/// Two-pole recursive band-pass over Laplacian pyramids.
#[derive(Debug, Clone)]
pub struct IirBandpass {
    r1: f32,
    r2: f32,
    state: Option<FilterState>,
}

impl IirBandpass {
    /// `r1` is the fast (high cutoff) rate, `r2` the slow one; `0 < r2 < r1 <= 1`.
    pub fn new(r1: f64, r2: f64) -> EvmResult<Self> {
        validate_rates(r1, r2)?;
        Ok(Self {
            r1: r1 as f32,
            r2: r2 as f32,
            state: None,
        })
    }

    /// Whether a first frame has seeded the filter.
    pub fn is_primed(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&FilterState> {
        self.state.as_ref()
    }

    /// Drop all state; the next pyramid primes the filter again.
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Advance one frame and return the band-passed pyramid.
    pub fn filter(&mut self, input: &Pyramid) -> EvmResult<Pyramid> {
        let Some(state) = self.state.as_mut() else {
            self.state = Some(FilterState {
                lowpass_fast: input.clone(),
                lowpass_slow: input.clone(),
            });
            return Ok(input.zeros_like());
        };

        if !state.lowpass_fast.same_shape(input) {
            return Err(EvmError::degenerate_input(format!(
                "pyramid shape {:?} does not match filter state {:?}",
                input.sizes(),
                state.lowpass_fast.sizes()
            )));
        }

        let mut band = input.zeros_like();
        for (((fast, slow), x), out) in state
            .lowpass_fast
            .iter_mut()
            .zip(state.lowpass_slow.iter_mut())
            .zip(input.iter())
            .zip(band.iter_mut())
        {
            step_level(fast, slow, x, out, self.r1, self.r2);
        }
        Ok(band)
    }
}

fn step_level(fast: &mut Frame, slow: &mut Frame, x: &Frame, out: &mut Frame, r1: f32, r2: f32) {
    let fast = fast.data_mut();
    let slow = slow.data_mut();
    for (((f, s), x), o) in fast
        .iter_mut()
        .zip(slow.iter_mut())
        .zip(x.data().iter())
        .zip(out.data_mut().iter_mut())
    {
        for c in 0..3 {
            f[c] = (1.0 - r1) * f[c] + r1 * x[c];
            s[c] = (1.0 - r2) * s[c] + r2 * x[c];
            o[c] = f[c] - s[c];
        }
    }
}

pub(crate) fn validate_rates(r1: f64, r2: f64) -> EvmResult<()> {
    if !(r1 > 0.0 && r1 <= 1.0 && r2 > 0.0 && r2 <= 1.0) {
        return Err(EvmError::invalid_config(format!(
            "IIR rates must lie in (0, 1], got r1={r1}, r2={r2}"
        )));
    }
    if r1 <= r2 {
        return Err(EvmError::invalid_config(format!(
            "IIR fast rate r1={r1} must exceed slow rate r2={r2}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pyramid::build_laplacian;

    fn pyramid_of(value: f32) -> Pyramid {
        let frame = Frame::new_fill(16, 16, [value, value * 0.5, -value]);
        build_laplacian(&frame, 3).unwrap()
    }

    fn max_abs(pyr: &Pyramid) -> f32 {
        pyr.iter()
            .map(|f| {
                let (lo, hi) = f.min_max();
                lo.abs().max(hi.abs())
            })
            .fold(0.0, f32::max)
    }

    #[test]
    fn test_rejects_bad_rates() {
        assert!(IirBandpass::new(0.05, 0.4).is_err());
        assert!(IirBandpass::new(0.4, 0.4).is_err());
        assert!(IirBandpass::new(1.5, 0.4).is_err());
        assert!(IirBandpass::new(0.4, 0.0).is_err());
        assert!(IirBandpass::new(1.0, 0.05).is_ok());
    }

    #[test]
    fn test_first_frame_yields_zero_band() {
        let mut filter = IirBandpass::new(0.4, 0.05).unwrap();
        assert!(!filter.is_primed());
        let band = filter.filter(&pyramid_of(0.8)).unwrap();
        assert_eq!(max_abs(&band), 0.0);
        assert!(filter.is_primed());
    }

    #[test]
    fn test_step_response_decays_to_zero() {
        let mut filter = IirBandpass::new(0.4, 0.05).unwrap();
        filter.filter(&pyramid_of(0.2)).unwrap();

        let step = pyramid_of(0.7);
        let first = filter.filter(&step).unwrap();
        assert!(max_abs(&first) > 0.1);

        let mut last = first;
        for _ in 0..400 {
            last = filter.filter(&step).unwrap();
        }
        assert!(max_abs(&last) < 1e-4, "band did not settle: {}", max_abs(&last));

        let state = filter.state().unwrap();
        let target = step.coarsest();
        assert!(state.lowpass_fast.coarsest().max_abs_diff(target) < 1e-4);
        assert!(state.lowpass_slow.coarsest().max_abs_diff(target) < 1e-4);
    }

    #[test]
    fn test_reset_reprimes() {
        let mut filter = IirBandpass::new(0.4, 0.05).unwrap();
        filter.filter(&pyramid_of(0.2)).unwrap();
        filter.reset();
        assert!(!filter.is_primed());
        let band = filter.filter(&pyramid_of(0.9)).unwrap();
        assert_eq!(max_abs(&band), 0.0);
    }

    #[test]
    fn test_shape_change_is_degenerate_input() {
        let mut filter = IirBandpass::new(0.4, 0.05).unwrap();
        filter.filter(&pyramid_of(0.2)).unwrap();
        let other = build_laplacian(&Frame::new_fill(32, 16, [0.0; 3]), 3).unwrap();
        let err = filter.filter(&other).unwrap_err();
        assert!(matches!(err, EvmError::DegenerateInput { .. }));
    }
}
