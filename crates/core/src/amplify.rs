//! Frequency-dependent amplification of band-passed pyramids.
//!
//! Each Laplacian level gets a representative spatial wavelength `lambda`,
//! starting at `diag / 3` for the coarsest level and halving per finer level.
//! With `delta = lambda_c / 8 / (1 + alpha)` the admissible gain is
//! `(lambda / delta / 8 - 1) * 2`, capped at `alpha`. The finest and coarsest
//! levels are never amplified.

use evm_common::error::{EvmError, EvmResult};

use crate::pyramid::Pyramid;

/// Boost over the paper's bound, for visibility.
pub const EXAGGERATION_FACTOR: f32 = 2.0;

/// Empirical divisor for the coarsest level's representative wavelength.
const DIAGONAL_DIVISOR: f32 = 3.0;

/// Per-level gains derived from `alpha` and the spatial cutoff `lambda_c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplificationPolicy {
    alpha: f32,
    lambda_c: f32,
}

impl AmplificationPolicy {
    pub fn new(alpha: f64, lambda_c: f64) -> EvmResult<Self> {
        if !(alpha.is_finite() && alpha >= 0.0) {
            return Err(EvmError::invalid_config(format!(
                "alpha must be a non-negative number, got {alpha}"
            )));
        }
        if !(lambda_c.is_finite() && lambda_c > 0.0) {
            return Err(EvmError::invalid_config(format!(
                "lambda_c must be positive, got {lambda_c}"
            )));
        }
        Ok(Self {
            alpha: alpha as f32,
            lambda_c: lambda_c as f32,
        })
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Gain for every level `0..=depth` of a pyramid over a `width x height` frame.
    pub fn level_factors(&self, depth: usize, width: usize, height: usize) -> Vec<f32> {
        let delta = self.lambda_c / 8.0 / (1.0 + self.alpha);
        let (w, h) = (width as f32, height as f32);
        let mut lambda = (w * w + h * h).sqrt() / DIAGONAL_DIVISOR;

        let mut factors = vec![0.0f32; depth + 1];
        for l in (0..=depth).rev() {
            let curr_alpha = (lambda / delta / 8.0 - 1.0) * EXAGGERATION_FACTOR;
            factors[l] = if l == depth || l == 0 {
                0.0
            } else {
                curr_alpha.min(self.alpha).max(0.0)
            };
            lambda /= 2.0;
        }
        factors
    }

    /// Scale each level of a band-passed pyramid by its gain.
    pub fn apply(&self, mut band: Pyramid) -> Pyramid {
        let (width, height) = band.level(0).map(|f| f.dims()).unwrap_or((0, 0));
        let factors = self.level_factors(band.depth(), width, height);
        for (level, (frame, gain)) in band.iter_mut().zip(factors.iter()).enumerate() {
            tracing::trace!(level, gain, "Amplifying level");
            frame.scale(*gain);
        }
        band
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::pyramid::build_laplacian;

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(AmplificationPolicy::new(-1.0, 16.0).is_err());
        assert!(AmplificationPolicy::new(10.0, 0.0).is_err());
        assert!(AmplificationPolicy::new(f64::NAN, 16.0).is_err());
        assert!(AmplificationPolicy::new(0.0, 16.0).is_ok());
    }

    #[test]
    fn test_level_factors_for_64_square() {
        let policy = AmplificationPolicy::new(10.0, 16.0).unwrap();
        let f = policy.level_factors(6, 64, 64);
        assert_eq!(f.len(), 7);
        assert_eq!(f[0], 0.0);
        assert_eq!(f[6], 0.0);
        assert_eq!(f[5], 10.0);
        assert!((f[4] - 8.37).abs() < 0.01, "level 4 gain {}", f[4]);
        assert!((f[3] - 3.18).abs() < 0.01, "level 3 gain {}", f[3]);
        // Below the cutoff wavelength the gain would go negative; it is floored.
        assert_eq!(f[1], 0.0);
    }

    #[test]
    fn test_gain_grows_with_coarseness() {
        let policy = AmplificationPolicy::new(100.0, 16.0).unwrap();
        let f = policy.level_factors(6, 640, 480);
        for l in 1..5 {
            assert!(f[l] <= f[l + 1], "gain not monotone at {l}: {f:?}");
        }
    }

    #[test]
    fn test_apply_zeroes_extremes_and_bounds_middle() {
        let data = (0..32 * 32)
            .map(|i| {
                let v = ((i * 37) % 101) as f32 / 101.0 - 0.5;
                [v, -v, v * 0.5]
            })
            .collect();
        let frame = Frame::from_vec(32, 32, data).unwrap();
        let band = build_laplacian(&frame, 4).unwrap();
        let policy = AmplificationPolicy::new(5.0, 8.0).unwrap();
        let out = policy.apply(band.clone());

        assert_eq!(out.level(0).unwrap().min_max(), (0.0, 0.0));
        assert_eq!(out.coarsest().min_max(), (0.0, 0.0));
        for l in 1..4 {
            let before = band.level(l).unwrap();
            let after = out.level(l).unwrap();
            for (a, b) in after.data().iter().zip(before.data().iter()) {
                for c in 0..3 {
                    assert!(a[c].abs() <= 5.0 * b[c].abs() + 1e-6);
                }
            }
        }
    }
}
