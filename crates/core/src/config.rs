//! Run configuration.
//!
//! An [`EvmConfig`] is fixed for the lifetime of a run. The spatial/temporal
//! pairing is carried by [`MagnifyMode`]: motion magnification is always
//! Laplacian + IIR, color magnification always Gaussian + ideal band-pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use evm_common::error::{EvmError, EvmResult};

use crate::pyramid::check_levels;
use crate::temporal::ideal::validate_band;
use crate::temporal::iir::validate_rates;

/// IIR band edges as per-frame update rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Fast low-pass rate (higher cutoff).
    pub r1: f64,
    /// Slow low-pass rate (lower cutoff).
    pub r2: f64,
}

/// Ideal band edges in Hz, relative to the sequence frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorParams {
    pub fl: f64,
    pub fh: f64,
}

/// Processing mode with its temporal band parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MagnifyMode {
    /// Laplacian pyramid + IIR band-pass, streamed frame by frame.
    Motion(MotionParams),
    /// Gaussian pyramid + ideal band-pass over the buffered sequence.
    Color(ColorParams),
}

/// Mode discriminant without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Motion,
    Color,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Motion => write!(f, "motion"),
            Self::Color => write!(f, "color"),
        }
    }
}

impl MagnifyMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Motion(_) => ModeKind::Motion,
            Self::Color(_) => ModeKind::Color,
        }
    }
}

/// Immutable parameter set for one magnification run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvmConfig {
    /// Pyramid depth (number of downsampling steps).
    pub levels: usize,

    /// Amplification ceiling.
    pub alpha: f64,

    /// Spatial cutoff wavelength in pixels.
    pub lambda_c: f64,

    /// Gain applied to the I and Q channels of the amplified signal.
    pub chrom_attenuation: f64,

    pub mode: MagnifyMode,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self::motion_default()
    }
}

impl EvmConfig {
    /// Motion magnification defaults.
    pub fn motion_default() -> Self {
        Self {
            levels: 6,
            alpha: 10.0,
            lambda_c: 16.0,
            chrom_attenuation: 0.1,
            mode: MagnifyMode::Motion(MotionParams { r1: 0.4, r2: 0.05 }),
        }
    }

    /// Color magnification defaults.
    pub fn color_default() -> Self {
        Self {
            levels: 6,
            alpha: 10.0,
            lambda_c: 16.0,
            chrom_attenuation: 0.1,
            mode: MagnifyMode::Color(ColorParams { fl: 2.33, fh: 2.66 }),
        }
    }

    /// Defaults for the given mode.
    pub fn default_for(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Motion => Self::motion_default(),
            ModeKind::Color => Self::color_default(),
        }
    }

    /// Parse and validate a JSON document.
    ///
    /// Malformed JSON is `Json`. A well-formed document whose `levels` is a
    /// number but not a non-negative integer is `InvalidConfiguration`, the
    /// same as any other out-of-range parameter.
    pub fn from_json(json: &str) -> EvmResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if let Some(levels) = value.get("levels").filter(|v| v.is_number()) {
            if levels.as_u64().is_none() {
                return Err(EvmError::invalid_config(format!(
                    "levels must be a positive integer, got {levels}"
                )));
            }
        }
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Frame-independent checks.
    pub fn validate(&self) -> EvmResult<()> {
        if self.levels < 1 {
            return Err(EvmError::invalid_config("levels must be at least 1"));
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(EvmError::invalid_config(format!(
                "alpha must be a non-negative number, got {}",
                self.alpha
            )));
        }
        if !(self.lambda_c.is_finite() && self.lambda_c > 0.0) {
            return Err(EvmError::invalid_config(format!(
                "lambda_c must be positive, got {}",
                self.lambda_c
            )));
        }
        if !(0.0..=1.0).contains(&self.chrom_attenuation) {
            return Err(EvmError::invalid_config(format!(
                "chrom_attenuation must lie in [0, 1], got {}",
                self.chrom_attenuation
            )));
        }
        match self.mode {
            MagnifyMode::Motion(MotionParams { r1, r2 }) => validate_rates(r1, r2),
            MagnifyMode::Color(ColorParams { fl, fh }) => validate_band(fl, fh),
        }
    }

    /// [`validate`](Self::validate) plus the pyramid depth check for a frame size.
    pub fn validate_for_frame(&self, width: usize, height: usize) -> EvmResult<()> {
        self.validate()?;
        check_levels(width, height, self.levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EvmConfig::motion_default().validate().unwrap();
        EvmConfig::color_default().validate().unwrap();
        assert_eq!(EvmConfig::default().mode.kind(), ModeKind::Motion);
        assert_eq!(EvmConfig::default_for(ModeKind::Color).mode.kind(), ModeKind::Color);
    }

    #[test]
    fn test_each_bad_parameter_is_rejected() {
        let base = EvmConfig::motion_default();
        let bad = [
            EvmConfig { levels: 0, ..base },
            EvmConfig { alpha: -0.1, ..base },
            EvmConfig { lambda_c: 0.0, ..base },
            EvmConfig { chrom_attenuation: 1.2, ..base },
            EvmConfig {
                mode: MagnifyMode::Motion(MotionParams { r1: 0.05, r2: 0.4 }),
                ..base
            },
            EvmConfig {
                mode: MagnifyMode::Color(ColorParams { fl: 3.0, fh: 1.0 }),
                ..base
            },
            EvmConfig {
                mode: MagnifyMode::Color(ColorParams { fl: -1.0, fh: 1.0 }),
                ..base
            },
        ];
        for config in bad {
            let err = config.validate().unwrap_err();
            assert!(err.is_configuration(), "{config:?} gave {err}");
        }
    }

    #[test]
    fn test_levels_checked_against_frame() {
        let config = EvmConfig::motion_default();
        config.validate_for_frame(64, 64).unwrap();
        assert!(config.validate_for_frame(63, 640).is_err());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(EvmConfig::color_default()).unwrap();
        assert_eq!(json["mode"]["kind"], "color");
        assert_eq!(json["mode"]["fl"], 2.33);

        let parsed = EvmConfig::from_json(
            r#"{"levels": 4, "alpha": 20.0, "lambda_c": 10.0, "chrom_attenuation": 0.5,
                "mode": {"kind": "motion", "r1": 0.5, "r2": 0.1}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.mode,
            MagnifyMode::Motion(MotionParams { r1: 0.5, r2: 0.1 })
        );
    }

    #[test]
    fn test_from_json_validates() {
        let err = EvmConfig::from_json(
            r#"{"levels": 0, "alpha": 20.0, "lambda_c": 10.0, "chrom_attenuation": 0.5,
                "mode": {"kind": "color", "fl": 1.0, "fh": 2.0}}"#,
        )
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            EvmConfig::from_json("{not json").unwrap_err(),
            EvmError::Json(_)
        ));
    }

    #[test]
    fn test_from_json_out_of_range_levels_is_configuration_error() {
        for levels in ["-1", "2.5"] {
            let json = format!(
                r#"{{"levels": {levels}, "alpha": 20.0, "lambda_c": 10.0, "chrom_attenuation": 0.5,
                    "mode": {{"kind": "motion", "r1": 0.4, "r2": 0.05}}}}"#
            );
            let err = EvmConfig::from_json(&json).unwrap_err();
            assert!(err.is_configuration(), "levels {levels} gave {err}");
        }
        assert!(matches!(
            EvmConfig::from_json(r#"{"levels": "four"}"#).unwrap_err(),
            EvmError::Json(_)
        ));
    }
}
