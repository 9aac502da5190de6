//! Three-channel floating-point frames.
//!
//! A [`Frame`] is a row-major grid of `[f32; 3]` samples. Decoded video
//! frames enter the pipeline normalized to `[0.0, 1.0]`; intermediate frames
//! (YIQ values, Laplacian bands, filtered signals) may hold any finite value.

use evm_common::error::{EvmError, EvmResult};

/// One pixel: three channel samples.
pub type Pixel = [f32; 3];

/// A 2-D grid of three-channel samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<Pixel>,
}

impl Frame {
    /// Wrap an existing pixel buffer.
    pub fn from_vec(width: usize, height: usize, data: Vec<Pixel>) -> EvmResult<Self> {
        if width == 0 || height == 0 {
            return Err(EvmError::degenerate_input(format!(
                "frame dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width.checked_mul(height).ok_or_else(|| {
            EvmError::degenerate_input(format!("frame size {width}x{height} overflows"))
        })?;
        if data.len() != expected {
            return Err(EvmError::degenerate_input(format!(
                "frame buffer holds {} pixels, expected {expected} for {width}x{height}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A frame with every pixel set to `value`.
    ///
    /// Used for sizes already derived from a validated frame. Untrusted
    /// dimensions go through [`Frame::from_vec`], which reports overflow as
    /// `DegenerateInput`.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new_fill(width: usize, height: usize, value: Pixel) -> Self {
        let len = width.checked_mul(height).expect("frame size overflow");
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }

    /// An all-zero frame.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self::new_fill(width, height, [0.0; 3])
    }

    /// Decode interleaved 8-bit RGB into a frame normalized to `[0, 1]`.
    pub fn from_rgb8(width: usize, height: usize, rgb: &[u8]) -> EvmResult<Self> {
        let expected = width.saturating_mul(height).saturating_mul(3);
        if rgb.len() != expected {
            return Err(EvmError::degenerate_input(format!(
                "RGB buffer holds {} bytes, expected {expected} for {width}x{height}",
                rgb.len()
            )));
        }

        let data = rgb
            .chunks_exact(3)
            .map(|px| {
                [
                    px[0] as f32 / 255.0,
                    px[1] as f32 / 255.0,
                    px[2] as f32 / 255.0,
                ]
            })
            .collect();
        Self::from_vec(width, height, data)
    }

    /// Encode to interleaved 8-bit RGB, clamping samples to `[0, 1]`.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() * 3);
        for px in &self.data {
            for &c in px {
                out.push((c.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
        out
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `(width, height)`.
    pub fn dims(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn data(&self) -> &[Pixel] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [Pixel] {
        &mut self.data
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    /// Row `y` as a slice.
    pub fn row(&self, y: usize) -> &[Pixel] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Whether `other` has the same dimensions.
    pub fn same_dims(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Multiply every sample of channel `c` by `gains[c]`.
    pub fn scale_channels(&mut self, gains: [f32; 3]) {
        for px in &mut self.data {
            px[0] *= gains[0];
            px[1] *= gains[1];
            px[2] *= gains[2];
        }
    }

    /// Multiply every sample by `gain`.
    pub fn scale(&mut self, gain: f32) {
        self.scale_channels([gain; 3]);
    }

    /// `self += other`, elementwise.
    pub fn add_assign(&mut self, other: &Frame) {
        debug_assert!(self.same_dims(other));
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            a[0] += b[0];
            a[1] += b[1];
            a[2] += b[2];
        }
    }

    /// `self -= other`, elementwise.
    pub fn sub_assign(&mut self, other: &Frame) {
        debug_assert!(self.same_dims(other));
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            a[0] -= b[0];
            a[1] -= b[1];
            a[2] -= b[2];
        }
    }

    /// Smallest and largest sample over all pixels and channels.
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .flat_map(|px| px.iter().copied())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Largest absolute difference to `other`, over all samples.
    pub fn max_abs_diff(&self, other: &Frame) -> f32 {
        debug_assert!(self.same_dims(other));
        self.data
            .iter()
            .zip(other.data.iter())
            .flat_map(|(a, b)| (0..3).map(move |c| (a[c] - b[c]).abs()))
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let err = Frame::from_vec(2, 2, vec![[0.0; 3]; 3]).unwrap_err();
        assert!(matches!(err, EvmError::DegenerateInput { .. }));
    }

    #[test]
    fn test_from_vec_rejects_empty_frame() {
        assert!(Frame::from_vec(0, 4, vec![]).is_err());
    }

    #[test]
    fn test_from_vec_reports_overflow_as_degenerate_input() {
        let err = Frame::from_vec(usize::MAX, 2, vec![]).unwrap_err();
        assert!(matches!(err, EvmError::DegenerateInput { .. }));
    }

    #[test]
    #[should_panic(expected = "frame size overflow")]
    fn test_new_fill_panics_on_overflow() {
        let _ = Frame::new_fill(usize::MAX, 2, [0.0; 3]);
    }

    #[test]
    fn test_rgb8_roundtrip() {
        let rgb = vec![0u8, 128, 255, 10, 20, 30];
        let frame = Frame::from_rgb8(2, 1, &rgb).unwrap();
        assert!((frame.get(0, 0).unwrap()[2] - 1.0).abs() < 1e-6);
        assert_eq!(frame.to_rgb8(), rgb);
    }

    #[test]
    fn test_to_rgb8_clamps_out_of_range() {
        let frame = Frame::from_vec(1, 1, vec![[-0.5, 0.5, 1.5]]).unwrap();
        assert_eq!(frame.to_rgb8(), vec![0, 128, 255]);
    }

    #[test]
    fn test_arithmetic_and_min_max() {
        let mut a = Frame::new_fill(2, 2, [1.0, 2.0, 3.0]);
        let b = Frame::new_fill(2, 2, [0.5, 0.5, 0.5]);
        a.sub_assign(&b);
        a.scale_channels([2.0, 1.0, 0.0]);
        assert_eq!(a.get(1, 1), Some(&[1.0, 1.5, 0.0]));
        a.add_assign(&b);
        assert_eq!(a.min_max(), (0.5, 2.0));
        assert_eq!(a.get(2, 0), None);
    }
}
