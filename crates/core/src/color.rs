//! RGB <-> YIQ (NTSC luma/chroma) conversion.
//!
//! The YIQ -> RGB matrix is the fixed NTSC one; the RGB -> YIQ direction is
//! its exact inverse, computed once in double precision so that
//! `inverse(forward(f))` reproduces `f` up to `f32` rounding.

use crate::frame::{Frame, Pixel};

type Mat3 = [[f64; 3]; 3];

/// YIQ -> RGB.
const YIQ_TO_RGB: Mat3 = [
    [1.0, 0.956, 0.621],
    [1.0, -0.272, -0.647],
    [1.0, -1.106, 1.703],
];

/// Per-pixel linear transform between RGB and YIQ.
#[derive(Debug, Clone)]
pub struct ColorSpaceConverter {
    to_yiq: [[f32; 3]; 3],
    to_rgb: [[f32; 3]; 3],
}

impl Default for ColorSpaceConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorSpaceConverter {
    pub fn new() -> Self {
        Self {
            to_yiq: to_f32(&invert(&YIQ_TO_RGB)),
            to_rgb: to_f32(&YIQ_TO_RGB),
        }
    }

    /// RGB -> YIQ, channel 0 is luma.
    pub fn forward(&self, mut frame: Frame) -> Frame {
        for px in frame.data_mut() {
            *px = apply(&self.to_yiq, px);
        }
        frame
    }

    /// YIQ -> RGB.
    pub fn inverse(&self, mut frame: Frame) -> Frame {
        for px in frame.data_mut() {
            *px = apply(&self.to_rgb, px);
        }
        frame
    }

    /// Convert a single pixel to YIQ.
    pub fn forward_pixel(&self, px: &Pixel) -> Pixel {
        apply(&self.to_yiq, px)
    }
}

#[inline]
fn apply(m: &[[f32; 3]; 3], px: &Pixel) -> Pixel {
    [
        m[0][0] * px[0] + m[0][1] * px[1] + m[0][2] * px[2],
        m[1][0] * px[0] + m[1][1] * px[1] + m[1][2] * px[2],
        m[2][0] * px[0] + m[2][1] * px[1] + m[2][2] * px[2],
    ]
}

fn to_f32(m: &Mat3) -> [[f32; 3]; 3] {
    let mut out = [[0.0f32; 3]; 3];
    for (dst, src) in out.iter_mut().zip(m.iter()) {
        for (d, s) in dst.iter_mut().zip(src.iter()) {
            *d = *s as f32;
        }
    }
    out
}

/// Adjugate / determinant inverse. The NTSC matrix is well conditioned.
fn invert(m: &Mat3) -> Mat3 {
    let cof = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[r0][c0] * m[r1][c1] - m[r0][c1] * m[r1][c0]
    };

    let c00 = cof(1, 2, 1, 2);
    let c01 = -cof(1, 2, 0, 2);
    let c02 = cof(1, 2, 0, 1);
    let det = m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02;

    let c10 = -cof(0, 2, 1, 2);
    let c11 = cof(0, 2, 0, 2);
    let c12 = -cof(0, 2, 0, 1);
    let c20 = cof(0, 1, 1, 2);
    let c21 = -cof(0, 1, 0, 2);
    let c22 = cof(0, 1, 0, 1);

    // inverse = transpose(cofactors) / det
    [
        [c00 / det, c10 / det, c20 / det],
        [c01 / det, c11 / det, c21 / det],
        [c02 / det, c12 / det, c22 / det],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luma_row_matches_ntsc_weights() {
        let conv = ColorSpaceConverter::new();
        let y = conv.forward_pixel(&[1.0, 0.0, 0.0])[0];
        assert!((y - 0.299).abs() < 2e-3, "red luma weight {y}");
        let y = conv.forward_pixel(&[0.0, 1.0, 0.0])[0];
        assert!((y - 0.587).abs() < 2e-3, "green luma weight {y}");
    }

    #[test]
    fn test_gray_has_no_chroma() {
        let conv = ColorSpaceConverter::new();
        let yiq = conv.forward_pixel(&[0.5, 0.5, 0.5]);
        assert!((yiq[0] - 0.5).abs() < 1e-5);
        assert!(yiq[1].abs() < 1e-5);
        assert!(yiq[2].abs() < 1e-5);
    }

    #[test]
    fn test_boundary_values_roundtrip() {
        let conv = ColorSpaceConverter::new();
        let data = vec![
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 1.0],
        ];
        let frame = Frame::from_vec(2, 2, data).unwrap();
        let back = conv.inverse(conv.forward(frame.clone()));
        assert!(back.max_abs_diff(&frame) < 1e-5);
    }

    #[test]
    fn test_matrix_inverse_is_identity() {
        let inv = invert(&YIQ_TO_RGB);
        for i in 0..3 {
            for j in 0..3 {
                let v: f64 = (0..3).map(|k| YIQ_TO_RGB[i][k] * inv[k][j]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((v - expected).abs() < 1e-12);
            }
        }
    }
}
