//! Gaussian and Laplacian pyramids.
//!
//! Both pyramids hold `levels + 1` frames, level 0 at full resolution. Each
//! coarser level is the previous one blurred with the 5-tap binomial kernel
//! `[1 4 6 4 1] / 16` and decimated by 2, so a `w x h` level yields
//! `((w + 1) / 2, (h + 1) / 2)`. Borders use reflect-101.
//!
//! The Laplacian pyramid stores `g[i] - up(g[i + 1])` for `i < levels` and the
//! coarsest Gaussian image at `levels`, which makes [`reconstruct`] an exact
//! inverse of [`build_laplacian`] up to rounding.

use evm_common::error::{EvmError, EvmResult};

use crate::frame::{Frame, Pixel};

const DOWN_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// An ordered stack of frames, finest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Pyramid {
    bands: Vec<Frame>,
}

impl Pyramid {
    /// Same shape, every sample zero.
    pub fn zeros_like(&self) -> Self {
        Self {
            bands: self
                .bands
                .iter()
                .map(|b| Frame::zeros(b.width(), b.height()))
                .collect(),
        }
    }

    /// Index of the coarsest level (the configured level count).
    pub fn depth(&self) -> usize {
        self.bands.len() - 1
    }

    /// Number of stored frames (`depth() + 1`).
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn level(&self, i: usize) -> Option<&Frame> {
        self.bands.get(i)
    }

    pub fn coarsest(&self) -> &Frame {
        &self.bands[self.bands.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.bands.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Frame> {
        self.bands.iter_mut()
    }

    /// Level dimensions, finest first.
    pub fn sizes(&self) -> Vec<(usize, usize)> {
        self.bands.iter().map(Frame::dims).collect()
    }

    /// Same level count and same dimensions at every level.
    pub fn same_shape(&self, other: &Pyramid) -> bool {
        self.bands.len() == other.bands.len()
            && self
                .bands
                .iter()
                .zip(other.bands.iter())
                .all(|(a, b)| a.same_dims(b))
    }
}

/// Deepest pyramid a `width x height` frame supports: `floor(log2(min(w, h)))`.
pub fn max_levels(width: usize, height: usize) -> usize {
    let side = width.min(height);
    if side == 0 {
        return 0;
    }
    (usize::BITS - 1 - side.leading_zeros()) as usize
}

/// Reject level counts the frame dimensions cannot carry.
pub fn check_levels(width: usize, height: usize, levels: usize) -> EvmResult<()> {
    if levels < 1 {
        return Err(EvmError::invalid_config("levels must be at least 1"));
    }
    let max = max_levels(width, height);
    if levels > max {
        return Err(EvmError::invalid_config(format!(
            "{levels} pyramid levels requested but a {width}x{height} frame supports at most {max}"
        )));
    }
    Ok(())
}

/// Gaussian pyramid: `[frame, down(frame), down(down(frame)), ...]`.
pub fn build_gaussian(frame: &Frame, levels: usize) -> EvmResult<Pyramid> {
    check_levels(frame.width(), frame.height(), levels)?;

    let mut bands = Vec::with_capacity(levels + 1);
    bands.push(frame.clone());
    for l in 0..levels {
        let down = pyr_down(&bands[l]);
        bands.push(down);
    }
    Ok(Pyramid { bands })
}

/// Laplacian pyramid: band-pass residuals plus the coarsest low-pass image.
pub fn build_laplacian(frame: &Frame, levels: usize) -> EvmResult<Pyramid> {
    check_levels(frame.width(), frame.height(), levels)?;

    let mut bands = Vec::with_capacity(levels + 1);
    let mut current = frame.clone();
    for _ in 0..levels {
        let down = pyr_down(&current);
        let up = pyr_up(&down, current.width(), current.height());
        current.sub_assign(&up);
        bands.push(current);
        current = down;
    }
    bands.push(current);
    Ok(Pyramid { bands })
}

/// Collapse a Laplacian pyramid back to a full-resolution frame.
pub fn reconstruct(pyramid: Pyramid) -> Frame {
    let mut bands = pyramid.bands;
    let mut current = bands.pop().expect("pyramid is never empty");
    while let Some(band) = bands.pop() {
        let mut up = pyr_up(&current, band.width(), band.height());
        up.add_assign(&band);
        current = up;
    }
    current
}

/// Expand a coarse Gaussian level back up a size chain.
///
/// `sizes` is a pyramid's [`Pyramid::sizes`] (finest first); `coarse` must
/// have the dimensions of its last entry.
pub fn expand_to_base(coarse: Frame, sizes: &[(usize, usize)]) -> Frame {
    debug_assert_eq!(sizes.last().copied(), Some(coarse.dims()));

    let mut current = coarse;
    for &(w, h) in sizes.iter().rev().skip(1) {
        current = pyr_up(&current, w, h);
    }
    current
}

/// Blur with the binomial kernel and keep every other row and column.
pub fn pyr_down(src: &Frame) -> Frame {
    let (w, h) = src.dims();
    let dw = w.div_ceil(2);
    let dh = h.div_ceil(2);

    // Horizontal pass at decimated columns, all rows.
    let mut tmp = vec![[0.0f32; 3]; dw * h];
    for y in 0..h {
        let row = src.row(y);
        let out = &mut tmp[y * dw..(y + 1) * dw];
        for (x, dst) in out.iter_mut().enumerate() {
            for (k, &wk) in DOWN_KERNEL.iter().enumerate() {
                let sx = reflect101(2 * x as isize + k as isize - 2, w);
                accumulate(dst, wk, &row[sx]);
            }
        }
    }

    let mut out = Frame::zeros(dw, dh);
    let dst = out.data_mut();
    for y in 0..dh {
        for (k, &wk) in DOWN_KERNEL.iter().enumerate() {
            let sy = reflect101(2 * y as isize + k as isize - 2, h);
            let src_row = &tmp[sy * dw..(sy + 1) * dw];
            let dst_row = &mut dst[y * dw..(y + 1) * dw];
            for (d, s) in dst_row.iter_mut().zip(src_row.iter()) {
                accumulate(d, wk, s);
            }
        }
    }
    out
}

/// Upsample `src` to exactly `width x height` (at most one pixel past `2x`).
///
/// Polyphase form of zero-stuffing followed by the binomial kernel scaled by
/// two per axis: even outputs take `(s[m-1] + 6 s[m] + s[m+1]) / 8`, odd
/// outputs `(s[m] + s[m+1]) / 2`.
pub fn pyr_up(src: &Frame, width: usize, height: usize) -> Frame {
    let (sw, sh) = src.dims();
    debug_assert!(width <= 2 * sw + 1 && height <= 2 * sh + 1);

    let mut tmp = vec![[0.0f32; 3]; width * sh];
    for y in 0..sh {
        let row = src.row(y);
        let out = &mut tmp[y * width..(y + 1) * width];
        for (x, dst) in out.iter_mut().enumerate() {
            for (idx, wk) in up_taps(x, sw) {
                accumulate(dst, wk, &row[idx]);
            }
        }
    }

    let mut out = Frame::zeros(width, height);
    let dst = out.data_mut();
    for y in 0..height {
        let dst_row = &mut dst[y * width..(y + 1) * width];
        for (sy, wk) in up_taps(y, sh) {
            let src_row = &tmp[sy * width..(sy + 1) * width];
            for (d, s) in dst_row.iter_mut().zip(src_row.iter()) {
                accumulate(d, wk, s);
            }
        }
    }
    out
}

/// Source taps for output position `i` of a 2x upsample from `len` samples.
fn up_taps(i: usize, len: usize) -> impl Iterator<Item = (usize, f32)> {
    let m = (i / 2) as isize;
    let taps: [(isize, f32); 3] = if i % 2 == 0 {
        [(m - 1, 1.0 / 8.0), (m, 6.0 / 8.0), (m + 1, 1.0 / 8.0)]
    } else {
        [(m, 0.5), (m + 1, 0.5), (m, 0.0)]
    };
    taps.into_iter()
        .filter(|&(_, w)| w != 0.0)
        .map(move |(j, w)| (reflect101(j, len), w))
}

#[inline]
fn accumulate(acc: &mut Pixel, w: f32, p: &Pixel) {
    acc[0] += w * p[0];
    acc[1] += w * p[1];
    acc[2] += w * p[2];
}

/// Mirror `i` into `[0, len)` without repeating the edge sample.
fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = (2 * len - 2) as isize;
    let r = i.rem_euclid(period) as usize;
    if r < len {
        r
    } else {
        (2 * len - 2) - r
    }
}
