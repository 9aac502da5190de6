//! PNG directory frame I/O.

use std::path::{Path, PathBuf};

use evm_common::error::{EvmError, EvmResult};
use evm_core::{Frame, FrameSink, FrameSource};
use image::{ImageBuffer, Rgb};

/// Reads `*.png` files from a directory in file-name order.
pub struct PngDirSource {
    paths: Vec<PathBuf>,
    next: usize,
    frame_rate: f64,
}

impl PngDirSource {
    pub fn open(dir: &Path, frame_rate: f64) -> EvmResult<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(EvmError::invalid_config(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if is_png {
                paths.push(path);
            }
        }
        paths.sort();

        tracing::debug!(dir = %dir.display(), frames = paths.len(), "Opened PNG sequence");
        Ok(Self {
            paths,
            next: 0,
            frame_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for PngDirSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> EvmResult<Option<Frame>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;

        let img = image::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to decode {}: {e}", path.display()))?
            .to_rgb8();
        let (w, h) = img.dimensions();
        Frame::from_rgb8(w as usize, h as usize, img.as_raw()).map(Some)
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.paths.len() - self.next)
    }
}

/// Writes frames as `<prefix>_00000.png`, `<prefix>_00001.png`, ...
pub struct PngDirSink {
    dir: PathBuf,
    prefix: String,
    written: usize,
}

impl PngDirSink {
    pub fn create(dir: &Path, prefix: impl Into<String>) -> EvmResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.into(),
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("{}_{index:05}.png", self.prefix))
    }
}

impl FrameSink for PngDirSink {
    fn write_frame(&mut self, frame: Frame) -> EvmResult<()> {
        let (w, h) = frame.dims();
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_raw(w as u32, h as u32, frame.to_rgb8())
                .ok_or_else(|| anyhow::anyhow!("RGB buffer does not match {w}x{h}"))?;

        let path = self.frame_path(self.written);
        img.save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> EvmResult<()> {
        tracing::debug!(dir = %self.dir.display(), frames = self.written, "PNG sequence written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_round_trip_preserves_order_and_pixels() {
        let dir = std::env::temp_dir().join("evm_test_png_dir");
        let _ = std::fs::remove_dir_all(&dir);

        let mut sink = PngDirSink::create(&dir, "frame").unwrap();
        for v in [0.0f32, 0.5, 1.0] {
            sink.write_frame(Frame::new_fill(4, 3, [v, 1.0 - v, 0.25]))
                .unwrap();
        }
        sink.finish().unwrap();
        assert_eq!(sink.written(), 3);
        assert!(dir.join("frame_00002.png").exists());

        let mut source = PngDirSource::open(&dir, 30.0).unwrap();
        assert_eq!(source.len(), 3);
        let mut firsts = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.dims(), (4, 3));
            firsts.push(frame.get(0, 0).unwrap()[0]);
        }
        assert_eq!(firsts.len(), 3);
        assert!(firsts[0] < 0.01 && (firsts[1] - 0.5).abs() < 0.01 && firsts[2] > 0.99);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_source_rejects_bad_rate() {
        let dir = std::env::temp_dir();
        assert!(PngDirSource::open(&dir, 0.0).is_err());
    }
}
