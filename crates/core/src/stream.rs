//! Frame sources and sinks.
//!
//! The pipeline pulls frames from a [`FrameSource`] and pushes results into a
//! [`FrameSink`]. Decoding and encoding live behind these traits; the CLI
//! provides PNG-directory implementations, tests use the in-memory ones here.

use std::collections::VecDeque;

use evm_common::error::{EvmError, EvmResult};

use crate::frame::Frame;

/// Pull-based supplier of RGB frames in [0, 1].
pub trait FrameSource: Send {
    /// Frames per second of the sequence.
    fn frame_rate(&self) -> f64;

    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> EvmResult<Option<Frame>>;

    /// Remaining frame count, if known.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// Consumer of output frames, written in input order.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: Frame) -> EvmResult<()>;

    /// Flush any buffered output.
    fn finish(&mut self) -> EvmResult<()> {
        Ok(())
    }
}

/// Source over frames already in memory.
#[derive(Debug, Clone)]
pub struct VecSource {
    frames: VecDeque<Frame>,
    frame_rate: f64,
}

impl VecSource {
    pub fn new(frames: Vec<Frame>, frame_rate: f64) -> EvmResult<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(EvmError::invalid_config(format!(
                "frame rate must be positive, got {frame_rate}"
            )));
        }
        Ok(Self {
            frames: frames.into(),
            frame_rate,
        })
    }
}

impl FrameSource for VecSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> EvmResult<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}

/// Sink collecting frames into a vector.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    frames: Vec<Frame>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl FrameSink for VecSink {
    fn write_frame(&mut self, frame: Frame) -> EvmResult<()> {
        self.frames.push(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_source_drains_in_order() {
        let frames = vec![
            Frame::new_fill(2, 2, [0.1; 3]),
            Frame::new_fill(2, 2, [0.2; 3]),
        ];
        let mut source = VecSource::new(frames, 25.0).unwrap();
        assert_eq!(source.frame_rate(), 25.0);
        assert_eq!(source.len_hint(), Some(2));

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.get(0, 0), Some(&[0.1; 3]));
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_vec_source_rejects_bad_rate() {
        assert!(VecSource::new(Vec::new(), 0.0).is_err());
        assert!(VecSource::new(Vec::new(), f64::NAN).is_err());
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink = VecSink::new();
        assert!(sink.is_empty());
        sink.write_frame(Frame::zeros(1, 1)).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.into_frames().len(), 1);
    }
}
