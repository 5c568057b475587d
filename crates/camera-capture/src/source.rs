//! Frame source capability

use crate::frame::VideoFrame;
use tracing::debug;

/// Supplies video frames on demand.
///
/// Opening and closing the underlying device is the implementor's concern.
pub trait FrameSource: Send + 'static {
    /// Whether the source can currently supply frames at all
    fn is_available(&self) -> bool;

    /// Pull the next frame, or `None` when no frame is ready right now
    fn next_frame(&mut self) -> Option<VideoFrame>;
}

/// Source producing a bounded number of frame handles.
///
/// Used when landmarks come from a recording rather than from pixels: each
/// frame only carries its sequence number so the model can look it up.
#[derive(Debug, Clone)]
pub struct TickSource {
    width: u32,
    height: u32,
    interval_ns: u64,
    next_sequence: u32,
    total: u32,
}

impl TickSource {
    /// Create a source that yields `total` frames spaced `interval_ms` apart
    pub fn new(total: u32, interval_ms: u64) -> Self {
        Self {
            width: 640,
            height: 480,
            interval_ns: interval_ms * 1_000_000,
            next_sequence: 0,
            total,
        }
    }

    /// Frames not yet handed out
    pub fn remaining(&self) -> u32 {
        self.total - self.next_sequence
    }
}

impl FrameSource for TickSource {
    fn is_available(&self) -> bool {
        self.total > 0
    }

    fn next_frame(&mut self) -> Option<VideoFrame> {
        if self.next_sequence >= self.total {
            debug!("Tick source exhausted after {} frames", self.total);
            return None;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Some(VideoFrame::new(
            self.width,
            self.height,
            u64::from(sequence) * self.interval_ns,
            sequence,
        ))
    }
}
