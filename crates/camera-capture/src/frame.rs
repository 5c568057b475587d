//! Video frame types

/// Handle to one captured video frame.
///
/// Pixels stay with the frame source; the landmark model resolves the
/// handle to whatever image data it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFrame {
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }
}
