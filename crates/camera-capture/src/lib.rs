//! Camera Capture Library
//!
//! Frame handles and the frame source capability consumed by the
//! drowsiness monitor. Device lifecycle (open/close of the camera) belongs
//! to the implementor of [`FrameSource`]; the monitor only pulls frames.

pub mod frame;
pub mod source;

pub use frame::VideoFrame;
pub use source::{FrameSource, TickSource};

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open frame source: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Streaming error: {0}")]
    Stream(String),
}
