//! Detection Session
//!
//! Start/stop lifecycle around the drowsiness classifier. A running session
//! is one cooperative task that pulls a frame, runs the landmark model,
//! classifies, drives the alarm and publishes the result, then waits for
//! the next frame tick.

mod controller;
mod worker;

pub use controller::{SessionController, SessionPhase};

use dms::{DmsConfig, DmsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session error types
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No video frame source available")]
    NoFrameSource,

    #[error("Landmark model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Detection session already running")]
    AlreadyRunning,

    #[error(transparent)]
    Config(#[from] DmsError),
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between frame pulls (milliseconds)
    pub frame_interval_ms: u64,

    /// Classifier configuration
    pub dms: DmsConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 33, // ~30fps
            dms: DmsConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.frame_interval_ms == 0 {
            return Err(DmsError::Config("frame_interval_ms must be non-zero".into()).into());
        }
        self.dms.validate()?;
        Ok(())
    }
}
