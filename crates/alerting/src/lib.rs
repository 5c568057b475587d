//! Alerting System
//!
//! Drives a binary alarm actuator from the classifier state.

mod controller;

pub use controller::{AlarmActuator, AlarmConfig, AlarmController, Waveform};

use thiserror::Error;

/// Alarm error types
#[derive(Error, Debug)]
pub enum AlarmError {
    #[error("Alarm actuator failure: {0}")]
    Actuator(String),
}
