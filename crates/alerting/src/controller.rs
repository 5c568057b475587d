//! Alarm Controller Implementation

use dms::ClassifierState;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::AlarmError;

/// Tone waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Alarm tone configuration, consumed by concrete actuators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// Tone frequency (Hz)
    pub frequency_hz: f32,
    /// Tone waveform
    pub waveform: Waveform,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 850.0,
            waveform: Waveform::Square,
        }
    }
}

/// Binary alarm output (tone, buzzer, light)
pub trait AlarmActuator: Send + 'static {
    fn turn_on(&mut self) -> Result<(), AlarmError>;

    fn turn_off(&mut self) -> Result<(), AlarmError>;
}

/// Keeps the actuator on exactly while the state calls for it.
///
/// Only edges reach the actuator: repeated identical states never issue a
/// second `turn_on` or `turn_off`.
pub struct AlarmController<A> {
    actuator: A,
    active: bool,
    activations: usize,
    /// Consecutive failed `turn_on` attempts in the current alarming run
    failed_starts: u32,
}

impl<A: AlarmActuator> AlarmController<A> {
    /// Create a controller with the alarm assumed off
    pub fn new(actuator: A) -> Self {
        Self {
            actuator,
            active: false,
            activations: 0,
            failed_starts: 0,
        }
    }

    /// React to the state resolved for the latest frame
    pub fn on_state_change(&mut self, state: ClassifierState) {
        let wanted = state.requires_alarm();
        if !wanted {
            self.failed_starts = 0;
        }
        self.set_active(wanted);
    }

    /// Turn the alarm off if it is on
    pub fn shutdown(&mut self) {
        self.set_active(false);
    }

    fn set_active(&mut self, wanted: bool) {
        if wanted == self.active {
            return;
        }

        if wanted {
            match self.actuator.turn_on() {
                Ok(()) => {
                    self.active = true;
                    self.activations += 1;
                    self.failed_starts = 0;
                    info!("Alarm started (activation {})", self.activations);
                }
                // stays inactive so the next alarming frame retries
                Err(e) => {
                    self.failed_starts += 1;
                    if self.failed_starts == 1 {
                        warn!("Failed to start alarm, retrying every alarming frame: {}", e);
                    } else {
                        debug!("Alarm start attempt {} failed: {}", self.failed_starts, e);
                    }
                }
            }
        } else {
            if let Err(e) = self.actuator.turn_off() {
                warn!("Failed to stop alarm: {}", e);
            } else {
                info!("Alarm stopped");
            }
            self.active = false;
        }
        debug!("Alarm active: {}", self.active);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Failed `turn_on` attempts since the alarm last started or was last
    /// not wanted
    pub fn failed_starts(&self) -> u32 {
        self.failed_starts
    }

    /// Successful `turn_on` calls so far
    pub fn activations(&self) -> usize {
        self.activations
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Release the actuator
    pub fn into_actuator(self) -> A {
        self.actuator
    }
}
