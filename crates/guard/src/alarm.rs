//! Alarm actuator that reports the tone instead of playing it

use alerting::{AlarmActuator, AlarmConfig, AlarmError};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LogAlarm {
    config: AlarmConfig,
    sounding: bool,
}

impl LogAlarm {
    pub fn new(config: AlarmConfig) -> Self {
        Self { config, sounding: false }
    }

    pub fn is_sounding(&self) -> bool {
        self.sounding
    }
}

impl AlarmActuator for LogAlarm {
    fn turn_on(&mut self) -> Result<(), AlarmError> {
        if self.sounding {
            return Ok(());
        }
        warn!(
            "ALARM ON: {} Hz {:?} tone",
            self.config.frequency_hz, self.config.waveform
        );
        self.sounding = true;
        Ok(())
    }

    fn turn_off(&mut self) -> Result<(), AlarmError> {
        if self.sounding {
            info!("Alarm off");
            self.sounding = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_calls_are_harmless() {
        let mut alarm = LogAlarm::new(AlarmConfig::default());
        alarm.turn_off().unwrap();
        alarm.turn_on().unwrap();
        alarm.turn_on().unwrap();
        assert!(alarm.is_sounding());
        alarm.turn_off().unwrap();
        alarm.turn_off().unwrap();
        assert!(!alarm.is_sounding());
    }
}
