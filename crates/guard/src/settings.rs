//! Layered runner settings: defaults, optional TOML file, environment

use std::path::Path;

use alerting::AlarmConfig;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use session::SessionConfig;

/// Environment prefix, e.g. `DROWSY_GUARD__SESSION__FRAME_INTERVAL_MS=50`
pub const ENV_PREFIX: &str = "DROWSY_GUARD";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionConfig,
    pub alarm: AlarmConfig,
}

impl Settings {
    /// Load defaults, then `path` if given, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Parse settings from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::Waveform;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_toml(
            r#"
            [session]
            frame_interval_ms = 50

            [session.dms.thresholds]
            ear_threshold = 0.2
            eyes_dwell_ms = 2000

            [alarm]
            waveform = "sine"
            "#,
        )
        .unwrap();

        assert_eq!(settings.session.frame_interval_ms, 50);
        assert_eq!(settings.session.dms.thresholds.ear_threshold, 0.2);
        assert_eq!(settings.session.dms.thresholds.eyes_dwell_ms, 2000);
        assert_eq!(settings.session.dms.thresholds.yawn_dwell_ms, 1200);
        assert_eq!(settings.alarm.waveform, Waveform::Sine);
        assert_eq!(settings.alarm.frequency_hz, 850.0);
    }

    #[test]
    fn test_missing_file_is_error() {
        let missing = Path::new("/nonexistent/drowsy-guard.toml");
        assert!(Settings::load(Some(missing)).is_err());
    }
}
