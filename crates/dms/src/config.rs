//! DMS configuration

use serde::{Deserialize, Serialize};
use crate::DmsError;

/// Instantaneous thresholds and dwell times for the three monitored channels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelThresholds {
    /// Eye-aspect ratio below which the eyes count as closed
    pub ear_threshold: f32,

    /// Eyes closed duration before drowsiness (milliseconds)
    pub eyes_dwell_ms: u64,

    /// Mouth ratio above which the mouth counts as yawning
    pub mouth_threshold: f32,

    /// Yawn duration before the yawn state (milliseconds)
    pub yawn_dwell_ms: u64,

    /// Nose drop (normalized units below baseline) counting as head down
    pub nose_drop_threshold: f32,

    /// Head-down duration before drowsiness (milliseconds)
    pub head_dwell_ms: u64,
}

impl Default for ChannelThresholds {
    fn default() -> Self {
        Self {
            ear_threshold: 0.23,
            eyes_dwell_ms: 1500,
            mouth_threshold: 0.6,
            yawn_dwell_ms: 1200,
            nose_drop_threshold: 0.08,
            head_dwell_ms: 1200,
        }
    }
}

/// Options handed to the landmark model when it is configured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceMeshOptions {
    pub max_faces: u32,
    /// Request the refined (iris) landmark set
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for FaceMeshOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

/// DMS configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Channel thresholds and dwell times
    pub thresholds: ChannelThresholds,

    /// Landmark model options
    pub face_mesh: FaceMeshOptions,
}

impl DmsConfig {
    /// Create strict config (shorter dwell times)
    pub fn strict() -> Self {
        Self {
            thresholds: ChannelThresholds {
                eyes_dwell_ms: 1000,
                yawn_dwell_ms: 800,
                head_dwell_ms: 800,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create lenient config (longer dwell times)
    pub fn lenient() -> Self {
        Self {
            thresholds: ChannelThresholds {
                eyes_dwell_ms: 2500,
                yawn_dwell_ms: 2000,
                head_dwell_ms: 2000,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Reject thresholds the classifier cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        let t = &self.thresholds;
        for (name, value) in [
            ("ear_threshold", t.ear_threshold),
            ("mouth_threshold", t.mouth_threshold),
            ("nose_drop_threshold", t.nose_drop_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(DmsError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        for (name, value) in [
            ("eyes_dwell_ms", t.eyes_dwell_ms),
            ("yawn_dwell_ms", t.yawn_dwell_ms),
            ("head_dwell_ms", t.head_dwell_ms),
        ] {
            if value == 0 {
                return Err(DmsError::Config(format!("{name} must be non-zero")));
            }
        }

        let m = &self.face_mesh;
        if m.max_faces == 0 {
            return Err(DmsError::Config("max_faces must be at least 1".into()));
        }
        for (name, value) in [
            ("min_detection_confidence", m.min_detection_confidence),
            ("min_tracking_confidence", m.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DmsError::Config(format!("{name} must be within [0, 1], got {value}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DmsConfig::default();
        assert_eq!(config.thresholds.ear_threshold, 0.23);
        assert_eq!(config.thresholds.eyes_dwell_ms, 1500);
        assert_eq!(config.thresholds.mouth_threshold, 0.6);
        assert_eq!(config.thresholds.yawn_dwell_ms, 1200);
        assert_eq!(config.thresholds.nose_drop_threshold, 0.08);
        assert_eq!(config.thresholds.head_dwell_ms, 1200);
        assert_eq!(config.face_mesh.max_faces, 1);
        assert!(config.face_mesh.refine_landmarks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(DmsConfig::strict().validate().is_ok());
        assert!(DmsConfig::lenient().validate().is_ok());
        assert!(DmsConfig::strict().thresholds.eyes_dwell_ms < DmsConfig::lenient().thresholds.eyes_dwell_ms);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DmsConfig::default();
        config.thresholds.yawn_dwell_ms = 0;
        assert!(matches!(config.validate(), Err(DmsError::Config(_))));

        let mut config = DmsConfig::default();
        config.thresholds.ear_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = DmsConfig::default();
        config.face_mesh.min_tracking_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: DmsConfig =
            serde_json::from_str(r#"{"thresholds":{"eyes_dwell_ms":2000}}"#).unwrap();
        assert_eq!(config.thresholds.eyes_dwell_ms, 2000);
        assert_eq!(config.thresholds.ear_threshold, 0.23);
        assert_eq!(config.face_mesh, FaceMeshOptions::default());
    }
}
