//! Classifier state and per-frame state resolution

use serde::{Deserialize, Serialize};
use crate::config::ChannelThresholds;
use crate::metrics::{Extraction, MetricSample};

/// Drowsiness classifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierState {
    /// Constructed, not yet started
    #[default]
    Idle,
    Awake,
    Drowsy,
    Yawn,
    NoFaceDetected,
    /// Session ended; frozen until the next start
    Stopped,
}

impl ClassifierState {
    /// Whether the alarm must sound in this state
    pub fn requires_alarm(&self) -> bool {
        matches!(self, ClassifierState::Drowsy | ClassifierState::Yawn)
    }

    /// Human-readable status label
    pub fn label(&self) -> &'static str {
        match self {
            ClassifierState::Idle => "Ready",
            ClassifierState::Awake => "Awake",
            ClassifierState::Drowsy => "Drowsy!",
            ClassifierState::Yawn => "Yawning!",
            ClassifierState::NoFaceDetected => "No Face Detected",
            ClassifierState::Stopped => "Detection Stopped",
        }
    }
}

impl std::fmt::Display for ClassifierState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Debounced outputs of the three channels for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SustainedSignals {
    pub eyes: bool,
    pub yawn: bool,
    pub head: bool,
}

/// Whether every instantaneous condition is within its normal range
pub fn is_normal(sample: &MetricSample, thresholds: &ChannelThresholds) -> bool {
    sample.ear_avg >= thresholds.ear_threshold
        && sample.mouth_ratio <= thresholds.mouth_threshold
        && sample.nose_drop <= thresholds.nose_drop_threshold
}

/// Resolve one frame into a state.
///
/// First match wins: no face, then eyes or head (drowsy), then yawn, then
/// awake when all raw metrics are normal. `None` means a condition is
/// abnormal but not yet sustained, and the previous state stands.
pub fn resolve(
    extraction: &Extraction,
    sustained: SustainedSignals,
    thresholds: &ChannelThresholds,
) -> Option<ClassifierState> {
    let sample = match extraction {
        Extraction::NoFace => return Some(ClassifierState::NoFaceDetected),
        Extraction::Face(sample) => sample,
    };

    if sustained.eyes || sustained.head {
        Some(ClassifierState::Drowsy)
    } else if sustained.yawn {
        Some(ClassifierState::Yawn)
    } else if is_normal(sample, thresholds) {
        Some(ClassifierState::Awake)
    } else {
        None
    }
}
