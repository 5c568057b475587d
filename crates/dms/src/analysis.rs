//! Per-frame analysis record

use serde::{Deserialize, Serialize};
use crate::metrics::MetricSample;
use crate::state::{ClassifierState, SustainedSignals};

/// Everything the classifier derived from one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Source frame sequence number
    pub sequence: u32,

    /// Session clock at processing time (milliseconds)
    pub timestamp_ms: u64,

    /// Metrics, absent when no face was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricSample>,

    /// Debounced channel outputs
    pub sustained: SustainedSignals,

    /// State after this frame
    pub state: ClassifierState,
}

impl FrameAnalysis {
    pub fn face_detected(&self) -> bool {
        self.metrics.is_some()
    }
}
