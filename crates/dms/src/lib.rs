//! Driver Monitoring System (DMS)
//!
//! Turns a stream of facial landmarks into a debounced drowsiness state:
//! - Eye-aspect ratio (eyes closed)
//! - Mouth ratio (yawning)
//! - Nose drop against a per-session baseline (head down)
//! - Head tilt (observed only)

pub mod analysis;
pub mod config;
pub mod debounce;
pub mod detector;
pub mod landmarks;
pub mod metrics;
pub mod sketch;
pub mod state;

pub use analysis::FrameAnalysis;
pub use config::{ChannelThresholds, DmsConfig, FaceMeshOptions};
pub use debounce::ChannelTimer;
pub use detector::{LandmarkModel, ModelLoader, ReplayLoader, ReplayModel};
pub use landmarks::{LandmarkFrame, LandmarkPoint, RawFaceMeshResults};
pub use metrics::{Baseline, Extraction, MetricSample};
pub use state::{ClassifierState, SustainedSignals};

use thiserror::Error;
use tracing::{debug, info};

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid model payload: {0}")]
    InvalidPayload(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-session drowsiness classifier.
///
/// Owns the nose baseline, one timer per channel and the current state.
/// Each instance is independent, so several can run side by side.
#[derive(Debug, Clone)]
pub struct DrowsinessClassifier {
    config: DmsConfig,
    baseline: Baseline,
    eyes: ChannelTimer,
    yawn: ChannelTimer,
    head: ChannelTimer,
    state: ClassifierState,
}

impl DrowsinessClassifier {
    /// Create a classifier in the idle state
    pub fn new(config: DmsConfig) -> Self {
        Self {
            config,
            baseline: Baseline::default(),
            eyes: ChannelTimer::default(),
            yawn: ChannelTimer::default(),
            head: ChannelTimer::default(),
            state: ClassifierState::Idle,
        }
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn state(&self) -> ClassifierState {
        self.state
    }

    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Channel timers in (eyes, yawn, head) order
    pub fn timers(&self) -> (ChannelTimer, ChannelTimer, ChannelTimer) {
        (self.eyes, self.yawn, self.head)
    }

    /// Reset everything and enter the awake state
    pub fn begin(&mut self) {
        self.clear();
        self.state = ClassifierState::Awake;
    }

    /// Reset everything and freeze in the stopped state
    pub fn halt(&mut self) {
        self.clear();
        self.state = ClassifierState::Stopped;
    }

    fn clear(&mut self) {
        self.baseline.clear();
        self.eyes = ChannelTimer::default();
        self.yawn = ChannelTimer::default();
        self.head = ChannelTimer::default();
    }

    /// Classify one frame observed at `now_ms` on the session clock
    pub fn process(&mut self, frame: &LandmarkFrame, sequence: u32, now_ms: u64) -> FrameAnalysis {
        let extraction = metrics::extract(frame, &mut self.baseline);
        let t = self.config.thresholds;

        // a missing face counts as every condition having ceased
        let (eyes_closed, yawning, head_down) = match extraction.sample() {
            Some(s) => (
                s.ear_avg < t.ear_threshold,
                s.mouth_ratio > t.mouth_threshold,
                s.nose_drop > t.nose_drop_threshold,
            ),
            None => (false, false, false),
        };

        let was_idle = [&self.eyes, &self.yawn, &self.head].map(|timer| !timer.is_running());
        let sustained = SustainedSignals {
            eyes: self.eyes.advance(eyes_closed, now_ms, t.eyes_dwell_ms),
            yawn: self.yawn.advance(yawning, now_ms, t.yawn_dwell_ms),
            head: self.head.advance(head_down, now_ms, t.head_dwell_ms),
        };
        for ((name, idle), timer) in ["eyes closed", "yawn", "head down"]
            .into_iter()
            .zip(was_idle)
            .zip([&self.eyes, &self.yawn, &self.head])
        {
            if idle && timer.is_running() {
                debug!("{} timer started at {}ms", name, now_ms);
            }
        }

        if let Some(next) = state::resolve(&extraction, sustained, &t) {
            if next != self.state {
                info!("State {:?} -> {:?} at {}ms", self.state, next, now_ms);
                self.state = next;
            }
        }

        FrameAnalysis {
            sequence,
            timestamp_ms: now_ms,
            metrics: extraction.sample().copied(),
            sustained,
            state: self.state,
        }
    }
}

impl Default for DrowsinessClassifier {
    fn default() -> Self {
        Self::new(DmsConfig::default())
    }
}
