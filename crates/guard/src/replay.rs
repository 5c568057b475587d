//! Landmark trace replay through a live detection session

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::Context;
use camera_capture::{CameraError, TickSource};
use dms::{ClassifierState, FrameAnalysis, RawFaceMeshResults, ReplayLoader};
use serde::Serialize;
use session::SessionController;
use tracing::{debug, info};

use crate::alarm::LogAlarm;
use crate::settings::Settings;

/// Recorded landmark-model results, one JSON object per line
#[derive(Debug, Clone, Default)]
pub struct TraceRecording {
    frames: Vec<RawFaceMeshResults>,
}

impl TraceRecording {
    pub fn open(path: &Path) -> Result<Self, CameraError> {
        let file = File::open(path).map_err(|e| CameraError::Open(format!("{}: {}", path.display(), e)))?;
        Self::parse(BufReader::new(file))
    }

    /// Parse JSON lines; blank lines are skipped
    pub fn parse(reader: impl BufRead) -> Result<Self, CameraError> {
        let mut frames = Vec::new();
        for (n, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| CameraError::Stream(e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            let results = serde_json::from_str(&line)
                .map_err(|e| CameraError::Format(format!("line {}: {}", n + 1, e)))?;
            frames.push(results);
        }
        debug!("Parsed {} trace frames", frames.len());
        Ok(Self { frames })
    }

    pub fn from_frames(frames: Vec<RawFaceMeshResults>) -> Self {
        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// What the observer saw during a replay
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    pub frames_observed: usize,
    pub drowsy_frames: usize,
    pub yawn_frames: usize,
    pub no_face_frames: usize,
    pub final_state: ClassifierState,
    pub alarm_activations: usize,
}

impl ReplaySummary {
    fn observe(&mut self, analysis: &FrameAnalysis) {
        self.frames_observed += 1;
        match analysis.state {
            ClassifierState::Drowsy => self.drowsy_frames += 1,
            ClassifierState::Yawn => self.yawn_frames += 1,
            ClassifierState::NoFaceDetected => self.no_face_frames += 1,
            _ => {}
        }
        self.final_state = analysis.state;
    }
}

fn write_analysis(out: &mut impl Write, analysis: &FrameAnalysis) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, analysis).context("encoding frame analysis")?;
    writeln!(out).context("writing frame analysis")?;
    Ok(())
}

/// Replay `trace` at the configured frame rate, writing each observed
/// analysis to `out` as a JSON line. Stops after the last recorded frame
/// or on Ctrl-C.
pub async fn run_replay<W: Write>(
    settings: &Settings,
    trace: TraceRecording,
    out: &mut W,
) -> anyhow::Result<ReplaySummary> {
    let total = trace.len();
    let source = TickSource::new(total as u32, settings.session.frame_interval_ms);
    let loader = ReplayLoader::new(trace.frames);
    let alarm = LogAlarm::new(settings.alarm.clone());

    let mut controller = SessionController::new(settings.session.clone(), source, loader, alarm)?;
    let mut analyses = controller.subscribe_analysis();
    controller.start().await?;
    info!("Replaying {} frames", total);

    let mut summary = ReplaySummary::default();
    let result = loop {
        tokio::select! {
            changed = analyses.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let Some(analysis) = analyses.borrow_and_update().clone() else {
                    continue;
                };
                summary.observe(&analysis);
                if let Err(e) = write_analysis(out, &analysis) {
                    break Err(e);
                }
                if analysis.sequence as usize + 1 >= total {
                    break Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break Ok(());
            }
        }
    };

    controller.stop().await;
    summary.alarm_activations = controller.alarm().map(|a| a.activations()).unwrap_or(0);
    result.map(|()| summary)
}
