//! Per-frame geometric metrics derived from facial landmarks

use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::landmarks::{index, LandmarkFrame, LandmarkPoint};

/// Denominators below this are treated as degenerate geometry
const MIN_SPAN: f32 = 1e-6;

/// Reference nose height for head-down detection.
///
/// Latched on the first face seen after a reset and never moved until the
/// next reset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Baseline {
    nose_y: Option<f32>,
}

impl Baseline {
    pub fn nose_y(&self) -> Option<f32> {
        self.nose_y
    }

    pub fn is_set(&self) -> bool {
        self.nose_y.is_some()
    }

    /// Forget the latched value
    pub fn clear(&mut self) {
        self.nose_y = None;
    }

    /// Latched value, latching `current` if nothing is latched yet
    fn latch(&mut self, current: f32) -> f32 {
        *self.nose_y.get_or_insert_with(|| {
            debug!("Baseline nose Y set: {:.4}", current);
            current
        })
    }
}

/// Scalar metrics for one frame with a face
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    /// Mean eye-aspect ratio of both eyes
    pub ear_avg: f32,
    /// Inner-lip opening over mouth width
    pub mouth_ratio: f32,
    /// Nose tip Y minus baseline nose Y (positive = lower)
    pub nose_drop: f32,
    /// Angle of the outer-eye-corner line in degrees
    pub tilt_angle_deg: f32,
}

/// Result of metric extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extraction {
    Face(MetricSample),
    NoFace,
}

impl Extraction {
    pub fn sample(&self) -> Option<&MetricSample> {
        match self {
            Extraction::Face(sample) => Some(sample),
            Extraction::NoFace => None,
        }
    }
}

/// `None` when the denominator span has collapsed
fn ratio(numerator: f32, denominator: f32) -> Option<f32> {
    if denominator < MIN_SPAN {
        None
    } else {
        Some(numerator / denominator)
    }
}

fn eye_aspect_ratio(
    frame: &LandmarkFrame,
    corners: (usize, usize),
    vertical: [(usize, usize); 2],
) -> Option<f32> {
    let horizontal = distance(frame, corners)?;
    let v0 = distance(frame, vertical[0])?;
    let v1 = distance(frame, vertical[1])?;
    ratio(v0 + v1, 2.0 * horizontal)
}

fn distance(frame: &LandmarkFrame, (a, b): (usize, usize)) -> Option<f32> {
    Some(frame.point(a)?.distance(frame.point(b)?))
}

fn tilt_degrees(left: &LandmarkPoint, right: &LandmarkPoint) -> f32 {
    (right.y - left.y).atan2(right.x - left.x).to_degrees()
}

/// Map one frame's landmarks to metrics.
///
/// An empty frame, or one whose eye or mouth width has collapsed to a
/// point, yields [`Extraction::NoFace`] and leaves `baseline` untouched. Otherwise the baseline is latched on first use, so the first
/// face after a reset always has `nose_drop == 0`.
pub fn extract(frame: &LandmarkFrame, baseline: &mut Baseline) -> Extraction {
    match try_extract(frame, baseline) {
        Some(sample) => Extraction::Face(sample),
        None => Extraction::NoFace,
    }
}

fn try_extract(frame: &LandmarkFrame, baseline: &mut Baseline) -> Option<MetricSample> {
    if frame.is_empty() {
        return None;
    }

    let left = eye_aspect_ratio(frame, index::LEFT_EYE_CORNERS, index::LEFT_EYE_VERTICAL)?;
    let right = eye_aspect_ratio(frame, index::RIGHT_EYE_CORNERS, index::RIGHT_EYE_VERTICAL)?;
    let mouth_ratio = ratio(
        distance(frame, index::INNER_LIPS)?,
        distance(frame, index::MOUTH_CORNERS)?,
    )?;

    let nose_y = frame.point(index::NOSE_TIP)?.y;
    let nose_drop = nose_y - baseline.latch(nose_y);

    let (outer_left, outer_right) = index::OUTER_EYE_CORNERS;
    let tilt_angle_deg = tilt_degrees(frame.point(outer_left)?, frame.point(outer_right)?);

    let sample = MetricSample {
        ear_avg: (left + right) / 2.0,
        mouth_ratio,
        nose_drop,
        tilt_angle_deg,
    };
    debug!(
        "EAR {:.4} mouth {:.4} nose drop {:.4} tilt {:.2}",
        sample.ear_avg, sample.mouth_ratio, sample.nose_drop, sample.tilt_angle_deg
    );
    Some(sample)
}
