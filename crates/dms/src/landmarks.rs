//! Facial landmark data model and model-payload validation

use serde::{Deserialize, Serialize};
use crate::DmsError;

/// Points in the base face-mesh topology
pub const FACE_MESH_POINTS: usize = 468;

/// Points when refined (iris) landmarks are requested
pub const REFINED_FACE_MESH_POINTS: usize = 478;

/// Fixed face-mesh landmark indices
pub mod index {
    /// Nose tip
    pub const NOSE_TIP: usize = 1;

    /// Left eye: horizontal corners, then two vertical eyelid pairs
    pub const LEFT_EYE_CORNERS: (usize, usize) = (33, 133);
    pub const LEFT_EYE_VERTICAL: [(usize, usize); 2] = [(160, 144), (158, 153)];

    /// Right eye: horizontal corners, then two vertical eyelid pairs
    pub const RIGHT_EYE_CORNERS: (usize, usize) = (362, 263);
    pub const RIGHT_EYE_VERTICAL: [(usize, usize); 2] = [(385, 380), (387, 373)];

    /// Inner lips (upper, lower)
    pub const INNER_LIPS: (usize, usize) = (13, 14);
    /// Mouth corners (left, right)
    pub const MOUTH_CORNERS: (usize, usize) = (78, 308);

    /// Outer eye corners used for head tilt (left, right)
    pub const OUTER_EYE_CORNERS: (usize, usize) = (33, 263);
}

/// Normalized 2D landmark coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in normalized image space
    pub fn distance(&self, other: &LandmarkPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One processed frame's landmarks for a single face, or none.
///
/// A non-empty frame always covers the full face-mesh topology, so the
/// fixed indices in [`index`] are valid on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    points: Vec<LandmarkPoint>,
}

impl LandmarkFrame {
    /// Frame with no face
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a frame from one face's points
    pub fn new(points: Vec<LandmarkPoint>) -> Result<Self, DmsError> {
        if points.is_empty() {
            return Ok(Self::empty());
        }
        if points.len() < FACE_MESH_POINTS {
            return Err(DmsError::InvalidPayload(format!(
                "expected at least {} landmarks, got {}",
                FACE_MESH_POINTS,
                points.len()
            )));
        }
        if let Some(i) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(DmsError::InvalidPayload(format!("landmark {i} is not finite")));
        }
        Ok(Self { points })
    }

    /// Validate a raw model result, keeping the first face only
    pub fn from_results(results: RawFaceMeshResults) -> Result<Self, DmsError> {
        let first = results
            .multi_face_landmarks
            .and_then(|faces| faces.into_iter().next());

        match first {
            Some(face) => Self::new(face.into_iter().map(LandmarkPoint::from).collect()),
            None => Ok(Self::empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Landmark at a fixed face-mesh index
    pub fn point(&self, index: usize) -> Option<&LandmarkPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }
}

/// Raw landmark as emitted by the face-mesh model
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawLandmark {
    pub x: f32,
    pub y: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

impl From<RawLandmark> for LandmarkPoint {
    fn from(raw: RawLandmark) -> Self {
        LandmarkPoint::new(raw.x, raw.y)
    }
}

/// Raw per-frame model result before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFaceMeshResults {
    #[serde(default)]
    pub multi_face_landmarks: Option<Vec<Vec<RawLandmark>>>,
}

impl From<&LandmarkFrame> for RawFaceMeshResults {
    /// Re-encode a validated frame in the model's payload shape
    fn from(frame: &LandmarkFrame) -> Self {
        if frame.is_empty() {
            return Self::default();
        }
        let face = frame
            .points()
            .iter()
            .map(|p| RawLandmark { x: p.x, y: p.y, z: None })
            .collect();
        Self { multi_face_landmarks: Some(vec![face]) }
    }
}
