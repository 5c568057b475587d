//! Synthetic face-mesh frames with chosen metric values.
//!
//! Places the handful of landmarks the extractor reads so that the frame
//! measures back as the requested EAR, mouth ratio, nose height and tilt.
//! Used by simulations and tests.

use crate::landmarks::{index, LandmarkFrame, LandmarkPoint, REFINED_FACE_MESH_POINTS};

const EYE_WIDTH: f32 = 0.10;
const MOUTH_WIDTH: f32 = 0.16;
const EYE_Y: f32 = 0.40;
const MOUTH_Y: f32 = 0.70;

/// Target measurements for a synthetic face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceSketch {
    pub ear: f32,
    pub mouth_ratio: f32,
    pub nose_y: f32,
    pub tilt_deg: f32,
}

impl Default for FaceSketch {
    /// Alert face: eyes open, mouth closed, level head
    fn default() -> Self {
        Self {
            ear: 0.30,
            mouth_ratio: 0.20,
            nose_y: 0.50,
            tilt_deg: 0.0,
        }
    }
}

impl FaceSketch {
    /// Same face with the eyes at `ear`
    pub fn eyes(self, ear: f32) -> Self {
        Self { ear, ..self }
    }

    /// Same face with the mouth open to `mouth_ratio`
    pub fn mouth(self, mouth_ratio: f32) -> Self {
        Self { mouth_ratio, ..self }
    }

    /// Same face with the nose tip at `nose_y`
    pub fn nose(self, nose_y: f32) -> Self {
        Self { nose_y, ..self }
    }

    pub fn to_frame(&self) -> LandmarkFrame {
        let mut points = vec![LandmarkPoint::new(0.5, 0.5); REFINED_FACE_MESH_POINTS];

        let lid = self.ear * EYE_WIDTH / 2.0;
        place_eye(&mut points, 0.35, index::LEFT_EYE_CORNERS, index::LEFT_EYE_VERTICAL, lid);
        place_eye(&mut points, 0.55, index::RIGHT_EYE_CORNERS, index::RIGHT_EYE_VERTICAL, lid);

        let (left_corner, right_corner) = index::MOUTH_CORNERS;
        points[left_corner] = LandmarkPoint::new(0.5 - MOUTH_WIDTH / 2.0, MOUTH_Y);
        points[right_corner] = LandmarkPoint::new(0.5 + MOUTH_WIDTH / 2.0, MOUTH_Y);
        let lip = self.mouth_ratio * MOUTH_WIDTH / 2.0;
        let (upper, lower) = index::INNER_LIPS;
        points[upper] = LandmarkPoint::new(0.5, MOUTH_Y - lip);
        points[lower] = LandmarkPoint::new(0.5, MOUTH_Y + lip);

        let nose = LandmarkPoint::new(0.5, self.nose_y);
        points[index::NOSE_TIP] = nose;

        // rotating about the nose tip keeps every distance and the nose height
        if self.tilt_deg != 0.0 {
            let (sin, cos) = self.tilt_deg.to_radians().sin_cos();
            for p in points.iter_mut() {
                let (dx, dy) = (p.x - nose.x, p.y - nose.y);
                *p = LandmarkPoint::new(nose.x + dx * cos - dy * sin, nose.y + dx * sin + dy * cos);
            }
        }

        LandmarkFrame::new(points).unwrap_or_default()
    }
}

fn place_eye(
    points: &mut [LandmarkPoint],
    x0: f32,
    (first, second): (usize, usize),
    vertical: [(usize, usize); 2],
    lid: f32,
) {
    points[first] = LandmarkPoint::new(x0, EYE_Y);
    points[second] = LandmarkPoint::new(x0 + EYE_WIDTH, EYE_Y);
    for ((upper, lower), x) in vertical.into_iter().zip([x0 + 0.03, x0 + 0.07]) {
        points[upper] = LandmarkPoint::new(x, EYE_Y - lid);
        points[lower] = LandmarkPoint::new(x, EYE_Y + lid);
    }
}
