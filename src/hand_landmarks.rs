/// Number of tracked points per hand, matching the common 21-point
/// hand-skeleton layout (wrist + 4 joints per finger).
pub const LANDMARK_COUNT: usize = 21;

/// A single tracked 3-D point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl LandmarkPoint {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &LandmarkPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn sub(&self, other: &LandmarkPoint) -> [f32; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }
}

/// Named indices into a 21-point landmark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc = 1,
    ThumbMcp = 2,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexMcp = 5,
    IndexPip = 6,
    IndexDip = 7,
    IndexTip = 8,
    MiddleMcp = 9,
    MiddlePip = 10,
    MiddleDip = 11,
    MiddleTip = 12,
    RingMcp = 13,
    RingPip = 14,
    RingDip = 15,
    RingTip = 16,
    PinkyMcp = 17,
    PinkyPip = 18,
    PinkyDip = 19,
    PinkyTip = 20,
}

impl HandLandmark {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One finger described by its base (MCP), middle (PIP) and tip joints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// (base, mid, tip) joint indices for this finger.
    ///
    /// For the thumb the IP joint plays the role of the middle joint.
    pub fn joints(self) -> (HandLandmark, HandLandmark, HandLandmark) {
        match self {
            Finger::Thumb => (HandLandmark::ThumbMcp, HandLandmark::ThumbIp, HandLandmark::ThumbTip),
            Finger::Index => (HandLandmark::IndexMcp, HandLandmark::IndexPip, HandLandmark::IndexTip),
            Finger::Middle => (
                HandLandmark::MiddleMcp,
                HandLandmark::MiddlePip,
                HandLandmark::MiddleTip,
            ),
            Finger::Ring => (HandLandmark::RingMcp, HandLandmark::RingPip, HandLandmark::RingTip),
            Finger::Pinky => (HandLandmark::PinkyMcp, HandLandmark::PinkyPip, HandLandmark::PinkyTip),
        }
    }

    pub fn tip(self) -> HandLandmark {
        self.joints().2
    }
}

/// An ordered set of landmarks for one detected hand.
///
/// Produced per frame and consumed immediately; never persisted.
#[derive(Debug, Clone, Default)]
pub struct LandmarkSet {
    pub points: Vec<LandmarkPoint>,
}

impl LandmarkSet {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    /// Whether the set has the expected 21-point shape.
    pub fn is_well_formed(&self) -> bool {
        self.points.len() == LANDMARK_COUNT
    }

    #[inline]
    pub fn point(&self, landmark: HandLandmark) -> &LandmarkPoint {
        &self.points[landmark.index()]
    }

    /// Angle in radians at `vertex` formed by the segments to `a` and `b`.
    ///
    /// Returns 0.0 when either segment is degenerate so callers never see NaN.
    pub fn joint_angle(&self, a: HandLandmark, vertex: HandLandmark, b: HandLandmark) -> f32 {
        let v = self.point(vertex);
        angle_between(self.point(a).sub(v), self.point(b).sub(v))
    }
}

/// Angle between two vectors in radians, clamped against rounding drift.
pub fn angle_between(u: [f32; 3], v: [f32; 3]) -> f32 {
    let dot = u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
    let nu = (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt();
    let nv = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if nu == 0.0 || nv == 0.0 {
        return 0.0;
    }
    (dot / (nu * nv)).clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_between_right_angle() {
        let angle = angle_between([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_angle_between_degenerate_vector() {
        assert_eq!(angle_between([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_well_formed() {
        let set = LandmarkSet::new(vec![LandmarkPoint::default(); LANDMARK_COUNT]);
        assert!(set.is_well_formed());
        let short = LandmarkSet::new(vec![LandmarkPoint::default(); 5]);
        assert!(!short.is_well_formed());
    }

    #[test]
    fn test_joint_angle_straight_line() {
        let mut points = vec![LandmarkPoint::default(); LANDMARK_COUNT];
        points[HandLandmark::IndexMcp.index()] = LandmarkPoint::new(0.0, 0.0, 0.0);
        points[HandLandmark::IndexPip.index()] = LandmarkPoint::new(0.0, 0.1, 0.0);
        points[HandLandmark::IndexTip.index()] = LandmarkPoint::new(0.0, 0.2, 0.0);
        let set = LandmarkSet::new(points);
        let angle = set.joint_angle(
            HandLandmark::IndexTip,
            HandLandmark::IndexPip,
            HandLandmark::IndexMcp,
        );
        assert!((angle - std::f32::consts::PI).abs() < 1e-4);
    }
}
