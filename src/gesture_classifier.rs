use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

use crate::hand_landmarks::{angle_between, Finger, HandLandmark, LandmarkSet};

/// Recognized gesture labels, in classifier priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    /// Thumb, index and pinky extended, middle and ring curled.
    ILoveYou,
    /// Index and middle extended and spread, ring and pinky curled.
    PeaceSign,
    /// All five fingers extended.
    OpenHand,
    /// Index extended, everything else curled.
    PointingUp,
    /// Thumb extended, everything else curled.
    ThumbsUp,
    /// No fingers extended.
    Fist,
}

impl GestureLabel {
    pub const ALL: [GestureLabel; 6] = [
        GestureLabel::ILoveYou,
        GestureLabel::PeaceSign,
        GestureLabel::OpenHand,
        GestureLabel::PointingUp,
        GestureLabel::ThumbsUp,
        GestureLabel::Fist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ILoveYou => "i-love-you",
            Self::PeaceSign => "peace-sign",
            Self::OpenHand => "open-hand",
            Self::PointingUp => "pointing-up",
            Self::ThumbsUp => "thumbs-up",
            Self::Fist => "fist",
        }
    }

    /// Display text for this label.
    pub fn text(&self) -> &'static str {
        match self {
            Self::ILoveYou => "I love you",
            Self::PeaceSign => "How are you?",
            Self::OpenHand => "Hello!",
            Self::PointingUp => "My name is...",
            Self::ThumbsUp => "Thank you!",
            Self::Fist => "I need help",
        }
    }

    /// Fixed nominal confidence carried by this label.
    pub fn nominal_confidence(&self) -> f32 {
        match self {
            Self::ILoveYou => 0.95,
            Self::PeaceSign => 0.85,
            Self::OpenHand => 0.92,
            Self::PointingUp => 0.88,
            Self::ThumbsUp => 0.95,
            Self::Fist => 0.82,
        }
    }
}

/// An unstabilized per-frame gesture guess.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub label: Option<GestureLabel>,
    pub confidence: f32,
    pub timestamp: Instant,
}

impl Candidate {
    pub fn none(timestamp: Instant) -> Self {
        Self {
            label: None,
            confidence: 0.0,
            timestamp,
        }
    }

    pub fn of(label: GestureLabel, timestamp: Instant) -> Self {
        Self {
            label: Some(label),
            confidence: label.nominal_confidence(),
            timestamp,
        }
    }
}

/// Per-frame classification capability.
///
/// Implementations must never panic on malformed landmark input; a frame the
/// classifier cannot make sense of yields a null candidate.
pub trait GestureClassifier: Send {
    fn classify(&mut self, landmarks: Option<&LandmarkSet>, now: Instant) -> Candidate;
}

/// Thresholds for the geometric heuristic classifier.
#[derive(Debug, Clone)]
pub struct GeometricConfig {
    /// Minimum joint angle (radians) for the thumb to count as extended.
    pub thumb_angle_rad: f32,
    /// Minimum joint angle (radians) for the other fingers.
    pub finger_angle_rad: f32,
    /// Minimum angle (radians) between index and middle directions for a
    /// peace sign.
    pub spread_angle_rad: f32,
}

impl Default for GeometricConfig {
    fn default() -> Self {
        Self {
            thumb_angle_rad: 0.3,
            finger_angle_rad: 0.7,
            spread_angle_rad: 0.15,
        }
    }
}

/// Classifies gestures from hand geometry alone.
///
/// A finger counts as extended when both the angle at its middle joint
/// (tip-mid-base) and the angle at its base joint relative to the wrist
/// exceed the configured threshold; a curled finger folds both angles flat.
/// Pattern matchers then test the finger-state vector in a fixed priority
/// order and the first match wins.
pub struct GeometricClassifier {
    config: GeometricConfig,
}

impl GeometricClassifier {
    pub fn new(config: GeometricConfig) -> Self {
        Self { config }
    }

    fn finger_extended(&self, landmarks: &LandmarkSet, finger: Finger) -> bool {
        let (base, mid, tip) = finger.joints();
        let threshold = match finger {
            Finger::Thumb => self.config.thumb_angle_rad,
            _ => self.config.finger_angle_rad,
        };

        let mid_angle = landmarks.joint_angle(tip, mid, base);
        let base_angle = landmarks.joint_angle(mid, base, HandLandmark::Wrist);
        mid_angle > threshold && base_angle > threshold
    }

    fn fingers_spread(&self, landmarks: &LandmarkSet, a: Finger, b: Finger) -> bool {
        let (a_base, _, a_tip) = a.joints();
        let (b_base, _, b_tip) = b.joints();
        let da = [
            landmarks.point(a_tip).x - landmarks.point(a_base).x,
            landmarks.point(a_tip).y - landmarks.point(a_base).y,
            landmarks.point(a_tip).z - landmarks.point(a_base).z,
        ];
        let db = [
            landmarks.point(b_tip).x - landmarks.point(b_base).x,
            landmarks.point(b_tip).y - landmarks.point(b_base).y,
            landmarks.point(b_tip).z - landmarks.point(b_base).z,
        ];
        angle_between(da, db) > self.config.spread_angle_rad
    }

    fn match_pattern(&self, landmarks: &LandmarkSet) -> Option<GestureLabel> {
        let extended: Vec<bool> = Finger::ALL
            .iter()
            .map(|f| self.finger_extended(landmarks, *f))
            .collect();
        let [thumb, index, middle, ring, pinky] = [
            extended[0],
            extended[1],
            extended[2],
            extended[3],
            extended[4],
        ];

        if thumb && index && pinky && !middle && !ring {
            return Some(GestureLabel::ILoveYou);
        }
        if index && middle && !ring && !pinky
            && self.fingers_spread(landmarks, Finger::Index, Finger::Middle)
        {
            return Some(GestureLabel::PeaceSign);
        }
        if thumb && index && middle && ring && pinky {
            return Some(GestureLabel::OpenHand);
        }
        if index && !thumb && !middle && !ring && !pinky {
            return Some(GestureLabel::PointingUp);
        }
        if thumb && !index && !middle && !ring && !pinky {
            return Some(GestureLabel::ThumbsUp);
        }
        if !thumb && !index && !middle && !ring && !pinky {
            return Some(GestureLabel::Fist);
        }
        None
    }
}

impl GestureClassifier for GeometricClassifier {
    fn classify(&mut self, landmarks: Option<&LandmarkSet>, now: Instant) -> Candidate {
        // Malformed input fails closed; the frame loop must never see a panic.
        let landmarks = match landmarks {
            Some(set) if set.is_well_formed() => set,
            _ => return Candidate::none(now),
        };

        match self.match_pattern(landmarks) {
            Some(label) => Candidate::of(label, now),
            None => Candidate::none(now),
        }
    }
}

/// Demo-mode classifier producing random label runs, ignoring landmarks.
///
/// Labels are held for several frames so the stream still looks like a noisy
/// classifier rather than white noise the stabilizer would reject outright.
pub struct SimulatedClassifier {
    rng: StdRng,
    current: Option<GestureLabel>,
    switch_probability: f64,
}

impl SimulatedClassifier {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            current: None,
            switch_probability: 0.1,
        }
    }

    #[cfg(test)]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            current: None,
            switch_probability: 0.1,
        }
    }
}

impl Default for SimulatedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureClassifier for SimulatedClassifier {
    fn classify(&mut self, _landmarks: Option<&LandmarkSet>, now: Instant) -> Candidate {
        if self.current.is_none() || self.rng.random_bool(self.switch_probability) {
            // One slot past the label set means "no hand".
            let pick = self.rng.random_range(0..=GestureLabel::ALL.len());
            self.current = GestureLabel::ALL.get(pick).copied();
        }

        match self.current {
            Some(label) => Candidate::of(label, now),
            None => Candidate::none(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand_landmarks::{LandmarkPoint, LANDMARK_COUNT};

    /// A hand with every finger pointing straight up from the wrist.
    fn open_hand() -> LandmarkSet {
        let mut points = vec![LandmarkPoint::default(); LANDMARK_COUNT];
        points[HandLandmark::Wrist.index()] = LandmarkPoint::new(0.5, 0.9, 0.0);
        for (i, finger) in Finger::ALL.iter().enumerate() {
            let x = 0.3 + 0.1 * i as f32;
            let (base, mid, tip) = finger.joints();
            points[base.index()] = LandmarkPoint::new(x, 0.7, 0.0);
            points[mid.index()] = LandmarkPoint::new(x, 0.5, 0.0);
            points[tip.index()] = LandmarkPoint::new(x, 0.3, 0.0);
        }
        LandmarkSet::new(points)
    }

    /// Curl a finger back toward the wrist.
    fn curl(set: &mut LandmarkSet, finger: Finger) {
        let (base, mid, tip) = finger.joints();
        let base_point = *set.point(base);
        set.points[mid.index()] = LandmarkPoint::new(base_point.x, base_point.y + 0.03, 0.02);
        set.points[tip.index()] = LandmarkPoint::new(base_point.x, base_point.y + 0.05, 0.0);
    }

    fn classify(set: &LandmarkSet) -> Candidate {
        let mut classifier = GeometricClassifier::new(GeometricConfig::default());
        classifier.classify(Some(set), Instant::now())
    }

    #[test]
    fn test_no_hand_yields_null_candidate() {
        let mut classifier = GeometricClassifier::new(GeometricConfig::default());
        let candidate = classifier.classify(None, Instant::now());
        assert_eq!(candidate.label, None);
        assert_eq!(candidate.confidence, 0.0);
    }

    #[test]
    fn test_malformed_landmarks_fail_closed() {
        let mut classifier = GeometricClassifier::new(GeometricConfig::default());
        let short = LandmarkSet::new(vec![LandmarkPoint::default(); 3]);
        let candidate = classifier.classify(Some(&short), Instant::now());
        assert_eq!(candidate.label, None);
    }

    #[test]
    fn test_open_hand() {
        let candidate = classify(&open_hand());
        assert_eq!(candidate.label, Some(GestureLabel::OpenHand));
        assert_eq!(candidate.confidence, GestureLabel::OpenHand.nominal_confidence());
    }

    #[test]
    fn test_fist() {
        let mut set = open_hand();
        for finger in Finger::ALL {
            curl(&mut set, finger);
        }
        assert_eq!(classify(&set).label, Some(GestureLabel::Fist));
    }

    #[test]
    fn test_pointing_up() {
        let mut set = open_hand();
        for finger in [Finger::Thumb, Finger::Middle, Finger::Ring, Finger::Pinky] {
            curl(&mut set, finger);
        }
        assert_eq!(classify(&set).label, Some(GestureLabel::PointingUp));
    }

    #[test]
    fn test_thumbs_up() {
        let mut set = open_hand();
        for finger in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky] {
            curl(&mut set, finger);
        }
        assert_eq!(classify(&set).label, Some(GestureLabel::ThumbsUp));
    }

    #[test]
    fn test_peace_sign_requires_spread() {
        let mut set = open_hand();
        for finger in [Finger::Thumb, Finger::Ring, Finger::Pinky] {
            curl(&mut set, finger);
        }
        // Spread index and middle tips apart.
        set.points[HandLandmark::IndexTip.index()] = LandmarkPoint::new(0.32, 0.3, 0.0);
        set.points[HandLandmark::MiddleTip.index()] = LandmarkPoint::new(0.58, 0.3, 0.0);
        assert_eq!(classify(&set).label, Some(GestureLabel::PeaceSign));
    }

    #[test]
    fn test_i_love_you() {
        let mut set = open_hand();
        curl(&mut set, Finger::Middle);
        curl(&mut set, Finger::Ring);
        assert_eq!(classify(&set).label, Some(GestureLabel::ILoveYou));
    }

    #[test]
    fn test_simulated_classifier_produces_runs() {
        let mut classifier = SimulatedClassifier::seeded(42);
        let now = Instant::now();
        let labels: Vec<_> = (0..100).map(|_| classifier.classify(None, now).label).collect();
        // At least one label must repeat back to back for the stabilizer to
        // ever confirm anything.
        assert!(labels.windows(2).any(|w| w[0].is_some() && w[0] == w[1]));
    }
}
