//! Landmark classifier: finger counting on a 21-keypoint hand skeleton.
//!
//! Keypoint layout (image pixels, top-left origin):
//!
//! | Index | Point |
//! |---|---|
//! | 0 | wrist / palm centre |
//! | 1–4 | thumb CMC, MCP, IP, tip |
//! | 5–8 | index MCP, PIP, DIP, tip |
//! | 9–12 | middle |
//! | 13–16 | ring |
//! | 17–20 | pinky |
//!
//! A finger is extended when its tip is above its base joint; the thumb when
//! its tip is right of its IP joint.  Three or more extended fingers read as
//! an open hand.

use glam::Vec2;

use crate::classifier::{GestureClassifier, GestureReading};
use crate::error::GestureError;
use crate::frame::VideoFrame;

pub const KEYPOINTS: usize = 21;
pub const PALM:      usize = 0;
pub const THUMB_IP:  usize = 3;
pub const THUMB_TIP: usize = 4;
/// `(tip, base)` for index, middle, ring, pinky.
pub const FINGERS: [(usize, usize); 4] = [(8, 5), (12, 9), (16, 13), (20, 17)];

/// Extended fingers needed for "open".
pub const OPEN_MIN_EXTENDED: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandLandmarks {
    pub points: [Vec2; KEYPOINTS],
}

impl HandLandmarks {
    pub fn extended_fingers(&self) -> usize {
        let p = &self.points;
        let thumb = usize::from(p[THUMB_TIP].x > p[THUMB_IP].x);
        thumb + FINGERS.iter().filter(|&&(tip, base)| p[tip].y < p[base].y).count()
    }

    pub fn is_open(&self) -> bool {
        self.extended_fingers() >= OPEN_MIN_EXTENDED
    }

    pub fn palm(&self) -> Vec2 { self.points[PALM] }
}

/// External hand-skeleton model.  Loading it may fail, which is reported as
/// [`GestureError::Unavailable`] by whoever constructs it.
pub trait HandLandmarkDetector: Send + 'static {
    fn name(&self) -> &str;

    /// First hand found in `frame`, if any.
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>, GestureError>;
}

pub struct LandmarkClassifier {
    detector: Box<dyn HandLandmarkDetector>,
}

impl LandmarkClassifier {
    pub fn new(detector: Box<dyn HandLandmarkDetector>) -> Self {
        LandmarkClassifier { detector }
    }

    pub fn detector_name(&self) -> &str { self.detector.name() }
}

/// Palm position normalized to `[-1, 1]`, mirrored horizontally, `+y` up.
pub fn normalize_palm(palm: Vec2, width: u32, height: u32) -> Vec2 {
    let x = -(palm.x / width as f32 - 0.5) * 2.0;
    let y = -(palm.y / height as f32 - 0.5) * 2.0;
    Vec2::new(x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0))
}

impl GestureClassifier for LandmarkClassifier {
    fn name(&self) -> &'static str { "landmark" }

    fn classify(&mut self, frame: &VideoFrame) -> Result<Option<GestureReading>, GestureError> {
        let Some(hand) = self.detector.detect(frame)? else {
            return Ok(None);
        };
        let at = normalize_palm(hand.palm(), frame.width(), frame.height());
        Ok(Some(GestureReading { hand_open: hand.is_open(), x: at.x, y: at.y }))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapLandmarkDetector: LeapMotion hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand skeletons from a LeapMotion controller instead of a vision model.
///
/// The camera frame only supplies the image size; joints are projected from
/// the device's millimetre space (`x` right, `y` up) into that image over a
/// fixed interaction box.
#[cfg(feature = "leap")]
pub struct LeapLandmarkDetector {
    connection: leaprs::Connection,
}

#[cfg(feature = "leap")]
impl LeapLandmarkDetector {
    /// Interaction box, mm: `x ∈ ±BOX_HALF_WIDTH`, `y ∈ [BOX_FLOOR, BOX_FLOOR + BOX_HEIGHT]`.
    const BOX_HALF_WIDTH: f32 = 200.0;
    const BOX_FLOOR:      f32 = 80.0;
    const BOX_HEIGHT:     f32 = 320.0;

    pub fn open() -> Result<Self, GestureError> {
        use leaprs::*;
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| GestureError::model_unavailable(format!("LeapC connection: {:?}", e)))?;
        connection
            .open()
            .map_err(|e| GestureError::model_unavailable(format!("LeapMotion device: {:?}", e)))?;
        Ok(LeapLandmarkDetector { connection })
    }

    fn project(x: f32, y: f32, width: u32, height: u32) -> Vec2 {
        let u = (x + Self::BOX_HALF_WIDTH) / (2.0 * Self::BOX_HALF_WIDTH);
        let v = 1.0 - (y - Self::BOX_FLOOR) / Self::BOX_HEIGHT;
        // The device looks up at the hand; flip x so it matches a camera image.
        Vec2::new((1.0 - u) * width as f32, v * height as f32)
    }
}

#[cfg(feature = "leap")]
impl HandLandmarkDetector for LeapLandmarkDetector {
    fn name(&self) -> &str { "leapmotion" }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>, GestureError> {
        use leaprs::*;
        let (w, h) = (frame.width(), frame.height());
        let msg = match self.connection.poll(10) {
            Ok(m)  => m,
            Err(_) => return Ok(None),
        };
        let Event::Tracking(tracking) = msg.event() else {
            return Ok(None);
        };
        let Some(hand) = tracking.hands().next() else {
            return Ok(None);
        };

        let mut points = [Vec2::ZERO; KEYPOINTS];
        let palm = hand.palm().position();
        points[PALM] = Self::project(palm.x, palm.y, w, h);
        for (f, digit) in hand.digits().enumerate().take(5) {
            let joints = [
                digit.proximal().prev_joint(),
                digit.intermediate().prev_joint(),
                digit.distal().prev_joint(),
                digit.distal().next_joint(),
            ];
            for (k, j) in joints.iter().enumerate() {
                points[1 + f * 4 + k] = Self::project(j.x, j.y, w, h);
            }
        }
        Ok(Some(HandLandmarks { points }))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Upright hand with the palm at `palm`; `open` extends every finger.
    fn hand(palm: Vec2, open: bool) -> HandLandmarks {
        let mut points = [palm; KEYPOINTS];
        let reach = if open { -40.0 } else { 10.0 };
        for (f, &(tip, base)) in FINGERS.iter().enumerate() {
            let x = palm.x - 15.0 + f as f32 * 10.0;
            points[base] = Vec2::new(x, palm.y - 20.0);
            points[tip]  = Vec2::new(x, palm.y - 20.0 + reach);
        }
        points[THUMB_IP]  = Vec2::new(palm.x + 20.0, palm.y - 5.0);
        points[THUMB_TIP] = Vec2::new(palm.x + if open { 35.0 } else { 10.0 }, palm.y - 10.0);
        HandLandmarks { points }
    }

    struct Fixed(Option<HandLandmarks>);

    impl HandLandmarkDetector for Fixed {
        fn name(&self) -> &str { "fixed" }
        fn detect(&mut self, _: &VideoFrame) -> Result<Option<HandLandmarks>, GestureError> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl HandLandmarkDetector for Broken {
        fn name(&self) -> &str { "broken" }
        fn detect(&mut self, _: &VideoFrame) -> Result<Option<HandLandmarks>, GestureError> {
            Err(GestureError::Detector { detector: "broken".into(), reason: "tensor shape".into() })
        }
    }

    fn frame() -> VideoFrame { VideoFrame::filled(640, 480, [0, 0, 0]) }

    #[test]
    fn finger_counting() {
        let open = hand(Vec2::new(320.0, 240.0), true);
        assert_eq!(open.extended_fingers(), 5);
        assert!(open.is_open());
        let fist = hand(Vec2::new(320.0, 240.0), false);
        assert_eq!(fist.extended_fingers(), 0);
        assert!(!fist.is_open());
    }

    #[test]
    fn three_fingers_is_the_threshold() {
        let mut h = hand(Vec2::new(320.0, 240.0), false);
        for &(tip, base) in &FINGERS[..2] {
            h.points[tip].y = h.points[base].y - 30.0;
        }
        assert_eq!(h.extended_fingers(), 2);
        assert!(!h.is_open());
        h.points[THUMB_TIP].x = h.points[THUMB_IP].x + 5.0;
        assert!(h.is_open());
    }

    #[test]
    fn no_landmarks_is_neutral() {
        let mut c = LandmarkClassifier::new(Box::new(Fixed(None)));
        assert_eq!(c.sample(&frame()).unwrap(), GestureReading::NEUTRAL);
    }

    #[test]
    fn palm_maps_mirrored() {
        let mut c = LandmarkClassifier::new(Box::new(Fixed(Some(hand(Vec2::new(160.0, 120.0), true)))));
        let r = c.classify(&frame()).unwrap().unwrap();
        assert!(r.hand_open);
        assert!((r.x - 0.5).abs() < 1e-6);
        assert!((r.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn detector_failure_propagates() {
        let mut c = LandmarkClassifier::new(Box::new(Broken));
        assert!(matches!(c.classify(&frame()), Err(GestureError::Detector { .. })));
    }

    proptest! {
        #[test]
        fn output_is_bounded(px in -100.0f32..740.0, py in -100.0f32..580.0, open in any::<bool>()) {
            let mut c = LandmarkClassifier::new(Box::new(Fixed(Some(hand(Vec2::new(px, py), open)))));
            let r = c.classify(&frame()).unwrap().unwrap();
            prop_assert!((-1.0..=1.0).contains(&r.x));
            prop_assert!((-1.0..=1.0).contains(&r.y));
            prop_assert_eq!(r.hand_open, open);
        }
    }
}
