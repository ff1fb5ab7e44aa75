//! The gesture-classifier capability and start-up selection.
//!
//! Two implementations exist: [`LandmarkClassifier`] (needs an external
//! hand-skeleton detector) and [`SkinHeuristicClassifier`] (needs nothing).
//! Their thresholds were tuned independently and are not interchangeable, so
//! exactly one is chosen at start-up by [`select_classifier`] and kept for
//! the session.
//!
//! Coordinate convention shared by both: `x, y ∈ [-1, 1]`, `+x` to the
//! viewer's right with the image mirrored (selfie view), `+y` up.

use log::{info, warn};

use crate::error::GestureError;
use crate::frame::VideoFrame;
use crate::landmark::{HandLandmarkDetector, LandmarkClassifier};
use crate::skin::{SkinHeuristicClassifier, SkinHeuristicConfig};

/// One classified frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureReading {
    pub hand_open: bool,
    pub x:         f32,
    pub y:         f32,
}

impl GestureReading {
    /// What "no hand" reads as: closed (⇒ formed), centred.
    pub const NEUTRAL: GestureReading = GestureReading { hand_open: false, x: 0.0, y: 0.0 };
}

pub trait GestureClassifier: Send + 'static {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means no hand in the frame.
    fn classify(&mut self, frame: &VideoFrame) -> Result<Option<GestureReading>, GestureError>;

    /// Like [`classify`](Self::classify) but folds "no hand" into the
    /// neutral reading.
    fn sample(&mut self, frame: &VideoFrame) -> Result<GestureReading, GestureError> {
        Ok(self.classify(frame)?.unwrap_or(GestureReading::NEUTRAL))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    Landmark,
    #[default]
    SkinHeuristic,
}

impl ClassifierKind {
    pub fn label(self) -> &'static str {
        match self {
            ClassifierKind::Landmark      => "landmark",
            ClassifierKind::SkinHeuristic => "skin",
        }
    }
}

/// Pick the classifier for this session.
///
/// `load_detector` is only called when the landmark strategy is preferred;
/// if it fails the skin heuristic (with `skin`) is used instead.
pub fn select_classifier<F>(
    preferred:     ClassifierKind,
    skin:          SkinHeuristicConfig,
    load_detector: F,
) -> Box<dyn GestureClassifier>
where
    F: FnOnce() -> Result<Box<dyn HandLandmarkDetector>, GestureError>,
{
    let chosen: Box<dyn GestureClassifier> = match preferred {
        ClassifierKind::SkinHeuristic => Box::new(SkinHeuristicClassifier::new(skin)),
        ClassifierKind::Landmark => match load_detector() {
            Ok(detector) => Box::new(LandmarkClassifier::new(detector)),
            Err(e) => {
                warn!("{}; falling back to skin heuristic", e);
                Box::new(SkinHeuristicClassifier::new(skin))
            }
        },
    };
    info!("gesture classifier: {}", chosen.name());
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::HandLandmarks;

    struct Blind;

    impl HandLandmarkDetector for Blind {
        fn name(&self) -> &str { "blind" }
        fn detect(&mut self, _: &VideoFrame) -> Result<Option<HandLandmarks>, GestureError> {
            Ok(None)
        }
    }

    #[test]
    fn landmark_when_detector_loads() {
        let c = select_classifier(ClassifierKind::Landmark, SkinHeuristicConfig::default(), || Ok(Box::new(Blind) as Box<dyn HandLandmarkDetector>));
        assert_eq!(c.name(), "landmark");
    }

    #[test]
    fn falls_back_when_model_missing() {
        let c = select_classifier(ClassifierKind::Landmark, SkinHeuristicConfig::default(), || Err(GestureError::model_unavailable("no weights")));
        assert_eq!(c.name(), "skin-heuristic");
    }

    #[test]
    fn skin_never_loads_detector() {
        let c = select_classifier(ClassifierKind::SkinHeuristic, SkinHeuristicConfig::default(), || -> Result<Box<dyn HandLandmarkDetector>, GestureError> {
            panic!("detector should not be loaded")
        });
        assert_eq!(c.name(), "skin-heuristic");
    }

    #[test]
    fn sample_folds_no_hand_into_neutral() {
        let mut c = select_classifier(ClassifierKind::Landmark, SkinHeuristicConfig::default(), || Ok(Box::new(Blind) as Box<dyn HandLandmarkDetector>));
        let f = VideoFrame::filled(8, 8, [0, 0, 0]);
        assert_eq!(c.sample(&f).unwrap(), GestureReading::NEUTRAL);
    }
}
