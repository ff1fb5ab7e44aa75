//! # hand_gesture
//!
//! Webcam hand gestures for the morph scene: an open hand scatters the tree,
//! a fist (or no hand) re-forms it, and the hand's position steers the
//! camera.
//!
//! ## Pipeline
//!
//! | Stage | Runs on | Type |
//! |---|---|---|
//! | Capture | worker thread | [`FrameSource`] |
//! | Classify (throttled) | worker thread | [`GestureClassifier`] |
//! | Hand-off | shared | [`GestureSlot`] (last write wins) |
//! | Smooth / decay | frame loop | [`GestureTracker`] |
//!
//! ## Classifiers
//!
//! * [`LandmarkClassifier`]: counts extended fingers on a 21-keypoint
//!   skeleton from a [`HandLandmarkDetector`].  Open at ≥ 3 fingers.
//! * [`SkinHeuristicClassifier`]: skin-tone centroid for position,
//!   bright-pixel spread for open/closed.  Needs no model.
//!
//! ## Feature flags
//!
//! * (default) — camera frames and the two software classifiers.
//! * `leap` — `LeapLandmarkDetector`, a LeapMotion controller standing in for
//!   the landmark model.

pub mod error;
pub mod frame;
pub mod classifier;
pub mod skin;
pub mod landmark;
pub mod worker;
pub mod tracker;

pub use classifier::{select_classifier, ClassifierKind, GestureClassifier, GestureReading};
pub use error::GestureError;
pub use frame::{FrameSource, VideoFrame};
pub use landmark::{HandLandmarkDetector, HandLandmarks, LandmarkClassifier};
pub use skin::{SkinHeuristicClassifier, SkinHeuristicConfig, SpreadOrigin};
pub use tracker::{GestureState, GestureTracker, TrackerConfig};
pub use worker::{GestureSample, GestureSlot, GestureWorker, InferenceThrottle, ThrottleConfig};

#[cfg(feature = "leap")]
pub use landmark::LeapLandmarkDetector;
