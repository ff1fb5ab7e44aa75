use thiserror::Error;

/// Everything that can go wrong between the camera and a gesture reading.
///
/// None of these are fatal to the scene: the frame loop logs them and keeps
/// running, in manual-toggle mode if need be.
#[derive(Debug, Error)]
pub enum GestureError {
    /// Camera or detector model could not be acquired.
    #[error("{what} unavailable: {reason}")]
    Unavailable { what: &'static str, reason: String },

    /// Pixel buffer does not hold `width * height` RGBA pixels.
    #[error("frame {width}x{height} expects {expected} bytes, got {actual}")]
    InvalidFrame { width: u32, height: u32, expected: usize, actual: usize },

    /// The external detector failed during inference.
    #[error("detector {detector} failed: {reason}")]
    Detector { detector: String, reason: String },

    /// The background inference thread panicked.
    #[error("gesture worker panicked")]
    WorkerPanicked,
}

impl GestureError {
    pub fn camera_unavailable(reason: impl Into<String>) -> Self {
        GestureError::Unavailable { what: "camera", reason: reason.into() }
    }

    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        GestureError::Unavailable { what: "hand model", reason: reason.into() }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, GestureError::Unavailable { .. })
    }
}
