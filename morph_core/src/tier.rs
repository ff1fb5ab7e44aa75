//! Device tier: the one external flag that scales parameters.
//!
//! The tier never changes the shape of an algorithm, only how many entities
//! it runs over and how often the gesture classifier is allowed to run.

use std::time::Duration;

/// Hardware class the scene is running on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DeviceTier {
    #[default]
    Desktop,
    /// Phones, tablets, small windows.
    Constrained,
}

/// Screens narrower than this are treated as constrained.
pub const CONSTRAINED_WIDTH_PX: u32 = 1024;

impl DeviceTier {
    pub fn from_constrained(is_constrained: bool) -> Self {
        if is_constrained { DeviceTier::Constrained } else { DeviceTier::Desktop }
    }

    /// Classify by available screen width.
    pub fn detect(screen_width_px: u32) -> Self {
        Self::from_constrained(screen_width_px < CONSTRAINED_WIDTH_PX)
    }

    pub fn is_constrained(self) -> bool {
        self == DeviceTier::Constrained
    }

    /// Minimum time between two gesture inferences.
    pub fn inference_interval(self) -> Duration {
        match self {
            DeviceTier::Desktop     => Duration::from_millis(100),
            DeviceTier::Constrained => Duration::from_millis(300),
        }
    }

    /// Capture resolution requested from the camera (width, height).
    pub fn capture_resolution(self) -> (u32, u32) {
        match self {
            DeviceTier::Desktop     => (640, 480),
            DeviceTier::Constrained => (320, 240),
        }
    }

    /// Loading-screen time before the intro starts.
    pub fn intro_delay(self) -> Duration {
        match self {
            DeviceTier::Desktop     => Duration::from_secs(2),
            DeviceTier::Constrained => Duration::from_secs(3),
        }
    }

    /// Multiplier on foliage point sizes so sparse clouds still read as solid.
    pub fn point_size_scale(self) -> f32 {
        match self {
            DeviceTier::Desktop     => 1.0,
            DeviceTier::Constrained => 1.5,
        }
    }
}
