//! Skin-tone heuristic classifier.
//!
//! # Algorithm
//!
//! Every `stride`-th pixel in raster order is inspected:
//!
//! * **Skin**: `r>95, g>40, b>20, r>g, r>b, r−g>15`.  Skin samples give a
//!   centroid, which becomes the hand position (mirrored, scaled by `gain`).
//! * **Bright**: mean channel above `bright_threshold`.  The mean absolute
//!   deviation `|dx| + |dy|` of bright samples from the spread origin is the
//!   open/closed proxy: splayed fingers cover more ground than a fist.
//!
//! `min_skin_samples` skin samples or fewer means no hand.

use glam::Vec2;

use crate::classifier::{GestureClassifier, GestureReading};
use crate::error::GestureError;
use crate::frame::VideoFrame;

/// Where bright-pixel spread is measured from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SpreadOrigin {
    /// Centre of the frame.
    #[default]
    FrameCentre,
    /// Centroid of the skin samples, which makes the measure independent of
    /// where the hand is.
    SkinCentroid,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkinHeuristicConfig {
    pub stride:           usize,
    /// A frame needs strictly more skin samples than this to count as a hand.
    pub min_skin_samples: usize,
    pub bright_threshold: f32,
    /// Mean spread in pixels above which the hand reads as open.
    pub open_spread_px:   f32,
    pub gain:             f32,
    pub spread_origin:    SpreadOrigin,
}

impl Default for SkinHeuristicConfig {
    fn default() -> Self {
        SkinHeuristicConfig {
            stride:           4,
            min_skin_samples: 100,
            bright_threshold: 120.0,
            open_spread_px:   25.0,
            gain:             0.8,
            spread_origin:    SpreadOrigin::FrameCentre,
        }
    }
}

#[inline]
pub fn is_skin([r, g, b]: [u8; 3]) -> bool {
    r > 95 && g > 40 && b > 20 && r > g && r > b && r - g > 15
}

#[inline]
fn is_bright([r, g, b]: [u8; 3], threshold: f32) -> bool {
    (r as f32 + g as f32 + b as f32) / 3.0 > threshold
}

#[derive(Clone, Debug, Default)]
pub struct SkinHeuristicClassifier {
    config: SkinHeuristicConfig,
    bright: Vec<Vec2>,
}

impl SkinHeuristicClassifier {
    pub fn new(config: SkinHeuristicConfig) -> Self {
        SkinHeuristicClassifier { config, bright: Vec::new() }
    }

    pub fn config(&self) -> &SkinHeuristicConfig { &self.config }
}

impl GestureClassifier for SkinHeuristicClassifier {
    fn name(&self) -> &'static str { "skin-heuristic" }

    fn classify(&mut self, frame: &VideoFrame) -> Result<Option<GestureReading>, GestureError> {
        let cfg    = self.config;
        let width  = frame.width() as usize;
        let pixels = width * frame.height() as usize;
        let data   = frame.data();

        let mut skin_count = 0usize;
        let mut skin_sum   = Vec2::ZERO;
        self.bright.clear();

        for p in (0..pixels).step_by(cfg.stride.max(1)) {
            let rgb = [data[p * 4], data[p * 4 + 1], data[p * 4 + 2]];
            let at  = Vec2::new((p % width) as f32, (p / width) as f32);
            if is_skin(rgb) {
                skin_count += 1;
                skin_sum   += at;
            }
            if is_bright(rgb, cfg.bright_threshold) {
                self.bright.push(at);
            }
        }

        if skin_count <= cfg.min_skin_samples {
            return Ok(None);
        }

        let size     = Vec2::new(frame.width() as f32, frame.height() as f32);
        let centroid = skin_sum / skin_count as f32;
        let origin   = match cfg.spread_origin {
            SpreadOrigin::FrameCentre  => size * 0.5,
            SpreadOrigin::SkinCentroid => centroid,
        };
        let spread = if self.bright.is_empty() {
            0.0
        } else {
            let total: f32 = self.bright.iter().map(|b| (*b - origin).abs().element_sum()).sum();
            total / self.bright.len() as f32
        };

        let norm = (centroid / size - Vec2::splat(0.5)) * 2.0;
        Ok(Some(GestureReading {
            hand_open: spread > cfg.open_spread_px,
            x: (-norm.x * cfg.gain).clamp(-1.0, 1.0),
            y: (-norm.y * cfg.gain).clamp(-1.0, 1.0),
        }))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
