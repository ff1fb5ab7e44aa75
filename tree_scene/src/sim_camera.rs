//! Webcam simulation: mouse and keyboard stand in for a hand in front of a
//! camera.
//!
//! The window writes a [`SimHand`] each frame; [`SimCamera`] renders it into
//! real RGBA frames (a skin-toned disc on a dark background, small for a
//! fist, large for a splayed hand) which then go through the same
//! classifiers a physical camera would feed.  [`SimHandDetector`] plays the
//! part of the landmark model for those frames.
//!
//! | Input | Hand |
//! |---|---|
//! | Mouse over window | hand in view, at the pointer |
//! | Mouse outside window | no hand |
//! | Hold `H` or left button | open hand |

use std::sync::{Arc, Mutex, PoisonError};

use glam::Vec2;
use hand_gesture::landmark::{FINGERS, KEYPOINTS, PALM, THUMB_IP, THUMB_TIP};
use hand_gesture::skin::is_skin;
use hand_gesture::{FrameSource, GestureError, HandLandmarkDetector, HandLandmarks, VideoFrame};
use log::info;

const SKIN:       [u8; 3] = [224, 172, 140];
const BACKGROUND: [u8; 3] = [18, 22, 30];
/// Disc radii in camera pixels.  A fist is just big enough to clear the
/// noise floor; an open hand spreads well past the open threshold.
pub const FIST_RADIUS_PX: f32 = 16.0;
pub const OPEN_RADIUS_PX: f32 = 48.0;

// ════════════════════════════════════════════════════════════════════════════
// SimHand
// ════════════════════════════════════════════════════════════════════════════

/// What the simulated user is doing, as seen from the viewer's side.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimHand {
    pub present: bool,
    pub open:    bool,
    /// Position over the window, `[0, 1]` with origin top-left.
    pub u:       f32,
    pub v:       f32,
}

/// Shared between the window (writer) and the camera thread (reader).
#[derive(Clone, Debug, Default)]
pub struct SimHandHandle(Arc<Mutex<SimHand>>);

impl SimHandHandle {
    pub fn set(&self, hand: SimHand) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = hand;
    }

    pub fn get(&self) -> SimHand {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimCamera
// ════════════════════════════════════════════════════════════════════════════

pub struct SimCamera {
    hand:        SimHandHandle,
    unavailable: bool,
    size:        Option<(u32, u32)>,
}

impl SimCamera {
    pub fn new(hand: SimHandHandle, unavailable: bool) -> Self {
        SimCamera { hand, unavailable, size: None }
    }

    /// Render `hand` into a `width × height` frame as a camera would see it:
    /// not mirrored, so the viewer's right is the image's left.
    pub fn render(hand: SimHand, width: u32, height: u32) -> VideoFrame {
        let mut frame = VideoFrame::filled(width, height, BACKGROUND);
        if !hand.present {
            return frame;
        }
        let cx = (1.0 - hand.u.clamp(0.0, 1.0)) * width as f32;
        let cy = hand.v.clamp(0.0, 1.0) * height as f32;
        let r  = if hand.open { OPEN_RADIUS_PX } else { FIST_RADIUS_PX };

        let x0 = (cx - r).floor().max(0.0) as u32;
        let y0 = (cy - r).floor().max(0.0) as u32;
        let x1 = ((cx + r).ceil() as u32).min(width);
        let y1 = ((cy + r).ceil() as u32).min(height);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r * r {
                    frame.set_rgb(x, y, SKIN);
                }
            }
        }
        frame
    }
}

impl FrameSource for SimCamera {
    fn name(&self) -> &str { "simulated webcam" }

    fn open(&mut self, width: u32, height: u32) -> Result<(), GestureError> {
        if self.unavailable {
            return Err(GestureError::camera_unavailable("simulated permission denial"));
        }
        self.size = Some((width, height));
        Ok(())
    }

    fn grab(&mut self) -> Result<Option<VideoFrame>, GestureError> {
        Ok(self.size.map(|(w, h)| Self::render(self.hand.get(), w, h)))
    }

    fn close(&mut self) {
        if self.size.take().is_some() {
            info!("simulated webcam released");
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandDetector
// ════════════════════════════════════════════════════════════════════════════

/// Landmark "model" for simulated frames: finds the skin disc and poses a
/// skeleton in it, fingers up when the disc is large.
#[derive(Clone, Debug, Default)]
pub struct SimHandDetector;

impl SimHandDetector {
    const MIN_PIXELS: usize = 200;

    pub fn load() -> Result<Box<dyn HandLandmarkDetector>, GestureError> {
        Ok(Box::new(SimHandDetector))
    }

    fn pose(palm: Vec2, radius: f32, open: bool) -> HandLandmarks {
        let mut points = [palm; KEYPOINTS];
        let finger_len = if open { -0.9 * radius } else { 0.3 * radius };
        for (f, &(tip, base)) in FINGERS.iter().enumerate() {
            let x = palm.x + (f as f32 - 1.5) * 0.25 * radius;
            let base_at = Vec2::new(x, palm.y - 0.4 * radius);
            let step = Vec2::new(0.0, finger_len / 3.0);
            points[base]     = base_at;
            points[base + 1] = base_at + step;
            points[base + 2] = base_at + step * 2.0;
            points[tip]      = base_at + step * 3.0;
        }
        let thumb_reach = if open { 0.8 } else { 0.3 };
        points[1]         = palm + Vec2::new(0.3 * radius, 0.0);
        points[2]         = palm + Vec2::new(0.45 * radius, -0.1 * radius);
        points[THUMB_IP]  = palm + Vec2::new(0.55 * radius, -0.2 * radius);
        points[THUMB_TIP] = palm + Vec2::new(thumb_reach * radius, -0.3 * radius);
        points[PALM]      = palm;
        HandLandmarks { points }
    }
}

impl HandLandmarkDetector for SimHandDetector {
    fn name(&self) -> &str { "simulated hand model" }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>, GestureError> {
        let mut count = 0usize;
        let mut sum   = Vec2::ZERO;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                if frame.rgb(x, y).is_some_and(is_skin) {
                    count += 1;
                    sum   += Vec2::new(x as f32, y as f32);
                }
            }
        }
        if count < Self::MIN_PIXELS {
            return Ok(None);
        }
        let palm   = sum / count as f32;
        let radius = (count as f32 / std::f32::consts::PI).sqrt();
        let open   = radius > (FIST_RADIUS_PX + OPEN_RADIUS_PX) * 0.5;
        Ok(Some(Self::pose(palm, radius, open)))
    }
}
