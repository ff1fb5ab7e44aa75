//! Camera state and the hand-driven follow controller.
//!
//! While a hand is tracked, its normalized position drives a bounded orbit:
//! `x` swings the azimuth by at most ±`max_swing` radians and `y` raises or
//! lowers the eye around `base_height`.  The camera eases toward that target
//! with the same frame-rate independent factor as the progress controller
//! and always looks at the tree's centre.  With no hand the controller is
//! bypassed and an external free-orbit controller owns the camera.

use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub look_at:  Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        let cfg = CameraFollowConfig::default();
        CameraState {
            position: Vec3::new(0.0, cfg.base_height, cfg.radius),
            look_at:  cfg.look_at,
        }
    }
}

impl CameraState {
    /// Right-handed view matrix, `+Y` up.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFollowConfig {
    /// Horizontal distance from the tree axis.
    pub radius:       f32,
    pub base_height:  f32,
    /// Azimuth swing at `|x| = 1`, radians.
    pub max_swing:    f32,
    /// Height change at `|y| = 1`.
    pub height_range: f32,
    pub smoothing:    f32,
    pub reference_hz: f32,
    pub look_at:      Vec3,
}

impl Default for CameraFollowConfig {
    fn default() -> Self {
        CameraFollowConfig {
            radius:       24.0,
            base_height:  4.0,
            max_swing:    1.5,
            height_range: 8.0,
            smoothing:    0.05,
            reference_hz: 60.0,
            look_at:      Vec3::new(0.0, 4.5, 0.0),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CameraFollow {
    config: CameraFollowConfig,
}

impl CameraFollow {
    pub fn new(config: CameraFollowConfig) -> Self { CameraFollow { config } }

    pub fn config(&self) -> &CameraFollowConfig { &self.config }

    /// Where the camera settles for a steady hand at `(x, y)`.
    pub fn target_position(&self, x: f32, y: f32) -> Vec3 {
        let cfg = &self.config;
        let az  = x.clamp(-1.0, 1.0) * cfg.max_swing;
        let h   = cfg.base_height + y.clamp(-1.0, 1.0) * cfg.height_range;
        Vec3::new(az.sin() * cfg.radius, h, az.cos() * cfg.radius)
    }

    /// Ease `camera` toward the target for `(x, y)`.
    pub fn update(&self, camera: &mut CameraState, x: f32, y: f32, dt: f32) {
        camera.look_at = self.config.look_at;
        if !(dt > 0.0) {
            return;
        }
        let factor = (1.0 - (1.0 - self.config.smoothing).powf(dt * self.config.reference_hz))
            .clamp(0.0, 1.0);
        let target = self.target_position(x, y);
        camera.position += (target - camera.position) * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_on_steady_hand() {
        let follow = CameraFollow::default();
        let mut cam = CameraState::default();
        for _ in 0..600 {
            follow.update(&mut cam, 0.6, -0.3, 1.0 / 60.0);
        }
        assert!((cam.position - follow.target_position(0.6, -0.3)).length() < 1e-3);
        assert_eq!(cam.look_at, follow.config().look_at);
    }

    #[test]
    fn swing_is_bounded() {
        let follow = CameraFollow::default();
        let wild  = follow.target_position(40.0, -40.0);
        let edge  = follow.target_position(1.0, -1.0);
        assert_eq!(wild, edge);
        let az = wild.x.atan2(wild.z);
        assert!(az.abs() <= follow.config().max_swing + 1e-5);
    }

    #[test]
    fn centred_hand_faces_tree_front() {
        let follow = CameraFollow::default();
        let p = follow.target_position(0.0, 0.0);
        assert!(p.x.abs() < 1e-6);
        assert_eq!(p.y, follow.config().base_height);
        assert_eq!(p.z, follow.config().radius);
    }

    #[test]
    fn moves_gradually() {
        let follow = CameraFollow::default();
        let mut cam = CameraState::default();
        let start = cam.position;
        follow.update(&mut cam, 1.0, 1.0, 1.0 / 60.0);
        let full = (follow.target_position(1.0, 1.0) - start).length();
        let moved = (cam.position - start).length();
        assert!((moved / full - 0.05).abs() < 1e-3);
    }
}
