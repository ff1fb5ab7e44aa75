//! Free-orbit camera used while gesture control is off.
//!
//! Drag (or the arrow keys) to swing around the tree; while the scene is
//! formed the camera also drifts slowly on its own.

use glam::Vec3;
use morph_core::{CameraFollowConfig, CameraState};

#[derive(Clone, Debug)]
pub struct OrbitCamera {
    azimuth:     f32,
    height:      f32,
    radius:      f32,
    look_at:     Vec3,
    min_height:  f32,
    max_height:  f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let cfg = CameraFollowConfig::default();
        OrbitCamera {
            azimuth:    0.0,
            height:     cfg.base_height,
            radius:     cfg.radius,
            look_at:    cfg.look_at,
            min_height: cfg.base_height - cfg.height_range,
            max_height: cfg.base_height + cfg.height_range,
        }
    }
}

impl OrbitCamera {
    /// `drag` is (azimuth, height) change requested by the user this frame;
    /// `auto_rate` is added as rad/s.
    pub fn update(&mut self, drag: (f32, f32), auto_rate: f32, dt: f32) {
        self.azimuth = (self.azimuth + drag.0 + auto_rate * dt.max(0.0)) % std::f32::consts::TAU;
        self.height  = (self.height + drag.1).clamp(self.min_height, self.max_height);
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            position: Vec3::new(
                self.azimuth.sin() * self.radius,
                self.height,
                self.azimuth.cos() * self.radius,
            ),
            look_at: self.look_at,
        }
    }

    /// Continue orbiting from wherever the camera currently is.
    pub fn sync_from(&mut self, camera: &CameraState) {
        let p = camera.position;
        self.azimuth = p.x.atan2(p.z);
        self.height  = p.y.clamp(self.min_height, self.max_height);
    }

    pub fn azimuth(&self) -> f32 { self.azimuth }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_rotation_advances_azimuth() {
        let mut o = OrbitCamera::default();
        o.update((0.0, 0.0), 0.3, 1.0);
        assert!((o.azimuth() - 0.3).abs() < 1e-6);
        o.update((0.0, 0.0), 0.0, 1.0);
        assert!((o.azimuth() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn height_is_clamped() {
        let mut o = OrbitCamera::default();
        o.update((0.0, 1000.0), 0.0, 0.016);
        let cfg = CameraFollowConfig::default();
        assert_eq!(o.state().position.y, cfg.base_height + cfg.height_range);
    }

    #[test]
    fn sync_round_trip() {
        let mut a = OrbitCamera::default();
        a.update((1.2, 2.0), 0.0, 0.0);
        let mut b = OrbitCamera::default();
        b.sync_from(&a.state());
        assert!((b.state().position - a.state().position).length() < 1e-4);
    }
}
