//! Entry choreography: the one-shot vortex entrance.
//!
//! ```text
//!  WAITING ──start_delay──▶ LAUNCHING ──last entity starts──▶ SETTLING
//!                                                              │
//!                                 last window end + tail       ▼
//!                                                            DONE (sticky)
//! ```
//!
//! Entity `i` starts at `start_delay + i·stagger` and takes `duration`
//! seconds.  It rises from a wide ring deep below the tree, radius and
//! height each eased with cubic-out, while its azimuth unwinds from
//! `final + revolutions·2π` to `final`, a decelerating spiral.  Rotation
//! tumbles freely for the first 80 % of the flight and then blends
//! (smoothstep) into the steady-state orientation; scale pops in with a
//! back-out overshoot.  Entities that have not launched are written with
//! zero scale.

use std::f32::consts::TAU;

use glam::Vec3;
use log::info;

use crate::easing::{lerp, lerp_vec3, smoothstep, Easing};
use crate::layout::EntityRecord;
use crate::morph::EntityTransform;
use crate::tier::DeviceTier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntroPhase {
    Waiting,
    Launching,
    Settling,
    Done,
}

/// Timing and path constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntroConfig {
    /// Seconds after scene start before the first entity moves.
    pub start_delay:       f32,
    /// Seconds between consecutive entity launches.
    pub stagger:           f32,
    /// Seconds each entity's flight takes.
    pub duration:          f32,
    /// Seconds past the last entity's landing before the sequence is done.
    pub tail:              f32,
    pub spawn_radius:      f32,
    pub spawn_depth:       f32,
    pub revolutions:       f32,
    /// rad/s of the decorative tumble.
    pub tumble_rate:       f32,
    /// Local progress where tumbling hands over to the final orientation.
    pub settle_at:         f32,
}

impl IntroConfig {
    pub fn for_tier(tier: DeviceTier) -> Self {
        IntroConfig {
            start_delay:  tier.intro_delay().as_secs_f32(),
            stagger:      0.02,
            duration:     2.5,
            tail:         0.5,
            spawn_radius: 25.0,
            spawn_depth:  -15.0,
            revolutions:  3.0,
            tumble_rate:  6.0,
            settle_at:    0.8,
        }
    }
}

impl Default for IntroConfig {
    fn default() -> Self { Self::for_tier(DeviceTier::Desktop) }
}

#[derive(Clone, Debug)]
pub struct IntroSequence {
    config:   IntroConfig,
    count:    usize,
    phase:    IntroPhase,
    finished: bool,
}

impl IntroSequence {
    /// `count` is the length of the largest population taking part.
    pub fn new(config: IntroConfig, count: usize) -> Self {
        IntroSequence { config, count, phase: IntroPhase::Waiting, finished: false }
    }

    pub fn config(&self) -> &IntroConfig { &self.config }
    pub fn phase(&self) -> IntroPhase    { self.phase }
    pub fn is_finished(&self) -> bool    { self.finished }

    /// Scene time at which entity `i` launches.
    pub fn entity_start(&self, i: usize) -> f32 {
        self.config.start_delay + i as f32 * self.config.stagger
    }

    /// When the last entity lands.
    pub fn last_window_end(&self) -> f32 {
        self.entity_start(self.count.saturating_sub(1)) + self.config.duration
    }

    /// When the sequence flips to done.
    pub fn end_time(&self) -> f32 {
        self.last_window_end() + self.config.tail
    }

    /// Entity-local progress in `[0, 1]`.
    pub fn local_progress(&self, i: usize, time: f32) -> f32 {
        if self.config.duration <= 0.0 {
            return if time >= self.entity_start(i) { 1.0 } else { 0.0 };
        }
        ((time - self.entity_start(i)) / self.config.duration).clamp(0.0, 1.0)
    }

    /// Move the state machine to `time`.  Once done it stays done.
    pub fn advance(&mut self, time: f32) -> IntroPhase {
        if self.finished {
            return IntroPhase::Done;
        }
        let last_start = self.entity_start(self.count.saturating_sub(1));
        self.phase = if time >= self.end_time() {
            IntroPhase::Done
        } else if time < self.config.start_delay {
            IntroPhase::Waiting
        } else if time < last_start {
            IntroPhase::Launching
        } else {
            IntroPhase::Settling
        };
        if self.phase == IntroPhase::Done {
            self.finished = true;
            info!("intro finished at t={:.2}s ({} entities)", time, self.count);
        }
        self.phase
    }

    /// Transform for entity `i` at `time`.  `landing` is the entity's
    /// steady-state transform for this frame (current progress included);
    /// the flight converges on it and returns it unchanged once landed, so
    /// the hand-off to the morph evaluator is seamless in any state.
    pub fn entity_transform(
        &self,
        i:       usize,
        record:  &EntityRecord,
        landing: &EntityTransform,
        time:    f32,
    ) -> EntityTransform {
        let cfg    = &self.config;
        let target = landing.position;

        if time < self.entity_start(i) {
            return EntityTransform {
                position: self.spawn_point(target),
                rotation: landing.rotation,
                scale:    0.0,
            };
        }

        let t = self.local_progress(i, time);
        if t >= 1.0 {
            return *landing;
        }

        let e           = Easing::CubicOut.apply(t);
        let final_r     = (target.x * target.x + target.z * target.z).sqrt();
        let final_theta = target.z.atan2(target.x);
        let radius      = lerp(cfg.spawn_radius, final_r, e);
        let height      = lerp(cfg.spawn_depth, target.y, e);
        let theta       = final_theta + cfg.revolutions * TAU * (1.0 - e);
        let position    = Vec3::new(theta.cos() * radius, height, theta.sin() * radius);

        let elapsed = time - self.entity_start(i);
        let tumbled = landing.rotation
            + Vec3::new(1.0, 0.7, 0.4) * (cfg.tumble_rate * elapsed + record.phase);
        let rotation = if t < cfg.settle_at {
            tumbled
        } else {
            lerp_vec3(tumbled, landing.rotation, smoothstep(cfg.settle_at, 1.0, t))
        };

        EntityTransform {
            position,
            rotation,
            scale: landing.scale * Easing::BackOut.apply(t),
        }
    }

    fn spawn_point(&self, target: Vec3) -> Vec3 {
        let theta = target.z.atan2(target.x) + self.config.revolutions * TAU;
        Vec3::new(
            theta.cos() * self.config.spawn_radius,
            self.config.spawn_depth,
            theta.sin() * self.config.spawn_radius,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutGenerator, PopulationKind};
    use crate::morph::{evaluate_entity, MorphProfile};

    // Binary-exact timings so boundary checks need no tolerance.
    fn five() -> IntroSequence {
        let cfg = IntroConfig {
            start_delay: 2.0,
            stagger:     0.25,
            duration:    1.0,
            tail:        0.5,
            ..IntroConfig::default()
        };
        IntroSequence::new(cfg, 5)
    }

    fn record() -> EntityRecord {
        let p = LayoutGenerator::new(Some(9)).generate_count(PopulationKind::Gifts, 1, DeviceTier::Desktop);
        p.entities()[0]
    }

    /// Steady-state gift transform at `progress`.
    fn landing(r: &EntityRecord, progress: f32, time: f32) -> EntityTransform {
        evaluate_entity(r, &MorphProfile::for_kind(PopulationKind::Gifts), progress, time)
    }

    #[test]
    fn stagger_windows() {
        let s = five();
        for i in 0..5 {
            let start = 2.0 + i as f32 * 0.25;
            assert_eq!(s.local_progress(i, start), 0.0);
            assert_eq!(s.local_progress(i, start + 1.0), 1.0);
            assert!(s.local_progress(i, start + 0.5) > 0.0 && s.local_progress(i, start + 0.5) < 1.0);
        }
    }

    #[test]
    fn phases_in_order_and_done_is_sticky() {
        let mut s = five();
        assert_eq!(s.advance(0.0), IntroPhase::Waiting);
        assert_eq!(s.advance(2.1), IntroPhase::Launching);
        assert_eq!(s.advance(3.5), IntroPhase::Settling);
        assert!(!s.is_finished());
        // Last window closes at 2 + 4·0.25 + 1 = 4.
        assert_eq!(s.advance(s.last_window_end()), IntroPhase::Settling);
        assert!(!s.is_finished());
        assert_eq!(s.advance(4.5), IntroPhase::Done);
        assert!(s.is_finished());
        assert_eq!(s.advance(0.0), IntroPhase::Done);
        assert!(s.is_finished());
    }

    #[test]
    fn hidden_before_launch() {
        let s = five();
        let r = record();
        let t = s.entity_transform(3, &r, &landing(&r, 1.0, 2.5), 2.5);
        assert_eq!(t.scale, 0.0);
        assert!(t.position.is_finite());
    }

    #[test]
    fn lands_exactly_on_formed() {
        let s = five();
        let r = record();
        let t = s.entity_transform(2, &r, &landing(&r, 1.0, 3.5), 3.5);
        assert_eq!(t.position, r.formed_position);
        assert_eq!(t.scale, r.scale);
    }

    #[test]
    fn lands_on_chaos_when_scattered() {
        let s = five();
        let r = record();
        let t = s.entity_transform(2, &r, &landing(&r, 0.0, 3.5), 3.5);
        assert_eq!(t, landing(&r, 0.0, 3.5));
        assert_eq!(t.position, r.chaos_position);
    }

    #[test]
    fn flight_converges_on_moving_target() {
        let s = five();
        let r = record();
        // Progress sliding toward chaos while the entity is in the air.
        let dist = |k: u32| {
            let time = 2.0 + k as f32 / 100.0;
            let goal = landing(&r, 1.0 - k as f32 / 100.0, time);
            (s.entity_transform(0, &r, &goal, time).position - goal.position).length()
        };
        assert!(dist(99) < 0.05 * dist(10));
        assert!(dist(99) < 0.1);
    }

    #[test]
    fn starts_deep_and_wide() {
        let s = five();
        let r = record();
        let t = s.entity_transform(0, &r, &landing(&r, 1.0, 2.0), 2.0);
        assert!((t.position.y - s.config().spawn_depth).abs() < 1e-4);
        let planar = (t.position.x.powi(2) + t.position.z.powi(2)).sqrt();
        assert!((planar - s.config().spawn_radius).abs() < 1e-3);
        assert_eq!(t.scale, 0.0);
    }

    #[test]
    fn spiral_decelerates() {
        let cfg = five().config;
        let offset = |t: f32| cfg.revolutions * TAU * (1.0 - Easing::CubicOut.apply(t));
        let early = offset(0.0) - offset(0.1);
        let late  = offset(0.8) - offset(0.9);
        assert!(early > late * 10.0);
        assert!(offset(0.0) >= 2.0 * TAU);
    }

    #[test]
    fn scale_pops_past_full_size() {
        let s = five();
        let r = record();
        let peak = (0..100)
            .map(|k| {
                let time = 2.0 + k as f32 / 100.0;
                s.entity_transform(0, &r, &landing(&r, 1.0, time), time).scale
            })
            .fold(0.0f32, f32::max);
        assert!(peak > r.scale);
    }

    #[test]
    fn rotation_hands_over_to_steady_state() {
        let s = five();
        let r = record();
        let steady   = landing(&r, 1.0, 2.0 + 0.999);
        let near_end = s.entity_transform(0, &r, &steady, 2.0 + 0.999);
        assert!((near_end.rotation - steady.rotation).length() < 1e-2);
    }

    #[test]
    fn empty_population_finishes() {
        let mut s = IntroSequence::new(IntroConfig::default(), 0);
        assert!(s.end_time().is_finite());
        s.advance(100.0);
        assert!(s.is_finished());
    }
}
