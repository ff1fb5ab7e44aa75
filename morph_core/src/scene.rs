//! Scene: the explicit context object threaded through one frame.
//!
//! Everything the frame loop mutates lives here: the progress controller,
//! one [`MorphGroup`] per population kind, the entry choreography, and the
//! camera.  [`Scene::frame`] is the single synchronous evaluation pass;
//! nothing else writes transforms or camera state.
//!
//! ```text
//!   FrameInput ──▶ control (toggle / hand edge) ──▶ ProgressController::tick
//!                                                        │
//!                   IntroSequence::advance ◀─────────────┤
//!                                                        ▼
//!                   MorphGroup::update / update_intro  (per kind)
//!                                                        │
//!                   CameraFollow::update (hand only) ◀───┘
//! ```

use log::{debug, info};

use crate::camera::{CameraFollow, CameraFollowConfig, CameraState};
use crate::intro::{IntroConfig, IntroPhase, IntroSequence};
use crate::layout::{LayoutGenerator, PopulationKind};
use crate::morph::MorphGroup;
use crate::progress::{MorphTarget, ProgressConfig, ProgressController};
use crate::tier::DeviceTier;

#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub tier:       DeviceTier,
    pub seed:       Option<u64>,
    pub initial:    MorphTarget,
    pub play_intro: bool,
    pub progress:   ProgressConfig,
    pub camera:     CameraFollowConfig,
    pub intro:      IntroConfig,
}

impl SceneConfig {
    pub fn new(tier: DeviceTier) -> Self {
        SceneConfig {
            tier,
            seed:       None,
            initial:    MorphTarget::Formed,
            play_intro: true,
            progress:   ProgressConfig::default(),
            camera:     CameraFollowConfig::default(),
            intro:      IntroConfig::for_tier(tier),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self { self.seed = seed; self }
    pub fn with_intro(mut self, play: bool) -> Self      { self.play_intro = play; self }
}

impl Default for SceneConfig {
    fn default() -> Self { Self::new(DeviceTier::default()) }
}

/// Latest gesture reading as seen by the frame loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandSignal {
    pub open:    bool,
    /// Normalized `[-1, 1]`, mirrored.
    pub x:       f32,
    pub y:       f32,
    /// A hand is currently in view (as opposed to a neutral fallback).
    pub tracked: bool,
}

impl HandSignal {
    pub const NEUTRAL: HandSignal = HandSignal { open: false, x: 0.0, y: 0.0, tracked: false };

    pub fn target(&self) -> MorphTarget {
        if self.open { MorphTarget::Chaos } else { MorphTarget::Formed }
    }
}

/// Inputs for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt:     f32,
    /// Manual toggle pressed this frame.
    pub toggle: bool,
    /// `Some` while gesture control is active.
    pub hand:   Option<HandSignal>,
}

#[derive(Debug)]
pub struct Scene {
    tier:       DeviceTier,
    config:     SceneConfig,
    generator:  LayoutGenerator,
    progress:   ProgressController,
    groups:     Vec<MorphGroup>,
    intro:      Option<IntroSequence>,
    camera:     CameraState,
    follow:     CameraFollow,
    time:       f32,
    last_open:  Option<bool>,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let tier = config.tier;
        let mut generator = LayoutGenerator::new(config.seed);
        let groups: Vec<MorphGroup> = PopulationKind::ALL
            .iter()
            .map(|&kind| MorphGroup::generate(&mut generator, kind, tier))
            .collect();
        let intro = if config.play_intro { Self::build_intro(&config, &groups) } else { None };

        info!("scene ready: {:?}, {} entities in {} groups, intro {}",
              tier,
              groups.iter().map(MorphGroup::len).sum::<usize>(),
              groups.len(),
              if intro.is_some() { "on" } else { "off" });

        let mut scene = Scene {
            tier,
            progress: ProgressController::with_config(config.initial, config.progress),
            follow:   CameraFollow::new(config.camera),
            camera:   CameraState::default(),
            config,
            generator,
            groups,
            intro,
            time:      0.0,
            last_open: None,
        };
        // Publish once so the buffers are valid before the first frame.
        scene.evaluate(0.0);
        scene
    }

    fn build_intro(config: &SceneConfig, groups: &[MorphGroup]) -> Option<IntroSequence> {
        let count = groups
            .iter()
            .filter(|g| g.plays_intro())
            .map(MorphGroup::len)
            .max()?;
        Some(IntroSequence::new(config.intro, count))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Frame
    // ════════════════════════════════════════════════════════════════════════

    /// One full evaluation pass.
    pub fn frame(&mut self, input: &FrameInput) {
        let dt = input.dt.max(0.0);
        self.time += dt;

        match input.hand {
            Some(hand) => {
                if input.toggle && !hand.tracked {
                    self.progress.toggle();
                }
                if self.last_open != Some(hand.open) {
                    debug!("hand {} → {:?}", if hand.open { "open" } else { "closed" }, hand.target());
                    self.progress.request_state(hand.target());
                    self.last_open = Some(hand.open);
                }
                self.follow.update(&mut self.camera, hand.x, hand.y, dt);
            }
            None => {
                if input.toggle {
                    self.progress.toggle();
                }
                self.last_open = None;
            }
        }

        self.progress.tick(dt);
        self.evaluate(dt);
    }

    fn evaluate(&mut self, dt: f32) {
        let progress = self.progress.progress();
        let time     = self.time;

        let intro = match self.intro.as_mut() {
            Some(seq) if !seq.is_finished() => {
                if seq.advance(time) == IntroPhase::Done { None } else { Some(&*seq) }
            }
            _ => None,
        };

        for group in &mut self.groups {
            match intro {
                Some(seq) if group.plays_intro() => group.update_intro(seq, progress, time, dt),
                _ => group.update(progress, time, dt),
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Control
    // ════════════════════════════════════════════════════════════════════════

    pub fn request_state(&mut self, target: MorphTarget) -> bool {
        self.progress.request_state(target)
    }

    pub fn toggle(&mut self) { self.progress.toggle(); }

    /// Switch tier.  Every population is recreated together with its
    /// transform buffer, and a pending intro is restarted for the new counts.
    pub fn set_tier(&mut self, tier: DeviceTier) {
        if tier == self.tier {
            return;
        }
        info!("tier {:?} → {:?}", self.tier, tier);
        self.tier = tier;
        self.config.tier = tier;
        for group in &mut self.groups {
            let count = group.kind().count_for(tier);
            group.regenerate(&mut self.generator, count, tier);
        }
        let pending = self.intro.as_ref().is_some_and(|s| !s.is_finished());
        if pending {
            self.config.intro.start_delay = tier.intro_delay().as_secs_f32();
            self.intro = Self::build_intro(&self.config, &self.groups);
        }
        self.evaluate(0.0);
    }

    /// Overwrite the camera; the free-orbit controller calls this while
    /// gesture control is off so following starts from where it left off.
    pub fn set_camera(&mut self, camera: CameraState) { self.camera = camera; }

    // ════════════════════════════════════════════════════════════════════════
    // Read side
    // ════════════════════════════════════════════════════════════════════════

    pub fn tier(&self) -> DeviceTier          { self.tier }
    pub fn time(&self) -> f32                 { self.time }
    pub fn progress(&self) -> f32             { self.progress.progress() }
    pub fn target(&self) -> MorphTarget       { self.progress.target() }
    pub fn camera(&self) -> &CameraState      { &self.camera }
    pub fn groups(&self) -> &[MorphGroup]     { &self.groups }

    pub fn group(&self, kind: PopulationKind) -> Option<&MorphGroup> {
        self.groups.iter().find(|g| g.kind() == kind)
    }

    pub fn intro_phase(&self) -> IntroPhase {
        self.intro.as_ref().map_or(IntroPhase::Done, IntroSequence::phase)
    }

    pub fn intro_finished(&self) -> bool {
        self.intro.as_ref().map_or(true, IntroSequence::is_finished)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn scene(intro: bool) -> Scene {
        Scene::new(SceneConfig::new(DeviceTier::Constrained).with_seed(Some(5)).with_intro(intro))
    }

    fn open(open: bool, tracked: bool) -> FrameInput {
        FrameInput { dt: DT, toggle: false, hand: Some(HandSignal { open, x: 0.5, y: 0.2, tracked }) }
    }

    #[test]
    fn buffers_sized_from_first_publish() {
        let s = scene(false);
        for g in s.groups() {
            assert_eq!(g.transforms().len(), g.kind().count_for(DeviceTier::Constrained));
        }
        let photos = s.group(PopulationKind::Photos).map(MorphGroup::len);
        assert_eq!(photos, Some(12));
    }

    #[test]
    fn manual_toggle_round_trip() {
        let mut s = scene(false);
        s.frame(&FrameInput { dt: DT, toggle: true, hand: None });
        assert_eq!(s.target(), MorphTarget::Chaos);
        for _ in 0..300 { s.frame(&FrameInput { dt: DT, ..Default::default() }); }
        assert_eq!(s.progress(), 0.0);
        let foliage = s.group(PopulationKind::Foliage).map(|g| {
            g.transforms().iter().zip(g.population().iter())
                .all(|(t, r)| t.position == r.chaos_position)
        });
        assert_eq!(foliage, Some(true));
    }

    #[test]
    fn hand_edges_drive_state() {
        let mut s = scene(false);
        s.frame(&open(true, true));
        assert_eq!(s.target(), MorphTarget::Chaos);
        s.frame(&open(true, true));
        assert_eq!(s.target(), MorphTarget::Chaos);
        s.frame(&open(false, true));
        assert_eq!(s.target(), MorphTarget::Formed);
    }

    #[test]
    fn toggle_ignored_while_hand_tracked() {
        let mut s = scene(false);
        s.frame(&open(false, true));
        s.frame(&FrameInput { toggle: true, ..open(false, true) });
        assert_eq!(s.target(), MorphTarget::Formed);
        s.frame(&FrameInput { toggle: true, ..open(false, false) });
        assert_eq!(s.target(), MorphTarget::Chaos);
    }

    #[test]
    fn camera_follows_only_with_hand() {
        let mut s = scene(false);
        let start = *s.camera();
        s.frame(&FrameInput { dt: DT, ..Default::default() });
        assert_eq!(*s.camera(), start);
        s.frame(&open(false, true));
        assert_ne!(s.camera().position, start.position);
    }

    #[test]
    fn intro_hides_ornaments_then_hands_off() {
        let mut s = scene(true);
        let gifts = |s: &Scene| s.group(PopulationKind::Gifts).map(|g| g.transforms().to_vec()).unwrap_or_default();
        assert!(gifts(&s).iter().all(|t| t.scale == 0.0));
        assert_eq!(s.intro_phase(), IntroPhase::Waiting);
        let mut frames = 0;
        while !s.intro_finished() {
            s.frame(&FrameInput { dt: DT, ..Default::default() });
            frames += 1;
            assert!(frames < 60 * 30);
        }
        let g = s.group(PopulationKind::Gifts).map(|g| {
            g.transforms().iter().zip(g.population().iter())
                .all(|(t, r)| t.position == r.formed_position && t.scale == r.scale)
        });
        assert_eq!(g, Some(true));
    }

    #[test]
    fn chaos_during_intro_hands_off_without_jump() {
        let mut s = Scene::new(SceneConfig::new(DeviceTier::Desktop).with_seed(Some(5)).with_intro(true));
        let gifts = |s: &Scene| {
            s.group(PopulationKind::Gifts).map(|g| g.transforms().to_vec()).unwrap_or_default()
        };
        s.frame(&FrameInput { dt: DT, toggle: true, hand: None });
        assert_eq!(s.target(), MorphTarget::Chaos);

        let mut before = gifts(&s);
        let mut was_finished = s.intro_finished();
        let mut handoff_jump = None;
        for _ in 0..60 * 10 {
            s.frame(&FrameInput { dt: DT, ..Default::default() });
            let now = gifts(&s);
            if s.intro_finished() && !was_finished {
                let jump = before.iter().zip(&now)
                    .map(|(a, b)| (a.position - b.position).length())
                    .fold(0.0f32, f32::max);
                handoff_jump = Some(jump);
            }
            was_finished = s.intro_finished();
            before = now;
        }
        let jump = handoff_jump.unwrap_or(f32::INFINITY);
        assert!(jump < 1e-3, "gifts moved {} across the hand-off", jump);

        // Landed on the scattered layout, not the tree.
        let g = s.group(PopulationKind::Gifts).map(|g| {
            g.transforms().iter().zip(g.population().iter())
                .all(|(t, r)| t.position == r.chaos_position && t.scale == r.scale)
        });
        assert_eq!(g, Some(true));
    }

    #[test]
    fn tier_switch_regenerates_everything() {
        let mut s = Scene::new(SceneConfig::new(DeviceTier::Desktop).with_seed(Some(2)).with_intro(false));
        s.set_tier(DeviceTier::Constrained);
        for g in s.groups() {
            assert_eq!(g.len(), g.kind().count_for(DeviceTier::Constrained));
            assert_eq!(g.transforms().len(), g.population().len());
        }
        assert_eq!(s.tier(), DeviceTier::Constrained);
    }
}
