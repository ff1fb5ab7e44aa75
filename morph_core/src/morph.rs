//! Morph evaluator: per-frame entity transforms from `progress`.
//!
//! Layers, applied in order for every entity every frame:
//!
//! 1. **Easing**: `progress` is reshaped by the population's curve.
//! 2. **Blend**: `lerp(chaos, formed, eased)` for position and euler
//!    rotation.
//! 3. **Swirl** (foliage): a rotation of `(x, z)` about the vertical axis,
//!    strongest low on the tree and decaying as the shape forms.  Recomputed
//!    from scratch each frame, so it never accumulates.
//! 4. **Bob**: a millimetre-scale vertical sine, purely cosmetic.
//! 5. **Tumble**: constant angular velocity added to the rotation.
//!
//! A [`MorphGroup`] owns a population together with its transform buffer;
//! the two are only ever replaced together, so their lengths always agree.

use glam::{EulerRot, Mat4, Quat, Vec3};
use log::info;

use crate::easing::{lerp_vec3, smoothstep, Easing};
use crate::intro::IntroSequence;
use crate::layout::{LayoutGenerator, Population, PopulationKind, EntityRecord};
use crate::tier::DeviceTier;

// ════════════════════════════════════════════════════════════════════════════
// Profile pieces
// ════════════════════════════════════════════════════════════════════════════

/// Decaying vortex distortion.
///
/// `angle = envelope(p) · ((1 − eased)·max_strength·(1 − y/height_scale)
///          + phase·phase_weight)`
///
/// The envelope fades in over `[0, fade]` and out over
/// `[cutoff − fade, cutoff]`, so the swirl is exactly zero at both ends of
/// the morph and never pops on or off.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwirlConfig {
    pub max_strength: f32,
    pub height_scale: f32,
    pub phase_weight: f32,
    pub cutoff:       f32,
    pub fade:         f32,
}

impl Default for SwirlConfig {
    fn default() -> Self {
        SwirlConfig {
            max_strength: 2.0,
            height_scale: 12.0,
            phase_weight: 0.1,
            cutoff:       0.99,
            fade:         0.2,
        }
    }
}

impl SwirlConfig {
    pub fn envelope(&self, progress: f32) -> f32 {
        smoothstep(0.0, self.fade, progress)
            * smoothstep(self.cutoff, self.cutoff - self.fade, progress)
    }

    /// Rotation angle about `y` for an entity at height `y`.
    pub fn angle(&self, progress: f32, eased: f32, y: f32, phase: f32) -> f32 {
        let env = self.envelope(progress);
        if env == 0.0 {
            return 0.0;
        }
        let strength = (1.0 - eased) * self.max_strength;
        env * (strength * (1.0 - y / self.height_scale) + phase * self.phase_weight)
    }
}

/// Small vertical sine.  Frequency switches once the group is mostly formed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bob {
    pub amplitude:   f32,
    pub freq_chaos:  f32,
    pub freq_formed: f32,
    pub switch_at:   f32,
}

impl Bob {
    pub fn offset(&self, time: f32, phase: f32, progress: f32) -> f32 {
        let freq = if progress < self.switch_at { self.freq_chaos } else { self.freq_formed };
        (time * freq + phase).sin() * self.amplitude
    }
}

/// Whole-group yaw rate, near-still when chaotic and faster when formed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroupSpin {
    /// rad/s at progress 0.
    pub chaos_rate:  f32,
    /// Additional rad/s at progress 1.
    pub formed_rate: f32,
}

impl GroupSpin {
    pub fn rate(&self, progress: f32) -> f32 {
        self.chaos_rate + progress * self.formed_rate
    }
}

/// How one population moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MorphProfile {
    pub easing: Easing,
    pub swirl:  Option<SwirlConfig>,
    pub bob:    Option<Bob>,
    /// Angular velocity (rad/s, euler XYZ) added on top of the blended
    /// rotation.
    pub tumble: Vec3,
    pub spin:   Option<GroupSpin>,
    /// Whether this group plays the entry choreography.
    pub intro:  bool,
}

impl MorphProfile {
    pub fn for_kind(kind: PopulationKind) -> Self {
        let ornament = |tumble| MorphProfile {
            easing: Easing::CubicInOut,
            swirl:  None,
            bob:    None,
            tumble,
            spin:   None,
            intro:  true,
        };
        match kind {
            PopulationKind::Foliage => MorphProfile {
                easing: Easing::QuarticOut,
                swirl:  Some(SwirlConfig::default()),
                bob:    None,
                tumble: Vec3::ZERO,
                // 0.005 + p·0.05 per 60 Hz frame, scaled by the 0.016 frame time.
                spin:   Some(GroupSpin { chaos_rate: 0.005 * 0.96, formed_rate: 0.05 * 0.96 }),
                intro:  false,
            },
            PopulationKind::Gifts    => ornament(Vec3::new(0.1, 0.05, 0.0)),
            PopulationKind::Baubles  => ornament(Vec3::ZERO),
            PopulationKind::Crystals => ornament(Vec3::new(0.2, 0.3, 0.0)),
            PopulationKind::Photos   => MorphProfile {
                easing: Easing::CubicInOut,
                swirl:  None,
                bob:    Some(Bob {
                    amplitude:   0.002,
                    freq_chaos:  0.5,
                    freq_formed: 1.0,
                    switch_at:   0.8,
                }),
                tumble: Vec3::ZERO,
                spin:   None,
                intro:  false,
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EntityTransform
// ════════════════════════════════════════════════════════════════════════════

/// What the renderer consumes for one entity, in group-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityTransform {
    pub position: Vec3,
    /// Euler XYZ, radians.
    pub rotation: Vec3,
    pub scale:    f32,
}

impl Default for EntityTransform {
    fn default() -> Self {
        EntityTransform { position: Vec3::ZERO, rotation: Vec3::ZERO, scale: 0.0 }
    }
}

impl EntityTransform {
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.quat(), self.position)
    }
}

/// Rotate `(x, z)` by `angle` about the vertical axis.
#[inline]
pub fn rotate_about_y(p: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(p.x * cos - p.z * sin, p.y, p.x * sin + p.z * cos)
}

/// Blended, swirled layout position, everything except the cosmetic bob.
pub fn blend_position(record: &EntityRecord, profile: &MorphProfile, progress: f32) -> Vec3 {
    let eased = profile.easing.apply(progress);
    let pos = lerp_vec3(record.chaos_position, record.formed_position, eased);
    match profile.swirl {
        Some(swirl) => {
            let angle = swirl.angle(progress, eased, pos.y, record.phase);
            if angle == 0.0 { pos } else { rotate_about_y(pos, angle) }
        }
        None => pos,
    }
}

/// Full steady-state transform for one entity.
pub fn evaluate_entity(
    record:   &EntityRecord,
    profile:  &MorphProfile,
    progress: f32,
    time:     f32,
) -> EntityTransform {
    let eased = profile.easing.apply(progress);
    let mut position = blend_position(record, profile, progress);
    if let Some(bob) = profile.bob {
        position.y += bob.offset(time, record.phase, progress);
    }
    let rotation = lerp_vec3(record.chaos_rotation, record.formed_rotation, eased)
        + profile.tumble * time;
    EntityTransform { position, rotation, scale: record.scale }
}

// ════════════════════════════════════════════════════════════════════════════
// MorphGroup
// ════════════════════════════════════════════════════════════════════════════

/// A population plus the transform buffer it publishes each frame.
///
/// The buffer is allocated from the population's length and is only
/// reachable read-only through [`MorphGroup::transforms`].  Regeneration
/// swaps both in one step and bumps [`MorphGroup::generation`], so a
/// consumer holding instance buffers knows to rebuild them.
#[derive(Debug)]
pub struct MorphGroup {
    population: Population,
    profile:    MorphProfile,
    buffer:     Vec<EntityTransform>,
    group_yaw:  f32,
    generation: u64,
}

impl MorphGroup {
    pub fn new(population: Population, profile: MorphProfile) -> Self {
        let buffer = vec![EntityTransform::default(); population.len()];
        MorphGroup { population, profile, buffer, group_yaw: 0.0, generation: 0 }
    }

    /// Generate a population for `kind` at the tier's density with its
    /// default profile.
    pub fn generate(generator: &mut LayoutGenerator, kind: PopulationKind, tier: DeviceTier) -> Self {
        Self::new(generator.generate(kind, tier), MorphProfile::for_kind(kind))
    }

    /// Replace the population and its buffer together.
    pub fn regenerate(&mut self, generator: &mut LayoutGenerator, count: usize, tier: DeviceTier) {
        let kind = self.population.kind();
        let population = generator.generate_count(kind, count, tier);
        info!("regenerating {} group: {} → {} entities ({:?})",
              kind.name(), self.population.len(), population.len(), tier);
        self.buffer     = vec![EntityTransform::default(); population.len()];
        self.population = population;
        self.generation += 1;
    }

    /// Steady-state update for this frame.
    pub fn update(&mut self, progress: f32, time: f32, dt: f32) {
        for (slot, record) in self.buffer.iter_mut().zip(self.population.iter()) {
            *slot = evaluate_entity(record, &self.profile, progress, time);
        }
        self.advance_spin(progress, dt);
    }

    /// Intro update for this frame.  Each entity flies toward its
    /// steady-state transform at the current `progress`; entities that have
    /// not launched yet are written with zero scale so the buffer stays
    /// fully populated.
    pub fn update_intro(&mut self, intro: &IntroSequence, progress: f32, time: f32, dt: f32) {
        for (i, (slot, record)) in self.buffer.iter_mut().zip(self.population.iter()).enumerate() {
            let landing = evaluate_entity(record, &self.profile, progress, time);
            *slot = intro.entity_transform(i, record, &landing, time);
        }
        self.advance_spin(progress, dt);
    }

    fn advance_spin(&mut self, progress: f32, dt: f32) {
        if let Some(spin) = self.profile.spin {
            self.group_yaw = (self.group_yaw + spin.rate(progress) * dt) % std::f32::consts::TAU;
        }
    }

    pub fn kind(&self) -> PopulationKind       { self.population.kind() }
    pub fn profile(&self) -> &MorphProfile     { &self.profile }
    pub fn population(&self) -> &Population    { &self.population }
    pub fn transforms(&self) -> &[EntityTransform] { &self.buffer }
    pub fn group_yaw(&self) -> f32             { self.group_yaw }
    pub fn generation(&self) -> u64            { self.generation }
    pub fn len(&self) -> usize                 { self.buffer.len() }
    pub fn is_empty(&self) -> bool             { self.buffer.is_empty() }

    pub fn plays_intro(&self) -> bool {
        self.profile.intro && !self.population.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
