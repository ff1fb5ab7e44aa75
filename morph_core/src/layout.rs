//! Layout generation: the two static placements every entity morphs between.
//!
//! A [`Population`] is generated once per `(kind, count, tier)` and is never
//! resized afterwards.  Each [`EntityRecord`] carries:
//!
//! * a **chaos** placement: a point on a thick spherical shell (or, for
//!   photo panels, a camera-facing scatter), read as "exploded";
//! * a **formed** placement: a point inside a cone whose radius tapers
//!   linearly from `R_max` at the base to `0` at `H_max`, winding helically
//!   upwards so the cloud reads as a tree;
//! * static attributes: scale, colour, and a random phase that breaks up
//!   synchronised motion.
//!
//! | Kind | Desktop | Constrained | Chaos | Formed |
//! |---|---|---|---|---|
//! | Foliage  | 25 000 | 6 000 | shell 12–20 | dense spiral cone |
//! | Gifts    | 40 | 20 | shell 10–15 | lower cone band |
//! | Baubles  | 80 | 40 | shell 10–15 | cone band |
//! | Crystals | 40 | 20 | shell 10–15 | cone band |
//! | Photos   | 12 | 12 | screen scatter | fan across the front |

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::tier::DeviceTier;

/// Height of the tree silhouette shared by every cone layout.
pub const TREE_HEIGHT: f32 = 11.0;

// ════════════════════════════════════════════════════════════════════════════
// PopulationKind
// ════════════════════════════════════════════════════════════════════════════

/// One visual group of entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PopulationKind {
    Foliage,
    Gifts,
    Baubles,
    Crystals,
    Photos,
}

impl PopulationKind {
    pub const ALL: [PopulationKind; 5] = [
        PopulationKind::Foliage,
        PopulationKind::Gifts,
        PopulationKind::Baubles,
        PopulationKind::Crystals,
        PopulationKind::Photos,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PopulationKind::Foliage  => "foliage",
            PopulationKind::Gifts    => "gifts",
            PopulationKind::Baubles  => "baubles",
            PopulationKind::Crystals => "crystals",
            PopulationKind::Photos   => "photos",
        }
    }

    /// Entity count on the given tier.
    pub fn count_for(self, tier: DeviceTier) -> usize {
        let constrained = tier.is_constrained();
        match self {
            PopulationKind::Foliage  => if constrained { 6_000 } else { 25_000 },
            PopulationKind::Gifts    => if constrained { 20 } else { 40 },
            PopulationKind::Baubles  => if constrained { 40 } else { 80 },
            PopulationKind::Crystals => if constrained { 20 } else { 40 },
            PopulationKind::Photos   => 12,
        }
    }

    /// The placement recipe for this kind.  Only the photo scatter depends on
    /// the tier (portrait screens want a taller, narrower spread).
    pub fn recipe(self, tier: DeviceTier) -> LayoutRecipe {
        let shell = |base_radius, spread| ChaosLayout::Shell { base_radius, spread };
        let band  = |height_limit, radius_factor: f32| FormedLayout::Cone(ConeLayout {
            height:           TREE_HEIGHT,
            base_radius:      TREE_HEIGHT * radius_factor,
            height_limit,
            density_exponent: 1.0,
            winding_rate:     0.0,
            fill:             RadialFill::Band { inner: 0.75, spread: 0.2 },
            y_offset:         0.0,
        });

        match self {
            PopulationKind::Foliage => LayoutRecipe {
                chaos:  shell(12.0, 8.0),
                formed: FormedLayout::Cone(ConeLayout::foliage()),
                style:  EntityStyle::Foliage { size_scale: tier.point_size_scale() },
            },
            PopulationKind::Gifts => LayoutRecipe {
                chaos:  shell(10.0, 5.0),
                formed: band(6.0, 0.55),
                style:  EntityStyle::Ornament {
                    color:        rgb(0x8B0000),
                    scale_factor: 1.0,
                    base_tilt:    Vec3::new(1.0, 1.0, 0.5),
                },
            },
            PopulationKind::Baubles => LayoutRecipe {
                chaos:  shell(10.0, 5.0),
                formed: band(10.0, 0.45),
                style:  EntityStyle::Ornament {
                    color:        rgb(0xFFD700),
                    scale_factor: 0.5,
                    base_tilt:    Vec3::ZERO,
                },
            },
            PopulationKind::Crystals => LayoutRecipe {
                chaos:  shell(10.0, 5.0),
                formed: band(9.0, 0.50),
                style:  EntityStyle::Ornament {
                    color:        rgb(0xE0FFFF),
                    scale_factor: 0.35,
                    base_tilt:    Vec3::new(1.0, 1.0, 0.0),
                },
            },
            PopulationKind::Photos => LayoutRecipe {
                chaos:  ChaosLayout::photo_scatter(tier),
                formed: FormedLayout::Gallery(GalleryLayout::default()),
                style:  EntityStyle::Photo { color: rgb(0xFDF5E6) },
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Recipes
// ════════════════════════════════════════════════════════════════════════════

/// Everything the generator needs to place one population.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutRecipe {
    pub chaos:  ChaosLayout,
    pub formed: FormedLayout,
    pub style:  EntityStyle,
}

/// Dispersed placement.
#[derive(Clone, Debug, PartialEq)]
pub enum ChaosLayout {
    /// Uniform directions on a shell of radius `base_radius + U·spread`.
    /// The polar angle is drawn as `acos(2u − 1)` so the poles are not
    /// over-sampled.
    Shell { base_radius: f32, spread: f32 },
    /// Camera-facing scatter in a box in front of the tree, with small
    /// random tilts.
    Scatter {
        width:        f32,
        height:       f32,
        center_y:     f32,
        depth:        f32,
        depth_spread: f32,
        tilt:         Vec3,
    },
}

impl ChaosLayout {
    pub fn photo_scatter(tier: DeviceTier) -> Self {
        let c = tier.is_constrained();
        ChaosLayout::Scatter {
            width:        if c { 6.0 } else { 22.0 },
            height:       if c { 14.0 } else { 8.0 },
            center_y:     if c { 5.0 } else { 4.0 },
            depth:        if c { 10.0 } else { 12.0 },
            depth_spread: if c { 4.0 } else { 6.0 },
            tilt:         Vec3::new(0.3, 0.3, 0.2),
        }
    }

    /// Returns `(position, euler rotation)`.
    fn sample(&self, rng: &mut impl Rng) -> (Vec3, Vec3) {
        match *self {
            ChaosLayout::Shell { base_radius, spread } => {
                let radius = base_radius + rng.random::<f32>() * spread;
                let theta  = rng.random::<f32>() * TAU;
                let phi    = (2.0 * rng.random::<f32>() - 1.0).acos();
                let pos = Vec3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                );
                (pos, Vec3::ZERO)
            }
            ChaosLayout::Scatter { width, height, center_y, depth, depth_spread, tilt } => {
                let pos = Vec3::new(
                    (rng.random::<f32>() - 0.5) * width,
                    (rng.random::<f32>() - 0.5) * height + center_y,
                    depth + rng.random::<f32>() * depth_spread,
                );
                let rot = Vec3::new(
                    (rng.random::<f32>() - 0.5) * tilt.x,
                    (rng.random::<f32>() - 0.5) * tilt.y,
                    (rng.random::<f32>() - 0.5) * tilt.z,
                );
                (pos, rot)
            }
        }
    }
}

/// How the planar radius is drawn inside the cone's cross-section.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RadialFill {
    /// `sqrt(U)·r(h)`, uniform areal density over the disk.
    Disk,
    /// `r(h)·(inner + U·spread)`, a ring hugging the surface.
    Band { inner: f32, spread: f32 },
}

/// Parametric cone: `h = U^k · height_limit`, `r(h) = R_max·(1 − h/H_max)`,
/// `θ = h·winding_rate + 2π·U`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConeLayout {
    /// `H_max`, where the taper reaches zero.
    pub height:           f32,
    /// `R_max`, the radius at `h = 0`.
    pub base_radius:      f32,
    /// Upper bound of the sampled height (≤ `height`).
    pub height_limit:     f32,
    /// `k`; values above 1 thicken the base.
    pub density_exponent: f32,
    /// Radians of helical winding per unit of height.
    pub winding_rate:     f32,
    pub fill:             RadialFill,
    /// Added to `y` after sampling (the foliage sits slightly below origin).
    pub y_offset:         f32,
}

impl ConeLayout {
    pub fn foliage() -> Self {
        ConeLayout {
            height:           TREE_HEIGHT,
            base_radius:      5.5,
            height_limit:     TREE_HEIGHT,
            density_exponent: 1.5,
            winding_rate:     25.0 / TREE_HEIGHT,
            fill:             RadialFill::Disk,
            y_offset:         -1.0,
        }
    }

    /// Cone radius at height `h` (before `y_offset`).
    pub fn radius_at(&self, h: f32) -> f32 {
        if self.height <= 0.0 {
            return 0.0;
        }
        self.base_radius * (1.0 - h / self.height).clamp(0.0, 1.0)
    }

    fn sample(&self, rng: &mut impl Rng) -> Vec3 {
        let h      = rng.random::<f32>().powf(self.density_exponent) * self.height_limit;
        let r_max  = self.radius_at(h);
        let theta  = h * self.winding_rate + rng.random::<f32>() * TAU;
        let radius = match self.fill {
            RadialFill::Disk => rng.random::<f32>().sqrt() * r_max,
            RadialFill::Band { inner, spread } => r_max * (inner + rng.random::<f32>() * spread),
        };
        Vec3::new(theta.cos() * radius, h + self.y_offset, theta.sin() * radius)
    }
}

/// Photo panels fanned across the front of the cone, facing outwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GalleryLayout {
    pub bottom:       f32,
    pub span:         f32,
    pub base_radius:  f32,
    pub standoff:     f32,
    /// Total angular spread of the fan.
    pub fan:          f32,
    pub angle_jitter: f32,
    pub pitch:        f32,
    pub roll_jitter:  f32,
}

impl Default for GalleryLayout {
    fn default() -> Self {
        GalleryLayout {
            bottom:       1.0,
            span:         8.5,
            base_radius:  4.0,
            standoff:     0.6,
            fan:          PI / 1.2,
            angle_jitter: 0.5,
            pitch:        -0.1,
            roll_jitter:  0.15,
        }
    }
}

impl GalleryLayout {
    fn sample(&self, index: usize, count: usize, rng: &mut impl Rng) -> (Vec3, Vec3) {
        let y       = self.bottom + (index as f32 / count.max(1) as f32) * self.span;
        let radius  = self.base_radius * (1.0 - y / TREE_HEIGHT) + self.standoff;
        let spread  = if count > 1 { index as f32 / (count - 1) as f32 - 0.5 } else { 0.0 };
        let jitter  = (rng.random::<f32>() - 0.5) * self.angle_jitter;
        let angle   = spread * self.fan + jitter + PI / 2.0;
        let pos     = Vec3::new(angle.cos() * radius, y, angle.sin() * radius);
        let rot     = Vec3::new(
            self.pitch,
            -angle + PI / 2.0,
            (rng.random::<f32>() - 0.5) * self.roll_jitter,
        );
        (pos, rot)
    }
}

/// Assembled placement.
#[derive(Clone, Debug, PartialEq)]
pub enum FormedLayout {
    Cone(ConeLayout),
    Gallery(GalleryLayout),
}

/// Per-kind static attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityStyle {
    /// Green shades with a 1 % sprinkle of gold; `size_scale` widens points
    /// on sparse tiers.
    Foliage { size_scale: f32 },
    /// Single material colour; scale `(0.8 + U·0.5)·scale_factor`.  Both
    /// orientations start at `index · base_tilt`.
    Ornament { color: [f32; 3], scale_factor: f32, base_tilt: Vec3 },
    Photo { color: [f32; 3] },
}

const FOLIAGE_GREENS: [u32; 6] = [0x002400, 0x004B23, 0x006400, 0x007200, 0x008000, 0x38B000];
const FOLIAGE_GOLD: u32 = 0xFFD700;

/// `0xRRGGBB` → linear-ish `[r, g, b]` in `0..=1`.
pub fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >>  8) & 0xFF) as f32 / 255.0,
        ( hex        & 0xFF) as f32 / 255.0,
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// EntityRecord / Population
// ════════════════════════════════════════════════════════════════════════════

/// Static data for one entity.  Immutable once generated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityRecord {
    pub chaos_position:  Vec3,
    pub formed_position: Vec3,
    /// Euler XYZ, radians.
    pub chaos_rotation:  Vec3,
    pub formed_rotation: Vec3,
    pub scale:           f32,
    pub color:           [f32; 3],
    /// Random offset that desynchronises per-entity motion.
    pub phase:           f32,
}

/// A fixed-size, ordered set of entities produced by one generation pass.
#[derive(Clone, Debug)]
pub struct Population {
    kind:     PopulationKind,
    tier:     DeviceTier,
    entities: Vec<EntityRecord>,
}

impl Population {
    pub fn kind(&self) -> PopulationKind { self.kind }
    pub fn tier(&self) -> DeviceTier     { self.tier }
    pub fn len(&self) -> usize           { self.entities.len() }
    pub fn is_empty(&self) -> bool       { self.entities.is_empty() }
    pub fn entities(&self) -> &[EntityRecord] { &self.entities }

    pub fn iter(&self) -> std::slice::Iter<'_, EntityRecord> {
        self.entities.iter()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LayoutGenerator
// ════════════════════════════════════════════════════════════════════════════

/// Produces populations.  Seeded generators are reproducible; unseeded ones
/// draw from the OS.
#[derive(Debug)]
pub struct LayoutGenerator {
    rng: StdRng,
}

impl LayoutGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None    => StdRng::from_os_rng(),
        };
        LayoutGenerator { rng }
    }

    /// Generate a population at the tier's default density.
    pub fn generate(&mut self, kind: PopulationKind, tier: DeviceTier) -> Population {
        self.generate_count(kind, kind.count_for(tier), tier)
    }

    /// Generate exactly `count` entities.  `count == 0` yields an empty
    /// population.
    pub fn generate_count(
        &mut self,
        kind:  PopulationKind,
        count: usize,
        tier:  DeviceTier,
    ) -> Population {
        let recipe = kind.recipe(tier);
        let mut entities = Vec::with_capacity(count);

        for i in 0..count {
            let (chaos_position, mut chaos_rotation) = recipe.chaos.sample(&mut self.rng);
            let (formed_position, mut formed_rotation) = match &recipe.formed {
                FormedLayout::Cone(cone)       => (cone.sample(&mut self.rng), Vec3::ZERO),
                FormedLayout::Gallery(gallery) => gallery.sample(i, count, &mut self.rng),
            };

            let (scale, color) = match &recipe.style {
                EntityStyle::Foliage { size_scale } => {
                    if self.rng.random::<f32>() > 0.99 {
                        let size = self.rng.random::<f32>() * 2.5 + 0.5;
                        (size * size_scale, rgb(FOLIAGE_GOLD))
                    } else {
                        let pick  = self.rng.random::<f32>().powf(1.5) * FOLIAGE_GREENS.len() as f32;
                        let shade = (pick as usize).min(FOLIAGE_GREENS.len() - 1);
                        let size  = self.rng.random::<f32>() * 1.5 + 0.2;
                        (size * size_scale, rgb(FOLIAGE_GREENS[shade]))
                    }
                }
                EntityStyle::Ornament { color, scale_factor, base_tilt } => {
                    let tilt = *base_tilt * i as f32;
                    chaos_rotation  = tilt;
                    formed_rotation = tilt;
                    ((0.8 + self.rng.random::<f32>() * 0.5) * scale_factor, *color)
                }
                EntityStyle::Photo { color } => (1.0, *color),
            };

            let phase = match kind {
                PopulationKind::Photos => i as f32,
                _ => self.rng.random::<f32>() * TAU,
            };

            entities.push(EntityRecord {
                chaos_position,
                formed_position,
                chaos_rotation,
                formed_rotation,
                scale,
                color,
                phase,
            });
        }

        debug!("generated {} {} entities ({:?})", count, kind.name(), tier);
        Population { kind, tier, entities }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
