//! Easing curves that reshape linear progress before blending.
//!
//! Every curve maps `[0, 1] → [0, 1]` with `f(0) = 0` and `f(1) = 1`
//! exactly.  All of them except [`Easing::BackOut`] are monotonic; back-out
//! deliberately overshoots past 1 before settling and is only used for the
//! intro "pop" in scale, never for position blending.

/// Overshoot constant for the back-out curve.
const BACK_C1: f32 = 1.70158;
const BACK_C3: f32 = BACK_C1 + 1.0;

/// A named shaping curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// `4t³` below one half, `1 − (2 − 2t)³ / 2` above.  Slow start, slow settle.
    CubicInOut,
    /// `1 − (1 − t)³`.
    CubicOut,
    /// `1 − (1 − t)⁴`.  Snappier settle than cubic.
    QuarticOut,
    /// `1 + c3·(t − 1)³ + c1·(t − 1)²`.  Overshoots, not monotonic.
    BackOut,
    /// Hermite `t²(3 − 2t)`.
    Smoothstep,
}

impl Easing {
    /// Evaluate the curve.  Input outside `[0, 1]` is clamped first.
    pub fn apply(self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 - 2.0 * t;
                    1.0 - u * u * u / 2.0
                }
            }
            Easing::CubicOut => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Easing::QuarticOut => {
                let u = 1.0 - t;
                1.0 - u * u * u * u
            }
            Easing::BackOut => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u * u * u + BACK_C1 * u * u
            }
            Easing::Smoothstep => t * t * (3.0 - 2.0 * t),
        }
    }

    /// True for curves that never decrease over the unit interval.
    pub fn is_monotonic(self) -> bool {
        !matches!(self, Easing::BackOut)
    }
}

/// Hermite smoothstep between two edges, clamped.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation that returns `a` at `t = 0` and `b` at `t = 1`
/// bit-for-bit (the `a + (b − a)·t` form does not).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Component-wise [`lerp`] on vectors, same endpoint guarantee.
#[inline]
pub fn lerp_vec3(a: glam::Vec3, b: glam::Vec3, t: f32) -> glam::Vec3 {
    a * (1.0 - t) + b * t
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
