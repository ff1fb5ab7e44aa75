//! Progress controller: the single authoritative "how far morphed" value.
//!
//! Two logical states, [`MorphTarget::Formed`] and [`MorphTarget::Chaos`].
//! `progress` is a continuous shadow of the target: each tick it moves a
//! fixed fraction of the remaining distance, and snaps exactly onto the
//! target once within `snap_epsilon`.  Nothing outside this module writes
//! it; callers only ever ask via [`ProgressController::request_state`].

use log::info;

/// The binary state the controller is steering toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MorphTarget {
    /// Dispersed cloud, `progress → 0`.
    Chaos,
    /// Assembled tree, `progress → 1`.
    Formed,
}

impl MorphTarget {
    pub fn value(self) -> f32 {
        match self {
            MorphTarget::Chaos  => 0.0,
            MorphTarget::Formed => 1.0,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            MorphTarget::Chaos  => MorphTarget::Formed,
            MorphTarget::Formed => MorphTarget::Chaos,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MorphTarget::Chaos  => "CHAOS",
            MorphTarget::Formed => "FORMED",
        }
    }
}

/// Smoothing constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressConfig {
    /// Fraction of the remaining distance covered per reference tick.
    pub smoothing:    f32,
    /// Distance below which progress snaps onto the target.
    pub snap_epsilon: f32,
    /// Tick rate the smoothing factor was tuned for.
    pub reference_hz: f32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig {
            smoothing:    0.05,
            snap_epsilon: 0.01,
            reference_hz: 60.0,
        }
    }
}

impl ProgressConfig {
    /// Per-tick blend factor for a tick of `dt` seconds.  Equal to
    /// `smoothing` at the reference rate; frame-rate independent otherwise.
    pub fn factor(&self, dt: f32) -> f32 {
        let frames = dt * self.reference_hz;
        (1.0 - (1.0 - self.smoothing).powf(frames)).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Debug)]
pub struct ProgressController {
    progress: f32,
    target:   MorphTarget,
    config:   ProgressConfig,
}

impl ProgressController {
    /// Start settled on `initial`.
    pub fn new(initial: MorphTarget) -> Self {
        Self::with_config(initial, ProgressConfig::default())
    }

    pub fn with_config(initial: MorphTarget, config: ProgressConfig) -> Self {
        ProgressController {
            progress: initial.value(),
            target:   initial,
            config,
        }
    }

    /// Steer toward `target`.  Returns `false` (and does nothing) when it is
    /// already the current target.
    pub fn request_state(&mut self, target: MorphTarget) -> bool {
        if target == self.target {
            return false;
        }
        info!("morph target {} → {} at progress {:.3}",
              self.target.label(), target.label(), self.progress);
        self.target = target;
        true
    }

    /// Flip between the two states.
    pub fn toggle(&mut self) {
        self.request_state(self.target.toggled());
    }

    /// Advance by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !(dt > 0.0) {
            return;
        }
        let goal = self.target.value();
        let diff = goal - self.progress;
        if diff.abs() <= self.config.snap_epsilon {
            self.progress = goal;
            return;
        }
        self.progress = (self.progress + diff * self.config.factor(dt)).clamp(0.0, 1.0);
    }

    pub fn progress(&self) -> f32        { self.progress }
    pub fn target(&self) -> MorphTarget  { self.target }

    /// True once progress sits exactly on the target.
    pub fn is_settled(&self) -> bool {
        self.progress == self.target.value()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn converges_exactly_within_bound() {
        let mut pc = ProgressController::new(MorphTarget::Formed);
        pc.request_state(MorphTarget::Chaos);
        let mut ticks = 0;
        while !pc.is_settled() {
            pc.tick(DT);
            ticks += 1;
            assert!(ticks < 200, "did not converge");
        }
        assert_eq!(pc.progress(), 0.0);
        // 0.95^n ≤ 0.01 needs ~90 ticks; a full transition is ~1.5 s at 60 Hz.
        assert!(ticks > 60, "settled suspiciously fast: {}", ticks);
    }

    #[test]
    fn redundant_request_is_noop() {
        let mut pc = ProgressController::new(MorphTarget::Formed);
        assert!(!pc.request_state(MorphTarget::Formed));
        pc.tick(DT);
        assert_eq!(pc.progress(), 1.0);
    }

    #[test]
    fn reversal_is_continuous() {
        let mut pc = ProgressController::new(MorphTarget::Formed);
        pc.request_state(MorphTarget::Chaos);
        let mut prev = pc.progress();
        for _ in 0..20 {
            pc.tick(DT);
            assert!((pc.progress() - prev).abs() <= 0.05 + 1e-6);
            prev = pc.progress();
        }
        pc.request_state(MorphTarget::Formed);
        let mut reversed = false;
        for _ in 0..300 {
            pc.tick(DT);
            let step = pc.progress() - prev;
            assert!(step.abs() <= 0.05 + 1e-6, "jump of {}", step);
            if step > 0.0 { reversed = true; }
            prev = pc.progress();
        }
        assert!(reversed);
        assert_eq!(pc.progress(), 1.0);
    }

    #[test]
    fn factor_matches_smoothing_at_reference_rate() {
        let cfg = ProgressConfig::default();
        assert!((cfg.factor(DT) - 0.05).abs() < 1e-5);
        assert!(cfg.factor(1.0 / 30.0) > cfg.factor(DT));
    }

    #[test]
    fn zero_or_negative_dt_is_ignored() {
        let mut pc = ProgressController::new(MorphTarget::Formed);
        pc.request_state(MorphTarget::Chaos);
        pc.tick(0.0);
        pc.tick(-1.0);
        assert_eq!(pc.progress(), 1.0);
    }

    #[test]
    fn huge_dt_lands_on_target() {
        let mut pc = ProgressController::new(MorphTarget::Chaos);
        pc.request_state(MorphTarget::Formed);
        pc.tick(100.0);
        pc.tick(DT);
        assert_eq!(pc.progress(), 1.0);
    }

    proptest! {
        #[test]
        fn stays_in_unit_interval_and_converges(
            steps in proptest::collection::vec((any::<bool>(), 0usize..40), 1..30),
            dt in 0.001f32..0.1,
        ) {
            let mut pc = ProgressController::new(MorphTarget::Formed);
            let mut last = MorphTarget::Formed;
            for (formed, ticks) in steps {
                last = if formed { MorphTarget::Formed } else { MorphTarget::Chaos };
                pc.request_state(last);
                for _ in 0..ticks {
                    pc.tick(dt);
                    prop_assert!((0.0..=1.0).contains(&pc.progress()));
                }
            }
            for _ in 0..10_000 {
                if pc.is_settled() { break; }
                pc.tick(dt);
            }
            prop_assert_eq!(pc.progress(), last.value());
        }
    }
}
