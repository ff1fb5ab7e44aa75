//! Consumer-side gesture state.
//!
//! The frame loop calls [`GestureTracker::update`] once per frame with
//! whatever the slot currently holds.  Fresh samples are applied as-is; a
//! repeated sample changes nothing, so late data simply keeps the last known
//! hand.  When no hand has been seen for `stale_after` (or the classifier
//! reports none) the open flag drops to closed and the position eases back
//! to the centre instead of freezing where the hand was last seen.

use std::time::{Duration, Instant};

use log::debug;
use morph_core::HandSignal;

use crate::worker::GestureSample;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    /// No fresh sample for this long counts as "no hand".
    pub stale_after:  Duration,
    /// Fraction of the remaining distance to centre covered per reference
    /// frame while no hand is tracked.
    pub decay:        f32,
    pub reference_hz: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            stale_after:  Duration::from_millis(1000),
            decay:        0.1,
            reference_hz: 60.0,
        }
    }
}

/// What the scene currently believes about the hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureState {
    pub hand_open:      bool,
    pub x:              f32,
    pub y:              f32,
    pub tracked:        bool,
    pub last_sample_at: Option<Instant>,
    last_seq:           Option<u64>,
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState {
            hand_open:      false,
            x:              0.0,
            y:              0.0,
            tracked:        false,
            last_sample_at: None,
            last_seq:       None,
        }
    }
}

impl GestureState {
    pub fn signal(&self) -> HandSignal {
        HandSignal { open: self.hand_open, x: self.x, y: self.y, tracked: self.tracked }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GestureTracker {
    config: TrackerConfig,
    state:  GestureState,
}

impl GestureTracker {
    pub fn new(config: TrackerConfig) -> Self {
        GestureTracker { config, state: GestureState::default() }
    }

    pub fn state(&self) -> &GestureState { &self.state }

    /// Forget everything; used when gesture control is switched off.
    pub fn reset(&mut self) { self.state = GestureState::default(); }

    pub fn update(&mut self, sample: Option<GestureSample>, now: Instant, dt: f32) -> HandSignal {
        let st = &mut self.state;

        if let Some(s) = sample.filter(|s| st.last_seq != Some(s.seq)) {
            st.last_seq       = Some(s.seq);
            st.last_sample_at = Some(s.captured_at);
            match s.reading {
                Some(r) => {
                    st.hand_open = r.hand_open;
                    st.x         = r.x;
                    st.y         = r.y;
                    st.tracked   = true;
                }
                None => {
                    st.hand_open = false;
                    st.tracked   = false;
                }
            }
        }

        let stale = st
            .last_sample_at
            .map_or(true, |t| now.saturating_duration_since(t) > self.config.stale_after);
        if stale && st.tracked {
            debug!("gesture stale, decaying to neutral");
            st.tracked   = false;
            st.hand_open = false;
        }

        if !st.tracked && dt > 0.0 {
            let keep = (1.0 - self.config.decay).powf(dt * self.config.reference_hz);
            st.x *= keep;
            st.y *= keep;
        }

        st.signal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::GestureReading;

    const DT: f32 = 1.0 / 60.0;

    fn sample(seq: u64, at: Instant, reading: Option<GestureReading>) -> Option<GestureSample> {
        Some(GestureSample { reading, captured_at: at, seq })
    }

    fn hand(open: bool) -> Option<GestureReading> {
        Some(GestureReading { hand_open: open, x: 0.6, y: -0.4 })
    }

    #[test]
    fn starts_neutral() {
        let mut t = GestureTracker::default();
        assert_eq!(t.update(None, Instant::now(), DT), HandSignal::NEUTRAL);
    }

    #[test]
    fn fresh_sample_applies() {
        let mut t = GestureTracker::default();
        let now = Instant::now();
        let s = t.update(sample(1, now, hand(true)), now, DT);
        assert!(s.open && s.tracked);
        assert_eq!((s.x, s.y), (0.6, -0.4));
    }

    #[test]
    fn stale_by_one_interval_is_tolerated() {
        let mut t = GestureTracker::default();
        let t0 = Instant::now();
        t.update(sample(1, t0, hand(true)), t0, DT);
        let s = t.update(sample(1, t0, hand(true)), t0 + Duration::from_millis(300), DT);
        assert!(s.open && s.tracked);
        assert_eq!(s.x, 0.6);
    }

    #[test]
    fn sustained_absence_decays_to_neutral() {
        let mut t = GestureTracker::default();
        let t0 = Instant::now();
        t.update(sample(1, t0, hand(true)), t0, DT);
        let mut s = HandSignal::NEUTRAL;
        for k in 1..=600 {
            s = t.update(sample(1, t0, hand(true)), t0 + Duration::from_millis(1000 + k * 16), DT);
        }
        assert!(!s.open && !s.tracked);
        assert!(s.x.abs() < 1e-3 && s.y.abs() < 1e-3);
    }

    #[test]
    fn no_hand_closes_and_eases_home() {
        let mut t = GestureTracker::default();
        let t0 = Instant::now();
        t.update(sample(1, t0, hand(true)), t0, DT);
        let s = t.update(sample(2, t0, None), t0, DT);
        assert!(!s.open && !s.tracked);
        assert!(s.x > 0.0 && s.x < 0.6, "eases rather than jumps: {}", s.x);
    }

    #[test]
    fn reset_forgets() {
        let mut t = GestureTracker::default();
        let now = Instant::now();
        t.update(sample(1, now, hand(true)), now, DT);
        t.reset();
        assert_eq!(t.state().signal(), HandSignal::NEUTRAL);
    }
}
