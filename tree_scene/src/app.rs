//! Top-level application state machine.
//!
//! `AppState` owns the [`Scene`], the free-orbit camera, the gesture tracker
//! and (while gesture control is on) the gesture worker.  It turns each
//! frame's [`Controls`] into a [`FrameInput`] and drives the visualizer.

use std::time::Instant;

use hand_gesture::{select_classifier, GestureTracker, GestureWorker, ThrottleConfig};
use log::{info, warn};
use morph_core::{DeviceTier, FrameInput, HandSignal, MorphTarget, Scene};

use crate::config::AppConfig;
use crate::orbit::OrbitCamera;
use crate::sim_camera::{SimCamera, SimHandHandle};
use crate::visualizer::{Controls, Hud, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// Gesture control
// ════════════════════════════════════════════════════════════════════════════

struct GestureControl {
    worker:     GestureWorker,
    classifier: &'static str,
    signal:     HandSignal,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    config:   AppConfig,
    scene:    Scene,
    orbit:    OrbitCamera,
    gesture:  Option<GestureControl>,
    tracker:  GestureTracker,
    sim_hand: SimHandHandle,
    fps:      f32,

    // ── status message ────────────────────────────────────────────────────
    pub status: String,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let scene = Scene::new(config.scene_config());
        let mut app = AppState {
            scene,
            orbit:    OrbitCamera::default(),
            gesture:  None,
            tracker:  GestureTracker::new(config.tracker),
            sim_hand: SimHandHandle::default(),
            fps:      0.0,
            status:   "Ready. Space toggles, G enables gesture control".to_string(),
            config,
        };
        if app.config.gesture {
            app.enable_gesture();
        }
        app
    }

    // ── gesture mode ──────────────────────────────────────────────────────

    /// Acquire the camera and start the worker.  On failure the app stays
    /// in manual mode and says why.
    pub fn enable_gesture(&mut self) {
        if self.gesture.is_some() {
            return;
        }
        let skin = self.config.skin;

        #[cfg(feature = "leap")]
        let classifier = select_classifier(self.config.classifier, skin, || {
            hand_gesture::LeapLandmarkDetector::open()
                .map(|d| Box::new(d) as Box<dyn hand_gesture::HandLandmarkDetector>)
        });
        #[cfg(not(feature = "leap"))]
        let classifier = select_classifier(
            self.config.classifier, skin, crate::sim_camera::SimHandDetector::load,
        );

        let name   = classifier.name();
        let camera = SimCamera::new(self.sim_hand.clone(), self.config.camera_unavailable);
        match GestureWorker::spawn(Box::new(camera), classifier, ThrottleConfig::for_tier(self.config.tier)) {
            Ok(worker) => {
                info!("gesture control on ({})", name);
                self.status  = format!("Gesture control on: {}", name);
                self.gesture = Some(GestureControl {
                    worker,
                    classifier: name,
                    signal:     HandSignal::NEUTRAL,
                });
            }
            Err(e) => {
                warn!("gesture control unavailable: {}", e);
                self.status = format!("Gesture control unavailable ({}); manual mode", e);
            }
        }
    }

    /// Stop the worker and hand the camera back to the free orbit.
    pub fn disable_gesture(&mut self) {
        if let Some(mut g) = self.gesture.take() {
            if let Err(e) = g.worker.stop() {
                warn!("stopping gesture worker: {}", e);
            }
            self.tracker.reset();
            self.orbit.sync_from(self.scene.camera());
            self.status = "Manual mode".to_string();
            info!("gesture control off");
        }
    }

    pub fn toggle_tier(&mut self) {
        let tier = match self.config.tier {
            DeviceTier::Desktop     => DeviceTier::Constrained,
            DeviceTier::Constrained => DeviceTier::Desktop,
        };
        self.config.tier = tier;
        self.scene.set_tier(tier);
        // The inference cadence follows the tier.
        if self.gesture.is_some() {
            self.disable_gesture();
            self.enable_gesture();
        }
        self.status = format!("Tier: {:?}", tier);
    }

    // ── per-frame logic ───────────────────────────────────────────────────

    pub fn step(&mut self, controls: &Controls, dt: f32) {
        if controls.gesture_toggle {
            if self.gesture.is_some() { self.disable_gesture(); } else { self.enable_gesture(); }
        }
        if controls.tier_toggle {
            self.toggle_tier();
        }

        let hand = match self.gesture.as_mut() {
            Some(g) => {
                g.signal = self.tracker.update(g.worker.slot().latest(), Instant::now(), dt);
                Some(g.signal)
            }
            None => {
                let auto = if self.scene.target() == MorphTarget::Formed { self.config.auto_rotate } else { 0.0 };
                self.orbit.update(controls.orbit_drag, auto, dt);
                self.scene.set_camera(self.orbit.state());
                None
            }
        };

        self.scene.frame(&FrameInput { dt, toggle: controls.toggle, hand });

        if dt > 0.0 {
            let inst = 1.0 / dt;
            self.fps = if self.fps == 0.0 { inst } else { self.fps * 0.9 + inst * 0.1 };
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene                 { &self.scene }
    pub fn sim_hand(&self) -> &SimHandHandle      { &self.sim_hand }
    pub fn gesture_active(&self) -> bool          { self.gesture.is_some() }
    pub fn classifier_name(&self) -> Option<&str> { self.gesture.as_ref().map(|g| g.classifier) }
    pub fn hand_signal(&self) -> Option<HandSignal> { self.gesture.as_ref().map(|g| g.signal) }

    pub fn hud(&self) -> Hud<'_> {
        Hud {
            mode:       if self.gesture.is_some() { "gesture" } else { "manual" },
            classifier: self.classifier_name(),
            status:     &self.status,
            fps:        self.fps,
            hand:       self.hand_signal(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Main loop
// ════════════════════════════════════════════════════════════════════════════

pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let (w, h) = cfg.window_size();

    // ── Visualizer ────────────────────────────────────────────────────────
    let mut vis = Visualizer::new("Tree Scene", w, h)?;

    // ── App state ─────────────────────────────────────────────────────────
    let mut app = AppState::new(cfg);

    // ── Main loop ─────────────────────────────────────────────────────────
    let mut last = Instant::now();
    while vis.is_open() {
        // 1. Poll window input
        let controls = vis.poll();
        if controls.quit { break; }

        // 2. The pointer is the simulated hand in front of the webcam
        app.sim_hand().set(controls.hand);

        // 3. Per-frame logic
        let now = Instant::now();
        let dt  = now.duration_since(last).as_secs_f32().min(0.1);
        last = now;
        app.step(&controls, dt);

        // 4. Render
        vis.render(app.scene(), &app.hud());
    }

    app.disable_gesture();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use crate::sim_camera::SimHand;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> AppConfig {
        AppConfig { seed: Some(3), play_intro: false, ..AppConfig::default() }
    }

    fn run_frames(app: &mut AppState, controls: &Controls, n: usize) {
        for _ in 0..n {
            app.step(controls, DT);
        }
    }

    #[test]
    fn manual_toggle_drives_progress() {
        let mut app = AppState::new(config());
        assert_eq!(app.scene().target(), MorphTarget::Formed);

        app.step(&Controls { toggle: true, ..Controls::default() }, DT);
        assert_eq!(app.scene().target(), MorphTarget::Chaos);
        run_frames(&mut app, &Controls::default(), 600);
        assert!(app.scene().progress() < 0.01);
        assert!(!app.gesture_active());
    }

    #[test]
    fn camera_unavailable_stays_manual() {
        let mut app = AppState::new(AppConfig { camera_unavailable: true, ..config() });
        app.step(&Controls { gesture_toggle: true, ..Controls::default() }, DT);
        assert!(!app.gesture_active());
        assert!(app.status.contains("unavailable"), "{}", app.status);

        app.step(&Controls { toggle: true, ..Controls::default() }, DT);
        assert_eq!(app.scene().target(), MorphTarget::Chaos);
    }

    #[test]
    fn open_hand_scatters_the_tree() {
        let mut app = AppState::new(AppConfig { gesture: true, ..config() });
        assert!(app.gesture_active());
        assert_eq!(app.classifier_name(), Some("skin-heuristic"));

        app.sim_hand().set(SimHand { present: true, open: true, u: 0.5, v: 0.5 });
        let deadline = Instant::now() + Duration::from_secs(3);
        while app.scene().target() != MorphTarget::Chaos && Instant::now() < deadline {
            app.step(&Controls::default(), DT);
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(app.scene().target(), MorphTarget::Chaos);
        assert!(app.hand_signal().is_some_and(|h| h.tracked && h.open));

        app.step(&Controls { gesture_toggle: true, ..Controls::default() }, DT);
        assert!(!app.gesture_active());
        assert_eq!(app.hand_signal(), None);
    }

    #[test]
    fn re_enabled_gesture_starts_from_neutral() {
        let mut app = AppState::new(AppConfig { gesture: true, ..config() });
        // Hand held off to the viewer's left.
        app.sim_hand().set(SimHand { present: true, open: true, u: 0.9, v: 0.5 });
        let deadline = Instant::now() + Duration::from_secs(3);
        while !app.hand_signal().is_some_and(|h| h.tracked && h.x > 0.3) && Instant::now() < deadline {
            app.step(&Controls::default(), DT);
            thread::sleep(Duration::from_millis(10));
        }
        assert!(app.hand_signal().is_some_and(|h| h.x > 0.3));

        app.step(&Controls { gesture_toggle: true, ..Controls::default() }, DT);
        app.sim_hand().set(SimHand::default());
        app.step(&Controls { gesture_toggle: true, ..Controls::default() }, DT);
        assert!(app.gesture_active());
        let h = app.hand_signal().unwrap_or(HandSignal { x: 1.0, ..HandSignal::NEUTRAL });
        assert!(!h.tracked);
        assert_eq!(h.x, 0.0);
    }

    #[test]
    fn tier_toggle_regenerates() {
        let mut app = AppState::new(config());
        let before = app.scene().groups().iter().map(|g| g.len()).sum::<usize>();
        app.step(&Controls { tier_toggle: true, ..Controls::default() }, DT);
        assert_eq!(app.scene().tier(), DeviceTier::Constrained);
        let after = app.scene().groups().iter().map(|g| g.len()).sum::<usize>();
        assert!(after < before);
    }
}
