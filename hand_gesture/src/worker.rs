//! Background inference: throttle, result mailbox, and worker thread.
//!
//! ```text
//!  ┌──────── worker thread ────────┐          ┌──── frame loop ────┐
//!  │ FrameSource::grab             │          │                    │
//!  │   └─ every `interval`:        │  publish │ GestureSlot::latest│
//!  │      GestureClassifier::classify ───────▶│  (once per frame,  │
//!  │                               │  (last   │   never blocks)    │
//!  └───────────────────────────────┘  write   └────────────────────┘
//!                                       wins)
//! ```
//!
//! [`GestureWorker::stop`] clears the active flag, joins the thread (which
//! closes the camera on its way out) and empties the slot, so anything an
//! in-flight inference produces afterwards is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use morph_core::DeviceTier;

use crate::classifier::{GestureClassifier, GestureReading};
use crate::error::GestureError;
use crate::frame::FrameSource;

// ════════════════════════════════════════════════════════════════════════════
// InferenceThrottle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThrottleConfig {
    /// Minimum time between two inferences.
    pub interval:      Duration,
    /// Longest the worker sleeps between checks.
    pub poll:          Duration,
    /// Requested capture resolution.
    pub resolution:    (u32, u32),
}

impl ThrottleConfig {
    pub fn for_tier(tier: DeviceTier) -> Self {
        ThrottleConfig {
            interval:   tier.inference_interval(),
            poll:       Duration::from_millis(5),
            resolution: tier.capture_resolution(),
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self { Self::for_tier(DeviceTier::default()) }
}

/// Lets one inference through per interval.
#[derive(Clone, Debug)]
pub struct InferenceThrottle {
    interval: Duration,
    last:     Option<Instant>,
}

impl InferenceThrottle {
    pub fn new(interval: Duration) -> Self {
        InferenceThrottle { interval, last: None }
    }

    /// True (and the window restarts) when an inference may run at `now`.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Time left until the next inference is allowed.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last
            .map(|last| self.interval.saturating_sub(now.saturating_duration_since(last)))
            .unwrap_or(Duration::ZERO)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSlot
// ════════════════════════════════════════════════════════════════════════════

/// One inference result.  `reading == None` means the classifier saw no hand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureSample {
    pub reading:     Option<GestureReading>,
    pub captured_at: Instant,
    /// Increases by one per published sample.
    pub seq:         u64,
}

/// Single most-recent-value mailbox shared by the worker and the frame loop.
#[derive(Clone, Debug, Default)]
pub struct GestureSlot {
    inner: Arc<Mutex<Option<GestureSample>>>,
}

impl GestureSlot {
    pub fn new() -> Self { Self::default() }

    /// Overwrite whatever is there.
    pub fn publish(&self, sample: GestureSample) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(sample);
    }

    /// Copy of the newest sample; the slot keeps it.
    pub fn latest(&self) -> Option<GestureSample> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn clear(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureWorker
// ════════════════════════════════════════════════════════════════════════════

pub struct GestureWorker {
    active: Arc<AtomicBool>,
    slot:   GestureSlot,
    handle: Option<JoinHandle<()>>,
}

impl GestureWorker {
    /// Open `source` on the calling thread, so acquisition failures surface
    /// here, then hand it and `classifier` to a new worker thread.
    pub fn spawn(
        mut source:     Box<dyn FrameSource>,
        mut classifier: Box<dyn GestureClassifier>,
        config:         ThrottleConfig,
    ) -> Result<Self, GestureError> {
        let (w, h) = config.resolution;
        source.open(w, h)?;
        info!("gesture worker: {} @ {}x{}, {} every {:?}",
              source.name(), w, h, classifier.name(), config.interval);

        let active = Arc::new(AtomicBool::new(true));
        let slot   = GestureSlot::new();

        let thread_active = Arc::clone(&active);
        let thread_slot   = slot.clone();
        let handle = thread::Builder::new()
            .name("gesture-worker".into())
            .spawn(move || {
                run(source.as_mut(), classifier.as_mut(), config, &thread_active, &thread_slot);
                source.close();
            })
            .map_err(|e| GestureError::camera_unavailable(format!("worker thread: {}", e)))?;

        Ok(GestureWorker { active, slot, handle: Some(handle) })
    }

    /// Handle the frame loop reads from.
    pub fn slot(&self) -> &GestureSlot { &self.slot }

    pub fn is_active(&self) -> bool { self.active.load(Ordering::Acquire) }

    /// Stop inference and release the camera before returning.
    pub fn stop(&mut self) -> Result<(), GestureError> {
        self.active.store(false, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        let joined = handle.join().map_err(|_| GestureError::WorkerPanicked);
        self.slot.clear();
        if joined.is_ok() {
            info!("gesture worker stopped");
        }
        joined
    }
}

impl Drop for GestureWorker {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("{}", e);
        }
    }
}

fn run(
    source:     &mut dyn FrameSource,
    classifier: &mut dyn GestureClassifier,
    config:     ThrottleConfig,
    active:     &AtomicBool,
    slot:       &GestureSlot,
) {
    let mut throttle = InferenceThrottle::new(config.interval);
    let mut seq      = 0u64;
    let mut failing  = false;

    while active.load(Ordering::Acquire) {
        let now = Instant::now();
        if !throttle.ready(now) {
            thread::sleep(throttle.remaining(now).min(config.poll));
            continue;
        }

        let result = source
            .grab()
            .and_then(|frame| frame.map(|f| classifier.classify(&f)).transpose());

        match result {
            Ok(Some(reading)) => {
                failing = false;
                // Disabled while inferring: drop the result.
                if !active.load(Ordering::Acquire) {
                    break;
                }
                seq += 1;
                slot.publish(GestureSample { reading, captured_at: now, seq });
            }
            Ok(None) => {}
            Err(e) => {
                if !failing {
                    warn!("gesture inference: {}", e);
                    failing = true;
                } else {
                    debug!("gesture inference: {}", e);
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::VideoFrame;
    use crate::skin::SkinHeuristicClassifier;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Probe {
        opened: AtomicBool,
        closed: AtomicUsize,
        grabs:  AtomicUsize,
    }

    struct FakeCamera {
        probe: Arc<Probe>,
        fail:  bool,
    }

    impl FrameSource for FakeCamera {
        fn name(&self) -> &str { "fake" }

        fn open(&mut self, _: u32, _: u32) -> Result<(), GestureError> {
            if self.fail {
                return Err(GestureError::camera_unavailable("permission denied"));
            }
            self.probe.opened.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn grab(&mut self) -> Result<Option<VideoFrame>, GestureError> {
            self.probe.grabs.fetch_add(1, Ordering::SeqCst);
            Ok(Some(VideoFrame::filled(64, 48, [10, 10, 10])))
        }

        fn close(&mut self) {
            self.probe.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fast() -> ThrottleConfig {
        ThrottleConfig {
            interval:   Duration::from_millis(10),
            poll:       Duration::from_millis(1),
            resolution: (64, 48),
        }
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() { return true; }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn throttle_spacing() {
        let t0 = Instant::now();
        let mut th = InferenceThrottle::new(Duration::from_millis(100));
        assert!(th.ready(t0));
        assert!(!th.ready(t0 + Duration::from_millis(50)));
        assert_eq!(th.remaining(t0 + Duration::from_millis(40)), Duration::from_millis(60));
        assert!(th.ready(t0 + Duration::from_millis(100)));
        assert!(!th.ready(t0 + Duration::from_millis(150)));
    }

    #[test]
    fn tier_throttles() {
        assert_eq!(ThrottleConfig::for_tier(DeviceTier::Constrained).interval, Duration::from_millis(300));
        assert_eq!(ThrottleConfig::for_tier(DeviceTier::Desktop).resolution, (640, 480));
    }

    #[test]
    fn slot_is_last_write_wins() {
        let slot = GestureSlot::new();
        let now  = Instant::now();
        assert_eq!(slot.latest(), None);
        slot.publish(GestureSample { reading: None, captured_at: now, seq: 1 });
        slot.publish(GestureSample { reading: Some(GestureReading::NEUTRAL), captured_at: now, seq: 2 });
        assert_eq!(slot.latest().map(|s| s.seq), Some(2));
        assert_eq!(slot.latest().map(|s| s.seq), Some(2));
        slot.clear();
        assert_eq!(slot.latest(), None);
    }

    #[test]
    fn slot_survives_poisoning() {
        let slot = GestureSlot::new();
        let poisoner = slot.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.lock().unwrap();
            panic!("poison");
        })
        .join();
        slot.publish(GestureSample { reading: None, captured_at: Instant::now(), seq: 7 });
        assert_eq!(slot.latest().map(|s| s.seq), Some(7));
    }

    #[test]
    fn unavailable_camera_fails_spawn() {
        let probe = Arc::new(Probe::default());
        let cam = FakeCamera { probe: Arc::clone(&probe), fail: true };
        let err = GestureWorker::spawn(Box::new(cam), Box::new(SkinHeuristicClassifier::default()), fast());
        assert!(matches!(err, Err(ref e) if e.is_unavailable()));
        assert!(!probe.opened.load(Ordering::SeqCst));
    }

    #[test]
    fn publishes_then_releases_camera_on_stop() {
        let probe = Arc::new(Probe::default());
        let cam = FakeCamera { probe: Arc::clone(&probe), fail: false };
        let mut worker = GestureWorker::spawn(Box::new(cam), Box::new(SkinHeuristicClassifier::default()), fast())
            .unwrap();
        assert!(probe.opened.load(Ordering::SeqCst));

        let slot = worker.slot().clone();
        assert!(wait_for(|| slot.latest().is_some()));
        // Dark frame ⇒ classifier saw no hand.
        assert_eq!(slot.latest().and_then(|s| s.reading), None);

        worker.stop().unwrap();
        assert_eq!(probe.closed.load(Ordering::SeqCst), 1);
        assert!(!worker.is_active());
        assert_eq!(slot.latest(), None);

        let grabs = probe.grabs.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(probe.grabs.load(Ordering::SeqCst), grabs);
    }

    #[test]
    fn inference_is_rate_limited() {
        let probe = Arc::new(Probe::default());
        let cam = FakeCamera { probe: Arc::clone(&probe), fail: false };
        let cfg = ThrottleConfig { interval: Duration::from_millis(50), ..fast() };
        let mut worker = GestureWorker::spawn(Box::new(cam), Box::new(SkinHeuristicClassifier::default()), cfg)
            .unwrap();
        thread::sleep(Duration::from_millis(260));
        worker.stop().unwrap();
        let grabs = probe.grabs.load(Ordering::SeqCst);
        assert!((1..=7).contains(&grabs), "grabs = {}", grabs);
    }

    #[test]
    fn drop_stops_worker() {
        let probe = Arc::new(Probe::default());
        let cam = FakeCamera { probe: Arc::clone(&probe), fail: false };
        let worker = GestureWorker::spawn(Box::new(cam), Box::new(SkinHeuristicClassifier::default()), fast())
            .unwrap();
        drop(worker);
        assert_eq!(probe.closed.load(Ordering::SeqCst), 1);
    }
}
