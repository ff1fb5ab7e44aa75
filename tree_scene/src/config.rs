//! Runtime configuration and the command line that builds it.

use clap::{Parser, ValueEnum};
use hand_gesture::{ClassifierKind, SkinHeuristicConfig, SpreadOrigin, TrackerConfig};
use morph_core::{DeviceTier, SceneConfig};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub tier:               DeviceTier,
    pub seed:               Option<u64>,
    pub play_intro:         bool,
    /// Start with gesture control switched on.
    pub gesture:            bool,
    pub classifier:         ClassifierKind,
    pub skin:               SkinHeuristicConfig,
    pub tracker:            TrackerConfig,
    /// Make the simulated webcam refuse to open.
    pub camera_unavailable: bool,
    /// Free-orbit auto-rotation while formed, rad/s.
    pub auto_rotate:        f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            tier:               DeviceTier::Desktop,
            seed:               None,
            play_intro:         true,
            gesture:            false,
            classifier:         ClassifierKind::SkinHeuristic,
            // The simulated hand wanders the whole frame; measure finger
            // spread around the hand itself.
            skin:               SkinHeuristicConfig {
                spread_origin: SpreadOrigin::SkinCentroid,
                ..SkinHeuristicConfig::default()
            },
            tracker:            TrackerConfig::default(),
            camera_unavailable: false,
            auto_rotate:        0.3,
        }
    }
}

impl AppConfig {
    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig::new(self.tier)
            .with_seed(self.seed)
            .with_intro(self.play_intro)
    }

    /// Window size matching the tier; a constrained window is narrow enough
    /// that width detection agrees.
    pub fn window_size(&self) -> (usize, usize) {
        match self.tier {
            DeviceTier::Desktop     => (1280, 720),
            DeviceTier::Constrained => (800, 600),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Cli
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ClassifierArg {
    /// Bright/skin-tone pixel heuristic.
    Skin,
    /// Finger counting on a hand skeleton.
    Landmark,
}

impl From<ClassifierArg> for ClassifierKind {
    fn from(arg: ClassifierArg) -> Self {
        match arg {
            ClassifierArg::Skin     => ClassifierKind::SkinHeuristic,
            ClassifierArg::Landmark => ClassifierKind::Landmark,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tree_scene", version, about = "Chaos ⇄ tree particle morph with hand-gesture control")]
pub struct Cli {
    /// Run with the constrained-device parameters (fewer entities, slower inference).
    #[arg(long)]
    pub constrained: bool,

    /// Seed for the layout generator (random per run otherwise).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Start with gesture control enabled.
    #[arg(long)]
    pub gesture: bool,

    /// Gesture classifier strategy.
    #[arg(long, value_enum, default_value_t = ClassifierArg::Skin)]
    pub classifier: ClassifierArg,

    /// Simulate a camera that cannot be acquired.
    #[arg(long)]
    pub camera_unavailable: bool,

    /// Skip the entry choreography.
    #[arg(long)]
    pub no_intro: bool,
}

impl Cli {
    pub fn into_config(self) -> AppConfig {
        AppConfig {
            tier:               DeviceTier::from_constrained(self.constrained),
            seed:               self.seed,
            play_intro:         !self.no_intro,
            gesture:            self.gesture,
            classifier:         self.classifier.into(),
            camera_unavailable: self.camera_unavailable,
            ..AppConfig::default()
        }
    }
}
