//! # morph_core
//!
//! A procedural scene of many entities that morphs between two layouts: a
//! dispersed **chaos** cloud and an assembled **formed** tree.  One scalar,
//! `progress ∈ [0, 1]`, drives every blend.
//!
//! ## Frame pipeline
//!
//! | Step | Module | Writes |
//! |---|---|---|
//! | Control → target | [`progress`] | target state |
//! | Smooth progress | [`progress`] | `progress` |
//! | Entry choreography | [`intro`] | ornament transforms (first seconds only) |
//! | Morph evaluation | [`morph`] | per-entity transforms |
//! | Camera follow | [`camera`] | camera position (gesture mode only) |
//!
//! [`Scene`] owns all of it and runs the steps in order, once per frame.
//!
//! ## Populations
//!
//! | Kind | Easing | Extras |
//! |---|---|---|
//! | Foliage | quartic out | swirl, group spin |
//! | Gifts / Baubles / Crystals | cubic in-out | tumble, entry choreography |
//! | Photos | cubic in-out | ambient bob |
//!
//! Device tier scales how many entities there are, never how they move.

pub mod easing;
pub mod tier;
pub mod layout;
pub mod progress;
pub mod morph;
pub mod intro;
pub mod camera;
pub mod scene;

pub use camera::{CameraFollow, CameraFollowConfig, CameraState};
pub use easing::{lerp, lerp_vec3, smoothstep, Easing};
pub use intro::{IntroConfig, IntroPhase, IntroSequence};
pub use layout::{EntityRecord, LayoutGenerator, Population, PopulationKind, TREE_HEIGHT};
pub use morph::{EntityTransform, MorphGroup, MorphProfile};
pub use progress::{MorphTarget, ProgressConfig, ProgressController};
pub use scene::{FrameInput, HandSignal, Scene, SceneConfig};
pub use tier::DeviceTier;
