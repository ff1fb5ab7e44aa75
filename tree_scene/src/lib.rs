//! # tree_scene
//!
//! Interactive viewer for the chaos ⇄ tree morph, software rendered in a
//! `minifb` window, with either manual control or webcam hand gestures.
//!
//! ## Controls
//!
//! | Mode | Input | Action |
//! |---|---|---|
//! | Manual | `Space` | Toggle Formed ⇄ Chaos |
//! | Manual | Arrows / left drag | Orbit the camera |
//! | Gesture | Open hand | Scatter to Chaos |
//! | Gesture | Closed hand | Assemble the tree |
//! | Gesture | Hand position | Camera swings to follow |
//! | Either | `G` | Gesture control on / off |
//! | Either | `T` | Switch device tier |
//! | Either | `Q` / `Escape` | Quit |
//!
//! `Space` still works in gesture mode while no hand is in view.
//!
//! ## Simulated webcam
//!
//! Without hardware the pointer stands in for a hand: hovering over the
//! window puts a hand in view, holding `H` or the left button opens it.
//! Frames are rendered and classified exactly as camera frames would be.
//!
//! ## Feature flags
//!
//! * (default) — simulated webcam and landmark model.
//! * `leap` — LeapMotion supplies hand skeletons for the landmark classifier.

pub mod config;
pub mod orbit;
pub mod sim_camera;
pub mod visualizer;
pub mod app;
