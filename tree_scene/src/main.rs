//! tree_scene — interactive entry point.

use clap::Parser;
use env_logger::Env;
use tree_scene::app::run;
use tree_scene::config::Cli;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cfg = Cli::parse().into_config();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Tree Scene — Chaos ⇄ Formed Particle Morph          ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Landmarks: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Webcam: simulated  (mouse = hand, H or click = open)");
    println!("  Tier: {:?}   Classifier: {}", cfg.tier, cfg.classifier.label());
    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
