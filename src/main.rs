use std::path::PathBuf;

use aquasim::app::{self, AppConfig};

const USAGE: &str = "usage: aquasim <presets.json> <locations.json> [scene.json]";

fn parse_args() -> Option<AppConfig> {
    let mut args = std::env::args().skip(1);
    let presets_path = PathBuf::from(args.next()?);
    let locations_path = PathBuf::from(args.next()?);
    let scene_path = args.next().map(PathBuf::from);

    let seed = std::env::var("AQUASIM_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| fastrand::u64(..));
    let max_ticks = std::env::var("AQUASIM_TICKS")
        .ok()
        .and_then(|s| s.parse().ok());

    Some(AppConfig {
        presets_path,
        locations_path,
        scene_path,
        seed,
        max_ticks,
    })
}

fn main() {
    env_logger::init();
    log::info!("AquaSim starting up");

    let Some(config) = parse_args() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };
    log::info!("seed: {}", config.seed);

    if let Err(e) = app::run(&config) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
