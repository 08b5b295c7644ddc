use std::path::PathBuf;
use std::time::Duration;

use glam::Vec3;
use instant::Instant;

use crate::command::ControlHandle;
use crate::debug::timer::SystemPhase;
use crate::error::ConfigError;
use crate::location::LocationTable;
use crate::preset::PresetTable;
use crate::scene::SceneSetup;
use crate::sim::output::{self, RenderFrame};
use crate::sim::{Simulation, TickInputs};

/// Target simulation tick rate (seconds per tick).
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// How often to log frame stats (seconds).
const STATS_LOG_INTERVAL: f64 = 5.0;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_min: f64::MAX,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64, sim: &Simulation) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;
        self.frame_time_min = self.frame_time_min.min(dt);
        self.frame_time_max = self.frame_time_max.max(dt);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= STATS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            let phases: Vec<String> = SystemPhase::ALL
                .iter()
                .map(|&p| {
                    format!(
                        "{}: {:.0}us",
                        p.label(),
                        sim.timers.durations_us[p as usize]
                    )
                })
                .collect();
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | agents: {} | {} | sim total: {:.0}us",
                fps,
                avg_ms,
                self.frame_time_min * 1000.0,
                self.frame_time_max * 1000.0,
                sim.agent_count(),
                phases.join(" | "),
                sim.timers.total_us(),
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_min = f64::MAX;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Startup options, usually parsed from the command line.
pub struct AppConfig {
    pub presets_path: PathBuf,
    pub locations_path: PathBuf,
    pub scene_path: Option<PathBuf>,
    pub seed: u64,
    /// Stop after this many ticks; `None` runs until interrupted.
    pub max_ticks: Option<u64>,
}

/// Headless driver: owns the simulation, the fixed-timestep accumulator,
/// and the per-frame output buffers. A renderer collaborator would consume
/// `frame` after each `pump`.
pub struct App {
    sim: Simulation,
    handle: ControlHandle,
    camera_position: Vec3,

    last_frame_time: Option<Instant>,
    accumulator: f64,

    frame_stats: FrameStats,
    frame: RenderFrame,
}

impl App {
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let presets = PresetTable::from_path(&config.presets_path)?;
        let locations = LocationTable::from_path(&config.locations_path)?;
        let (sim, handle) = Simulation::new(presets, locations, config.seed);

        Ok(Self {
            sim,
            handle,
            camera_position: Vec3::ZERO,
            last_frame_time: None,
            accumulator: 0.0,
            frame_stats: FrameStats::new(),
            frame: RenderFrame::default(),
        })
    }

    pub fn handle(&self) -> &ControlHandle {
        &self.handle
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn set_camera_position(&mut self, position: Vec3) {
        self.camera_position = position;
    }

    /// Run fixed-timestep simulation ticks for the elapsed wall time.
    fn run_fixed_update(&mut self, dt: f64) {
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        while self.accumulator >= TICK_RATE {
            self.sim.tick(&TickInputs {
                dt: TICK_RATE as f32,
                camera_position: self.camera_position,
            });
            self.accumulator -= TICK_RATE;
        }
    }

    /// Interpolation alpha for rendering between ticks.
    fn interpolation_alpha(&self) -> f32 {
        (self.accumulator / TICK_RATE) as f32
    }

    /// One frame: advance the clock, tick as needed, rebuild the output
    /// buffers. Returns the interpolated frame for this instant.
    pub fn pump(&mut self) -> &RenderFrame {
        let now = Instant::now();
        let dt = match self.last_frame_time {
            Some(last) => now.duration_since(last).as_secs_f64(),
            None => TICK_RATE,
        };
        self.last_frame_time = Some(now);

        self.run_fixed_update(dt);

        let alpha = self.interpolation_alpha();
        self.sim.timers.begin();
        output::build_frame(&self.sim, alpha, &mut self.frame);
        self.sim.timers.end(SystemPhase::BuildFrame);

        self.frame_stats.record_frame(dt, &self.sim);
        &self.frame
    }
}

/// Load config, optionally replay a scene file, and run the pump loop.
pub fn run(config: &AppConfig) -> Result<(), ConfigError> {
    let mut app = App::new(config)?;

    // Without a real asset pipeline every preset's assets are ready at
    // startup, so deferred spawns release immediately.
    let preset_names: Vec<String> = app.sim.presets.names().map(str::to_owned).collect();
    for name in &preset_names {
        if app.handle.notify_assets_ready(name).is_err() {
            log::warn!("control queue closed during startup");
        }
    }

    if let Some(scene_path) = &config.scene_path {
        let scene = SceneSetup::from_path(scene_path)?;
        if let Err(err) = scene.apply(app.handle()) {
            log::error!("scene replay failed: {err}");
        } else {
            log::info!("scene '{}' queued", scene_path.display());
        }
    }

    log::info!("simulation running at {:.0} Hz", 1.0 / TICK_RATE);
    loop {
        app.pump();
        if let Some(max) = config.max_ticks {
            if app.sim.tick_count >= max {
                log::info!(
                    "finished after {} ticks, {} agents live",
                    app.sim.tick_count,
                    app.sim.agent_count()
                );
                return Ok(());
            }
        }
        // Pace the headless loop near the tick rate.
        std::thread::sleep(Duration::from_millis(1));
    }
}
