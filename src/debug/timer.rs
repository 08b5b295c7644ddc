use instant::Instant;

/// Which phase of the simulation tick is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Commands = 0,
    SpatialRebuild = 1,
    Behavior = 2,
    Steering = 3,
    Culling = 4,
    Reap = 5,
    BuildFrame = 6,
}

impl SystemPhase {
    pub const ALL: [SystemPhase; 7] = [
        Self::Commands,
        Self::SpatialRebuild,
        Self::Behavior,
        Self::Steering,
        Self::Culling,
        Self::Reap,
        Self::BuildFrame,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Commands => "Commands",
            Self::SpatialRebuild => "Spatial",
            Self::Behavior => "Behavior",
            Self::Steering => "Steering",
            Self::Culling => "Culling",
            Self::Reap => "Reap",
            Self::BuildFrame => "Build Frame",
        }
    }
}

/// Per-phase timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; 7],
    /// Timestamp when `begin()` was called.
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; 7],
            start: Instant::now(),
        }
    }

    /// Call before a phase runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a phase finishes. Records elapsed time for `phase`.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }
}

impl Default for SystemTimers {
    fn default() -> Self {
        Self::new()
    }
}
