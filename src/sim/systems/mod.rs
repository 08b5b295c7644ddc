pub mod behavior;
pub mod culling;
pub mod spatial;
pub mod steering;

use crate::debug::timer::SystemPhase;
use crate::sim::{lifecycle, Simulation, TickInputs};

/// Run all simulation phases for one fixed tick, in contract order.
/// Each phase completes before the next begins; external mutations only
/// ever land in phase 1.
pub fn tick(sim: &mut Simulation, inputs: &TickInputs) {
    sim.camera_position = inputs.camera_position;
    let dt = inputs.dt;

    // 1. Drain queued control commands, then converge populations.
    sim.timers.begin();
    sim.drain_commands();
    lifecycle::converge_populations(sim);
    sim.timers.end(SystemPhase::Commands);

    // 2. Rebuild spatial hash + snapshot cache.
    sim.timers.begin();
    spatial::rebuild(sim);
    sim.timers.end(SystemPhase::SpatialRebuild);

    // 3. Behavior state machines (mode timers, predator/prey transitions).
    sim.timers.begin();
    behavior::update(sim, dt);
    sim.timers.end(SystemPhase::Behavior);

    // 4. Steering forces + integration.
    sim.timers.begin();
    steering::update(sim, dt);
    sim.timers.end(SystemPhase::Steering);

    // 5. Per-view visibility masks + distance culling.
    sim.timers.begin();
    culling::update(sim);
    sim.timers.end(SystemPhase::Culling);

    // 6. Reap agents and schools marked for destruction.
    sim.timers.begin();
    lifecycle::reap(sim);
    sim.timers.end(SystemPhase::Reap);

    sim.tick_count += 1;
}
