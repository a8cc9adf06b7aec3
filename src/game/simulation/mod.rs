/// Simulation layer - deterministic motion, collision and awareness.
///
/// This module is organized into:
/// - **arena**: Generational object storage with stable processing order
/// - **components**: Per-object state (attributes, motion, bounds, sprite)
/// - **context**: The explicit per-session context and the tick driver
/// - **motion**: Turn, thrust, velocity integration and presentation
/// - **collision**: Near-grid pair tests and beam segment tests
/// - **separation**: Pushing overlapping solid objects apart
/// - **awareness**: Far-grid visibility, targeting and strength
/// - **hooks**: Callbacks into game logic
/// - **events / resources / systems**: The Bevy plugin wrapped around the core

use bevy::prelude::*;

pub mod arena;
pub mod awareness;
pub mod collision;
pub mod components;
pub mod context;
pub mod error;
pub mod events;
pub mod hooks;
pub mod motion;
pub mod resources;
pub mod separation;
pub mod systems;

pub use arena::{ObjectArena, ObjectId};
pub use components::*;
pub use context::{SimContext, SimTick};
pub use error::SimError;
pub use events::*;
pub use hooks::{EventLog, SimHooks};
pub use resources::*;

// System sets for organizing execution order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SimSet {
    Advance, // Motion, collision, awareness and sweep
    Publish, // Turn the tick's callbacks into messages
}

/// Main simulation plugin
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Overwritten from InitialConfig at startup
        app.insert_resource(Time::<bevy::time::Fixed>::from_seconds(1.0 / 20.0));

        app.init_resource::<SimContext>();
        app.init_resource::<SimTick>();
        app.init_resource::<SimStatus>();
        app.init_resource::<SimPerformance>();
        app.init_resource::<PendingEvents>();

        app.add_message::<HitEvent>();
        app.add_message::<ObjectExpired>();
        app.add_message::<ObjectActivated>();

        app.configure_sets(
            FixedUpdate,
            (SimSet::Advance, SimSet::Publish)
                .chain()
                .run_if(systems::sim_running),
        );

        app.add_systems(Startup, systems::init_sim_context_from_initial);

        app.add_systems(FixedUpdate, (
            systems::sim_start.before(SimSet::Advance),
            systems::advance_simulation.in_set(SimSet::Advance),
            systems::publish_events.in_set(SimSet::Publish),
            systems::sim_end.after(SimSet::Publish),
        ));
    }
}
