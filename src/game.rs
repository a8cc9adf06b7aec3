use bevy::prelude::*;

pub mod config;
pub mod fixed_math;
pub mod proximity;
pub mod simulation;
pub mod snapshot;

use simulation::SimulationPlugin;

/// Everything the game needs from the simulation core.
///
/// The plugin is headless: rendering and game rules live in other plugins
/// that read [`simulation::SimContext`] and the hit/expiry messages.
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(SimulationPlugin);
    }
}
