/// Bevy systems driving the simulation context.
///
/// - Startup: build the [`SimContext`] from [`InitialConfig`]
/// - FixedUpdate: advance one tick, publish the callbacks as messages
/// - Timing and periodic status logging

use bevy::prelude::*;
use bevy::time::Fixed as FixedStep;
use flotilla_macros::profile;

use crate::game::config::{InitialConfig, SimConfig, INITIAL_CONFIG_PATH};

use super::context::{SimContext, SimTick};
use super::events::{HitEvent, ObjectActivated, ObjectExpired};
use super::resources::{PendingEvents, SimPerformance, SimStatus};

// ============================================================================
// Configuration
// ============================================================================

/// Build the simulation context from the initial configuration.
///
/// An `InitialConfig` inserted by the app wins; otherwise it is read from
/// disk, falling back to defaults.
pub fn init_sim_context_from_initial(
    mut commands: Commands,
    mut fixed_time: ResMut<Time<FixedStep>>,
    initial_config: Option<Res<InitialConfig>>,
) {
    info!("Initializing SimContext from InitialConfig");

    let config = match initial_config {
        Some(cfg) => match cfg.validate() {
            Ok(()) => cfg.clone(),
            Err(e) => {
                error!("Inserted InitialConfig is invalid: {}; using defaults", e);
                let cfg = InitialConfig::default();
                commands.insert_resource(cfg.clone());
                cfg
            }
        },
        None => {
            let cfg = InitialConfig::load_or_default(INITIAL_CONFIG_PATH);
            commands.insert_resource(cfg.clone());
            cfg
        }
    };

    fixed_time.set_timestep_seconds(1.0 / config.tick_rate);

    let sim_config = SimConfig::from(&config);
    info!(
        "SimContext initialized: collision unit shift {}, max relevant distance {}, tick rate {}",
        sim_config.collision_unit_shift, sim_config.max_relevant_distance, config.tick_rate
    );
    commands.insert_resource(SimContext::new(sim_config));
}

// ============================================================================
// Tick
// ============================================================================

/// Advance the context by one motion unit.
///
/// Any error halts the simulation; the tick that failed is not retried.
pub fn advance_simulation(
    mut ctx: ResMut<SimContext>,
    mut pending: ResMut<PendingEvents>,
    mut status: ResMut<SimStatus>,
    mut tick: ResMut<SimTick>,
) {
    pending.0.clear();

    if let Err(err) = ctx.advance(1, &mut pending.0) {
        error!("[SIM] tick {} failed: {}; halting simulation", ctx.tick.0, err);
        *status = SimStatus::Halted;
    }
    *tick = ctx.tick;
}

/// Turn the callbacks of the last tick into messages, in reported order.
pub fn publish_events(
    pending: Res<PendingEvents>,
    mut hits: MessageWriter<HitEvent>,
    mut expired: MessageWriter<ObjectExpired>,
    mut activated: MessageWriter<ObjectActivated>,
) {
    for &(target, aggressor) in &pending.0.hits {
        hits.write(HitEvent { target, aggressor });
    }
    for &object in &pending.0.expired {
        expired.write(ObjectExpired { object });
    }
    for &object in &pending.0.activated {
        activated.write(ObjectActivated { object });
    }
}

pub fn sim_running(status: Res<SimStatus>) -> bool {
    status.is_running()
}

// ============================================================================
// Performance Tracking
// ============================================================================

/// Log simulation status periodically
pub fn sim_start(
    mut stats: ResMut<SimPerformance>,
    #[allow(unused_variables)] tick: Res<SimTick>,
    #[allow(unused_variables)] ctx: Res<SimContext>,
) {
    use crate::profile_log;

    stats.start_time = Some(std::time::Instant::now());
    profile_log!(tick, "[SIM STATUS] Tick: {} | Objects: {} | Last sim duration: {:?}",
          tick.0, ctx.objects.len(), stats.last_duration);
}

#[profile(16)]  // Warn if the whole tick > 16ms
pub fn sim_end(mut stats: ResMut<SimPerformance>) {
    if let Some(start) = stats.start_time.take() {
        stats.last_duration = start.elapsed();
    }
}
