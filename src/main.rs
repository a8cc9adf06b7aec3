use bevy::app::{AppExit, ScheduleRunnerPlugin};
use bevy::prelude::*;

use flotilla::game::fixed_math::{Coord, Fixed, FixedVec2};
use flotilla::game::simulation::{
    systems, AdmiralId, Attributes, BaseObject, FrameGeometry, HitEvent, ObjectExpired, SimContext, SimObject,
    SimSet, SimTick,
};
use flotilla::game::snapshot::SimSnapshot;
use flotilla::game::GamePlugin;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_TICKS: u64 = 600;
const SHIPS_PER_FLEET: i32 = 12;

/// How many ticks the headless run lasts.
#[derive(Resource)]
struct RunLength(u64);

fn setup_file_logging() -> std::io::Result<String> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Clean up old log files, keeping only the last 25
    cleanup_old_logs(&log_dir, 25);

    let now = chrono::Local::now();
    let log_filename = format!("flotilla_{}.log", now.format("%Y%m%d_%H%M%S"));
    let log_file_path = log_dir.join(&log_filename);
    let log_path_str = log_file_path.to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // Don't rotate during a single run
        &log_dir,
        &log_filename
    );

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false);

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bevy_ecs=info,bevy_app=info,flotilla=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn cleanup_old_logs(log_dir: &PathBuf, keep_count: usize) {
    if let Ok(entries) = fs::read_dir(log_dir) {
        let mut log_files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|s| s.starts_with("flotilla") && s.ends_with(".log"))
                    .unwrap_or(false)
            })
            .collect();

        // Oldest first
        log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        if log_files.len() > keep_count {
            for file in log_files.iter().take(log_files.len() - keep_count) {
                let _ = fs::remove_file(file.path());
            }
        }
    }
}

/// Two fleets flying at each other across the middle of the world.
fn spawn_fleets(mut ctx: ResMut<SimContext>) {
    let ship = Arc::new(BaseObject {
        mass: Fixed::ONE,
        offense_value: Fixed::from_long(2),
        tiny_size: 2,
        frames: vec![FrameGeometry::centered(24, 24)],
        ..Default::default()
    });
    let attributes = Attributes::CAN_COLLIDE
        | Attributes::CAN_BE_HIT
        | Attributes::OCCUPIES_SPACE
        | Attributes::CAN_THINK
        | Attributes::POTENTIAL_TARGET
        | Attributes::APPEAR_ON_RADAR;
    let center = ctx.config.thinkiverse_top_left + (ctx.config.thinkiverse_bottom_right - ctx.config.thinkiverse_top_left) / 2;

    let mut viewpoint = None;
    for (fleet, heading) in [(0u8, 1), (1u8, -1)] {
        for i in 0..SHIPS_PER_FLEET {
            let location = Coord::new(center - heading * 400, center + (i - SHIPS_PER_FLEET / 2) * 40);
            let object = SimObject::new(ship.clone(), location)
                .with_attributes(attributes)
                .with_owner(AdmiralId(fleet))
                .with_max_velocity(Fixed::from_long(3))
                .with_velocity(FixedVec2::new(Fixed::from_long(-heading * 2), Fixed::from_bits(i * 16 - 96)))
                .with_seed(u64::from(fleet) << 32 | i as u64);
            let id = ctx.spawn(object);
            viewpoint.get_or_insert(id);
        }
    }
    ctx.set_viewpoint(viewpoint);
    ctx.set_local_admiral(Some(AdmiralId(0)));
    info!("Spawned {} ships in two fleets", ctx.objects.len());
}

fn log_events(mut hits: MessageReader<HitEvent>, mut expired: MessageReader<ObjectExpired>) {
    for hit in hits.read() {
        debug!("[DEMO] {:?} hit by {:?}", hit.target, hit.aggressor);
    }
    for event in expired.read() {
        debug!("[DEMO] {:?} expired", event.object);
    }
}

fn stop_after(tick: Res<SimTick>, length: Res<RunLength>, ctx: Res<SimContext>, mut exit: MessageWriter<AppExit>) {
    if tick.0 < length.0 {
        return;
    }
    let snapshot = SimSnapshot::capture(&ctx);
    info!(
        "Finished {} ticks: {} objects, closest {:?}, checksum {:016x}",
        tick.0,
        snapshot.objects.len(),
        snapshot.closest,
        snapshot.checksum()
    );
    exit.write(AppExit::Success);
}

fn main() {
    let log_file = match setup_file_logging() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Failed to set up logging: {err}");
            return;
        }
    };
    println!("Flotilla headless run, logging to {log_file}");

    let ticks = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(DEFAULT_TICKS);

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(std::time::Duration::from_millis(1))))
        .add_plugins(GamePlugin)
        .insert_resource(RunLength(ticks))
        .add_systems(Startup, spawn_fleets.after(systems::init_sim_context_from_initial))
        .add_systems(FixedUpdate, log_events.after(SimSet::Publish))
        .add_systems(Update, stop_after)
        .run();
}
