/// Plugin-side resources wrapped around the simulation context.

use bevy::prelude::*;
use std::time::{Duration, Instant};

use super::hooks::EventLog;

/// Whether the fixed-step systems keep advancing the context.
///
/// A tick that fails (for example on a corrupt adjacency table) halts the
/// simulation rather than letting peers diverge.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SimStatus {
    #[default]
    Running,
    Halted,
}

impl SimStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, SimStatus::Running)
    }
}

/// Callback buffer reused across ticks.
#[derive(Resource, Debug, Default)]
pub struct PendingEvents(pub EventLog);

/// Timing of the last fixed step.
#[derive(Resource, Debug)]
pub struct SimPerformance {
    pub start_time: Option<Instant>,
    pub last_duration: Duration,
}

impl Default for SimPerformance {
    fn default() -> Self {
        Self {
            start_time: None,
            last_duration: Duration::from_secs(0),
        }
    }
}
