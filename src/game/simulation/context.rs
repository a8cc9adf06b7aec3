/// The explicit simulation context.
///
/// Everything a tick reads or writes lives here: the object arena, the
/// proximity grid, the viewpoint and the tuned constants. Stages take the
/// context by reference; there is no process-wide state.

use bevy::log::debug;
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::game::config::SimConfig;
use crate::game::proximity::ProximityGrid;

use super::arena::{ObjectArena, ObjectId};
use super::components::{AdmiralId, SimObject};
use super::error::SimError;
use super::hooks::SimHooks;
use super::{awareness, collision, motion};

/// Number of completed ticks.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTick(pub u64);

#[derive(Resource, Debug)]
pub struct SimContext {
    pub config: SimConfig,
    pub objects: ObjectArena,
    pub tick: SimTick,
    pub(crate) grid: ProximityGrid,
    pub(crate) viewpoint: Option<ObjectId>,
    pub(crate) local_admiral: Option<AdmiralId>,
    pub(crate) closest: Option<ObjectId>,
    pub(crate) farthest: Option<ObjectId>,
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl SimContext {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            objects: ObjectArena::default(),
            tick: SimTick::default(),
            grid: ProximityGrid::new(),
            viewpoint: None,
            local_admiral: None,
            closest: None,
            farthest: None,
        }
    }

    pub fn spawn(&mut self, object: SimObject) -> ObjectId {
        self.objects.spawn(object)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SimObject> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SimObject> {
        self.objects.get_mut(id)
    }

    /// The object distances to the player are measured from.
    pub fn set_viewpoint(&mut self, viewpoint: Option<ObjectId>) {
        self.viewpoint = viewpoint;
    }

    pub fn viewpoint(&self) -> Option<ObjectId> {
        self.viewpoint
    }

    /// The admiral whose view decides which sprites are drawn.
    pub fn set_local_admiral(&mut self, admiral: Option<AdmiralId>) {
        self.local_admiral = admiral;
    }

    pub fn local_admiral(&self) -> Option<AdmiralId> {
        self.local_admiral
    }

    /// Nearest radar-visible object to the viewpoint after the last tick.
    pub fn closest(&self) -> Option<ObjectId> {
        self.closest
    }

    /// Farthest radar-visible object from the viewpoint after the last tick.
    pub fn farthest(&self) -> Option<ObjectId> {
        self.farthest
    }

    /// Whether `admiral` could see `id` during the last tick.
    pub fn visible_to(&self, id: ObjectId, admiral: AdmiralId) -> bool {
        self.objects.get(id).is_some_and(|object| object.is_visible_to(admiral))
    }

    pub fn grid(&self) -> &ProximityGrid {
        &self.grid
    }

    /// Run one simulation tick covering `units` motion sub-ticks.
    ///
    /// A zero-unit call does nothing. On error the tick is abandoned part
    /// way through; the caller should stop advancing.
    pub fn advance(&mut self, units: i32, hooks: &mut impl SimHooks) -> Result<(), SimError> {
        if units <= 0 {
            return Ok(());
        }

        motion::move_objects(self, units)?;
        motion::update_presentation(self, units);
        collision::collide_objects(self, hooks)?;
        awareness::update_awareness(self, hooks)?;
        let freed = awareness::sweep(self);
        if freed > 0 {
            debug!("[SIM] tick {}: freed {} objects", self.tick.0, freed);
        }

        self.tick.0 += 1;
        Ok(())
    }
}
