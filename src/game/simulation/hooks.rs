/// Collaborator interface.
///
/// The core knows nothing about what a hit, an expiry or an activation does.
/// It reports them through [`SimHooks`] synchronously, in processing order.
/// Hooks may change object state (ownership, attributes, marking for
/// removal) but must not free objects; freeing only happens at the end of the
/// tick.

use super::arena::{ObjectArena, ObjectId};
use super::components::SimObject;

pub trait SimHooks {
    /// `target` was struck by `aggressor`.
    fn notify_hit(&mut self, objects: &mut ObjectArena, target: ObjectId, aggressor: ObjectId);

    /// Whether `object` considers `other` a valid target.
    fn engages(&self, _object: &SimObject, _other: &SimObject) -> bool {
        true
    }

    /// `id`'s age ran out.
    fn expire(&mut self, _objects: &mut ObjectArena, _id: ObjectId) {}

    /// `id`'s periodic timer fired.
    fn activate(&mut self, _objects: &mut ObjectArena, _id: ObjectId) {}
}

/// Records every callback in order. Used by the Bevy plugin to turn
/// callbacks into messages, and by tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventLog {
    pub hits: Vec<(ObjectId, ObjectId)>,
    pub expired: Vec<ObjectId>,
    pub activated: Vec<ObjectId>,
}

impl EventLog {
    pub fn clear(&mut self) {
        self.hits.clear();
        self.expired.clear();
        self.activated.clear();
    }
}

impl SimHooks for EventLog {
    fn notify_hit(&mut self, _objects: &mut ObjectArena, target: ObjectId, aggressor: ObjectId) {
        self.hits.push((target, aggressor));
    }

    fn expire(&mut self, _objects: &mut ObjectArena, id: ObjectId) {
        self.expired.push(id);
    }

    fn activate(&mut self, _objects: &mut ObjectArena, id: ObjectId) {
        self.activated.push(id);
    }
}
