/// Generational object storage.
///
/// Objects are addressed by [`ObjectId`], a slot index plus a version.
/// Freeing a slot bumps its version, so any handle still pointing at it stops
/// resolving. This replaces the identity re-check beams and targets would
/// otherwise need.
///
/// The arena also owns the active-object list (`order`). Processing order over
/// this list is part of the deterministic contract: spawning appends, freeing
/// removes without reordering.

use slotmap::{new_key_type, SlotMap};

use super::components::{Activity, SimObject};

new_key_type! {
    /// Handle to an object in an [`ObjectArena`].
    pub struct ObjectId;
}

#[derive(Clone, Debug, Default)]
pub struct ObjectArena {
    slots: SlotMap<ObjectId, SimObject>,
    order: Vec<ObjectId>,
}

impl ObjectArena {
    /// Store `object` and append it to the active list.
    pub fn spawn(&mut self, object: SimObject) -> ObjectId {
        let id = self.slots.insert(object);
        self.order.push(id);
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&SimObject> {
        self.slots.get(id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SimObject> {
        self.slots.get_mut(id)
    }

    /// Mutable access to two distinct objects at once.
    pub fn get_pair_mut(&mut self, a: ObjectId, b: ObjectId) -> Option<(&mut SimObject, &mut SimObject)> {
        let [first, second] = self.slots.get_disjoint_mut([a, b])?;
        Some((first, second))
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots.contains_key(id)
    }

    /// Release a slot immediately. The simulation itself only frees through
    /// [`ObjectArena::free_marked`] at the end of a tick.
    pub fn free(&mut self, id: ObjectId) -> Option<SimObject> {
        let object = self.slots.remove(id)?;
        self.order.retain(|&other| other != id);
        Some(object)
    }

    /// Free every object marked [`Activity::ToBeFreed`], keeping the order of
    /// the survivors. Returns how many were freed.
    pub fn free_marked(&mut self) -> usize {
        let order = std::mem::take(&mut self.order);
        let mut kept = Vec::with_capacity(order.len());
        let mut freed = 0;
        for id in order {
            let marked = self.get(id).is_some_and(|object| object.activity == Activity::ToBeFreed);
            if marked {
                self.slots.remove(id);
                freed += 1;
            } else {
                kept.push(id);
            }
        }
        self.order = kept;
        freed
    }

    /// The active-object list in processing order.
    pub fn order(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Objects in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SimObject)> + '_ {
        self.order
            .iter()
            .filter_map(move |&id| self.get(id).map(|object| (id, object)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixed_math::Coord;
    use crate::game::simulation::components::BaseObject;
    use std::sync::Arc;

    fn object(x: i32) -> SimObject {
        SimObject::new(Arc::new(BaseObject::default()), Coord::new(x, 0))
    }

    #[test]
    fn test_spawn_appends_to_order() {
        let mut arena = ObjectArena::default();
        let a = arena.spawn(object(1));
        let b = arena.spawn(object(2));
        assert_eq!(arena.order(), &[a, b]);
        assert_eq!(arena.get(b).map(|o| o.location.x), Some(2));
    }

    #[test]
    fn test_stale_handle_never_resolves() {
        let mut arena = ObjectArena::default();
        let a = arena.spawn(object(1));
        assert!(arena.free(a).is_some());
        assert!(arena.get(a).is_none());

        // The slot is reused with a new version.
        let b = arena.spawn(object(2));
        assert_ne!(a, b);
        assert!(arena.get(a).is_none());
        assert!(arena.get_mut(a).is_none());
        assert_eq!(arena.get(b).map(|o| o.location.x), Some(2));
    }

    #[test]
    fn test_free_marked_keeps_survivor_order() {
        let mut arena = ObjectArena::default();
        let ids: Vec<_> = (0..4).map(|i| arena.spawn(object(i))).collect();
        for &id in &[ids[0], ids[2]] {
            if let Some(o) = arena.get_mut(id) {
                o.mark_for_removal();
            }
        }

        assert_eq!(arena.free_marked(), 2);
        assert_eq!(arena.order(), &[ids[1], ids[3]]);
        assert!(!arena.contains(ids[0]));
        assert!(!arena.contains(ids[2]));
    }

    #[test]
    fn test_get_pair_mut() {
        let mut arena = ObjectArena::default();
        let a = arena.spawn(object(1));
        let b = arena.spawn(object(2));

        let (first, second) = arena.get_pair_mut(b, a).expect("distinct live objects");
        assert_eq!(first.location.x, 2);
        assert_eq!(second.location.x, 1);

        assert!(arena.get_pair_mut(a, a).is_none());
    }
}
