/// Messages published by the simulation plugin.
///
/// Each tick the plugin drains the core's callbacks into these messages, in
/// the order the core reported them. Game logic (damage, explosions, AI)
/// reads them in `FixedUpdate` after [`super::SimSet::Publish`].

use bevy::prelude::*;

use super::arena::ObjectId;

/// `target` was struck by `aggressor`.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitEvent {
    pub target: ObjectId,
    pub aggressor: ObjectId,
}

/// An object's age ran out.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectExpired {
    pub object: ObjectId,
}

/// An object's periodic timer fired.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectActivated {
    pub object: ObjectId,
}
