/// Object definitions for the simulation layer.
///
/// A [`SimObject`] is one live entity (ship, projectile, beam, planet). Its
/// static type data lives in a shared [`BaseObject`]; everything else is
/// per-tick state owned by the [`ObjectArena`](super::arena::ObjectArena).

use std::sync::Arc;

use bitflags::bitflags;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::game::fixed_math::{Coord, Fixed, FixedVec2, Scale};
use super::arena::ObjectId;

// ============================================================================
// Flags
// ============================================================================

bitflags! {
    /// Static capabilities of an object, copied from its base type at spawn.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Attributes: u32 {
        const CAN_TURN             = 1 << 0;
        const POTENTIAL_TARGET     = 1 << 1;
        const IS_REMOTE            = 1 << 3;
        const IS_HUMAN_CONTROLLED  = 1 << 4;
        const IS_BEAM              = 1 << 5;
        const DOES_BOUNCE          = 1 << 6;
        const IS_SELF_ANIMATED     = 1 << 7;
        const SHAPE_FROM_DIRECTION = 1 << 8;
        const CONSIDER_DISTANCE    = 1 << 10;
        const CAN_THINK            = 1 << 11;
        const ANIMATION_CYCLE      = 1 << 17;
        const CAN_COLLIDE          = 1 << 18;
        const CAN_BE_HIT           = 1 << 19;
        const IS_DESTINATION       = 1 << 20;
        const HIDE_EFFECT          = 1 << 21;
        const HATED                = 1 << 23;
        const OCCUPIES_SPACE       = 1 << 24;
        const IS_STATIONARY        = 1 << 25;
        const CAN_BE_EVADED        = 1 << 26;
        const APPEAR_ON_RADAR      = 1 << 29;
    }
}

impl Attributes {
    /// Any of these puts an object into the proximity grid.
    pub const GRID_ELIGIBLE: Self = Self::CAN_COLLIDE
        .union(Self::CAN_BE_HIT)
        .union(Self::IS_DESTINATION)
        .union(Self::CAN_THINK)
        .union(Self::CONSIDER_DISTANCE)
        .union(Self::CAN_BE_EVADED)
        .union(Self::IS_HUMAN_CONTROLLED)
        .union(Self::IS_REMOTE);

    /// Any of these makes an object take part in long-range awareness.
    pub const AWARENESS_CANDIDATE: Self = Self::CAN_THINK
        .union(Self::IS_HUMAN_CONTROLLED)
        .union(Self::IS_REMOTE)
        .union(Self::HATED);

    pub fn is_grid_eligible(self) -> bool {
        self.intersects(Self::GRID_ELIGIBLE)
    }

    pub fn is_awareness_candidate(self) -> bool {
        self.intersects(Self::AWARENESS_CANDIDATE)
    }
}

bitflags! {
    /// Flags recomputed while the simulation runs.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RuntimeFlags: u32 {
        const IS_CLOAKED = 1 << 0;
        const IS_HIDDEN  = 1 << 1;
    }
}

// ============================================================================
// Ownership
// ============================================================================

/// A player or AI faction. Objects with the same admiral never collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdmiralId(pub u8);

impl AdmiralId {
    /// This admiral's bit in `seen_by_player_flags`.
    pub const fn flag(self) -> u32 {
        1u32 << (self.0 & 31)
    }
}

// ============================================================================
// Base type data
// ============================================================================

/// Geometry of one sprite frame, in unscaled pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: i32,
    pub height: i32,
    pub center: Coord,
}

impl FrameGeometry {
    /// A frame of the given size with its center in the middle.
    pub const fn centered(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            center: Coord::new(width / 2, height / 2),
        }
    }
}

/// Frame range of a self-animated base type. Shapes are fixed-point frame
/// indices so fractional speeds accumulate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAnimation {
    pub first_shape: Fixed,
    pub last_shape: Fixed,
    pub frame_speed: Fixed,
}

/// Read-only type data shared by every object of one kind.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseObject {
    pub mass: Fixed,
    pub offense_value: Fixed,
    pub expire_dont_die: bool,
    pub activate_period: i32,
    pub activate_period_range: i32,
    pub tiny_size: i32,
    pub frames: Vec<FrameGeometry>,
    pub animation: BaseAnimation,
    /// Degrees per sprite frame for SHAPE_FROM_DIRECTION objects.
    pub rotation_resolution: i32,
}

// ============================================================================
// Per-object state
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activity {
    /// Parked by the collaborator; skipped by every pass.
    Available,
    #[default]
    InUse,
    /// Freed at the end of the current tick.
    ToBeFreed,
}

/// Presence state relevant to thrust: warping objects chase a fixed speed
/// instead of their max velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Presence {
    #[default]
    Normal,
    Warping { speed: Fixed },
    WarpOut { speed: Fixed },
}

/// Axis-aligned bounding box in world units.
///
/// `right <= left` means "not computed this tick".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

pub mod clip {
    pub const LEFT: u8 = 8;
    pub const RIGHT: u8 = 4;
    pub const TOP: u8 = 2;
    pub const BOTTOM: u8 = 1;
}

impl Bounds {
    pub const INVALID: Self = Self { left: 0, top: 0, right: 0, bottom: 0 };

    pub const fn is_computed(&self) -> bool {
        self.left < self.right
    }

    /// Inclusive overlap test; touching edges count. A box that was never
    /// computed overlaps nothing.
    pub const fn overlaps(&self, other: &Bounds) -> bool {
        if !self.is_computed() || !other.is_computed() {
            return false;
        }
        !(self.right < other.left
            || self.left > other.right
            || self.bottom < other.top
            || self.top > other.bottom)
    }

    /// Outcode of a point for segment clipping. The right and bottom edges
    /// are exclusive.
    pub fn clip_code(&self, x: i64, y: i64) -> u8 {
        let mut code = 0;
        if x < i64::from(self.left) {
            code |= clip::LEFT;
        } else if x > i64::from(self.right) - 1 {
            code |= clip::RIGHT;
        }
        if y < i64::from(self.top) {
            code |= clip::TOP;
        } else if y > i64::from(self.bottom) - 1 {
            code |= clip::BOTTOM;
        }
        code
    }

    pub const fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left.wrapping_add(dx),
            top: self.top.wrapping_add(dy),
            right: self.right.wrapping_add(dx),
            bottom: self.bottom.wrapping_add(dy),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteStyle {
    #[default]
    Normal,
    /// Shield flash after a hit, at the given intensity.
    Shielded(i32),
    /// Cloak fade, at the given opacity loss.
    Cloaked(i32),
}

/// Presentation data the render layer reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteState {
    pub which_shape: i32,
    pub tiny_size: i32,
    pub style: SpriteStyle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationState {
    pub this_shape: Fixed,
    pub frame_direction: i32,
    pub frame_speed: Fixed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeamKind {
    /// Travels on its own velocity like a projectile.
    #[default]
    Kinetic,
    StaticObjectToObject,
    BoltObjectToObject,
    StaticObjectToRelative,
    BoltObjectToRelative,
}

impl BeamKind {
    pub const fn is_object_to_object(self) -> bool {
        matches!(self, Self::StaticObjectToObject | Self::BoltObjectToObject)
    }

    pub const fn is_object_to_relative(self) -> bool {
        matches!(self, Self::StaticObjectToRelative | Self::BoltObjectToRelative)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeamState {
    pub kind: BeamKind,
    pub from: Option<ObjectId>,
    pub to: Option<ObjectId>,
    pub to_relative: Coord,
    /// The other end of the beam segment; `location` is the first end.
    pub last_global_location: Coord,
}

/// One live object.
#[derive(Clone, Debug)]
pub struct SimObject {
    pub base: Arc<BaseObject>,
    pub activity: Activity,
    pub attributes: Attributes,
    pub runtime_flags: RuntimeFlags,

    pub location: Coord,
    pub velocity: FixedVec2,
    pub motion_fraction: FixedVec2,
    pub direction: i32,
    pub turn_velocity: Fixed,
    pub turn_fraction: Fixed,
    pub thrust: Fixed,
    pub max_velocity: Fixed,
    pub presence: Presence,

    pub owner: Option<AdmiralId>,
    pub player_flag: u32,

    pub natural_scale: Scale,
    pub absolute_bounds: Bounds,
    pub collision_grid: Coord,
    pub distance_grid: Coord,

    pub closest_object: Option<ObjectId>,
    pub closest_distance: u32,
    pub local_friend_strength: Fixed,
    pub local_foe_strength: Fixed,
    pub seen_by_player_flags: u32,
    pub distance_from_player: u64,

    pub age: i32,
    pub periodic_time: i32,
    pub hit_state: i32,
    pub cloak_state: i32,

    pub sprite: Option<SpriteState>,
    pub animation: AnimationState,
    pub beam: Option<BeamState>,

    pub rng: Pcg32,
}

impl SimObject {
    /// A stationary, unowned object. Callers fill in the rest through the
    /// public fields or the `with_*` helpers.
    pub fn new(base: Arc<BaseObject>, location: Coord) -> Self {
        let sprite = (!base.frames.is_empty()).then(|| SpriteState {
            which_shape: 0,
            tiny_size: base.tiny_size,
            style: SpriteStyle::Normal,
        });
        Self {
            activity: Activity::InUse,
            attributes: Attributes::empty(),
            runtime_flags: RuntimeFlags::empty(),
            location,
            velocity: FixedVec2::ZERO,
            motion_fraction: FixedVec2::ZERO,
            direction: 0,
            turn_velocity: Fixed::ZERO,
            turn_fraction: Fixed::ZERO,
            thrust: Fixed::ZERO,
            max_velocity: Fixed::ZERO,
            presence: Presence::Normal,
            owner: None,
            player_flag: 0,
            natural_scale: Scale::default(),
            absolute_bounds: Bounds::INVALID,
            collision_grid: Coord::default(),
            distance_grid: Coord::default(),
            closest_object: None,
            closest_distance: 0,
            local_friend_strength: Fixed::ZERO,
            local_foe_strength: Fixed::ZERO,
            seen_by_player_flags: 0,
            distance_from_player: 0,
            age: -1,
            periodic_time: 0,
            hit_state: 0,
            cloak_state: 0,
            sprite,
            animation: AnimationState::default(),
            beam: None,
            rng: Pcg32::seed_from_u64(0),
            base,
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_owner(mut self, owner: AdmiralId) -> Self {
        self.owner = Some(owner);
        self.player_flag = owner.flag();
        self
    }

    pub fn with_velocity(mut self, velocity: FixedVec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: Fixed) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    pub fn with_beam(mut self, beam: BeamState) -> Self {
        self.beam = Some(beam);
        self
    }

    pub fn is_in_use(&self) -> bool {
        self.activity == Activity::InUse
    }

    pub fn is_active(&self) -> bool {
        self.activity != Activity::Available
    }

    pub fn mark_for_removal(&mut self) {
        self.activity = Activity::ToBeFreed;
    }

    /// Whether `admiral` saw this object during the last awareness pass.
    pub fn is_visible_to(&self, admiral: AdmiralId) -> bool {
        self.seen_by_player_flags & admiral.flag() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(left: i32, top: i32, size: i32) -> Bounds {
        Bounds { left, top, right: left + size, bottom: top + size }
    }

    #[test]
    fn test_overlap_is_inclusive() {
        let a = square(0, 0, 10);
        assert!(a.overlaps(&square(10, 10, 5)));
        assert!(!a.overlaps(&square(11, 0, 5)));
    }

    #[test]
    fn test_uncomputed_bounds_overlap_nothing() {
        assert!(!Bounds::INVALID.overlaps(&Bounds::INVALID));
        assert!(!Bounds::INVALID.overlaps(&square(-5, -5, 10)));
        assert!(!square(-5, -5, 10).overlaps(&Bounds::INVALID));
    }
}
