/// Snapshots of simulation state for desync detection and replays.
///
/// A snapshot keeps the deterministic state of every live object in
/// processing order. Two peers that ran the same ticks produce equal
/// snapshots, so comparing [`SimSnapshot::checksum`] values each tick is
/// enough to detect a desync. Snapshots are stored as zlib-compressed bincode.

use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::fixed_math::{Coord, Fixed, FixedVec2};
use crate::game::simulation::{
    Activity, AdmiralId, AnimationState, Attributes, BeamState, Bounds, ObjectId, Presence, RuntimeFlags,
    SimContext, SimObject, SpriteState,
};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("snapshot version {found} is not supported (expected {SNAPSHOT_VERSION})")]
    Version { found: u32 },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub activity: Activity,
    pub attributes: Attributes,
    pub runtime_flags: RuntimeFlags,
    pub location: Coord,
    pub velocity: FixedVec2,
    pub motion_fraction: FixedVec2,
    pub direction: i32,
    pub turn_fraction: Fixed,
    pub presence: Presence,
    pub owner: Option<AdmiralId>,
    pub absolute_bounds: Bounds,
    pub closest_object: Option<ObjectId>,
    pub closest_distance: u32,
    pub local_friend_strength: Fixed,
    pub local_foe_strength: Fixed,
    pub seen_by_player_flags: u32,
    pub age: i32,
    pub periodic_time: i32,
    pub hit_state: i32,
    pub cloak_state: i32,
    pub sprite: Option<SpriteState>,
    pub animation: AnimationState,
    pub beam: Option<BeamState>,
}

impl ObjectSnapshot {
    fn capture(id: ObjectId, object: &SimObject) -> Self {
        Self {
            id,
            activity: object.activity,
            attributes: object.attributes,
            runtime_flags: object.runtime_flags,
            location: object.location,
            velocity: object.velocity,
            motion_fraction: object.motion_fraction,
            direction: object.direction,
            turn_fraction: object.turn_fraction,
            presence: object.presence,
            owner: object.owner,
            absolute_bounds: object.absolute_bounds,
            closest_object: object.closest_object,
            closest_distance: object.closest_distance,
            local_friend_strength: object.local_friend_strength,
            local_foe_strength: object.local_foe_strength,
            seen_by_player_flags: object.seen_by_player_flags,
            age: object.age,
            periodic_time: object.periodic_time,
            hit_state: object.hit_state,
            cloak_state: object.cloak_state,
            sprite: object.sprite,
            animation: object.animation,
            beam: object.beam,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SimSnapshot {
    pub version: u32,
    pub tick: u64,
    pub closest: Option<ObjectId>,
    pub farthest: Option<ObjectId>,
    pub objects: Vec<ObjectSnapshot>,
}

impl SimSnapshot {
    pub fn capture(ctx: &SimContext) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            tick: ctx.tick.0,
            closest: ctx.closest(),
            farthest: ctx.farthest(),
            objects: ctx
                .objects
                .iter()
                .map(|(id, object)| ObjectSnapshot::capture(id, object))
                .collect(),
        }
    }

    pub fn checksum(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        let mut encoder = ZlibEncoder::new(writer, Compression::default());
        bincode::serialize_into(&mut encoder, self)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut decoder = ZlibDecoder::new(reader);
        let snapshot: SimSnapshot = bincode::deserialize_from(&mut decoder)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version { found: snapshot.version });
        }
        Ok(snapshot)
    }
}
