/// Long-range awareness over the far grid.
///
/// Pairs of thinking objects owned by different admirals exchange
/// visibility, pick their closest potential target and accumulate local
/// friend/foe strength. The closing [`sweep`] frees everything marked for
/// removal and settles the per-admiral visibility masks.

use flotilla_macros::profile;

use crate::game::config::SimConfig;
use crate::game::fixed_math::Coord;
use crate::game::proximity::{Layer, CELL_COUNT};
use crate::profile_log;

use super::arena::{ObjectArena, ObjectId};
use super::components::{Attributes, RuntimeFlags, SimObject};
use super::context::SimContext;
use super::error::SimError;
use super::hooks::SimHooks;

#[profile]
pub fn update_awareness(ctx: &mut SimContext, hooks: &mut impl SimHooks) -> Result<(), SimError> {
    let bound = ctx.config.adjacency_delta_bound;

    for cell in 0..CELL_COUNT {
        let occupants = ctx.grid.bucket_ids(cell, Layer::Far);
        if occupants.is_empty() {
            continue;
        }
        let neighbours = ctx.grid.neighbours(cell, bound)?;

        for (position, &a) in occupants.iter().enumerate() {
            let Some(home) = ctx.objects.get(a).map(|object| object.distance_grid) else {
                continue;
            };

            for (k, neighbour) in neighbours.iter().enumerate() {
                let expected = home + neighbour.super_offset;
                if expected.x < 0 || expected.y < 0 {
                    continue;
                }

                let same_bucket = k == 0;
                let candidates: Vec<ObjectId> = if same_bucket {
                    ctx.grid.bucket_after(cell, Layer::Far, position).collect()
                } else {
                    ctx.grid.bucket_ids(neighbour.cell, Layer::Far)
                };

                for b in candidates {
                    relate(&mut ctx.objects, &*hooks, &ctx.config, a, b, expected, same_bucket);
                }
            }
        }
    }
    Ok(())
}

fn relate(
    objects: &mut ObjectArena,
    hooks: &impl SimHooks,
    config: &SimConfig,
    a: ObjectId,
    b: ObjectId,
    expected: Coord,
    same_bucket: bool,
) {
    let Some((first, second)) = objects.get_pair_mut(a, b) else {
        return;
    };
    if second.distance_grid != expected {
        return;
    }

    let rivals = first.owner != second.owner;
    let candidates = first.attributes.is_awareness_candidate() && second.attributes.is_awareness_candidate();

    if rivals && candidates {
        let distance = relevant_distance(first.location, second.location, config);

        if distance < config.max_relevant_distance_squared {
            first.seen_by_player_flags |= second.player_flag;
            second.seen_by_player_flags |= first.player_flag;

            if second.attributes.contains(Attributes::HIDE_EFFECT) {
                first.runtime_flags.insert(RuntimeFlags::IS_HIDDEN);
            }
            if first.attributes.contains(Attributes::HIDE_EFFECT) {
                second.runtime_flags.insert(RuntimeFlags::IS_HIDDEN);
            }
        }

        consider_target(hooks, first, second, b, distance);
        consider_target(hooks, second, first, a, distance);
        exchange_strength(first, second, true);
    } else if same_bucket {
        exchange_strength(first, second, rivals);
    }
}

/// Squared distance, saturated when either axis is out of relevance range.
fn relevant_distance(a: Coord, b: Coord, config: &SimConfig) -> u32 {
    let dx = (i64::from(b.x) - i64::from(a.x)).unsigned_abs();
    let dy = (i64::from(b.y) - i64::from(a.y)).unsigned_abs();
    let limit = u64::from(config.max_relevant_distance);
    if dx > limit || dy > limit {
        config.max_relevant_distance_squared
    } else {
        (dy * dy + dx * dx).min(u64::from(u32::MAX)) as u32
    }
}

/// Strictly closer potential targets replace the current one, so the first
/// candidate seen at a given distance keeps it.
fn consider_target(hooks: &impl SimHooks, object: &mut SimObject, other: &SimObject, other_id: ObjectId, distance: u32) {
    if hooks.engages(object, other)
        && distance < object.closest_distance
        && other.attributes.contains(Attributes::POTENTIAL_TARGET)
    {
        object.closest_distance = distance;
        object.closest_object = Some(other_id);
    }
}

/// Rivals add each other's friend strength to their foe strength and vice
/// versa; allies reinforce like with like. Both sides read the values from
/// before the exchange.
fn exchange_strength(first: &mut SimObject, second: &mut SimObject, rivals: bool) {
    let (first_friend, first_foe) = (first.local_friend_strength, first.local_foe_strength);
    let (second_friend, second_foe) = (second.local_friend_strength, second.local_foe_strength);

    if rivals {
        first.local_foe_strength += second_friend;
        first.local_friend_strength += second_foe;
        second.local_foe_strength += first_friend;
        second.local_friend_strength += first_foe;
    } else {
        first.local_friend_strength += second_friend;
        first.local_foe_strength += second_foe;
        second.local_friend_strength += first_friend;
        second.local_foe_strength += first_foe;
    }
}

/// Free marked objects and settle visibility for the rest.
///
/// Non-destination objects end the tick fully visible unless cloaked (seen
/// by nobody) or hidden (seen only by whoever saw them this tick), and are
/// always visible to their own admiral. Returns how many objects were freed.
#[profile]
pub fn sweep(ctx: &mut SimContext) -> usize {
    let freed = ctx.objects.free_marked();
    let local_flag = ctx.local_admiral.map(|admiral| admiral.flag());

    for index in 0..ctx.objects.order().len() {
        let id = ctx.objects.order()[index];
        let Some(object) = ctx.objects.get_mut(id) else {
            continue;
        };
        if !object.is_active() {
            continue;
        }

        if object.attributes.is_grid_eligible() && !object.attributes.contains(Attributes::IS_DESTINATION) {
            if object.runtime_flags.contains(RuntimeFlags::IS_CLOAKED) {
                object.seen_by_player_flags = 0;
            } else if !object.runtime_flags.contains(RuntimeFlags::IS_HIDDEN) {
                object.seen_by_player_flags = u32::MAX;
            }
            object.seen_by_player_flags |= object.player_flag;

            if let Some(flag) = local_flag {
                if object.seen_by_player_flags & flag == 0 {
                    if let Some(sprite) = object.sprite.as_mut() {
                        sprite.tiny_size = 0;
                    }
                }
            }
        }

        if object.attributes.contains(Attributes::IS_BEAM) {
            let location = object.location;
            if let Some(beam) = object.beam.as_mut() {
                beam.last_global_location = location;
            }
        }
    }

    profile_log!(ctx.tick, "[AWARENESS] freed {} objects, {} remain", freed, ctx.objects.len());
    freed
}
