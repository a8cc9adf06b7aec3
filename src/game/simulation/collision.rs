/// Collision detection.
///
/// Runs after motion every tick in three steps:
///
/// 1. **Prepare**: per-object countdowns (age, periodic activation), distance
///    from the viewpoint, and reset of the per-tick awareness fields.
/// 2. **Rebuild**: every grid-eligible object is placed into the near and far
///    buckets of the [`ProximityGrid`](crate::game::proximity::ProximityGrid).
/// 3. **Near phase**: each near bucket is paired with itself and its four
///    forward neighbours. Overlapping boxes dispatch hits; beams are clipped
///    against their target's box; solid objects are pushed apart by the
///    [separation resolver](super::separation).
///
/// Collaborators hear about hits, expiries and activations through
/// [`SimHooks`] while the pass is running, so every hook call re-reads the
/// objects it touches afterwards.

use bevy::log::debug;
use flotilla_macros::profile;
use rand::Rng;

use crate::game::fixed_math::{Coord, Fixed};
use crate::game::proximity::{placement, Layer, CELL_COUNT};
use crate::profile_log;

use super::arena::{ObjectArena, ObjectId};
use super::components::{clip, Activity, Attributes, Bounds, RuntimeFlags};
use super::context::SimContext;
use super::error::SimError;
use super::hooks::SimHooks;
use super::separation::correct_physical_space;

/// Initial value of `seen_by_player_flags` for non-destination objects.
pub const UNSEEN_FLAGS: u32 = 0x8000_0000;

/// A clip pass moves one endpoint onto one edge; this is enough for both
/// endpoints to reach every edge.
const MAX_CLIP_STEPS: usize = 8;

#[profile]
pub fn collide_objects(ctx: &mut SimContext, hooks: &mut impl SimHooks) -> Result<(), SimError> {
    prepare_objects(ctx, hooks);
    near_phase(ctx, hooks)
}

/// Countdowns, viewpoint distances and the grid rebuild.
fn prepare_objects(ctx: &mut SimContext, hooks: &mut impl SimHooks) {
    let SimContext { config, objects, grid, viewpoint, closest, farthest, .. } = ctx;

    let viewer = viewpoint.and_then(|id| {
        objects
            .get(id)
            .filter(|object| object.is_active())
            .map(|object| (id, object.location, object.owner))
    });
    let mut closest_distance = u64::MAX;
    let mut farthest_distance = 0u64;
    *closest = None;
    *farthest = None;

    grid.clear();

    let order = objects.order().to_vec();
    for id in order {
        let Some(object) = objects.get_mut(id) else {
            continue;
        };

        if object.activity == Activity::Available {
            if viewer.is_some() {
                object.distance_from_player = u64::MAX;
            }
            continue;
        }

        if object.age >= 0 {
            object.age -= config.age_decrement;
            if object.age < 0 {
                if !object.base.expire_dont_die {
                    object.activity = Activity::ToBeFreed;
                }
                hooks.expire(objects, id);
                if !objects.get(id).is_some_and(|object| object.is_active()) {
                    continue;
                }
            }
        }

        let Some(object) = objects.get_mut(id) else {
            continue;
        };
        if object.periodic_time > 0 {
            object.periodic_time -= 1;
            if object.periodic_time <= 0 {
                hooks.activate(objects, id);
                let Some(object) = objects.get_mut(id) else {
                    continue;
                };
                let range = object.base.activate_period_range;
                let jitter = if range > 0 { object.rng.random_range(0..range) } else { 0 };
                object.periodic_time = object.base.activate_period + jitter;
                if !object.is_active() {
                    continue;
                }
            }
        }

        let Some(object) = objects.get_mut(id) else {
            continue;
        };

        if let Some((viewer_id, viewer_location, viewer_owner)) = viewer {
            if object.attributes.contains(Attributes::APPEAR_ON_RADAR) {
                let distance = squared_distance(viewer_location, object.location);
                object.distance_from_player = distance;
                if closest_distance > distance
                    && id != viewer_id
                    && (!config.nearest_foe_zoom || object.owner != viewer_owner)
                {
                    closest_distance = distance;
                    *closest = Some(id);
                }
                if distance > farthest_distance {
                    farthest_distance = distance;
                    *farthest = Some(id);
                }
            }
        }

        if object.attributes.is_grid_eligible() {
            object.local_friend_strength = object.base.offense_value;
            object.local_foe_strength = Fixed::ZERO;
            object.closest_object = None;
            object.closest_distance = config.max_relevant_distance_squared;
            object.absolute_bounds = Bounds::INVALID;

            let place = placement(object.location, config);
            object.collision_grid = place.collision_grid;
            object.distance_grid = place.distance_grid;
            grid.insert(id, &place);

            if !object.attributes.contains(Attributes::IS_DESTINATION) {
                object.seen_by_player_flags = UNSEEN_FLAGS;
            }
            object.runtime_flags.remove(RuntimeFlags::IS_HIDDEN);
            let tiny_size = object.base.tiny_size;
            if let Some(sprite) = object.sprite.as_mut() {
                sprite.tiny_size = tiny_size;
            }
        }
    }

    profile_log!(
        ctx.tick,
        "[COLLISION] near entries {} in {} cells",
        ctx.grid.total_entries(Layer::Near),
        ctx.grid.non_empty_cells(Layer::Near)
    );
}

/// Saturating squared distance between two locations.
fn squared_distance(a: Coord, b: Coord) -> u64 {
    let dx = (i64::from(a.x) - i64::from(b.x)).unsigned_abs();
    let dy = (i64::from(a.y) - i64::from(b.y)).unsigned_abs();
    dy.saturating_mul(dy).saturating_add(dx.saturating_mul(dx))
}

fn near_phase(ctx: &mut SimContext, hooks: &mut impl SimHooks) -> Result<(), SimError> {
    let bound = ctx.config.adjacency_delta_bound;
    let step_limit = ctx.config.separation_step_limit;

    for cell in 0..CELL_COUNT {
        let occupants = ctx.grid.bucket_ids(cell, Layer::Near);
        if occupants.is_empty() {
            continue;
        }
        let neighbours = ctx.grid.neighbours(cell, bound)?;

        for (position, &a) in occupants.iter().enumerate() {
            ensure_bounds(&mut ctx.objects, a)?;

            for (k, neighbour) in neighbours.iter().enumerate() {
                let Some(home) = ctx.objects.get(a).map(|object| object.collision_grid) else {
                    break;
                };
                let expected = home + neighbour.super_offset;
                if expected.x < 0 || expected.y < 0 {
                    continue;
                }

                let candidates: Vec<ObjectId> = if k == 0 {
                    ctx.grid.bucket_after(cell, Layer::Near, position).collect()
                } else {
                    ctx.grid.bucket_ids(neighbour.cell, Layer::Near)
                };

                for b in candidates {
                    check_pair(&mut ctx.objects, hooks, a, b, expected, step_limit)?;
                }
            }
        }
    }
    Ok(())
}

/// Compute an object's box from its current sprite frame, unless it already
/// has one this tick. Objects without a sprite keep an empty box.
fn ensure_bounds(objects: &mut ObjectArena, id: ObjectId) -> Result<(), SimError> {
    let Some(object) = objects.get_mut(id) else {
        return Ok(());
    };
    if object.absolute_bounds.is_computed() {
        return Ok(());
    }
    let Some(sprite) = object.sprite else {
        return Ok(());
    };

    let frame = usize::try_from(sprite.which_shape)
        .ok()
        .and_then(|shape| object.base.frames.get(shape))
        .copied()
        .ok_or(SimError::MissingFrame { object: id, shape: sprite.which_shape })?;

    let scale = object.natural_scale;
    let width = scale.evil_scale_long(frame.width);
    let height = scale.evil_scale_long(frame.height);
    let left = object.location.x - scale.evil_scale_long(frame.center.x);
    let top = object.location.y - scale.evil_scale_long(frame.center.y);

    object.absolute_bounds = Bounds {
        left,
        top,
        right: left + width,
        bottom: top + height,
    };
    Ok(())
}

fn check_pair(
    objects: &mut ObjectArena,
    hooks: &mut impl SimHooks,
    a: ObjectId,
    b: ObjectId,
    expected: Coord,
    step_limit: u32,
) -> Result<(), SimError> {
    let (Some(first), Some(second)) = (objects.get(a), objects.get(b)) else {
        return Ok(());
    };
    let either = first.attributes | second.attributes;
    if !either.contains(Attributes::CAN_COLLIDE)
        || !either.contains(Attributes::CAN_BE_HIT)
        || second.collision_grid != expected
    {
        return Ok(());
    }

    ensure_bounds(objects, b)?;

    let (Some(first), Some(second)) = (objects.get(a), objects.get(b)) else {
        return Ok(());
    };
    if first.owner == second.owner {
        return Ok(());
    }

    if !either.contains(Attributes::IS_BEAM) {
        if first.absolute_bounds.overlaps(&second.absolute_bounds) {
            if can_hit(objects, a, b) {
                hooks.notify_hit(objects, a, b);
            }
            if can_hit(objects, b, a) {
                hooks.notify_hit(objects, b, a);
            }
        }
    } else {
        let (source, target) = if second.attributes.contains(Attributes::IS_BEAM) { (b, a) } else { (a, b) };
        if beam_hits(objects, source, target)? {
            debug!("[COLLISION] beam {:?} hit {:?}", source, target);
            hooks.notify_hit(objects, target, source);
        }
    }

    // The hit may have changed ownership or attributes.
    let (Some(first), Some(second)) = (objects.get(a), objects.get(b)) else {
        return Ok(());
    };
    let both = first.attributes & second.attributes;
    if !both.contains(Attributes::OCCUPIES_SPACE) || first.owner == second.owner {
        return Ok(());
    }
    if first.absolute_bounds.overlaps(&second.absolute_bounds) {
        correct_physical_space(objects, a, b, step_limit);
    }
    Ok(())
}

fn can_hit(objects: &ObjectArena, target: ObjectId, aggressor: ObjectId) -> bool {
    let (Some(target), Some(aggressor)) = (objects.get(target), objects.get(aggressor)) else {
        return false;
    };
    target.attributes.contains(Attributes::CAN_BE_HIT) && aggressor.attributes.contains(Attributes::CAN_COLLIDE)
}

fn beam_hits(objects: &ObjectArena, source: ObjectId, target: ObjectId) -> Result<bool, SimError> {
    let (Some(beam_object), Some(target_object)) = (objects.get(source), objects.get(target)) else {
        return Ok(false);
    };
    let beam = beam_object.beam.ok_or(SimError::MissingBeam(source))?;
    if beam_object.activity == Activity::ToBeFreed {
        return Ok(false);
    }
    Ok(segment_hits_box(
        beam_object.location,
        beam.last_global_location,
        &target_object.absolute_bounds,
    ))
}

/// Outcode clipping of the segment `start..end` against `bounds`.
///
/// Returns true once both endpoints lie inside the box (right and bottom
/// edges exclusive), false as soon as both share an outside region.
pub fn segment_hits_box(start: Coord, end: Coord, bounds: &Bounds) -> bool {
    let (mut xs, mut ys) = (i64::from(start.x), i64::from(start.y));
    let (mut xe, mut ye) = (i64::from(end.x), i64::from(end.y));
    let mut cs = bounds.clip_code(xs, ys);
    let mut ce = bounds.clip_code(xe, ye);

    for _ in 0..MAX_CLIP_STEPS {
        if cs | ce == 0 {
            return true;
        }
        if cs & ce != 0 {
            return false;
        }
        let xd = xe - xs;
        let yd = ye - ys;
        if cs != 0 {
            let Some((x, y)) = clip_endpoint(cs, xs, ys, xd, yd, bounds) else {
                return false;
            };
            (xs, ys) = (x, y);
            cs = bounds.clip_code(xs, ys);
        } else {
            let Some((x, y)) = clip_endpoint(ce, xe, ye, xd, yd, bounds) else {
                return false;
            };
            (xe, ye) = (x, y);
            ce = bounds.clip_code(xe, ye);
        }
    }
    cs | ce == 0
}

/// Slide an outside endpoint along the segment onto the edge its outcode
/// names first (left, right, top, bottom).
fn clip_endpoint(code: u8, x: i64, y: i64, xd: i64, yd: i64, bounds: &Bounds) -> Option<(i64, i64)> {
    let left = i64::from(bounds.left);
    let right = i64::from(bounds.right) - 1;
    let top = i64::from(bounds.top);
    let bottom = i64::from(bounds.bottom) - 1;

    if code & clip::LEFT != 0 {
        Some((left, y + (yd * (left - x)).checked_div(xd)?))
    } else if code & clip::RIGHT != 0 {
        Some((right, y + (yd * (right - x)).checked_div(xd)?))
    } else if code & clip::TOP != 0 {
        Some((x + (xd * (top - y)).checked_div(yd)?, top))
    } else if code & clip::BOTTOM != 0 {
        Some((x + (xd * (bottom - y)).checked_div(yd)?, bottom))
    } else {
        Some((x, y))
    }
}
