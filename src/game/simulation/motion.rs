/// Motion integration.
///
/// For every sub-tick each live object turns, thrusts and integrates its
/// velocity, then the world boundary, self-animation and beam endpoints are
/// applied. All arithmetic is fixed point; positions only change through
/// [`step_motion`], which carries the sub-unit remainder in
/// `motion_fraction` so nothing drifts between peers.
///
/// The presentation pass runs once after all sub-ticks and only touches
/// sprite state; it cannot affect object behaviour.

use flotilla_macros::profile;

use crate::game::config::SimConfig;
use crate::game::fixed_math::{add_angle, angle_from_slope, rot_point, Fixed, FixedVec2, ROT_POS};

use super::arena::{ObjectArena, ObjectId};
use super::components::{Activity, Attributes, Presence, RuntimeFlags, SimObject, SpriteStyle};
use super::context::SimContext;
use super::error::SimError;

#[profile]
pub fn move_objects(ctx: &mut SimContext, units: i32) -> Result<(), SimError> {
    let SimContext { config, objects, .. } = ctx;

    for _ in 0..units {
        // Nothing in this pass spawns or frees, so the order is stable.
        for index in 0..objects.order().len() {
            let id = objects.order()[index];
            advance_object(objects, config, id)?;
        }
    }
    Ok(())
}

fn advance_object(objects: &mut ObjectArena, config: &SimConfig, id: ObjectId) -> Result<(), SimError> {
    let Some(object) = objects.get_mut(id) else {
        return Ok(());
    };
    if !object.is_in_use() {
        return Ok(());
    }

    if !object.max_velocity.is_zero() || object.attributes.contains(Attributes::CAN_TURN) {
        turn(object);
        apply_thrust(object);
        step_motion(object);
    }

    apply_world_bounds(object, config);

    if object.attributes.contains(Attributes::IS_SELF_ANIMATED) {
        animate(object);
    } else if object.attributes.contains(Attributes::IS_BEAM) {
        update_beam(objects, id)?;
    }
    Ok(())
}

fn turn(object: &mut SimObject) {
    if !object.attributes.contains(Attributes::CAN_TURN) {
        return;
    }
    object.turn_fraction += object.turn_velocity;
    let whole = object.turn_fraction.round_to_long();
    object.turn_fraction -= Fixed::from_long(whole);
    object.direction = (object.direction + whole).rem_euclid(ROT_POS);
}

fn apply_thrust(object: &mut SimObject) {
    if object.thrust.is_zero() {
        return;
    }

    let (delta, thrust) = if object.thrust > Fixed::ZERO {
        let speed = match object.presence {
            Presence::Warping { speed } | Presence::WarpOut { speed } => speed,
            Presence::Normal => object.max_velocity,
        };
        let goal = rot_point(object.direction) * speed;
        (goal - object.velocity, object.thrust)
    } else {
        (-object.velocity, -object.thrust)
    };

    // Each axis is limited on its own against the thrust vector pointing
    // along the requested change.
    let limit = rot_point(angle_from_slope(delta.x, delta.y)) * thrust;
    let clamped = FixedVec2::new(clamp_axis(delta.x, limit.x), clamp_axis(delta.y, limit.y));
    object.velocity = object.velocity + clamped;
}

fn clamp_axis(value: Fixed, limit: Fixed) -> Fixed {
    if limit.is_negative() {
        value.max(limit)
    } else {
        value.min(limit)
    }
}

/// Add velocity into the motion fraction and move by its whole part.
///
/// Locations move *against* velocity. The remainder left in the fraction is
/// always under one unit per axis.
pub(crate) fn step_motion(object: &mut SimObject) {
    object.motion_fraction = object.motion_fraction + object.velocity;

    let dx = object.motion_fraction.x.round_to_long();
    object.location.x = object.location.x.wrapping_sub(dx);
    object.motion_fraction.x -= Fixed::from_long(dx);

    let dy = object.motion_fraction.y.round_to_long();
    object.location.y = object.location.y.wrapping_sub(dy);
    object.motion_fraction.y -= Fixed::from_long(dy);
}

fn apply_world_bounds(object: &mut SimObject, config: &SimConfig) {
    let low = config.thinkiverse_top_left;
    let high = config.thinkiverse_bottom_right;

    if !object.attributes.contains(Attributes::DOES_BOUNCE) {
        let location = object.location;
        if location.x < low || location.y < low || location.x > high || location.y > high {
            object.activity = Activity::ToBeFreed;
        }
        return;
    }

    if object.location.x < low {
        object.location.x = low;
        object.velocity.x = -object.velocity.x;
    } else if object.location.x > high {
        object.location.x = high;
        object.velocity.x = -object.velocity.x;
    }
    if object.location.y < low {
        object.location.y = low;
        object.velocity.y = -object.velocity.y;
    } else if object.location.y > high {
        object.location.y = high;
        object.velocity.y = -object.velocity.y;
    }
}

fn animate(object: &mut SimObject) {
    let base = object.base.animation;
    if base.frame_speed.is_zero() {
        return;
    }

    let cyclic = object.attributes.contains(Attributes::ANIMATION_CYCLE);
    let span = base.last_shape - base.first_shape + Fixed::ONE;
    let animation = &mut object.animation;
    animation.this_shape += Fixed::from_bits(animation.frame_direction.wrapping_mul(animation.frame_speed.to_bits()));

    let mut running = true;
    while running && animation.frame_direction > 0 && animation.this_shape > base.last_shape {
        if cyclic && span > Fixed::ZERO {
            animation.this_shape -= span;
        } else {
            running = false;
            object.activity = Activity::ToBeFreed;
            animation.this_shape = base.last_shape;
        }
    }
    while running && animation.frame_direction < 0 && animation.this_shape < base.first_shape {
        if cyclic && span > Fixed::ZERO {
            animation.this_shape += span;
        } else {
            running = false;
            object.activity = Activity::ToBeFreed;
            animation.this_shape = base.last_shape;
        }
    }
}

/// Re-derive a beam's endpoints from the objects it is attached to.
fn update_beam(objects: &mut ObjectArena, id: ObjectId) -> Result<(), SimError> {
    let Some(object) = objects.get(id) else {
        return Ok(());
    };
    let beam = object.beam.ok_or(SimError::MissingBeam(id))?;

    let live_location = |target: ObjectId| {
        objects
            .get(target)
            .filter(|target| target.is_active())
            .map(|target| target.location)
    };

    let mut location = object.location;
    let mut last_global = beam.last_global_location;
    let mut stale = false;

    if beam.kind.is_object_to_object() {
        if let Some(to) = beam.to {
            match live_location(to) {
                Some(target) => location = target,
                None => stale = true,
            }
        }
        if let Some(from) = beam.from {
            match live_location(from) {
                Some(source) => last_global = source,
                None => stale = true,
            }
        }
    } else if beam.kind.is_object_to_relative() {
        if let Some(from) = beam.from {
            match live_location(from) {
                Some(source) => {
                    last_global = source;
                    location = source + beam.to_relative;
                }
                None => stale = true,
            }
        }
    }

    if let Some(object) = objects.get_mut(id) {
        object.location = location;
        if let Some(beam) = object.beam.as_mut() {
            beam.last_global_location = last_global;
        }
        if stale {
            object.activity = Activity::ToBeFreed;
        }
    }
    Ok(())
}

/// Per-tick sprite bookkeeping: hit flash, cloak fade and shape selection.
#[profile]
pub fn update_presentation(ctx: &mut SimContext, units: i32) {
    let step = units << ctx.config.presentation_step_shift;
    let cloak_max = ctx.config.cloak_on_state_max;
    let local_admiral = ctx.local_admiral;

    for index in 0..ctx.objects.order().len() {
        let id = ctx.objects.order()[index];
        let Some(object) = ctx.objects.get_mut(id) else {
            continue;
        };
        if !object.is_in_use() || object.attributes.contains(Attributes::IS_BEAM) {
            continue;
        }
        let Some(mut sprite) = object.sprite else {
            continue;
        };

        // The local admiral sees its own cloaked ships faintly.
        let own = local_admiral.is_some() && object.owner == local_admiral;
        let faded = |level: i32| if own { level - (level >> 2) } else { level };

        if object.hit_state != 0 {
            object.hit_state -= step;
            if object.hit_state <= 0 {
                object.hit_state = 0;
                sprite.style = SpriteStyle::Normal;
            } else {
                sprite.style = SpriteStyle::Shielded(object.hit_state);
            }
        } else if object.cloak_state > 0 {
            if object.cloak_state < cloak_max {
                object.runtime_flags.insert(RuntimeFlags::IS_CLOAKED);
                object.cloak_state = (object.cloak_state + step).min(cloak_max);
            }
            sprite.style = SpriteStyle::Cloaked(faded(object.cloak_state));
        } else if object.cloak_state < 0 {
            object.cloak_state += step;
            if object.cloak_state >= 0 {
                object.runtime_flags.remove(RuntimeFlags::IS_CLOAKED);
                object.cloak_state = 0;
                sprite.style = SpriteStyle::Normal;
            } else {
                sprite.style = SpriteStyle::Cloaked(faded(-object.cloak_state));
            }
        }

        if object.attributes.contains(Attributes::IS_SELF_ANIMATED) {
            if !object.base.animation.frame_speed.is_zero() {
                sprite.which_shape = object.animation.this_shape.floor_to_long();
            }
        } else if object.attributes.contains(Attributes::SHAPE_FROM_DIRECTION) {
            let resolution = object.base.rotation_resolution;
            if resolution > 0 {
                sprite.which_shape = add_angle(object.direction, resolution >> 1) / resolution;
            }
        }

        object.sprite = Some(sprite);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixed_math::Coord;
    use crate::game::simulation::components::{BaseAnimation, BaseObject, BeamKind, BeamState};
    use std::sync::Arc;

    fn mover(velocity: FixedVec2) -> SimObject {
        SimObject::new(Arc::new(BaseObject::default()), Coord::new(1000, 1000))
            .with_max_velocity(Fixed::ONE)
            .with_velocity(velocity)
    }

    #[test]
    fn test_step_motion_moves_against_velocity() {
        let mut object = mover(FixedVec2::new(Fixed::from_long(2), Fixed::from_bits(-384)));
        step_motion(&mut object);
        assert_eq!(object.location, Coord::new(998, 1001));
        assert_eq!(object.motion_fraction, FixedVec2::new(Fixed::ZERO, Fixed::from_bits(-128)));
    }

    #[test]
    fn test_fraction_accumulates_without_drift() {
        // A quarter unit per step adds up to exactly one unit every four steps.
        let mut object = mover(FixedVec2::new(Fixed::from_bits(64), Fixed::ZERO));
        for _ in 0..8 {
            step_motion(&mut object);
        }
        assert_eq!(object.location.x, 998);
        assert!(object.motion_fraction.x.to_bits().abs() < Fixed::SCALE);
    }

    #[test]
    fn test_turn_wraps_direction() {
        let mut object = mover(FixedVec2::ZERO).with_attributes(Attributes::CAN_TURN);
        object.direction = 359;
        object.turn_velocity = Fixed::from_long(3);
        turn(&mut object);
        assert_eq!(object.direction, 2);

        object.turn_velocity = Fixed::from_long(-5);
        turn(&mut object);
        assert_eq!(object.direction, 357);
    }

    #[test]
    fn test_thrust_is_limited_per_axis() {
        let mut object = mover(FixedVec2::ZERO);
        object.max_velocity = Fixed::from_long(4);
        object.thrust = Fixed::ONE;
        object.direction = 0;

        apply_thrust(&mut object);
        // Goal is (0, 4); the change is capped at one unit of thrust.
        assert_eq!(object.velocity, FixedVec2::new(Fixed::ZERO, Fixed::ONE));

        for _ in 0..10 {
            apply_thrust(&mut object);
        }
        assert_eq!(object.velocity, FixedVec2::new(Fixed::ZERO, Fixed::from_long(4)));
    }

    #[test]
    fn test_negative_thrust_brakes() {
        let mut object = mover(FixedVec2::new(Fixed::ZERO, Fixed::from_long(3)));
        object.thrust = -Fixed::ONE;
        apply_thrust(&mut object);
        assert_eq!(object.velocity, FixedVec2::new(Fixed::ZERO, Fixed::from_long(2)));
    }

    #[test]
    fn test_warping_uses_presence_speed() {
        let mut object = mover(FixedVec2::ZERO);
        object.thrust = Fixed::from_long(100);
        object.presence = Presence::Warping { speed: Fixed::from_long(10) };
        apply_thrust(&mut object);
        assert_eq!(object.velocity, FixedVec2::new(Fixed::ZERO, Fixed::from_long(10)));
    }

    #[test]
    fn test_non_cyclic_animation_overrun_marks_for_removal() {
        let base = BaseObject {
            animation: BaseAnimation {
                first_shape: Fixed::ZERO,
                last_shape: Fixed::from_long(3),
                frame_speed: Fixed::ONE,
            },
            ..Default::default()
        };
        let mut object = SimObject::new(Arc::new(base), Coord::default()).with_attributes(Attributes::IS_SELF_ANIMATED);
        object.animation.frame_direction = 1;
        object.animation.frame_speed = Fixed::from_long(2);
        object.animation.this_shape = Fixed::from_long(2);

        animate(&mut object);
        assert_eq!(object.activity, Activity::ToBeFreed);
        assert_eq!(object.animation.this_shape, Fixed::from_long(3));
    }

    #[test]
    fn test_cyclic_animation_wraps() {
        let base = BaseObject {
            animation: BaseAnimation {
                first_shape: Fixed::ZERO,
                last_shape: Fixed::from_long(3),
                frame_speed: Fixed::ONE,
            },
            ..Default::default()
        };
        let mut object = SimObject::new(Arc::new(base), Coord::default())
            .with_attributes(Attributes::IS_SELF_ANIMATED | Attributes::ANIMATION_CYCLE);
        object.animation.frame_direction = 1;
        object.animation.frame_speed = Fixed::from_long(2);
        object.animation.this_shape = Fixed::from_long(3);

        animate(&mut object);
        assert_eq!(object.activity, Activity::InUse);
        assert_eq!(object.animation.this_shape, Fixed::ONE);
    }

    #[test]
    fn test_beam_follows_its_endpoints() {
        let mut objects = ObjectArena::default();
        let base = Arc::new(BaseObject::default());
        let from = objects.spawn(SimObject::new(base.clone(), Coord::new(10, 20)));
        let to = objects.spawn(SimObject::new(base.clone(), Coord::new(50, 60)));
        let beam = objects.spawn(
            SimObject::new(base, Coord::default())
                .with_attributes(Attributes::IS_BEAM)
                .with_beam(BeamState {
                    kind: BeamKind::StaticObjectToObject,
                    from: Some(from),
                    to: Some(to),
                    ..Default::default()
                }),
        );

        update_beam(&mut objects, beam).expect("beam has data");
        let object = objects.get(beam).expect("beam is live");
        assert_eq!(object.location, Coord::new(50, 60));
        assert_eq!(object.beam.map(|b| b.last_global_location), Some(Coord::new(10, 20)));
        assert_eq!(object.activity, Activity::InUse);

        objects.free(to);
        update_beam(&mut objects, beam).expect("beam has data");
        assert_eq!(objects.get(beam).map(|o| o.activity), Some(Activity::ToBeFreed));
    }

    #[test]
    fn test_relative_beam_offsets_from_source() {
        let mut objects = ObjectArena::default();
        let base = Arc::new(BaseObject::default());
        let from = objects.spawn(SimObject::new(base.clone(), Coord::new(10, 20)));
        let beam = objects.spawn(
            SimObject::new(base, Coord::default())
                .with_attributes(Attributes::IS_BEAM)
                .with_beam(BeamState {
                    kind: BeamKind::BoltObjectToRelative,
                    from: Some(from),
                    to_relative: Coord::new(5, -5),
                    ..Default::default()
                }),
        );

        update_beam(&mut objects, beam).expect("beam has data");
        let object = objects.get(beam).expect("beam is live");
        assert_eq!(object.location, Coord::new(15, 15));
        assert_eq!(object.beam.map(|b| b.last_global_location), Some(Coord::new(10, 20)));
    }

    #[test]
    fn test_beam_without_data_is_fatal() {
        let mut objects = ObjectArena::default();
        let beam = objects.spawn(
            SimObject::new(Arc::new(BaseObject::default()), Coord::default()).with_attributes(Attributes::IS_BEAM),
        );
        assert_eq!(update_beam(&mut objects, beam), Err(SimError::MissingBeam(beam)));
    }
}
