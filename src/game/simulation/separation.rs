/// Physical separation of overlapping solid objects.
///
/// When two space-occupying objects of different owners overlap, both get a
/// new velocity pointing away from each other and are stepped back one
/// rounded motion step at a time until their boxes no longer touch. This is
/// a discrete stepper, not a solver: it uses the same rounding as motion
/// integration so every peer ends at the same positions.

use bevy::log::warn;

use crate::game::fixed_math::{add_angle, angle_from_slope, isqrt, rot_point, Fixed};

use super::arena::{ObjectArena, ObjectId};
use super::components::SimObject;
use super::motion::step_motion;

/// Push `a` and `b` apart. Returns the number of steps taken.
///
/// `a` moves along the bearing from `b` to `a`, `b` along the opposite
/// bearing. Each speed is the partner's mass share of the relative impact
/// speed plus half the object's own max velocity. If neither ends up moving the
/// objects are left where they are.
pub fn correct_physical_space(objects: &mut ObjectArena, a: ObjectId, b: ObjectId, step_limit: u32) -> u32 {
    let Some((first, second)) = objects.get_pair_mut(a, b) else {
        return 0;
    };

    let impact = second.velocity - first.velocity;
    let force = Fixed::from_bits(isqrt(impact.raw_length_squared()).min(i64::from(i32::MAX)) as i32);

    // Only the ratio of the offset matters, so whole units go in as raw bits.
    let offset = second.location - first.location;
    let angle = angle_from_slope(Fixed::from_bits(offset.x), Fixed::from_bits(offset.y));

    let (first_mass, second_mass) = (first.base.mass, second.base.mass);
    let total_mass = first_mass + second_mass;
    // Each object takes its partner's share of the impact.
    let speed = |object: &SimObject, partner_mass: Fixed| {
        let share = if total_mass.is_zero() {
            Fixed::from_bits(-1)
        } else {
            (partner_mass * force).div_fixed(total_mass)
        };
        share + object.max_velocity.halved()
    };

    first.velocity = rot_point(angle) * speed(first, second_mass);
    second.velocity = rot_point(add_angle(angle, 180)) * speed(second, first_mass);

    if first.velocity.is_zero() && second.velocity.is_zero() {
        return 0;
    }

    let mut steps = 0;
    while first.absolute_bounds.overlaps(&second.absolute_bounds) {
        if steps >= step_limit {
            warn!(
                "[SEPARATION] {:?} and {:?} still overlap after {} steps; giving up",
                a, b, steps
            );
            break;
        }
        step_apart(first);
        step_apart(second);
        steps += 1;
    }
    steps
}

fn step_apart(object: &mut SimObject) {
    let before = object.location;
    step_motion(object);
    let moved = object.location - before;
    object.absolute_bounds = object.absolute_bounds.translated(moved.x, moved.y);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixed_math::{Coord, FixedVec2};
    use crate::game::simulation::components::{BaseObject, Bounds};
    use std::sync::Arc;

    fn boxed(location: Coord, max_velocity: Fixed, mass: Fixed) -> SimObject {
        let base = BaseObject { mass, ..Default::default() };
        let mut object = SimObject::new(Arc::new(base), location).with_max_velocity(max_velocity);
        object.absolute_bounds = Bounds {
            left: location.x - 5,
            top: location.y - 5,
            right: location.x + 5,
            bottom: location.y + 5,
        };
        object
    }

    #[test]
    fn test_zero_velocity_returns_immediately() {
        let mut objects = ObjectArena::default();
        // Equal masses and no impact or max velocity: both speeds are zero.
        let a = objects.spawn(boxed(Coord::new(1000, 1000), Fixed::ZERO, Fixed::ONE));
        let b = objects.spawn(boxed(Coord::new(1000, 1005), Fixed::ZERO, Fixed::ONE));

        assert_eq!(correct_physical_space(&mut objects, a, b, 1000), 0);
        assert_eq!(objects.get(a).map(|o| o.location), Some(Coord::new(1000, 1000)));
        assert_eq!(objects.get(b).map(|o| o.location), Some(Coord::new(1000, 1005)));
    }

    #[test]
    fn test_pushes_apart_along_bearing() {
        let mut objects = ObjectArena::default();
        let a = objects.spawn(boxed(Coord::new(1000, 1000), Fixed::ONE, Fixed::ONE));
        let b = objects.spawn(boxed(Coord::new(1000, 1005), Fixed::ONE, Fixed::ONE));

        let steps = correct_physical_space(&mut objects, a, b, 1000);
        assert!(steps > 0);

        let (first, second) = (objects.get(a).expect("a"), objects.get(b).expect("b"));
        assert!(!first.absolute_bounds.overlaps(&second.absolute_bounds));
        assert_eq!(first.location.x, 1000);
        assert_eq!(second.location.x, 1000);
        assert!(first.location.y < 1000);
        assert!(second.location.y > 1005);
        // Boxes moved with their objects.
        assert_eq!(first.absolute_bounds.top, first.location.y - 5);
        assert_eq!(second.absolute_bounds.top, second.location.y - 5);
    }

    #[test]
    fn test_zero_total_mass_uses_sentinel() {
        let mut objects = ObjectArena::default();
        let a = objects.spawn(boxed(Coord::new(0, 0), Fixed::ZERO, Fixed::ZERO));
        let b = objects.spawn(boxed(Coord::new(0, 5), Fixed::ZERO, Fixed::ZERO));

        correct_physical_space(&mut objects, a, b, 1);
        let velocity = objects.get(a).map(|o| o.velocity);
        // rot_point(0) * -1 raw.
        assert_eq!(velocity, Some(FixedVec2::new(Fixed::ZERO, Fixed::from_bits(-1))));
    }

    #[test]
    fn test_lighter_object_is_thrown_harder() {
        let mut objects = ObjectArena::default();
        let heavy = objects.spawn(boxed(Coord::new(0, 0), Fixed::ZERO, Fixed::from_long(3)));
        let mut light = boxed(Coord::new(0, 5), Fixed::ZERO, Fixed::ONE);
        light.velocity = FixedVec2::new(Fixed::ZERO, Fixed::from_long(4));
        let light = objects.spawn(light);

        correct_physical_space(&mut objects, heavy, light, 0);

        // Impact of 4 split 1:3 against the masses.
        assert_eq!(
            objects.get(heavy).map(|o| o.velocity),
            Some(FixedVec2::new(Fixed::ZERO, Fixed::ONE))
        );
        assert_eq!(
            objects.get(light).map(|o| o.velocity),
            Some(FixedVec2::new(Fixed::ZERO, -Fixed::from_long(3)))
        );
    }

    #[test]
    fn test_step_limit_stops_the_loop() {
        let mut objects = ObjectArena::default();
        let a = objects.spawn(boxed(Coord::new(0, 0), Fixed::ONE, Fixed::ONE));
        let b = objects.spawn(boxed(Coord::new(0, 5), Fixed::ONE, Fixed::ONE));
        assert_eq!(correct_physical_space(&mut objects, a, b, 2), 2);
    }
}
