use std::sync::Arc;

use flotilla::game::fixed_math::{Coord, Fixed};
use flotilla::game::simulation::{
    Activity, AdmiralId, Attributes, BaseObject, BeamKind, BeamState, EventLog, FrameGeometry, ObjectId,
    SimContext, SimObject,
};

/// Inside the world and 64 units into a near cell.
const ORIGIN: i32 = (1 << 30) + 64;

fn ship_base() -> Arc<BaseObject> {
    Arc::new(BaseObject {
        mass: Fixed::ONE,
        frames: vec![FrameGeometry::centered(10, 10)],
        ..Default::default()
    })
}

fn solid_ship(base: &Arc<BaseObject>, x: i32, y: i32, owner: u8) -> SimObject {
    SimObject::new(base.clone(), Coord::new(x, y))
        .with_attributes(Attributes::CAN_COLLIDE | Attributes::CAN_BE_HIT | Attributes::OCCUPIES_SPACE)
        .with_owner(AdmiralId(owner))
        .with_max_velocity(Fixed::ONE)
}

fn beam(from: Coord, to: Coord, owner: u8) -> SimObject {
    SimObject::new(Arc::new(BaseObject::default()), from)
        .with_attributes(Attributes::IS_BEAM | Attributes::CAN_COLLIDE)
        .with_owner(AdmiralId(owner))
        .with_beam(BeamState {
            kind: BeamKind::Kinetic,
            from: None,
            to: None,
            to_relative: Coord::default(),
            last_global_location: to,
        })
}

fn location(ctx: &SimContext, id: ObjectId) -> Coord {
    ctx.get(id).map(|object| object.location).expect("object is live")
}

#[test]
fn test_overlapping_rivals_hit_each_other_once_and_separate() {
    let mut ctx = SimContext::default();
    let base = ship_base();
    let a = ctx.spawn(solid_ship(&base, ORIGIN, ORIGIN, 0));
    let b = ctx.spawn(solid_ship(&base, ORIGIN, ORIGIN + 5, 1));

    let mut log = EventLog::default();
    ctx.advance(1, &mut log).expect("tick");

    // Newest first: b is the first object of the pair.
    assert_eq!(log.hits, vec![(b, a), (a, b)]);

    let (first, second) = (ctx.get(a).expect("a"), ctx.get(b).expect("b"));
    assert!(!first.absolute_bounds.overlaps(&second.absolute_bounds));
    assert_eq!(location(&ctx, a).x, ORIGIN);
    assert_eq!(location(&ctx, b).x, ORIGIN);
    assert!(location(&ctx, a).y < ORIGIN);
    assert!(location(&ctx, b).y > ORIGIN + 5);
}

#[test]
fn test_same_owner_never_collides() {
    let mut ctx = SimContext::default();
    let base = ship_base();
    let a = ctx.spawn(solid_ship(&base, ORIGIN, ORIGIN, 0));
    let b = ctx.spawn(solid_ship(&base, ORIGIN, ORIGIN + 5, 0));

    let mut log = EventLog::default();
    ctx.advance(1, &mut log).expect("tick");

    assert!(log.hits.is_empty());
    assert_eq!(location(&ctx, a), Coord::new(ORIGIN, ORIGIN));
    assert_eq!(location(&ctx, b), Coord::new(ORIGIN, ORIGIN + 5));
}

#[test]
fn test_hits_across_neighbouring_cells() {
    let mut ctx = SimContext::default();
    let base = ship_base();
    // 126 and 130 units past the cell origin straddle the near cell edge.
    let a = ctx.spawn(solid_ship(&base, ORIGIN + 62, ORIGIN, 0));
    let b = ctx.spawn(solid_ship(&base, ORIGIN + 66, ORIGIN, 1));
    assert_ne!(
        ctx.get(a).map(|o| o.location.x >> 7),
        ctx.get(b).map(|o| o.location.x >> 7)
    );

    let mut log = EventLog::default();
    ctx.advance(1, &mut log).expect("tick");

    assert_eq!(log.hits.len(), 2);
    assert!(log.hits.contains(&(a, b)));
    assert!(log.hits.contains(&(b, a)));
}

#[test]
fn test_spriteless_objects_never_touch() {
    let mut ctx = SimContext::default();
    let bare = Arc::new(BaseObject { mass: Fixed::ONE, ..Default::default() });
    let attributes = Attributes::CAN_COLLIDE | Attributes::CAN_BE_HIT | Attributes::OCCUPIES_SPACE;
    // Neighbouring near cells, 120 units apart.
    let a = ctx.spawn(
        SimObject::new(bare.clone(), Coord::new(ORIGIN + 62, ORIGIN))
            .with_attributes(attributes)
            .with_owner(AdmiralId(0)),
    );
    let b = ctx.spawn(
        SimObject::new(bare, Coord::new(ORIGIN + 182, ORIGIN))
            .with_attributes(attributes)
            .with_owner(AdmiralId(1)),
    );

    let mut log = EventLog::default();
    ctx.advance(1, &mut log).expect("tick");

    assert!(log.hits.is_empty());
    assert_eq!(location(&ctx, a), Coord::new(ORIGIN + 62, ORIGIN));
    assert_eq!(location(&ctx, b), Coord::new(ORIGIN + 182, ORIGIN));
}

#[test]
fn test_beam_crossing_target_hits() {
    let mut ctx = SimContext::default();
    let target = ctx.spawn(
        SimObject::new(ship_base(), Coord::new(ORIGIN, ORIGIN))
            .with_attributes(Attributes::CAN_BE_HIT)
            .with_owner(AdmiralId(1)),
    );
    let shot = ctx.spawn(beam(
        Coord::new(ORIGIN - 20, ORIGIN),
        Coord::new(ORIGIN + 20, ORIGIN),
        0,
    ));

    let mut log = EventLog::default();
    ctx.advance(1, &mut log).expect("tick");

    assert_eq!(log.hits, vec![(target, shot)]);
}

#[test]
fn test_beam_passing_below_target_misses() {
    let mut ctx = SimContext::default();
    ctx.spawn(
        SimObject::new(ship_base(), Coord::new(ORIGIN, ORIGIN))
            .with_attributes(Attributes::CAN_BE_HIT)
            .with_owner(AdmiralId(1)),
    );
    ctx.spawn(beam(
        Coord::new(ORIGIN - 20, ORIGIN + 50),
        Coord::new(ORIGIN + 20, ORIGIN + 50),
        0,
    ));

    let mut log = EventLog::default();
    ctx.advance(1, &mut log).expect("tick");

    assert!(log.hits.is_empty());
}

#[test]
fn test_dying_beam_does_not_hit_and_is_freed() {
    let mut ctx = SimContext::default();
    ctx.spawn(
        SimObject::new(ship_base(), Coord::new(ORIGIN, ORIGIN))
            .with_attributes(Attributes::CAN_BE_HIT)
            .with_owner(AdmiralId(1)),
    );
    let mut dying = beam(Coord::new(ORIGIN - 20, ORIGIN), Coord::new(ORIGIN + 20, ORIGIN), 0);
    dying.activity = Activity::ToBeFreed;
    let shot = ctx.spawn(dying);

    let mut log = EventLog::default();
    ctx.advance(1, &mut log).expect("tick");

    assert!(log.hits.is_empty());
    assert!(ctx.get(shot).is_none());
}

#[test]
fn test_missing_frame_is_an_error() {
    let mut ctx = SimContext::default();
    let base = ship_base();
    let mut broken = solid_ship(&base, ORIGIN, ORIGIN, 0);
    if let Some(sprite) = broken.sprite.as_mut() {
        sprite.which_shape = 3;
    }
    ctx.spawn(broken);

    assert!(ctx.advance(1, &mut EventLog::default()).is_err());
}
