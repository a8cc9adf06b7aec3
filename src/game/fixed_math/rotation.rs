//! Integer rotation table.
//!
//! Angles are whole degrees in `[0, ROT_POS)`. Angle 0 points toward −y in
//! world coordinates; the simulation subtracts velocities from locations, so
//! the unit vector for an angle is `(-sin, cos)`.

use super::{Fixed, FixedVec2};

/// Number of angle positions in a full turn.
pub const ROT_POS: i32 = 360;

/// `round(sin(deg) * 256)` for `deg` in `0..=90`.
const QUARTER_SINE: [i32; 91] = [
    0, 4, 9, 13, 18, 22, 27, 31, 36, 40, 44, 49, 53, 58, 62, 66, 71, 75, 79, 83, 88, 92, 96, 100,
    104, 108, 112, 116, 120, 124, 128, 132, 136, 139, 143, 147, 150, 154, 158, 161, 165, 168, 171,
    175, 178, 181, 184, 187, 190, 193, 196, 199, 202, 204, 207, 210, 212, 215, 217, 219, 222, 224,
    226, 228, 230, 232, 234, 236, 237, 239, 241, 242, 243, 245, 246, 247, 248, 249, 250, 251, 252,
    253, 254, 254, 255, 255, 255, 256, 256, 256, 256,
];

fn sine_bits(angle: i32) -> i32 {
    let angle = angle.rem_euclid(ROT_POS) as usize;
    match angle {
        0..=90 => QUARTER_SINE[angle],
        91..=180 => QUARTER_SINE[180 - angle],
        181..=270 => -QUARTER_SINE[angle - 180],
        _ => -QUARTER_SINE[360 - angle],
    }
}

/// Unit vector for `angle`, scaled to fixed point.
pub fn rot_point(angle: i32) -> FixedVec2 {
    FixedVec2::new(
        Fixed::from_bits(-sine_bits(angle)),
        Fixed::from_bits(sine_bits(angle + 90)),
    )
}

/// Add `delta` degrees to `angle`, wrapping once into `[0, ROT_POS)`.
pub fn add_angle(angle: i32, delta: i32) -> i32 {
    let sum = angle + delta;
    if sum >= ROT_POS {
        sum - ROT_POS
    } else {
        sum
    }
}

/// The table angle whose [`rot_point`] best matches the direction `(x, y)`.
///
/// A zero `x` component resolves to 0 or 180 depending on the sign of `y`.
pub fn angle_from_slope(x: Fixed, y: Fixed) -> i32 {
    if x.is_zero() {
        return if y.is_negative() { 180 } else { 0 };
    }

    // (x, y) is proportional to (-sin, cos).
    let sin = -i64::from(x.to_bits());
    let cos = i64::from(y.to_bits());
    let (abs_sin, abs_cos) = (sin.abs(), cos.abs());

    // Monotone in theta over the first quadrant: negative below the best
    // match, non-negative from it on.
    let balance = |theta: usize| {
        abs_cos * i64::from(QUARTER_SINE[theta]) - abs_sin * i64::from(QUARTER_SINE[90 - theta])
    };
    // balance(90) is never negative, so the search always lands in 0..=90.
    let (mut theta, mut hi) = (0usize, 90usize);
    while theta < hi {
        let mid = (theta + hi) / 2;
        if balance(mid) < 0 {
            theta = mid + 1;
        } else {
            hi = mid;
        }
    }
    if theta > 0 && -balance(theta - 1) < balance(theta) {
        theta -= 1;
    }
    let theta = theta as i32;

    match (sin >= 0, cos >= 0) {
        (true, true) => theta,
        (true, false) => 180 - theta,
        (false, false) => 180 + theta,
        (false, true) => (ROT_POS - theta) % ROT_POS,
    }
}
