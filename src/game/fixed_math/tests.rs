use super::*;

#[test]
fn test_from_long_is_exact() {
    assert_eq!(Fixed::from_long(3).to_bits(), 768);
    assert_eq!(Fixed::from_long(-2).to_bits(), -512);
}

#[test]
fn test_to_long_rounds_half_away_from_zero() {
    assert_eq!(Fixed::from_bits(128).to_long(), 1);
    assert_eq!(Fixed::from_bits(127).to_long(), 0);
    assert_eq!(Fixed::from_bits(-128).to_long(), -1);
    assert_eq!(Fixed::from_bits(-127).to_long(), 0);
    assert_eq!(Fixed::from_bits(-384).to_long(), -2);
}

#[test]
fn test_round_to_long_matches_motion_rounding() {
    assert_eq!(Fixed::from_bits(128).round_to_long(), 1);
    assert_eq!(Fixed::from_bits(383).round_to_long(), 1);
    assert_eq!(Fixed::from_bits(384).round_to_long(), 2);
    assert_eq!(Fixed::from_bits(-128).round_to_long(), 0);
    assert_eq!(Fixed::from_bits(-129).round_to_long(), -1);
    assert_eq!(Fixed::from_bits(-384).round_to_long(), -1);
    assert_eq!(Fixed::from_bits(-385).round_to_long(), -2);
}

#[test]
fn test_round_to_long_remainder_is_below_one_unit() {
    for bits in -2048..2048 {
        let value = Fixed::from_bits(bits);
        let whole = value.round_to_long();
        let remainder = value - Fixed::from_long(whole);
        assert!(
            remainder.to_bits().abs() < Fixed::SCALE,
            "remainder of {} was {}",
            bits,
            remainder.to_bits()
        );
    }
}

#[test]
fn test_multiply_shifts_the_product() {
    let a = Fixed::from_bits(384); // 1.5
    let b = Fixed::from_bits(512); // 2.0
    assert_eq!((a * b).to_bits(), 768);

    // Rounds toward negative infinity.
    let tiny = Fixed::from_bits(-1);
    assert_eq!((tiny * Fixed::HALF).to_bits(), -1);
}

#[test]
fn test_divide_scales_the_dividend() {
    let a = Fixed::from_long(3);
    let b = Fixed::from_long(2);
    assert_eq!(a.div_fixed(b).to_bits(), 384);

    let c = Fixed::from_long(-1);
    let d = Fixed::from_long(3);
    assert_eq!(c.div_fixed(d).to_bits(), -85);
}

#[test]
fn test_scale_by_identity_and_half() {
    let value = Fixed::from_long(10);
    assert_eq!(SCALE_SCALE.scale_by(value), value);
    assert_eq!(Scale::new(2048).evil_scale_by(value), Fixed::from_long(5));
    assert_eq!(SCALE_SCALE.evil_scale_long(10), 10);
    assert_eq!(Scale::new(2048).evil_scale_long(-3), -2);
    assert_eq!(Scale::new(2048).scale_by(Fixed::from_bits(-3)).to_bits(), -1);
}

#[test]
fn test_rot_point_cardinal_directions() {
    assert_eq!(rot_point(0), FixedVec2::new(Fixed::ZERO, Fixed::ONE));
    assert_eq!(rot_point(90), FixedVec2::new(-Fixed::ONE, Fixed::ZERO));
    assert_eq!(rot_point(180), FixedVec2::new(Fixed::ZERO, -Fixed::ONE));
    assert_eq!(rot_point(270), FixedVec2::new(Fixed::ONE, Fixed::ZERO));
}

#[test]
fn test_angle_from_slope_inverts_rot_point() {
    for angle in 0..ROT_POS {
        let point = rot_point(angle);
        assert_eq!(angle_from_slope(point.x, point.y), angle, "angle {}", angle);
    }
}

#[test]
fn test_angle_from_slope_zero_x() {
    assert_eq!(angle_from_slope(Fixed::ZERO, Fixed::from_long(5)), 0);
    assert_eq!(angle_from_slope(Fixed::ZERO, Fixed::ZERO), 0);
    assert_eq!(angle_from_slope(Fixed::ZERO, Fixed::from_long(-5)), 180);
}

#[test]
fn test_add_angle_wraps_once() {
    assert_eq!(add_angle(200, 180), 20);
    assert_eq!(add_angle(10, 180), 190);
}

#[test]
fn test_isqrt() {
    assert_eq!(isqrt(0), 0);
    assert_eq!(isqrt(-5), 0);
    assert_eq!(isqrt(65536), 256);
    assert_eq!(isqrt(65535), 255);
}
