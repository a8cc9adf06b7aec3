//! Deterministic fixed-point mathematics library.
//!
//! This module provides the scaled-integer types every position, velocity and
//! angle in the simulation is built from. All arithmetic is done on the raw
//! integer representation so that every peer in a lockstep game produces
//! bit-identical results, independent of platform float behaviour.

use fixed::types::I24F8;
use serde::{Deserialize, Serialize};

pub use rotation::{add_angle, angle_from_slope, rot_point, ROT_POS};
pub use scale::{Scale, SCALE_SCALE, SHIFT_SCALE};
pub use vec2::{Coord, FixedVec2};

mod rotation;
mod scale;
mod vec2;

#[cfg(test)]
mod tests;

/// Backing representation: 24 integer bits, 8 fractional bits.
pub type FixedBits = I24F8;

/// A fixed-point value holding `real_value * 256` in an `i32`.
///
/// Multiplication and division are defined explicitly on the raw bits
/// (shift after multiply, shift before divide) rather than delegated, so the
/// rounding behaviour is pinned down exactly:
///
/// - `a * b` is `(a * b) >> 8` on the widened product (rounds toward −∞)
/// - `a / b` is `(a << 8) / b` (truncates toward zero)
/// - [`Fixed::to_long`] rounds half away from zero
/// - [`Fixed::round_to_long`] is the motion-integration rounding and must not
///   be changed, since accumulated motion fractions depend on it
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fixed(FixedBits);

impl Fixed {
    pub const FRAC_BITS: u32 = 8;
    pub const SCALE: i32 = 1 << Self::FRAC_BITS;

    pub const ZERO: Self = Self::from_bits(0);
    pub const ONE: Self = Self::from_bits(Self::SCALE);
    pub const HALF: Self = Self::from_bits(Self::SCALE / 2);

    pub const fn from_bits(bits: i32) -> Self {
        Self(FixedBits::from_bits(bits))
    }

    pub const fn to_bits(self) -> i32 {
        self.0.to_bits()
    }

    /// Exact integer to fixed conversion.
    pub const fn from_long(value: i32) -> Self {
        Self::from_bits(value.wrapping_shl(Self::FRAC_BITS))
    }

    /// Fixed to integer conversion, rounding half away from zero.
    pub const fn to_long(self) -> i32 {
        let bits = self.to_bits();
        let half = Self::HALF.to_bits();
        if bits >= 0 {
            (bits + half) / Self::SCALE
        } else {
            (bits - half) / Self::SCALE
        }
    }

    /// Whole-unit part used by motion integration.
    ///
    /// Non-negative values shift `value + 0.5` down; negative values shift
    /// `value - 0.5` down and add one. Both branches use an arithmetic shift.
    pub const fn round_to_long(self) -> i32 {
        let bits = self.to_bits();
        let half = Self::HALF.to_bits();
        if bits >= 0 {
            (bits + half) >> Self::FRAC_BITS
        } else {
            ((bits - half) >> Self::FRAC_BITS) + 1
        }
    }

    /// Arithmetic shift to whole units (floor).
    pub const fn floor_to_long(self) -> i32 {
        self.to_bits() >> Self::FRAC_BITS
    }

    pub const fn is_zero(self) -> bool {
        self.to_bits() == 0
    }

    pub const fn is_negative(self) -> bool {
        self.to_bits() < 0
    }

    /// Half of the value, as an arithmetic shift of the raw bits.
    pub const fn halved(self) -> Self {
        Self::from_bits(self.to_bits() >> 1)
    }

    pub const fn abs(self) -> Self {
        Self::from_bits(self.to_bits().wrapping_abs())
    }

    /// `(self << 8) / rhs`. Callers must ensure `rhs` is non-zero.
    pub fn div_fixed(self, rhs: Self) -> Self {
        let wide = (i64::from(self.to_bits()) << Self::FRAC_BITS) / i64::from(rhs.to_bits());
        Self::from_bits(wide as i32)
    }
}

impl std::fmt::Debug for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::ops::Add for Fixed {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl std::ops::Sub for Fixed {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl std::ops::Mul for Fixed {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        let wide = (i64::from(self.to_bits()) * i64::from(rhs.to_bits())) >> Self::FRAC_BITS;
        Self::from_bits(wide as i32)
    }
}

impl std::ops::Neg for Fixed {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(self.0.wrapping_neg())
    }
}

impl std::ops::AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// Integer square root of a non-negative raw value.
pub fn isqrt(value: i64) -> i64 {
    if value <= 0 {
        0
    } else {
        (value as u64).isqrt() as i64
    }
}
