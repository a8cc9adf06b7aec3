use serde::{Deserialize, Serialize};

use super::Fixed;

pub const SHIFT_SCALE: u32 = 12;

/// The identity zoom factor.
pub const SCALE_SCALE: Scale = Scale { factor: 1 << SHIFT_SCALE };

/// A zoom factor applied uniformly to fixed or integer values.
///
/// `factor` is in units of `1 / 4096`, so [`SCALE_SCALE`] leaves values
/// unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scale {
    pub factor: i32,
}

impl Default for Scale {
    fn default() -> Self {
        SCALE_SCALE
    }
}

impl Scale {
    pub const fn new(factor: i32) -> Self {
        Self { factor }
    }

    /// Multiply then divide by [`SCALE_SCALE`] (truncates toward zero).
    pub fn scale_by(self, value: Fixed) -> Fixed {
        let wide = i64::from(value.to_bits()) * i64::from(self.factor);
        Fixed::from_bits((wide / i64::from(SCALE_SCALE.factor)) as i32)
    }

    /// Multiply then shift by [`SHIFT_SCALE`] (rounds toward −∞).
    pub fn evil_scale_by(self, value: Fixed) -> Fixed {
        let wide = i64::from(value.to_bits()) * i64::from(self.factor);
        Fixed::from_bits((wide >> SHIFT_SCALE) as i32)
    }

    /// Integer flavour of [`Scale::evil_scale_by`], used for sprite geometry.
    pub fn evil_scale_long(self, value: i32) -> i32 {
        ((i64::from(value) * i64::from(self.factor)) >> SHIFT_SCALE) as i32
    }
}
