//! Q1.15 fixed point and the filter's register value types.

use core::fmt;

use super::registers::{CONTROL_CLEAR, CONTROL_ENABLE};

/// Scale between a Q1.15 value and its integer representation (2^15).
pub const Q15_SCALE: f32 = 32_768.0;

/// Smallest representable Q1.15 step (2^-15).
pub const Q15_EPSILON: f32 = 1.0 / Q15_SCALE;

/// Signed Q1.15 fixed-point number: 1 sign bit, 15 fractional bits.
///
/// Range is `[-1.0, 1.0 - 2^-15]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Q15(i16);

impl Q15 {
    /// 0.0
    pub const ZERO: Self = Self(0);

    /// Wrap raw Q1.15 bits.
    pub const fn from_bits(bits: i16) -> Self {
        Self(bits)
    }

    /// Raw Q1.15 bits.
    pub const fn to_bits(self) -> i16 {
        self.0
    }

    /// Convert by scaling by 2^15 and truncating toward zero.
    ///
    /// This is the conversion the filter block's reference software uses, so
    /// results match it bit for bit. It is not rounding: 0.99999 becomes
    /// 32767 but -0.00001 becomes 0.
    ///
    /// Inputs outside `[-1.0, 1.0)` are not rejected or clamped. The scaled
    /// value saturates to `i32` and is then wrapped to 16 bits, so 1.0 becomes
    /// -1.0 and 1.5 becomes -0.5. Callers that need range safety must check
    /// before converting.
    pub fn from_f32_truncating(value: f32) -> Self {
        Self((value * Q15_SCALE) as i32 as i16)
    }

    /// Exact value as `f32`.
    pub fn to_f32(self) -> f32 {
        f32::from(self.0) / Q15_SCALE
    }

    /// Register image: the value sign-extended to 32 bits.
    pub const fn register_value(self) -> u32 {
        self.0 as i32 as u32
    }

    /// Decode a register image (low 16 bits).
    pub const fn from_register(value: u32) -> Self {
        Self(value as u16 as i16)
    }
}

impl fmt::Display for Q15 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three filter coefficients as floats, nominally in `[-1.0, 1.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterCoefficientSet {
    /// Gain on the current input sample.
    pub a0: f32,
    /// Gain on the previous input sample.
    pub a1: f32,
    /// Gain on the previous output sample.
    pub b1: f32,
}

impl FilterCoefficientSet {
    /// Bundle three coefficients.
    pub const fn new(a0: f32, a1: f32, b1: f32) -> Self {
        Self { a0, a1, b1 }
    }

    /// Convert each coefficient with [`Q15::from_f32_truncating`].
    pub fn to_fixed(&self) -> FixedCoefficients {
        FixedCoefficients {
            a0: Q15::from_f32_truncating(self.a0),
            a1: Q15::from_f32_truncating(self.a1),
            b1: Q15::from_f32_truncating(self.b1),
        }
    }

    /// Whether every coefficient is in `[-1.0, 1.0)` and converts without
    /// wrapping.
    pub fn is_representable(&self) -> bool {
        [self.a0, self.a1, self.b1]
            .iter()
            .all(|c| (-1.0..1.0).contains(c))
    }
}

/// Coefficients as written to the filter registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedCoefficients {
    /// A0 in Q1.15.
    pub a0: Q15,
    /// A1 in Q1.15.
    pub a1: Q15,
    /// B1 in Q1.15.
    pub b1: Q15,
}

impl FixedCoefficients {
    /// Back to floats (exact).
    pub fn to_f32(&self) -> FilterCoefficientSet {
        FilterCoefficientSet::new(self.a0.to_f32(), self.a1.to_f32(), self.b1.to_f32())
    }
}

impl fmt::Display for FixedCoefficients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A0={}, A1={}, B1={}", self.a0, self.a1, self.b1)
    }
}

/// Control register contents. Only two bits are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRegister {
    /// Filter datapath running.
    pub enable: bool,
    /// Delay elements held in reset.
    pub clear: bool,
}

impl ControlRegister {
    /// First half of the start sequence: running with state cleared.
    pub const RESET_AND_RUN: Self = Self::new(true, true);

    /// Second half of the start sequence: running normally.
    pub const RUN: Self = Self::new(true, false);

    /// Compose from the two flags.
    pub const fn new(enable: bool, clear: bool) -> Self {
        Self { enable, clear }
    }

    /// Register image. All bits other than enable and clear are zero.
    pub const fn bits(self) -> u32 {
        let mut bits = 0;
        if self.enable {
            bits |= CONTROL_ENABLE;
        }
        if self.clear {
            bits |= CONTROL_CLEAR;
        }
        bits
    }

    /// Decode a register image, ignoring undefined bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self::new(bits & CONTROL_ENABLE != 0, bits & CONTROL_CLEAR != 0)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn half_converts_to_16384() {
        assert_eq!(Q15::from_f32_truncating(0.5).to_bits(), 16_384);
        assert_eq!(Q15::from_f32_truncating(-0.5).to_bits(), -16_384);
        assert_eq!(Q15::from_f32_truncating(0.0), Q15::ZERO);
    }

    #[test]
    fn conversion_truncates_toward_zero() {
        // 0.99999 * 32768 = 32767.67
        assert_eq!(Q15::from_f32_truncating(0.99999).to_bits(), 32_767);
        // -0.99999 * 32768 = -32767.67
        assert_eq!(Q15::from_f32_truncating(-0.99999).to_bits(), -32_767);
        // Below one LSB in magnitude collapses to zero on both sides.
        assert_eq!(Q15::from_f32_truncating(0.00002).to_bits(), 0);
        assert_eq!(Q15::from_f32_truncating(-0.00002).to_bits(), 0);
    }

    #[test]
    fn minus_one_is_exact() {
        assert_eq!(Q15::from_f32_truncating(-1.0).to_bits(), i16::MIN);
        assert_eq!(Q15::from_bits(i16::MIN).to_f32(), -1.0);
    }

    #[test]
    fn out_of_range_wraps_instead_of_clamping() {
        assert_eq!(Q15::from_f32_truncating(1.0).to_bits(), i16::MIN);
        assert_eq!(Q15::from_f32_truncating(1.5).to_bits(), -16_384);
        assert!(!FilterCoefficientSet::new(1.0, 0.0, 0.0).is_representable());
        assert!(FilterCoefficientSet::new(-1.0, 0.0, 0.999).is_representable());
    }

    #[test]
    fn register_value_is_sign_extended() {
        assert_eq!(Q15::from_bits(16_384).register_value(), 0x0000_4000);
        assert_eq!(Q15::from_bits(-16_384).register_value(), 0xFFFF_C000);
        assert_eq!(Q15::from_register(0xFFFF_C000).to_bits(), -16_384);
        assert_eq!(Q15::from_register(0x0001_4000).to_bits(), 16_384);
    }

    #[test]
    fn fixed_coefficients_display_as_integers() {
        let fixed = FilterCoefficientSet::new(0.5, 0.0, 0.5).to_fixed();
        assert_eq!(format!("{fixed}"), "A0=16384, A1=0, B1=16384");
    }

    #[test]
    fn control_register_start_sequence_bits() {
        assert_eq!(ControlRegister::RESET_AND_RUN.bits(), 0x03);
        assert_eq!(ControlRegister::RUN.bits(), 0x01);
        assert_eq!(ControlRegister::default().bits(), 0x00);
        assert_eq!(ControlRegister::new(false, true).bits(), 0x02);
    }

    #[test]
    fn control_register_ignores_undefined_bits() {
        assert_eq!(ControlRegister::from_bits(0xFFFF_FFFD), ControlRegister::new(true, false));
    }
}
