use std::fmt;

/// 16.16 binary fixed-point value.
///
/// The raw `i32` is the real value scaled by 2^16, which is the encoding the
/// embedded profile exchanges with the host for vertices, colors and matrices.
#[repr(transparent)]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const FRAC_BITS: u32 = 16;
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1 << Self::FRAC_BITS);

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn from_int(v: i16) -> Self {
        Self((v as i32) << Self::FRAC_BITS)
    }

    /// Rounds to the nearest representable value; saturates outside ±32768.
    #[inline]
    pub fn from_f32(v: f32) -> Self {
        let scaled = (v as f64 * f64::from(1u32 << Self::FRAC_BITS)).round();
        Self(scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        (self.0 as f64 / f64::from(1u32 << Self::FRAC_BITS)) as f32
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({:#x} = {})", self.0, self.to_f32())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl From<i16> for Fixed {
    fn from(v: i16) -> Self {
        Self::from_int(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_is_two_to_the_sixteen() {
        assert_eq!(Fixed::ONE.raw(), 0x1_0000);
        assert_eq!(Fixed::from_int(1), Fixed::ONE);
        assert_eq!(Fixed::from_int(-2).raw(), -0x2_0000);
    }

    #[test]
    fn float_conversion_is_exact_for_dyadic_values() {
        assert_eq!(Fixed::from_f32(0.5).raw(), 0x8000);
        assert_eq!(Fixed::from_f32(-1.25).raw(), -0x1_4000);
        assert_eq!(Fixed::from_raw(0x8000).to_f32(), 0.5);
    }

    #[test]
    fn float_conversion_saturates() {
        assert_eq!(Fixed::from_f32(1.0e9).raw(), i32::MAX);
        assert_eq!(Fixed::from_f32(-1.0e9).raw(), i32::MIN);
    }
}
