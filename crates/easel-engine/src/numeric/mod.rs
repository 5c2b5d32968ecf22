//! Numeric domains exchanged with the host.
//!
//! The desktop profile speaks IEEE `f64`; the embedded profile speaks 16.16
//! [`Fixed`]. Everything above the driver is generic over [`Scalar`]; values
//! only become `f32` when they are written into GPU buffers.

mod fixed;

use std::fmt::Debug;

pub use fixed::Fixed;

/// A value in the backend numeric domain.
///
/// Equality is exact (`PartialEq`); the state cache relies on that.
pub trait Scalar: Copy + PartialEq + Debug + Send + Sync + 'static {
    const ZERO: Self;
    const ONE: Self;

    fn to_f32(self) -> f32;
    fn from_f32(v: f32) -> Self;
}

impl Scalar for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v as f64
    }
}

impl Scalar for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

impl Scalar for Fixed {
    const ZERO: Self = Fixed::ZERO;
    const ONE: Self = Fixed::ONE;

    #[inline]
    fn to_f32(self) -> f32 {
        Fixed::to_f32(self)
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        Fixed::from_f32(v)
    }
}

/// Widens a 3- or 4-component color to RGBA; a missing alpha is opaque.
///
/// Callers validate the length first; other lengths yield `None`.
pub fn rgba<N: Scalar>(components: &[N]) -> Option<[N; 4]> {
    match *components {
        [r, g, b] => Some([r, g, b, N::ONE]),
        [r, g, b, a] => Some([r, g, b, a]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_gets_opaque_alpha() {
        assert_eq!(rgba(&[0.1f64, 0.2, 0.3]), Some([0.1, 0.2, 0.3, 1.0]));
        assert_eq!(
            rgba(&[Fixed::ZERO, Fixed::ONE, Fixed::ZERO]),
            Some([Fixed::ZERO, Fixed::ONE, Fixed::ZERO, Fixed::ONE])
        );
    }

    #[test]
    fn other_lengths_are_rejected() {
        assert_eq!(rgba::<f64>(&[]), None);
        assert_eq!(rgba(&[1.0f64, 1.0]), None);
        assert_eq!(rgba(&[1.0f64; 5]), None);
    }
}
