use crate::device::{ClearBuffers, Driver};
use crate::error::InvalidArgument;
use crate::numeric::{rgba, Scalar};

/// Last clear color/depth handed to the driver.
///
/// Scenes usually clear to the same values every frame, and changing clear
/// state is a comparatively expensive transition, so repeats are dropped
/// here. Comparison is exact. Both values start unknown, so the first set
/// always reaches the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearCache<N> {
    color: Option<[N; 4]>,
    depth: Option<N>,
}

impl<N> Default for ClearCache<N> {
    fn default() -> Self {
        Self {
            color: None,
            depth: None,
        }
    }
}

impl<N: Scalar> ClearCache<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> Option<[N; 4]> {
        self.color
    }

    pub fn depth(&self) -> Option<N> {
        self.depth
    }

    /// Returns whether the driver was called.
    pub fn set_color<D>(&mut self, driver: &mut D, rgba: [N; 4]) -> bool
    where
        D: Driver<Scalar = N> + ?Sized,
    {
        if self.color == Some(rgba) {
            return false;
        }
        self.color = Some(rgba);
        driver.set_clear_color(rgba);
        true
    }

    /// Returns whether the driver was called.
    pub fn set_depth<D>(&mut self, driver: &mut D, depth: N) -> bool
    where
        D: Driver<Scalar = N> + ?Sized,
    {
        if self.depth == Some(depth) {
            return false;
        }
        self.depth = Some(depth);
        driver.set_clear_depth(depth);
        true
    }

    /// Issues one combined clear of exactly the requested buffers.
    ///
    /// Unrequested buffers keep their contents; requesting neither is a no-op.
    pub fn clear<D>(&self, driver: &mut D, color: bool, depth: bool)
    where
        D: Driver<Scalar = N> + ?Sized,
    {
        let buffers = ClearBuffers { color, depth };
        if buffers.is_empty() {
            return;
        }
        driver.clear(buffers);
    }

    /// Sets whichever values are given, then clears exactly those buffers.
    ///
    /// `color` takes 3 (opaque) or 4 components; the shape is checked before
    /// anything reaches the driver.
    pub fn clear_with<D>(&mut self, driver: &mut D, color: Option<&[N]>, depth: Option<N>) -> Result<(), InvalidArgument>
    where
        D: Driver<Scalar = N> + ?Sized,
    {
        let color = color
            .map(|c| rgba(c).ok_or(InvalidArgument::ColorDimension(c.len())))
            .transpose()?;

        if let Some(c) = color {
            self.set_color(driver, c);
        }
        if let Some(d) = depth {
            self.set_depth(driver, d);
        }
        self.clear(driver, color.is_some(), depth.is_some());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DriverCall, RecordingDriver};
    use crate::numeric::Fixed;

    fn color_sets<N: Scalar>(d: &RecordingDriver<N>) -> usize {
        d.count(|c| matches!(c, DriverCall::ClearColor(_)))
    }

    #[test]
    fn repeated_color_is_elided() {
        let mut d = RecordingDriver::<f64>::new();
        let mut cache = ClearCache::new();

        assert!(cache.set_color(&mut d, [0.1, 0.2, 0.3, 1.0]));
        assert!(!cache.set_color(&mut d, [0.1, 0.2, 0.3, 1.0]));
        assert_eq!(color_sets(&d), 1);

        assert!(cache.set_color(&mut d, [0.1, 0.2, 0.3, 0.5]));
        assert_eq!(color_sets(&d), 2);
        assert_eq!(cache.color(), Some([0.1, 0.2, 0.3, 0.5]));
    }

    #[test]
    fn first_set_reaches_driver_even_for_defaults() {
        let mut d = RecordingDriver::<Fixed>::new();
        let mut cache = ClearCache::new();

        assert!(cache.set_color(&mut d, [Fixed::ZERO; 4]));
        assert!(cache.set_depth(&mut d, Fixed::ZERO));
        assert!(!cache.set_depth(&mut d, Fixed::ZERO));
        assert_eq!(d.calls().len(), 2);
    }

    #[test]
    fn comparison_is_exact() {
        let mut d = RecordingDriver::<f64>::new();
        let mut cache = ClearCache::new();

        cache.set_depth(&mut d, 1.0);
        assert!(cache.set_depth(&mut d, 1.0 - f64::EPSILON));
        assert_eq!(d.count(|c| matches!(c, DriverCall::ClearDepth(_))), 2);
    }

    #[test]
    fn clear_covers_exactly_the_requested_buffers() {
        let mut d = RecordingDriver::<f64>::new();
        let cache = ClearCache::new();

        cache.clear(&mut d, true, false);
        cache.clear(&mut d, false, true);
        cache.clear(&mut d, true, true);
        cache.clear(&mut d, false, false);

        assert_eq!(
            d.calls(),
            [
                DriverCall::Clear(ClearBuffers { color: true, depth: false }),
                DriverCall::Clear(ClearBuffers { color: false, depth: true }),
                DriverCall::Clear(ClearBuffers { color: true, depth: true }),
            ]
        );
    }

    #[test]
    fn clear_with_sets_then_clears() {
        let mut d = RecordingDriver::<f64>::new();
        let mut cache = ClearCache::new();

        cache.clear_with(&mut d, Some(&[0.0, 0.0, 1.0]), None).unwrap();
        cache.clear_with(&mut d, Some(&[0.0, 0.0, 1.0, 1.0]), Some(1.0)).unwrap();

        assert_eq!(
            d.calls(),
            [
                DriverCall::ClearColor([0.0, 0.0, 1.0, 1.0]),
                DriverCall::Clear(ClearBuffers { color: true, depth: false }),
                DriverCall::ClearDepth(1.0),
                DriverCall::Clear(ClearBuffers { color: true, depth: true }),
            ]
        );
    }

    #[test]
    fn clear_with_rejects_bad_color_before_any_call() {
        let mut d = RecordingDriver::<f64>::new();
        let mut cache = ClearCache::new();

        assert_eq!(
            cache.clear_with(&mut d, Some(&[1.0, 1.0]), Some(1.0)),
            Err(InvalidArgument::ColorDimension(2))
        );
        assert!(d.calls().is_empty());
        assert_eq!(cache.depth(), None);
    }
}
