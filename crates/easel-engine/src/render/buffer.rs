use crate::error::InvalidArgument;
use crate::numeric::{rgba, Scalar};

/// Borrowed dense array of equally sized tuples.
///
/// The host keeps ownership; a draw call only borrows it for its own duration.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tuples<'a, N> {
    data: &'a [N],
    dim: usize,
}

/// Vertex positions, 2 to 4 components each.
pub type VertexBuffer<'a, N> = Tuples<'a, N>;

/// Per-vertex colors, 3 or 4 components each.
pub type ColorBuffer<'a, N> = Tuples<'a, N>;

impl<'a, N: Scalar> Tuples<'a, N> {
    /// Wraps `data` as `dim`-tuples. Shape is checked when the buffer is drawn.
    #[inline]
    pub const fn new(data: &'a [N], dim: usize) -> Self {
        Self { data, dim }
    }

    #[inline]
    pub fn data(&self) -> &'a [N] {
        self.data
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of whole tuples.
    #[inline]
    pub fn count(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    /// Iterates tuples; requires a non-zero dimension.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a [N]> + 'a {
        self.data.chunks_exact(self.dim.max(1))
    }

    fn check_whole(&self) -> Result<(), InvalidArgument> {
        if self.dim == 0 || self.data.len() % self.dim != 0 {
            return Err(InvalidArgument::Ragged {
                len: self.data.len(),
                dim: self.dim,
            });
        }
        Ok(())
    }

    pub(crate) fn check_vertices(&self) -> Result<(), InvalidArgument> {
        if !(2..=4).contains(&self.dim) {
            return Err(InvalidArgument::VertexDimension(self.dim));
        }
        self.check_whole()
    }

    pub(crate) fn check_colors(&self, vertices: usize) -> Result<(), InvalidArgument> {
        if !matches!(self.dim, 3 | 4) {
            return Err(InvalidArgument::ColorDimension(self.dim));
        }
        self.check_whole()?;
        if self.count() != vertices {
            return Err(InvalidArgument::ColorCount {
                vertices,
                colors: self.count(),
            });
        }
        Ok(())
    }
}

/// How a draw call is colored, as supplied by the host.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ColorSpec<'a, N> {
    PerVertex(ColorBuffer<'a, N>),
    /// One 3- or 4-component color for every vertex; 3 components are opaque.
    Uniform(&'a [N]),
}

/// Validated color source handed to the driver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ColorStream<'a, N> {
    PerVertex(ColorBuffer<'a, N>),
    Uniform([N; 4]),
}

impl<'a, N: Scalar> ColorSpec<'a, N> {
    pub(crate) fn validate(self, vertices: usize) -> Result<ColorStream<'a, N>, InvalidArgument> {
        match self {
            Self::PerVertex(buffer) => {
                buffer.check_colors(vertices)?;
                Ok(ColorStream::PerVertex(buffer))
            }
            Self::Uniform(components) => rgba(components)
                .map(ColorStream::Uniform)
                .ok_or(InvalidArgument::ColorDimension(components.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_ignores_zero_dimension() {
        assert_eq!(Tuples::new(&[1.0f64, 2.0], 0).count(), 0);
        assert_eq!(Tuples::new(&[1.0f64; 6], 2).count(), 3);
    }

    #[test]
    fn vertex_dimension_bounds() {
        let data = [0.0f64; 20];
        for dim in [0, 1, 5] {
            assert_eq!(
                Tuples::new(&data, dim).check_vertices(),
                Err(InvalidArgument::VertexDimension(dim))
            );
        }
        for dim in [2, 4] {
            assert!(Tuples::new(&data, dim).check_vertices().is_ok());
        }
    }

    #[test]
    fn ragged_vertices_are_rejected() {
        assert_eq!(
            Tuples::new(&[0.0f64; 7], 3).check_vertices(),
            Err(InvalidArgument::Ragged { len: 7, dim: 3 })
        );
    }

    #[test]
    fn color_count_must_match() {
        let colors = [1.0f64; 8];
        assert_eq!(
            ColorSpec::PerVertex(Tuples::new(&colors, 4)).validate(3),
            Err(InvalidArgument::ColorCount { vertices: 3, colors: 2 })
        );
        assert!(ColorSpec::PerVertex(Tuples::new(&colors, 4)).validate(2).is_ok());
    }

    #[test]
    fn color_dimension_bounds() {
        let colors = [1.0f64; 4];
        assert_eq!(
            ColorSpec::PerVertex(Tuples::new(&colors, 2)).validate(2),
            Err(InvalidArgument::ColorDimension(2))
        );
        assert_eq!(
            ColorSpec::Uniform(&colors[..2]).validate(1),
            Err(InvalidArgument::ColorDimension(2))
        );
    }

    #[test]
    fn uniform_rgb_becomes_opaque() {
        assert_eq!(
            ColorSpec::Uniform(&[1.0f64, 0.0, 0.0]).validate(3),
            Ok(ColorStream::Uniform([1.0, 0.0, 0.0, 1.0]))
        );
    }
}
