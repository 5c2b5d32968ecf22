use crate::error::InvalidArgument;
use crate::numeric::Scalar;

use super::viewport::PixelRect;

/// Column-major 4×4 matrix: `self.0[column][row]`.
///
/// Consumed verbatim; no validation beyond shape.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix4<N>(pub [[N; 4]; 4]);

impl<N: Scalar> Matrix4<N> {
    pub fn identity() -> Self {
        let mut m = [[N::ZERO; 4]; 4];
        for (i, column) in m.iter_mut().enumerate() {
            column[i] = N::ONE;
        }
        Self(m)
    }

    #[inline]
    pub const fn from_columns(columns: [[N; 4]; 4]) -> Self {
        Self(columns)
    }

    /// Reads 16 values laid out column after column.
    pub fn from_column_slice(values: &[N]) -> Result<Self, InvalidArgument> {
        if values.len() != 16 {
            return Err(InvalidArgument::MatrixShape(values.len()));
        }
        let mut m = [[N::ZERO; 4]; 4];
        for (column, chunk) in m.iter_mut().zip(values.chunks_exact(4)) {
            column.copy_from_slice(chunk);
        }
        Ok(Self(m))
    }

    #[inline]
    pub fn columns(&self) -> &[[N; 4]; 4] {
        &self.0
    }

    pub fn to_f32(&self) -> [[f32; 4]; 4] {
        self.0.map(|column| column.map(Scalar::to_f32))
    }
}

impl<N: Scalar> Default for Matrix4<N> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Which matrix slot a load targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MatrixMode {
    Projection,
    ModelView,
}

/// Fixed-function state mirrored on the CPU side.
///
/// Matrices are stored exactly as loaded so they read back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState<N> {
    pub projection: Matrix4<N>,
    pub modelview: Matrix4<N>,
    pub viewport: PixelRect,
    pub scissor: Option<PixelRect>,
    pub depth_range: (N, N),
}

impl<N: Scalar> PipelineState<N> {
    pub fn new(viewport: PixelRect) -> Self {
        Self {
            projection: Matrix4::identity(),
            modelview: Matrix4::identity(),
            viewport,
            scissor: None,
            depth_range: (N::ZERO, N::ONE),
        }
    }

    pub fn matrix(&self, mode: MatrixMode) -> &Matrix4<N> {
        match mode {
            MatrixMode::Projection => &self.projection,
            MatrixMode::ModelView => &self.modelview,
        }
    }

    pub fn matrix_mut(&mut self, mode: MatrixMode) -> &mut Matrix4<N> {
        match mode {
            MatrixMode::Projection => &mut self.projection,
            MatrixMode::ModelView => &mut self.modelview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Fixed;

    #[test]
    fn identity_has_ones_on_the_diagonal() {
        let m = Matrix4::<f64>::identity();
        for c in 0..4 {
            for r in 0..4 {
                assert_eq!(m.0[c][r], if c == r { 1.0 } else { 0.0 });
            }
        }
        assert_eq!(Matrix4::<Fixed>::identity().0[2][2], Fixed::ONE);
    }

    #[test]
    fn column_slice_fills_columns_in_order() {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        let m = Matrix4::from_column_slice(&values).unwrap();
        assert_eq!(m.0[0], [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(m.0[3], [12.0, 13.0, 14.0, 15.0]);
    }

    #[test]
    fn column_slice_rejects_wrong_shape() {
        assert_eq!(
            Matrix4::<f64>::from_column_slice(&[0.0; 15]),
            Err(InvalidArgument::MatrixShape(15))
        );
    }

    #[test]
    fn fixed_matrix_converts_to_floats() {
        let mut m = Matrix4::<Fixed>::identity();
        m.0[3][0] = Fixed::from_raw(0x8000);
        let f = m.to_f32();
        assert_eq!(f[3][0], 0.5);
        assert_eq!(f[1][1], 1.0);
    }
}
