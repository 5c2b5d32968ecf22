use crate::error::DriverError;
use crate::numeric::Scalar;
use crate::render::{ColorStream, PrimitiveKind, VertexBuffer};
use crate::state::{Matrix4, MatrixMode, PixelRect};

/// Buffers covered by one combined clear.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct ClearBuffers {
    pub color: bool,
    pub depth: bool,
}

impl ClearBuffers {
    #[inline]
    pub fn is_empty(self) -> bool {
        !self.color && !self.depth
    }
}

/// One validated draw: every vertex from index 0, colored by `colors`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCall<'a, N> {
    pub kind: PrimitiveKind,
    pub vertices: VertexBuffer<'a, N>,
    pub colors: ColorStream<'a, N>,
}

/// Immediate-mode GPU protocol.
///
/// Calls take effect in order. Shapes are validated before they get here.
/// Errors are never returned from a call; they queue up for
/// [`take_error`](Driver::take_error), so a failing call leaves the rest of
/// the frame intact.
pub trait Driver {
    type Scalar: Scalar;

    fn set_clear_color(&mut self, rgba: [Self::Scalar; 4]);
    fn set_clear_depth(&mut self, depth: Self::Scalar);
    fn clear(&mut self, buffers: ClearBuffers);

    fn set_viewport(&mut self, rect: PixelRect);
    fn set_scissor(&mut self, rect: Option<PixelRect>);
    fn set_depth_range(&mut self, near: Self::Scalar, far: Self::Scalar);
    fn load_matrix(&mut self, mode: MatrixMode, matrix: &Matrix4<Self::Scalar>);

    /// Borrows the buffers in `call` only until it returns.
    fn draw_arrays(&mut self, call: DrawCall<'_, Self::Scalar>);

    /// Follows a window size change.
    fn resize(&mut self, width: u32, height: u32);

    /// `(width, height)` the render targets are currently sized for.
    fn size(&self) -> (u32, u32);

    /// Presents the back buffer (or flushes, when single buffered).
    fn present(&mut self);

    /// Oldest error the driver reported since the last call.
    fn take_error(&mut self) -> Option<DriverError>;
}
