use crate::backend::Backend;
use crate::error::{DriverError, Error, SurfaceInitError};
use crate::host::HostScheduler;
use crate::input::InputEvent;
use crate::render::{ColorSpec, PrimitiveKind, VertexBuffer};

use super::{Surface, SurfaceConfig};

/// Host-facing controller holding at most one surface.
///
/// Mirrors the flat call surface hosts bind to: every operation other than
/// opening and polling fails with [`Error::NotOpen`] until a surface is open.
pub struct Session<B: Backend> {
    surface: Option<Surface<B>>,
}

impl<B: Backend> Default for Session<B> {
    fn default() -> Self {
        Self { surface: None }
    }
}

impl<B: Backend> Session<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional form of [`open_with`](Self::open_with).
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        &mut self,
        title: &str,
        depth: bool,
        alpha: bool,
        double_buffer: bool,
        multisample: bool,
        width: u32,
        height: u32,
    ) -> Result<(), SurfaceInitError> {
        self.open_with(SurfaceConfig {
            title: title.to_string(),
            depth,
            alpha,
            double_buffer,
            multisample,
            width,
            height,
        })
    }

    pub fn open_with(&mut self, config: SurfaceConfig) -> Result<(), SurfaceInitError> {
        if self.surface.is_some() {
            return Err(SurfaceInitError::AlreadyOpen);
        }
        self.surface = Some(Surface::open(config)?);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&Surface<B>> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut Surface<B>> {
        self.surface.as_mut()
    }

    pub fn close(&mut self) -> Result<(), Error> {
        let surface = self.surface.take().ok_or(Error::NotOpen)?;
        surface.close();
        Ok(())
    }

    /// `None` when no surface is open.
    pub fn poll_event(&mut self, blocking: bool) -> Option<InputEvent> {
        self.surface.as_mut()?.poll_event(blocking)
    }

    pub fn set_host(&mut self, host: Box<dyn HostScheduler>) -> Result<(), Error> {
        self.live()?.set_host(host);
        Ok(())
    }

    pub fn set_clear_color(&mut self, r: B::Scalar, g: B::Scalar, b: B::Scalar, a: B::Scalar) -> Result<(), Error> {
        self.live()?.set_clear_color([r, g, b, a]);
        Ok(())
    }

    pub fn set_clear_depth(&mut self, depth: B::Scalar) -> Result<(), Error> {
        self.live()?.set_clear_depth(depth);
        Ok(())
    }

    pub fn clear(&mut self, color: bool, depth: bool) -> Result<(), Error> {
        self.live()?.clear(color, depth);
        Ok(())
    }

    pub fn set_projection_matrix(&mut self, values: &[B::Scalar]) -> Result<(), Error> {
        Ok(self.live()?.set_projection_matrix(values)?)
    }

    pub fn set_modelview_matrix(&mut self, values: &[B::Scalar]) -> Result<(), Error> {
        Ok(self.live()?.set_modelview_matrix(values)?)
    }

    pub fn set_depth_range(&mut self, near: B::Scalar, far: B::Scalar) -> Result<(), Error> {
        self.live()?.set_depth_range(near, far);
        Ok(())
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), Error> {
        Ok(self.live()?.set_viewport(x, y, width, height)?)
    }

    pub fn set_scissor(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), Error> {
        Ok(self.live()?.set_scissor(x, y, width, height)?)
    }

    pub fn disable_scissor(&mut self) -> Result<(), Error> {
        self.live()?.disable_scissor();
        Ok(())
    }

    /// False when no surface is open.
    pub fn close_requested(&self) -> bool {
        self.surface.as_ref().is_some_and(Surface::close_requested)
    }

    /// `None` when no surface is open.
    pub fn window_size(&self) -> Option<(u32, u32)> {
        self.surface.as_ref().map(Surface::window_size)
    }

    pub fn draw(
        &mut self,
        kind: PrimitiveKind,
        vertices: VertexBuffer<'_, B::Scalar>,
        colors: ColorSpec<'_, B::Scalar>,
    ) -> Result<(), Error> {
        Ok(self.live()?.draw(kind, vertices, colors)?)
    }

    pub fn swap_buffers(&mut self) -> Result<(), Error> {
        self.live()?.swap_buffers();
        Ok(())
    }

    pub fn take_driver_error(&mut self) -> Result<Option<DriverError>, Error> {
        Ok(self.live()?.take_driver_error())
    }

    fn live(&mut self) -> Result<&mut Surface<B>, Error> {
        self.surface.as_mut().ok_or(Error::NotOpen)
    }
}
