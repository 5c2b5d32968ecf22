use crate::backend::Backend;
use crate::device::Driver;
use crate::error::{DriverError, InvalidArgument, SurfaceInitError};
use crate::host::{blocking_section, HostScheduler, Unmanaged};
use crate::input::{EventTranslator, InputEvent};
use crate::render::{ClientState, ColorSpec, Dispatcher, PrimitiveKind, VertexBuffer};
use crate::state::{ClearCache, Matrix4, MatrixMode, PipelineState, PixelRect};

use super::SurfaceConfig;

/// An open display connection, window and rendering context.
///
/// Every operation goes straight to the backend driver in call order. Driver
/// errors never fail a call: they are logged and the most recent one is kept
/// for [`take_driver_error`](Self::take_driver_error).
pub struct Surface<B: Backend> {
    // Field order is drop order: context and window first, then the connection.
    driver: B::Driver,
    pump: B::Pump,

    translator: EventTranslator,
    clear: ClearCache<B::Scalar>,
    pipeline: PipelineState<B::Scalar>,
    dispatcher: Dispatcher<B::Scalar>,
    host: Box<dyn HostScheduler>,

    config: SurfaceConfig,
    /// Size the driver's targets were last configured for.
    driver_size: (u32, u32),
    last_driver_error: Option<DriverError>,
}

impl<B: Backend> Surface<B> {
    pub fn open(config: SurfaceConfig) -> Result<Self, SurfaceInitError> {
        log::debug!(
            "opening {} surface \"{}\" at {}x{}",
            B::NAME,
            config.title,
            config.width,
            config.height
        );
        let (driver, pump) = B::connect(&config)?;
        Ok(Self::from_parts(config, driver, pump))
    }

    /// Wraps an already connected driver and pump, then applies the baseline
    /// state: viewport covering the window, no scissor.
    ///
    /// Sizes come from the driver, which may differ from the requested size
    /// (fullscreen windows, window manager constraints).
    pub fn from_parts(config: SurfaceConfig, driver: B::Driver, pump: B::Pump) -> Self {
        let (width, height) = driver.size();
        if (width, height) != (config.width, config.height) {
            log::debug!(
                "requested {}x{}, window came up {width}x{height}",
                config.width,
                config.height
            );
        }
        let viewport = PixelRect::new(0, 0, width, height);

        let mut surface = Self {
            driver,
            pump,
            translator: EventTranslator::new(width, height),
            clear: ClearCache::new(),
            pipeline: PipelineState::new(viewport),
            dispatcher: Dispatcher::new(),
            host: Box::new(Unmanaged),
            config,
            driver_size: (width, height),
            last_driver_error: None,
        };

        surface.driver.set_viewport(viewport);
        surface.driver.set_scissor(None);
        surface.check_driver("baseline setup");
        surface
    }

    /// Releases context, window and connection, in that order.
    pub fn close(self) {
        log::debug!("closing {} surface \"{}\"", B::NAME, self.config.title);
        let Self { driver, pump, .. } = self;
        drop(driver);
        drop(pump);
    }

    /// Installs the scheduler released around blocking waits and swaps.
    pub fn set_host(&mut self, host: Box<dyn HostScheduler>) {
        self.host = host;
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn double_buffered(&self) -> bool {
        self.config.double_buffer
    }

    pub fn driver(&self) -> &B::Driver {
        &self.driver
    }

    pub fn pump_mut(&mut self) -> &mut B::Pump {
        &mut self.pump
    }

    // ── input ────────────────────────────────────────────────────────────

    /// Next logical input event; `blocking` waits for one.
    ///
    /// A resize is forwarded to the driver before it is returned.
    pub fn poll_event(&mut self, blocking: bool) -> Option<InputEvent> {
        let ev = self.translator.poll(&mut self.pump, &*self.host, blocking);

        if let Some(InputEvent::Resize { width, height }) = ev {
            if (width, height) != self.driver_size {
                self.driver_size = (width, height);
                self.driver.resize(width, height);
                self.check_driver("resize");
            }
        }
        ev
    }

    /// Tracked `(width, height)` in device pixels.
    pub fn window_size(&self) -> (u32, u32) {
        self.translator.window_size()
    }

    pub fn close_requested(&self) -> bool {
        self.translator.close_requested()
    }

    // ── clear state ──────────────────────────────────────────────────────

    pub fn set_clear_color(&mut self, rgba: [B::Scalar; 4]) {
        if self.clear.set_color(&mut self.driver, rgba) {
            self.check_driver("set_clear_color");
        }
    }

    pub fn set_clear_depth(&mut self, depth: B::Scalar) {
        if self.clear.set_depth(&mut self.driver, depth) {
            self.check_driver("set_clear_depth");
        }
    }

    pub fn clear(&mut self, color: bool, depth: bool) {
        self.clear.clear(&mut self.driver, color, depth);
        self.check_driver("clear");
    }

    /// Sets the given clear values, then clears exactly those buffers.
    pub fn clear_with(&mut self, color: Option<&[B::Scalar]>, depth: Option<B::Scalar>) -> Result<(), InvalidArgument> {
        self.clear.clear_with(&mut self.driver, color, depth)?;
        self.check_driver("clear");
        Ok(())
    }

    // ── transforms ───────────────────────────────────────────────────────

    pub fn load_matrix(&mut self, mode: MatrixMode, matrix: Matrix4<B::Scalar>) {
        *self.pipeline.matrix_mut(mode) = matrix;
        self.driver.load_matrix(mode, &matrix);
        self.check_driver("load_matrix");
    }

    /// Replaces the projection matrix with 16 column-major values.
    pub fn set_projection_matrix(&mut self, values: &[B::Scalar]) -> Result<(), InvalidArgument> {
        let m = Matrix4::from_column_slice(values)?;
        self.load_matrix(MatrixMode::Projection, m);
        Ok(())
    }

    /// Replaces the model-view matrix with 16 column-major values.
    pub fn set_modelview_matrix(&mut self, values: &[B::Scalar]) -> Result<(), InvalidArgument> {
        let m = Matrix4::from_column_slice(values)?;
        self.load_matrix(MatrixMode::ModelView, m);
        Ok(())
    }

    pub fn projection_matrix(&self) -> &Matrix4<B::Scalar> {
        self.pipeline.matrix(MatrixMode::Projection)
    }

    pub fn modelview_matrix(&self) -> &Matrix4<B::Scalar> {
        self.pipeline.matrix(MatrixMode::ModelView)
    }

    pub fn set_depth_range(&mut self, near: B::Scalar, far: B::Scalar) {
        self.pipeline.depth_range = (near, far);
        self.driver.set_depth_range(near, far);
        self.check_driver("set_depth_range");
    }

    pub fn depth_range(&self) -> (B::Scalar, B::Scalar) {
        self.pipeline.depth_range
    }

    // ── viewport & scissor ───────────────────────────────────────────────

    /// Bottom-left origin, framebuffer pixels. Parts outside the window are
    /// cropped, not squeezed in.
    pub fn set_viewport(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), InvalidArgument> {
        let rect = PixelRect::checked(x, y, width, height)?;
        self.pipeline.viewport = rect;
        self.driver.set_viewport(rect);
        self.check_driver("set_viewport");
        Ok(())
    }

    pub fn viewport(&self) -> PixelRect {
        self.pipeline.viewport
    }

    /// Enables the scissor test with the given box. Draws and clears only
    /// touch pixels inside it.
    pub fn set_scissor(&mut self, x: i32, y: i32, width: i32, height: i32) -> Result<(), InvalidArgument> {
        let rect = PixelRect::checked(x, y, width, height)?;
        self.pipeline.scissor = Some(rect);
        self.driver.set_scissor(Some(rect));
        self.check_driver("set_scissor");
        Ok(())
    }

    pub fn disable_scissor(&mut self) {
        self.pipeline.scissor = None;
        self.driver.set_scissor(None);
        self.check_driver("disable_scissor");
    }

    pub fn scissor(&self) -> Option<PixelRect> {
        self.pipeline.scissor
    }

    // ── drawing ──────────────────────────────────────────────────────────

    pub fn draw(
        &mut self,
        kind: PrimitiveKind,
        vertices: VertexBuffer<'_, B::Scalar>,
        colors: ColorSpec<'_, B::Scalar>,
    ) -> Result<(), InvalidArgument> {
        self.dispatcher.draw(&mut self.driver, kind, vertices, colors)?;
        self.check_driver("draw");
        Ok(())
    }

    pub fn client_state(&self) -> ClientState<B::Scalar> {
        self.dispatcher.client_state()
    }

    /// Presents the frame; single-buffered surfaces flush instead.
    pub fn swap_buffers(&mut self) {
        let driver = &mut self.driver;
        blocking_section(&*self.host, || driver.present());
        self.check_driver("swap_buffers");
    }

    // ── driver errors ────────────────────────────────────────────────────

    /// Most recent driver error reported since the last call.
    pub fn take_driver_error(&mut self) -> Option<DriverError> {
        self.check_driver("deferred");
        self.last_driver_error.take()
    }

    fn check_driver(&mut self, op: &str) {
        while let Some(err) = self.driver.take_error() {
            log::error!("{op}: {err}");
            self.last_driver_error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::backend::Headless;
    use crate::device::{ClearBuffers, DriverCall, RecordedColors, RecordingDriver};
    use crate::error::DriverErrorKind;
    use crate::input::{RawEvent, ScriptedPump};
    use crate::numeric::Fixed;
    use crate::render::Tuples;

    type Desk = Surface<Headless<f64>>;

    fn open() -> Desk {
        let mut s = Desk::open(SurfaceConfig::default()).unwrap();
        s.driver.forget_calls();
        s
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn baseline_covers_the_window() {
        let s = Desk::open(SurfaceConfig::default().with_size(320, 200)).unwrap();
        assert_eq!(
            s.driver().calls(),
            [
                DriverCall::Viewport(PixelRect::new(0, 0, 320, 200)),
                DriverCall::Scissor(None),
            ]
        );
        assert_eq!(s.window_size(), (320, 200));
        assert_eq!(s.viewport(), PixelRect::new(0, 0, 320, 200));
        assert_eq!(s.projection_matrix(), &Matrix4::identity());
        assert_eq!(s.depth_range(), (0.0, 1.0));
        s.close();
    }

    #[test]
    fn baseline_follows_the_size_the_window_got() {
        let config = SurfaceConfig::default();
        let driver = RecordingDriver::with_size(1024, 600);
        let mut s = Desk::from_parts(config, driver, ScriptedPump::new());

        assert_eq!(s.window_size(), (1024, 600));
        assert_eq!(s.viewport(), PixelRect::new(0, 0, 1024, 600));
        assert_eq!(s.driver().calls()[0], DriverCall::Viewport(PixelRect::new(0, 0, 1024, 600)));

        // The first configure from the window manager repeats the real size.
        s.driver.forget_calls();
        s.pump_mut().deliver([RawEvent::Configure { width: 1024, height: 600 }]);
        assert_eq!(s.poll_event(false), None);
        assert!(s.driver().calls().is_empty());
    }

    #[test]
    fn configure_resizes_tracked_size_and_driver() {
        let mut s = open();
        s.pump_mut().deliver([RawEvent::Configure { width: 640, height: 360 }]);

        assert_eq!(s.poll_event(false), Some(InputEvent::Resize { width: 640, height: 360 }));
        assert_eq!(s.window_size(), (640, 360));
        assert_eq!(s.driver().calls(), [DriverCall::Resize(640, 360)]);
    }

    #[test]
    fn expose_reports_size_without_resizing_driver() {
        let mut s = open();
        s.pump_mut().deliver([RawEvent::Expose]);

        assert_eq!(s.poll_event(false), Some(InputEvent::Resize { width: 800, height: 480 }));
        assert!(s.driver().calls().is_empty());
    }

    #[test]
    fn poll_without_events_returns_none() {
        let mut s = open();
        assert_eq!(s.poll_event(false), None);
        assert_eq!(s.poll_event(true), None);
    }

    // ── state ────────────────────────────────────────────────────────────

    #[test]
    fn repeated_clear_color_reaches_driver_once() {
        let mut s = open();
        s.set_clear_color([0.0, 0.0, 0.0, 1.0]);
        s.set_clear_color([0.0, 0.0, 0.0, 1.0]);
        s.clear(true, false);

        assert_eq!(
            s.driver().calls(),
            [
                DriverCall::ClearColor([0.0, 0.0, 0.0, 1.0]),
                DriverCall::Clear(ClearBuffers { color: true, depth: false }),
            ]
        );
    }

    #[test]
    fn matrices_read_back_exactly() {
        let mut s = open();
        let values: Vec<f64> = (1..=16).map(|v| f64::from(v) / 3.0).collect();

        s.set_projection_matrix(&values).unwrap();
        assert_eq!(s.projection_matrix(), &Matrix4::from_column_slice(&values).unwrap());
        assert_eq!(s.modelview_matrix(), &Matrix4::identity());
        assert_eq!(s.driver().calls().len(), 1);

        assert_eq!(s.set_modelview_matrix(&values[..12]), Err(InvalidArgument::MatrixShape(12)));
        assert_eq!(s.driver().calls().len(), 1);
    }

    #[test]
    fn negative_viewport_is_rejected_before_the_driver() {
        let mut s = open();
        assert_eq!(
            s.set_viewport(0, 0, -5, 10),
            Err(InvalidArgument::NegativeSize { width: -5, height: 10 })
        );
        assert!(s.driver().calls().is_empty());
        assert_eq!(s.viewport(), PixelRect::new(0, 0, 800, 480));
    }

    #[test]
    fn scissor_toggles() {
        let mut s = open();
        s.set_scissor(10, 10, 100, 50).unwrap();
        assert_eq!(s.scissor(), Some(PixelRect::new(10, 10, 100, 50)));
        s.disable_scissor();
        assert_eq!(s.scissor(), None);
        assert_eq!(
            s.driver().calls(),
            [
                DriverCall::Scissor(Some(PixelRect::new(10, 10, 100, 50))),
                DriverCall::Scissor(None),
            ]
        );
    }

    // ── drawing ──────────────────────────────────────────────────────────

    #[test]
    fn uniform_triangles_are_one_draw() {
        let mut s = Surface::<Headless<Fixed>>::open(SurfaceConfig::default()).unwrap();
        let verts = [Fixed::ZERO, Fixed::ZERO, Fixed::ONE, Fixed::ZERO, Fixed::ZERO, Fixed::ONE];
        let red = [Fixed::ONE, Fixed::ZERO, Fixed::ZERO];

        s.draw(PrimitiveKind::Triangles, Tuples::new(&verts, 2), ColorSpec::Uniform(&red))
            .unwrap();

        let draws: Vec<_> = s.driver().draws().cloned().collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].vertex_count, 3);
        assert_eq!(
            draws[0].colors,
            RecordedColors::Uniform([Fixed::ONE, Fixed::ZERO, Fixed::ZERO, Fixed::ONE])
        );
        assert!(!s.client_state().color_array);
    }

    #[test]
    fn swap_releases_the_host_around_present() {
        struct Journal(Rc<RefCell<Vec<&'static str>>>);

        impl HostScheduler for Journal {
            fn release(&self) {
                self.0.borrow_mut().push("release");
            }
            fn acquire(&self) {
                self.0.borrow_mut().push("acquire");
            }
        }

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut s = open();
        s.set_host(Box::new(Journal(Rc::clone(&log))));

        s.swap_buffers();
        assert_eq!(*log.borrow(), ["release", "acquire"]);
        assert_eq!(s.driver().calls(), [DriverCall::Present]);
    }

    // ── driver errors ────────────────────────────────────────────────────

    #[test]
    fn driver_errors_are_kept_not_thrown() {
        let mut s = open();
        s.driver.inject_error(DriverError::new(DriverErrorKind::Validation, "first"));
        s.driver.inject_error(DriverError::new(DriverErrorKind::OutOfMemory, "second"));

        s.set_viewport(0, 0, 10, 10).unwrap();

        let err = s.take_driver_error().unwrap();
        assert_eq!(err.kind, DriverErrorKind::OutOfMemory);
        assert_eq!(s.take_driver_error(), None);
    }

    #[test]
    fn pending_errors_are_collected_on_take() {
        let mut s = open();
        s.driver.inject_error(DriverError::new(DriverErrorKind::Surface, "lost"));
        assert_eq!(s.take_driver_error().map(|e| e.message), Some("lost".to_string()));
    }
}
