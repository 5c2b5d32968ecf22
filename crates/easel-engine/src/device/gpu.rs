use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::{DriverError, SurfaceInitError};

use super::error::driver_error;
use super::surface::{self, Negotiated, Offer};
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

/// Errors wgpu reports out of band, oldest first.
type ErrorSink = Arc<Mutex<VecDeque<DriverError>>>;

/// Owns wgpu core objects, the surface configuration and the render targets
/// that follow the window size.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,

    /// Surface bound to the window; the window must outlive the `Gpu`.
    surface: wgpu::Surface<'w>,

    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    config: wgpu::SurfaceConfiguration,
    negotiated: Negotiated,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    /// Multisampled color target; `None` when rendering single-sampled.
    msaa_view: Option<wgpu::TextureView>,
    depth_view: Option<wgpu::TextureView>,

    errors: ErrorSink,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// A surface that offers no color format fails with
    /// [`SurfaceInitError::PixelFormat`] inside the returned error; every other
    /// failure is a context error.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        log::debug!("using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("easel device"),
                required_features: wgpu::Features::empty(),
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let errors = ErrorSink::default();
        let sink = Arc::clone(&errors);
        device.on_uncaptured_error(Arc::new(move |e: wgpu::Error| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(driver_error(&e));
        }));

        let caps = surface.get_capabilities(&adapter);
        let negotiated = surface::negotiate(&init, Offer::from(&caps), |format| {
            adapter.get_texture_format_features(format).flags
        })
        .map_err(anyhow::Error::new)?;

        log::debug!("negotiated surface {negotiated:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: negotiated.format,
            width: size.width,
            height: size.height,
            present_mode: negotiated.present_mode,
            alpha_mode: negotiated.alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: negotiated.frame_latency,
        };

        surface.configure(&device, &config);

        let mut gpu = Self {
            _instance: instance,
            surface,
            _adapter: adapter,
            device,
            queue,
            config,
            negotiated,
            size,
            msaa_view: None,
            depth_view: None,
            errors,
        };
        gpu.recreate_targets();
        Ok(gpu)
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn negotiated(&self) -> &Negotiated {
        &self.negotiated
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn msaa_view(&self) -> Option<&wgpu::TextureView> {
        self.msaa_view.as_ref()
    }

    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.depth_view.as_ref()
    }

    /// Reconfigures the surface and its targets after a resize.
    ///
    /// A 0x0 size only updates the tracked size; configuration is deferred.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );
        self.recreate_targets();
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("easel frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the recorded commands and presents the frame.
    pub fn submit(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        drop(frame.view);
        frame.surface_texture.present();
    }

    /// Submits the recorded commands and drops the frame unpresented.
    pub fn discard(&self, frame: GpuFrame) {
        self.queue.submit(std::iter::once(frame.encoder.finish()));
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&self, err: &SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(&self.surface, &self.device, &self.config, self.size, err)
    }

    /// Queues an error to be reported with the device's own.
    pub fn report(&self, err: DriverError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(err);
    }

    pub fn take_error(&self) -> Option<DriverError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn recreate_targets(&mut self) {
        let (width, height) = (self.config.width, self.config.height);
        let samples = self.negotiated.sample_count;

        self.msaa_view = (samples > 1).then(|| {
            create_target(&self.device, "easel msaa color", self.config.format, samples, width, height)
        });
        self.depth_view = self
            .negotiated
            .depth_format
            .map(|format| create_target(&self.device, "easel depth", format, samples, width, height));
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    sample_count: u32,
    width: u32,
    height: u32,
) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

/// Maps a failed [`Gpu::new`] to the error reported from `open`.
pub(crate) fn init_error(err: anyhow::Error) -> SurfaceInitError {
    match err.downcast::<SurfaceInitError>() {
        Ok(e) => e,
        Err(other) => SurfaceInitError::Context(format!("{other:#}")),
    }
}
