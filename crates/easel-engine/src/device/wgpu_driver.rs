use std::marker::PhantomData;

use ouroboros::self_referencing;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::{DriverError, SurfaceInitError};
use crate::numeric::Scalar;
use crate::render::ColorStream;
use crate::state::{Matrix4, MatrixMode, PixelRect};

use super::driver::{ClearBuffers, DrawCall, Driver};
use super::error::surface_driver_error;
use super::gpu::{init_error, Gpu};
use super::pipeline::{self, ClearPipelines, ClearUniform, ColorRate, PipelineCache, TransformUniform};
use super::{GpuFrame, GpuInit, SurfaceErrorAction};

#[self_referencing]
struct BoundWindow {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// [`Driver`] on top of wgpu, rendering into a winit window.
///
/// State calls only update a CPU mirror; clears and draws each record one
/// render pass into the current frame, which is acquired on first use and
/// presented by [`present`](Driver::present).
pub struct WgpuDriver<N> {
    bound: BoundWindow,
    pipelines: PipelineCache,
    clears: ClearPipelines,
    frame: Option<GpuFrame>,

    clear_color: wgpu::Color,
    clear_depth: f32,
    viewport: PixelRect,
    scissor: Option<PixelRect>,
    transform: TransformUniform,

    _scalar: PhantomData<N>,
}

impl<N: Scalar> WgpuDriver<N> {
    /// Binds a GPU context to `window`.
    ///
    /// On failure the window is dropped with everything created for it.
    pub fn new(window: Window, init: GpuInit) -> Result<Self, SurfaceInitError> {
        let bound = BoundWindowTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, init)),
        }
        .try_build()
        .map_err(init_error)?;

        let gpu = bound.borrow_gpu();
        let negotiated = gpu.negotiated();
        let pipelines = PipelineCache::new(gpu.device(), gpu.surface_format(), negotiated.sample_count);
        let clears = ClearPipelines::new(
            gpu.device(),
            gpu.surface_format(),
            negotiated.depth_format,
            negotiated.sample_count,
        );
        let size = gpu.size();

        Ok(Self {
            bound,
            pipelines,
            clears,
            frame: None,
            clear_color: wgpu::Color::BLACK,
            clear_depth: 1.0,
            viewport: PixelRect::new(0, 0, size.width, size.height),
            scissor: None,
            transform: TransformUniform::default(),
            _scalar: PhantomData,
        })
    }

    pub fn window(&self) -> &Window {
        self.bound.borrow_window()
    }

    pub fn gpu(&self) -> &Gpu<'_> {
        self.bound.borrow_gpu()
    }

    /// Acquires the frame if none is in flight. Returns false when the
    /// surface could not provide one; the failure is queued as a driver error.
    fn ensure_frame(&mut self) -> bool {
        if self.frame.is_some() {
            return true;
        }

        let gpu = self.bound.borrow_gpu();
        let mut retried = false;
        loop {
            match gpu.begin_frame() {
                Ok(frame) => {
                    self.frame = Some(frame);
                    return true;
                }
                Err(err) => {
                    let action = gpu.handle_surface_error(&err);
                    if action == SurfaceErrorAction::Reconfigured && !retried {
                        log::debug!("surface {err}; reconfigured, acquiring again");
                        retried = true;
                        continue;
                    }
                    gpu.report(surface_driver_error(&err, action));
                    return false;
                }
            }
        }
    }

    /// Clears through load ops, covering the whole attachment.
    fn clear_attachments(&mut self, buffers: ClearBuffers) {
        let gpu = self.bound.borrow_gpu();
        let Some(frame) = self.frame.as_mut() else { return };

        let color_load = if buffers.color {
            wgpu::LoadOp::Clear(self.clear_color)
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if buffers.depth {
            wgpu::LoadOp::Clear(self.clear_depth)
        } else {
            wgpu::LoadOp::Load
        };

        let (view, resolve_target) = match gpu.msaa_view() {
            Some(msaa) => (msaa, Some(&frame.view)),
            None => (&frame.view, None),
        };

        let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("easel clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: gpu.depth_view().map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    /// Clears only the scissor box by drawing the clear values over it.
    fn clear_scissored(&mut self, buffers: ClearBuffers, rect: PixelRect) {
        let gpu = self.bound.borrow_gpu();
        let Some(frame) = self.frame.as_mut() else { return };

        let target = gpu.size();
        let has_depth = gpu.depth_view().is_some();
        let Some((writes, (sx, sy, sw, sh))) =
            pipeline::scissored_clear(buffers, has_depth, rect, target.width, target.height)
        else {
            return;
        };

        let wgpu::Color { r, g, b, a } = self.clear_color;
        let values = ClearUniform {
            color: [r as f32, g as f32, b as f32, a as f32],
            depth: [self.clear_depth, 0.0, 0.0, 0.0],
        };

        let device = gpu.device();
        let values_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel clear ubo"),
            contents: bytemuck::bytes_of(&values),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel clear bind group"),
            layout: self.clears.bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: values_ubo.as_entire_binding(),
            }],
        });

        let pipeline = self.clears.get(device, writes);

        let (view, resolve_target) = match gpu.msaa_view() {
            Some(msaa) => (msaa, Some(&frame.view)),
            None => (&frame.view, None),
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("easel scissored clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: gpu.depth_view().map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_scissor_rect(sx, sy, sw, sh);
        rpass.draw(0..3, 0..1);
    }
}

impl<N: Scalar> Driver for WgpuDriver<N> {
    type Scalar = N;

    fn set_clear_color(&mut self, rgba: [N; 4]) {
        let [r, g, b, a] = rgba.map(|c| f64::from(c.to_f32()));
        self.clear_color = wgpu::Color { r, g, b, a };
    }

    fn set_clear_depth(&mut self, depth: N) {
        self.clear_depth = depth.to_f32().clamp(0.0, 1.0);
    }

    fn clear(&mut self, buffers: ClearBuffers) {
        if buffers.is_empty() || !self.ensure_frame() {
            return;
        }
        match self.scissor {
            None => self.clear_attachments(buffers),
            Some(rect) => self.clear_scissored(buffers, rect),
        }
    }

    fn set_viewport(&mut self, rect: PixelRect) {
        self.viewport = rect;
    }

    fn set_scissor(&mut self, rect: Option<PixelRect>) {
        self.scissor = rect;
    }

    fn set_depth_range(&mut self, near: N, far: N) {
        self.transform.depth_range = [near.to_f32().clamp(0.0, 1.0), far.to_f32().clamp(0.0, 1.0), 0.0, 0.0];
    }

    fn load_matrix(&mut self, mode: MatrixMode, matrix: &Matrix4<N>) {
        let m = matrix.to_f32();
        match mode {
            MatrixMode::Projection => self.transform.projection = m,
            MatrixMode::ModelView => self.transform.modelview = m,
        }
    }

    fn draw_arrays(&mut self, call: DrawCall<'_, N>) {
        let order = pipeline::assembly_order(call.kind, call.vertices.count());
        if order.is_empty() {
            return;
        }

        let vertex_data = call.vertices.data();
        let dim = call.vertices.dim();
        let positions: Vec<[f32; 4]> = order
            .iter()
            .map(|&i| pipeline::expand_position(&vertex_data[i * dim..(i + 1) * dim]))
            .collect();

        let (colors, rate): (Vec<[f32; 4]>, ColorRate) = match call.colors {
            ColorStream::PerVertex(buffer) => {
                let (data, dim) = (buffer.data(), buffer.dim());
                let colors = order
                    .iter()
                    .map(|&i| pipeline::expand_color(&data[i * dim..(i + 1) * dim]))
                    .collect();
                (colors, ColorRate::PerVertex)
            }
            ColorStream::Uniform(rgba) => (vec![rgba.map(Scalar::to_f32)], ColorRate::Uniform),
        };

        if !self.ensure_frame() {
            return;
        }
        let gpu = self.bound.borrow_gpu();
        let Some(frame) = self.frame.as_mut() else { return };

        let target = gpu.size();
        let Some(fit) = self.viewport.fit_viewport(target.width, target.height) else {
            log::trace!("viewport {:?} lies outside the window; draw skipped", self.viewport);
            return;
        };
        let scissor = match self.scissor {
            None => (0, 0, target.width, target.height),
            Some(rect) => match rect.to_top_left_clamped(target.width, target.height) {
                Some(s) => s,
                None => return,
            },
        };

        let device = gpu.device();

        let position_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel position vbo"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let color_vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel color vbo"),
            contents: bytemuck::cast_slice(&colors),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let transform_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("easel transform ubo"),
            contents: bytemuck::bytes_of(&self.transform.with_fit(&fit)),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("easel transform bind group"),
            layout: self.pipelines.bind_group_layout(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_ubo.as_entire_binding(),
            }],
        });

        let pipeline = self.pipelines.get(device, pipeline::topology(call.kind), rate);

        let (view, resolve_target) = match gpu.msaa_view() {
            Some(msaa) => (msaa, Some(&frame.view)),
            None => (&frame.view, None),
        };

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("easel draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.set_viewport(fit.x as f32, fit.y as f32, fit.width as f32, fit.height as f32, 0.0, 1.0);
        let (sx, sy, sw, sh) = scissor;
        rpass.set_scissor_rect(sx, sy, sw, sh);
        rpass.set_vertex_buffer(0, position_vbo.slice(..));
        rpass.set_vertex_buffer(1, color_vbo.slice(..));
        rpass.draw(0..positions.len() as u32, 0..1);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(frame) = self.frame.take() {
            log::debug!("dropping in-flight frame for resize to {width}x{height}");
            self.bound.borrow_gpu().discard(frame);
        }
        self.bound
            .with_gpu_mut(|gpu| gpu.resize(PhysicalSize::new(width, height)));
    }

    fn size(&self) -> (u32, u32) {
        let size = self.bound.borrow_gpu().size();
        (size.width, size.height)
    }

    fn present(&mut self) {
        if !self.ensure_frame() {
            return;
        }
        let Some(frame) = self.frame.take() else { return };
        self.bound.borrow_window().pre_present_notify();
        self.bound.borrow_gpu().submit(frame);
    }

    fn take_error(&mut self) -> Option<DriverError> {
        self.bound.borrow_gpu().take_error()
    }
}
