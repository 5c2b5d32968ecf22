//! Render pipelines for immediate-mode draws and scissored clears, and the
//! CPU-side assembly of primitive kinds into lists.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::numeric::Scalar;
use crate::render::PrimitiveKind;
use crate::state::{PixelRect, ViewportFit};

use super::driver::ClearBuffers;

// ── uniform ───────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct TransformUniform {
    pub projection: [[f32; 4]; 4],
    pub modelview: [[f32; 4]; 4],
    pub depth_range: [f32; 4], // near, far, pad, pad
    pub viewport_fit: [f32; 4], // scale x, scale y, offset x, offset y
}

impl Default for TransformUniform {
    fn default() -> Self {
        let identity = [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0]];
        Self {
            projection: identity,
            modelview: identity,
            depth_range: [0.0, 1.0, 0.0, 0.0],
            viewport_fit: [1.0, 1.0, 0.0, 0.0],
        }
    }
}

impl TransformUniform {
    pub fn with_fit(self, fit: &ViewportFit) -> Self {
        let [sx, sy] = fit.scale;
        let [ox, oy] = fit.offset;
        Self {
            viewport_fit: [sx, sy, ox, oy],
            ..self
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct ClearUniform {
    pub color: [f32; 4],
    pub depth: [f32; 4], // depth, pad, pad, pad
}

// ── vertex streams ────────────────────────────────────────────────────────

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x4];

/// Whether colors advance per vertex or one color covers the whole draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(super) enum ColorRate {
    PerVertex,
    Uniform,
}

impl ColorRate {
    fn step_mode(self) -> wgpu::VertexStepMode {
        match self {
            Self::PerVertex => wgpu::VertexStepMode::Vertex,
            // A single instance reads the one color for every vertex.
            Self::Uniform => wgpu::VertexStepMode::Instance,
        }
    }
}

fn stream_layout(attributes: &'static [wgpu::VertexAttribute], step_mode: wgpu::VertexStepMode) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 4]>() as u64,
        step_mode,
        attributes,
    }
}

/// Widens a 2..=4 component position to homogeneous coordinates.
pub(super) fn expand_position<N: Scalar>(v: &[N]) -> [f32; 4] {
    let mut out = [0.0, 0.0, 0.0, 1.0];
    for (dst, src) in out.iter_mut().zip(v) {
        *dst = src.to_f32();
    }
    out
}

/// Widens a 3 or 4 component color; a missing alpha is opaque.
pub(super) fn expand_color<N: Scalar>(c: &[N]) -> [f32; 4] {
    let mut out = [1.0; 4];
    for (dst, src) in out.iter_mut().zip(c) {
        *dst = src.to_f32();
    }
    out
}

// ── assembly ──────────────────────────────────────────────────────────────

pub(super) fn topology(kind: PrimitiveKind) -> wgpu::PrimitiveTopology {
    use wgpu::PrimitiveTopology as T;

    match kind {
        PrimitiveKind::Points => T::PointList,
        PrimitiveKind::Lines | PrimitiveKind::LineStrip | PrimitiveKind::LineLoop => T::LineList,
        PrimitiveKind::Triangles | PrimitiveKind::TriangleStrip | PrimitiveKind::TriangleFan => T::TriangleList,
    }
}

/// Source vertex index for each vertex submitted to the GPU.
///
/// Every kind is expanded into a point, line or triangle list. Flat
/// interpolation in wgpu takes the first vertex of a primitive while GL takes
/// the last, so each primitive is rotated to lead with GL's provoking vertex.
/// Rotation keeps the winding. Trailing vertices that do not complete a
/// primitive are dropped.
pub(super) fn assembly_order(kind: PrimitiveKind, count: usize) -> Vec<usize> {
    match kind {
        PrimitiveKind::Points => (0..count).collect(),
        PrimitiveKind::Lines => (0..count / 2).flat_map(|p| [2 * p + 1, 2 * p]).collect(),
        PrimitiveKind::LineStrip => (1..count).flat_map(|i| [i, i - 1]).collect(),
        PrimitiveKind::LineLoop => {
            if count < 2 {
                return Vec::new();
            }
            // The closing segment is provoked by the first vertex.
            (1..count).flat_map(|i| [i, i - 1]).chain([0, count - 1]).collect()
        }
        PrimitiveKind::Triangles => (0..count / 3)
            .flat_map(|p| {
                let i = 3 * p;
                [i + 2, i, i + 1]
            })
            .collect(),
        PrimitiveKind::TriangleStrip => (2..count)
            .flat_map(|i| if i % 2 == 0 { [i, i - 2, i - 1] } else { [i, i - 1, i - 2] })
            .collect(),
        PrimitiveKind::TriangleFan => (2..count).flat_map(|i| [i, 0, i - 1]).collect(),
    }
}

/// Buffers a clear under `scissor` writes, and the top-left box it covers.
///
/// `None` when nothing would change: no writable buffer requested, or the
/// box misses the target.
pub(super) fn scissored_clear(
    buffers: ClearBuffers,
    has_depth: bool,
    scissor: PixelRect,
    target_w: u32,
    target_h: u32,
) -> Option<(ClearBuffers, (u32, u32, u32, u32))> {
    let writes = ClearBuffers {
        color: buffers.color,
        depth: buffers.depth && has_depth,
    };
    if writes.is_empty() {
        return None;
    }
    Some((writes, scissor.to_top_left_clamped(target_w, target_h)?))
}

// ── pipelines ─────────────────────────────────────────────────────────────

/// Shader, layouts and one pipeline per (topology, color rate) pair.
pub(super) struct PipelineCache {
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    sample_count: u32,
    pipelines: HashMap<(wgpu::PrimitiveTopology, ColorRate), wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, sample_count: u32) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("easel immediate shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/immediate.wgsl").into()),
        });

        let bind_group_layout = uniform_layout::<TransformUniform>(device, "easel transform bgl", wgpu::ShaderStages::VERTEX);

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Self {
            shader,
            bind_group_layout,
            layout,
            format,
            sample_count,
            pipelines: HashMap::new(),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn get(&mut self, device: &wgpu::Device, topology: wgpu::PrimitiveTopology, rate: ColorRate) -> &wgpu::RenderPipeline {
        let Self {
            shader,
            layout,
            format,
            sample_count,
            pipelines,
            ..
        } = self;

        pipelines.entry((topology, rate)).or_insert_with(|| {
            log::debug!("building pipeline for {topology:?} with {rate:?} color");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("easel immediate pipeline"),
                layout: Some(layout),

                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[
                        stream_layout(&POSITION_ATTRS, wgpu::VertexStepMode::Vertex),
                        stream_layout(&COLOR_ATTRS, rate.step_mode()),
                    ],
                },

                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: *format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),

                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },

                // Depth testing stays off; the depth buffer is only ever cleared.
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: *sample_count,
                    ..Default::default()
                },

                multiview_mask: None,
                cache: None,
            })
        })
    }
}

/// Layout for a single uniform buffer of `T` at binding 0.
fn uniform_layout<T>(device: &wgpu::Device, label: &str, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<T>() as u64),
            },
            count: None,
        }],
    })
}

/// Pipelines that clear under the scissor box by drawing, one per set of
/// written buffers.
pub(super) struct ClearPipelines {
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    sample_count: u32,
    pipelines: HashMap<ClearBuffers, wgpu::RenderPipeline>,
}

impl ClearPipelines {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
        sample_count: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("easel clear shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/clear.wgsl").into()),
        });

        let bind_group_layout = uniform_layout::<ClearUniform>(
            device,
            "easel clear bgl",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("easel clear pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        Self {
            shader,
            bind_group_layout,
            layout,
            format,
            depth_format,
            sample_count,
            pipelines: HashMap::new(),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Pipeline writing exactly `writes`. Depth writes need a depth target.
    pub fn get(&mut self, device: &wgpu::Device, writes: ClearBuffers) -> &wgpu::RenderPipeline {
        let Self {
            shader,
            layout,
            format,
            depth_format,
            sample_count,
            pipelines,
            ..
        } = self;

        pipelines.entry(writes).or_insert_with(|| {
            log::debug!("building clear pipeline for {writes:?}");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("easel clear pipeline"),
                layout: Some(layout),

                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[],
                },

                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: *format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: if writes.color {
                            wgpu::ColorWrites::ALL
                        } else {
                            wgpu::ColorWrites::empty()
                        },
                    })],
                }),

                primitive: wgpu::PrimitiveState::default(),

                depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                    format,
                    depth_write_enabled: writes.depth,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: *sample_count,
                    ..Default::default()
                },

                multiview_mask: None,
                cache: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::Fixed;

    #[test]
    fn positions_are_padded_homogeneously() {
        assert_eq!(expand_position(&[1.0f64, 2.0]), [1.0, 2.0, 0.0, 1.0]);
        assert_eq!(expand_position(&[1.0f64, 2.0, 3.0]), [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(expand_position(&[Fixed::ONE; 4]), [1.0; 4]);
    }

    #[test]
    fn rgb_colors_are_opaque() {
        assert_eq!(expand_color(&[0.5f64, 0.25, 0.0]), [0.5, 0.25, 0.0, 1.0]);
    }

    /// First index of every `size`-vertex primitive in `order`.
    fn leaders(order: &[usize], size: usize) -> Vec<usize> {
        order.chunks(size).map(|p| p[0]).collect()
    }

    #[test]
    fn line_loop_closes_on_the_first_vertex() {
        assert_eq!(assembly_order(PrimitiveKind::LineLoop, 3), [1, 0, 2, 1, 0, 2]);
        assert!(assembly_order(PrimitiveKind::LineLoop, 1).is_empty());
        assert_eq!(topology(PrimitiveKind::LineLoop), wgpu::PrimitiveTopology::LineList);
    }

    #[test]
    fn fan_becomes_a_triangle_list() {
        assert_eq!(assembly_order(PrimitiveKind::TriangleFan, 5), [2, 0, 1, 3, 0, 2, 4, 0, 3]);
        assert!(assembly_order(PrimitiveKind::TriangleFan, 2).is_empty());
        assert!(assembly_order(PrimitiveKind::TriangleFan, 0).is_empty());
    }

    // ── provoking vertex ──────────────────────────────────────────────────

    #[test]
    fn fan_triangles_lead_with_their_last_vertex() {
        assert_eq!(leaders(&assembly_order(PrimitiveKind::TriangleFan, 4), 3), [2, 3]);
    }

    #[test]
    fn triangles_lead_with_their_last_vertex() {
        let order = assembly_order(PrimitiveKind::Triangles, 6);
        assert_eq!(order, [2, 0, 1, 5, 3, 4]);
        assert_eq!(leaders(&order, 3), [2, 5]);
    }

    #[test]
    fn strips_expand_to_lists_led_by_the_newest_vertex() {
        let tris = assembly_order(PrimitiveKind::TriangleStrip, 5);
        assert_eq!(leaders(&tris, 3), [2, 3, 4]);
        // Odd triangles keep the strip's alternating winding.
        assert_eq!(tris, [2, 0, 1, 3, 2, 1, 4, 2, 3]);

        let lines = assembly_order(PrimitiveKind::LineStrip, 4);
        assert_eq!(leaders(&lines, 2), [1, 2, 3]);
        assert_eq!(topology(PrimitiveKind::LineStrip), wgpu::PrimitiveTopology::LineList);
    }

    #[test]
    fn lines_and_loops_lead_with_the_second_endpoint() {
        assert_eq!(leaders(&assembly_order(PrimitiveKind::Lines, 4), 2), [1, 3]);
        assert_eq!(leaders(&assembly_order(PrimitiveKind::LineLoop, 4), 2), [1, 2, 3, 0]);
    }

    #[test]
    fn incomplete_primitives_are_dropped() {
        assert_eq!(assembly_order(PrimitiveKind::Triangles, 7).len(), 6);
        assert_eq!(assembly_order(PrimitiveKind::Lines, 5).len(), 4);
        assert!(assembly_order(PrimitiveKind::TriangleStrip, 2).is_empty());
        assert!(assembly_order(PrimitiveKind::LineStrip, 1).is_empty());
        assert_eq!(assembly_order(PrimitiveKind::Points, 1), [0]);
    }

    // ── scissored clears ──────────────────────────────────────────────────

    #[test]
    fn scissored_clear_covers_only_the_box() {
        let both = ClearBuffers { color: true, depth: true };
        let (writes, rect) = scissored_clear(both, true, PixelRect::new(10, 0, 100, 50), 800, 480).unwrap();
        assert_eq!(writes, both);
        assert_eq!(rect, (10, 430, 100, 50));
    }

    #[test]
    fn scissored_depth_clear_needs_a_depth_target() {
        let depth_only = ClearBuffers { color: false, depth: true };
        assert_eq!(scissored_clear(depth_only, false, PixelRect::new(0, 0, 8, 8), 800, 480), None);

        let both = ClearBuffers { color: true, depth: true };
        let (writes, _) = scissored_clear(both, false, PixelRect::new(0, 0, 8, 8), 800, 480).unwrap();
        assert_eq!(writes, ClearBuffers { color: true, depth: false });
    }

    #[test]
    fn scissor_outside_the_window_clears_nothing() {
        let color = ClearBuffers { color: true, depth: false };
        assert_eq!(scissored_clear(color, true, PixelRect::new(900, 0, 10, 10), 800, 480), None);
    }

    #[test]
    fn fit_lands_in_the_uniform() {
        let fit = ViewportFit {
            x: 0,
            y: 0,
            width: 800,
            height: 480,
            scale: [1.125, 1.0],
            offset: [-0.125, 0.0],
        };
        let u = TransformUniform::default().with_fit(&fit);
        assert_eq!(u.viewport_fit, [1.125, 1.0, -0.125, 0.0]);
        assert_eq!(u.projection, TransformUniform::default().projection);
        assert_eq!(TransformUniform::default().viewport_fit, [1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn uniform_layout_matches_the_shader() {
        assert_eq!(std::mem::size_of::<TransformUniform>(), 160);
        assert_eq!(std::mem::size_of::<ClearUniform>(), 32);
    }
}
