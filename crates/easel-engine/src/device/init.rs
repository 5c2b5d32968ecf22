use crate::surface::SurfaceConfig;

/// Initialization parameters for the GPU layer.
///
/// The capability flags are minimums the negotiation tries to meet; see
/// [`negotiate`](super::surface::negotiate) for the fallbacks.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// API set the instance may pick an adapter from.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Ask for a composite alpha mode that keeps the alpha channel.
    pub alpha: bool,

    /// Allocate a depth attachment next to the color target.
    pub depth: bool,

    /// Render with 4x MSAA when the surface format allows it.
    pub multisample: bool,

    /// FIFO presentation when set; otherwise immediate presentation if offered.
    pub double_buffer: bool,

    /// Desired maximum frame latency for a double-buffered surface.
    ///
    /// Single-buffered surfaces always use 1.
    pub desired_maximum_frame_latency: u32,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::PRIMARY,
            power_preference: wgpu::PowerPreference::HighPerformance,
            alpha: false,
            depth: false,
            multisample: false,
            double_buffer: true,
            desired_maximum_frame_latency: 2,
            required_limits: wgpu::Limits::default(),
        }
    }
}

impl GpuInit {
    /// Derives the GPU request from a surface configuration.
    pub fn for_surface(config: &SurfaceConfig, backends: wgpu::Backends) -> Self {
        Self {
            backends,
            alpha: config.alpha,
            depth: config.depth,
            multisample: config.multisample,
            double_buffer: config.double_buffer,
            ..Self::default()
        }
    }
}
