/// The frame currently being recorded.
///
/// Acquired lazily by the first clear or draw after a present and held until
/// the next present. Holding the surface texture prevents acquisition of
/// subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
