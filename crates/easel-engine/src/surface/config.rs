/// What the host asks for when opening a surface.
///
/// Capabilities are best-effort minimums; see
/// [`GpuInit`](crate::device::GpuInit) for how each one is met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub title: String,
    pub depth: bool,
    pub alpha: bool,
    pub double_buffer: bool,
    pub multisample: bool,
    /// Physical pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            title: "easel".to_string(),
            depth: false,
            alpha: false,
            double_buffer: true,
            multisample: false,
            width: 800,
            height: 480,
        }
    }
}

impl SurfaceConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_depth(mut self, depth: bool) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_double_buffer(mut self, double_buffer: bool) -> Self {
        self.double_buffer = double_buffer;
        self
    }

    pub fn with_multisample(mut self, multisample: bool) -> Self {
        self.multisample = multisample;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}
