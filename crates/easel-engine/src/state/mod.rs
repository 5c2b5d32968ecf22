//! CPU-side mirror of fixed-function state.

mod clear;
mod transform;
mod viewport;

pub use clear::ClearCache;
pub use transform::{Matrix4, MatrixMode, PipelineState};
pub use viewport::{PixelRect, ViewportFit};
