//! GPU device + surface management.
//!
//! This module is responsible for:
//! - the [`Driver`] protocol the rest of the crate talks to
//! - creating the wgpu Instance/Adapter/Device/Queue and negotiating the surface
//! - recording clears and draws into lazily acquired frames

mod driver;
mod error;
mod frame;
mod gpu;
mod init;
mod pipeline;
mod recording;
mod surface;
mod wgpu_driver;

pub use driver::{ClearBuffers, DrawCall, Driver};
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
pub use recording::{DriverCall, RecordedColors, RecordedDraw, RecordingDriver};
pub use surface::Negotiated;
pub use wgpu_driver::WgpuDriver;
