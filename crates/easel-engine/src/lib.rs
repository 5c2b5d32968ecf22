//! Easel engine crate.
//!
//! Immediate-mode drawing on a single native window: one display connection,
//! one window and one rendering context per process, driven from a host that
//! owns the frame loop.
//!
//! - [`surface`]: the bound triple and the host-facing [`Session`](surface::Session)
//! - [`input`]: platform event pumping, classification and coalescing
//! - [`state`] and [`render`]: clear-state cache, transforms, validated draws
//! - [`device`]: the [`Driver`](device::Driver) protocol and its wgpu implementation
//! - [`backend`]: the desktop (`f64`) and embedded (16.16 fixed-point) profiles

pub mod backend;
pub mod device;
pub mod error;
pub mod host;
pub mod input;
pub mod logging;
pub mod numeric;
pub mod render;
pub mod state;
pub mod surface;

pub use error::{DriverError, Error, InvalidArgument, SurfaceInitError};
