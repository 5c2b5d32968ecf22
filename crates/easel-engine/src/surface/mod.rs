//! The bound connection/window/context triple and the process boundary
//! built on it.

mod config;
mod context;
mod session;

pub use config::SurfaceConfig;
pub use context::Surface;
pub use session::Session;
