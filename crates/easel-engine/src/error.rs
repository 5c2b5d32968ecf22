//! Error taxonomy.
//!
//! - [`SurfaceInitError`]: fatal, returned synchronously from `open`.
//! - [`InvalidArgument`]: malformed shapes rejected before any driver call.
//! - [`DriverError`]: reported by the GPU after a call; logged and kept, never thrown.

use std::fmt;

/// Failure while establishing the connection/window/context triple.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceInitError {
    #[error("cannot connect to the display server: {0}")]
    Connection(String),

    #[error("cannot create window: {0}")]
    Window(String),

    #[error("no pixel format matches the requested capabilities: {0}")]
    PixelFormat(String),

    #[error("cannot create or activate the rendering context: {0}")]
    Context(String),

    #[error("a surface is already open in this process")]
    AlreadyOpen,
}

/// A buffer, matrix or rectangle with an unusable shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidArgument {
    #[error("vertex dimension {0} is outside 2..=4")]
    VertexDimension(usize),

    #[error("color dimension {0} is neither 3 nor 4")]
    ColorDimension(usize),

    #[error("buffer of {len} values is not a whole number of {dim}-tuples")]
    Ragged { len: usize, dim: usize },

    #[error("{colors} colors supplied for {vertices} vertices")]
    ColorCount { vertices: usize, colors: usize },

    #[error("matrix needs 16 values, got {0}")]
    MatrixShape(usize),

    #[error("rectangle has negative size {width}x{height}")]
    NegativeSize { width: i32, height: i32 },
}

/// Error code reported by the graphics driver after a call.
///
/// Results produced by the failing call are undefined; the surface stays usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    pub kind: DriverErrorKind,
    pub message: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DriverErrorKind {
    Validation,
    OutOfMemory,
    Surface,
    Internal,
}

impl DriverError {
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} driver error: {}", self.kind, self.message)
    }
}

impl std::error::Error for DriverError {}

/// Umbrella error for boundary calls made through a [`Session`](crate::surface::Session).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("no surface is open")]
    NotOpen,

    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
}
