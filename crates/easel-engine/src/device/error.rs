use crate::error::{DriverError, DriverErrorKind};

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; acquiring again may succeed.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM).
    Fatal,
}

/// Classifies an error reported on wgpu's uncaptured-error channel.
pub(crate) fn driver_error(err: &wgpu::Error) -> DriverError {
    let kind = match err {
        wgpu::Error::OutOfMemory { .. } => DriverErrorKind::OutOfMemory,
        wgpu::Error::Validation { .. } => DriverErrorKind::Validation,
        _ => DriverErrorKind::Internal,
    };
    DriverError::new(kind, err.to_string())
}

/// Turns a failed frame acquisition into a reportable driver error.
pub(crate) fn surface_driver_error(err: &wgpu::SurfaceError, action: SurfaceErrorAction) -> DriverError {
    let kind = match action {
        SurfaceErrorAction::Fatal => DriverErrorKind::OutOfMemory,
        _ => DriverErrorKind::Surface,
    };
    DriverError::new(kind, format!("cannot acquire frame: {err}"))
}
