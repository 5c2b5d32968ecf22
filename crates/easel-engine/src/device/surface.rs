use winit::dpi::PhysicalSize;

use crate::error::SurfaceInitError;

use super::{GpuInit, SurfaceErrorAction};

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

const MSAA_SAMPLES: u32 = 4;

/// What the surface offers, as seen by the negotiation.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Offer<'a> {
    pub formats: &'a [wgpu::TextureFormat],
    pub present_modes: &'a [wgpu::PresentMode],
    pub alpha_modes: &'a [wgpu::CompositeAlphaMode],
}

impl<'a> From<&'a wgpu::SurfaceCapabilities> for Offer<'a> {
    fn from(caps: &'a wgpu::SurfaceCapabilities) -> Self {
        Self {
            formats: &caps.formats,
            present_modes: &caps.present_modes,
            alpha_modes: &caps.alpha_modes,
        }
    }
}

/// Surface parameters settled on at open time.
#[derive(Debug, Clone, PartialEq)]
pub struct Negotiated {
    pub format: wgpu::TextureFormat,
    pub alpha_mode: wgpu::CompositeAlphaMode,
    pub present_mode: wgpu::PresentMode,
    pub frame_latency: u32,
    pub sample_count: u32,
    pub depth_format: Option<wgpu::TextureFormat>,
}

/// Meets the requested capabilities as best-effort minimums.
///
/// Only a surface without any color format fails; everything else falls back
/// with a warning. `format_features` reports what the adapter supports for a
/// candidate color format.
pub(crate) fn negotiate(
    init: &GpuInit,
    offer: Offer<'_>,
    format_features: impl FnOnce(wgpu::TextureFormat) -> wgpu::TextureFormatFeatureFlags,
) -> Result<Negotiated, SurfaceInitError> {
    let format = choose_surface_format(offer.formats).ok_or_else(|| {
        SurfaceInitError::PixelFormat("the surface offers no color formats".to_string())
    })?;

    let (present_mode, frame_latency) = choose_present_mode(offer.present_modes, init);

    Ok(Negotiated {
        format,
        alpha_mode: choose_alpha_mode(offer.alpha_modes, init.alpha),
        present_mode,
        frame_latency,
        sample_count: choose_sample_count(format_features(format), init.multisample),
        depth_format: init.depth.then_some(DEPTH_FORMAT),
    })
}

/// Prefers a linear 8-bit format: host colors are written as given, with no
/// encoding on store.
fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    let preferred = [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Rgba8Unorm];
    preferred
        .into_iter()
        .find(|f| formats.contains(f))
        .or_else(|| formats.iter().copied().find(|f| !f.is_srgb()))
        .or_else(|| formats.first().copied())
}

fn choose_alpha_mode(modes: &[wgpu::CompositeAlphaMode], alpha: bool) -> wgpu::CompositeAlphaMode {
    use wgpu::CompositeAlphaMode as M;

    if alpha {
        let keeps_alpha = [M::PreMultiplied, M::PostMultiplied, M::Inherit];
        if let Some(mode) = keeps_alpha.into_iter().find(|m| modes.contains(m)) {
            return mode;
        }
        log::warn!("no composite alpha mode keeps the alpha channel; window will be opaque");
    }

    if modes.contains(&M::Opaque) {
        M::Opaque
    } else {
        modes.first().copied().unwrap_or(M::Auto)
    }
}

fn choose_present_mode(modes: &[wgpu::PresentMode], init: &GpuInit) -> (wgpu::PresentMode, u32) {
    if init.double_buffer {
        return (wgpu::PresentMode::Fifo, init.desired_maximum_frame_latency);
    }
    if modes.contains(&wgpu::PresentMode::Immediate) {
        (wgpu::PresentMode::Immediate, 1)
    } else {
        log::warn!("immediate presentation unavailable; single-buffered surface uses FIFO");
        (wgpu::PresentMode::Fifo, 1)
    }
}

fn choose_sample_count(flags: wgpu::TextureFormatFeatureFlags, multisample: bool) -> u32 {
    if !multisample {
        return 1;
    }
    if flags.sample_count_supported(MSAA_SAMPLES) && flags.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE) {
        MSAA_SAMPLES
    } else {
        log::warn!("{MSAA_SAMPLES}x multisampling unsupported for the surface format; rendering without it");
        1
    }
}

pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;

    surface.configure(device, config);
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: &wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}
