//! Platform backends.
//!
//! A backend fixes the numeric domain exchanged with the host and knows how to
//! bring up a driver plus an event pump for a [`SurfaceConfig`].

use std::marker::PhantomData;

use raw_window_handle::{HasDisplayHandle, RawDisplayHandle};
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowAttributes};

use crate::device::{Driver, GpuInit, RecordingDriver, WgpuDriver};
use crate::error::SurfaceInitError;
use crate::input::{EventPump, ScriptedPump, WinitPump};
use crate::numeric::{Fixed, Scalar};
use crate::surface::SurfaceConfig;

#[cfg(all(feature = "desktop", feature = "embedded"))]
compile_error!("features `desktop` and `embedded` are mutually exclusive");

/// Backend selected by the enabled cargo feature.
#[cfg(all(feature = "desktop", not(feature = "embedded")))]
pub type ActiveBackend = Desktop;

/// Backend selected by the enabled cargo feature.
#[cfg(all(feature = "embedded", not(feature = "desktop")))]
pub type ActiveBackend = Embedded;

pub trait Backend {
    type Scalar: Scalar;
    type Driver: Driver<Scalar = Self::Scalar>;
    type Pump: EventPump;

    const NAME: &'static str;

    /// Connects, creates the window and binds a context to it.
    ///
    /// On error everything created so far has been released.
    fn connect(config: &SurfaceConfig) -> Result<(Self::Driver, Self::Pump), SurfaceInitError>;
}

/// Windowed desktop profile: `f64` values, any primary GPU API.
#[derive(Debug, Copy, Clone, Default)]
pub struct Desktop;

impl Backend for Desktop {
    type Scalar = f64;
    type Driver = WgpuDriver<f64>;
    type Pump = WinitPump;

    const NAME: &'static str = "desktop";

    fn connect(config: &SurfaceConfig) -> Result<(Self::Driver, Self::Pump), SurfaceInitError> {
        let init = GpuInit::for_surface(config, wgpu::Backends::PRIMARY);
        connect_winit(window_attributes(config), init)
    }
}

/// Fullscreen embedded profile: 16.16 fixed-point values over GLES.
#[derive(Debug, Copy, Clone, Default)]
pub struct Embedded;

impl Backend for Embedded {
    type Scalar = Fixed;
    type Driver = WgpuDriver<Fixed>;
    type Pump = WinitPump;

    const NAME: &'static str = "embedded";

    fn connect(config: &SurfaceConfig) -> Result<(Self::Driver, Self::Pump), SurfaceInitError> {
        let init = GpuInit {
            power_preference: wgpu::PowerPreference::LowPower,
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            ..GpuInit::for_surface(config, wgpu::Backends::GL)
        };

        let attrs = window_attributes(config).with_fullscreen(Some(winit::window::Fullscreen::Borderless(None)));

        #[cfg(target_os = "linux")]
        let attrs = {
            use winit::platform::x11::WindowAttributesExtX11;
            attrs.with_override_redirect(false)
        };

        connect_winit(attrs, init)
    }
}

/// No display: records driver calls and replays scripted input.
pub struct Headless<N>(PhantomData<N>);

impl<N: Scalar> Backend for Headless<N> {
    type Scalar = N;
    type Driver = RecordingDriver<N>;
    type Pump = ScriptedPump;

    const NAME: &'static str = "headless";

    fn connect(config: &SurfaceConfig) -> Result<(Self::Driver, Self::Pump), SurfaceInitError> {
        Ok((RecordingDriver::with_size(config.width, config.height), ScriptedPump::new()))
    }
}

fn window_attributes(config: &SurfaceConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(config.width, config.height))
}

fn connect_winit<N: Scalar>(attrs: WindowAttributes, init: GpuInit) -> Result<(WgpuDriver<N>, WinitPump), SurfaceInitError> {
    let mut pump = WinitPump::connect()?;
    let window = pump.open_window(attrs)?;
    log::debug!("window created on {}", display_kind(&window));

    let driver = WgpuDriver::new(window, init)?;
    Ok((driver, pump))
}

fn display_kind(window: &Window) -> &'static str {
    match window.display_handle().map(|h| h.as_raw()) {
        Ok(RawDisplayHandle::Xlib(_) | RawDisplayHandle::Xcb(_)) => "X11",
        Ok(RawDisplayHandle::Wayland(_)) => "Wayland",
        Ok(RawDisplayHandle::Windows(_)) => "Win32",
        Ok(RawDisplayHandle::AppKit(_)) => "AppKit",
        Ok(_) => "another display server",
        Err(_) => "an unknown display",
    }
}
