use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::error::OsError;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::ModifiersState;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus as WinitPumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::SurfaceInitError;
use crate::input::{EventPump, PumpStatus, RawButton, RawEvent, Wait};

/// How long one pump may wait for the platform to resume the application.
const WINDOW_POLL: Duration = Duration::from_millis(16);
const WINDOW_ATTEMPTS: usize = 250;

static CLAIMED: AtomicBool = AtomicBool::new(false);

/// Exclusive claim on the display connection for this process.
#[derive(Debug)]
pub(crate) struct ProcessClaim(());

impl ProcessClaim {
    pub(crate) fn acquire() -> Result<Self, SurfaceInitError> {
        CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(()))
            .map_err(|_| SurfaceInitError::AlreadyOpen)
    }
}

impl Drop for ProcessClaim {
    fn drop(&mut self) {
        CLAIMED.store(false, Ordering::Release);
    }
}

/// Pointer state the platform does not repeat on every event.
#[derive(Debug, Default)]
struct PointerState {
    x: i32,
    y: i32,
    modifiers: ModifiersState,
    primary_held: bool,
}

/// [`EventPump`] over a winit event loop driven with `pump_app_events`.
///
/// winit allows one event loop per process, and only once; a surface closed
/// and reopened in the same process fails to reconnect.
pub struct WinitPump {
    event_loop: EventLoop<()>,

    /// Events delivered while waiting for the window to appear.
    backlog: VecDeque<RawEvent>,
    pointer: PointerState,
    pending_window: Option<WindowAttributes>,
    connected: bool,

    _claim: ProcessClaim,
}

impl WinitPump {
    /// Connects to the display server.
    pub fn connect() -> Result<Self, SurfaceInitError> {
        let claim = ProcessClaim::acquire()?;
        let event_loop = EventLoop::new().map_err(|e| SurfaceInitError::Connection(e.to_string()))?;

        log::debug!("connected to display server");

        Ok(Self {
            event_loop,
            backlog: VecDeque::new(),
            pointer: PointerState::default(),
            pending_window: None,
            connected: true,
            _claim: claim,
        })
    }

    /// Creates the window once the platform lets the application run.
    pub fn open_window(&mut self, attrs: WindowAttributes) -> Result<Window, SurfaceInitError> {
        self.pending_window = Some(attrs);

        for _ in 0..WINDOW_ATTEMPTS {
            let mut created = None;
            let status = {
                let mut collector = Collector {
                    queue: &mut self.backlog,
                    pointer: &mut self.pointer,
                    pending_window: &mut self.pending_window,
                    created: &mut created,
                };
                self.event_loop.pump_app_events(Some(WINDOW_POLL), &mut collector)
            };

            if let Some(result) = created {
                return result.map_err(|e| SurfaceInitError::Window(e.to_string()));
            }
            if let WinitPumpStatus::Exit(code) = status {
                self.connected = false;
                return Err(SurfaceInitError::Window(format!(
                    "event loop exited with code {code} before the window was created"
                )));
            }
        }

        self.pending_window = None;
        Err(SurfaceInitError::Window("the platform never resumed the application".to_string()))
    }
}

impl EventPump for WinitPump {
    fn pump(&mut self, wait: Wait, queue: &mut VecDeque<RawEvent>) -> PumpStatus {
        queue.append(&mut self.backlog);

        if !self.connected {
            return PumpStatus::Disconnected;
        }

        let timeout = match wait {
            Wait::Pending => Some(Duration::ZERO),
            Wait::Block => None,
        };

        let mut created = None;
        let mut collector = Collector {
            queue,
            pointer: &mut self.pointer,
            pending_window: &mut self.pending_window,
            created: &mut created,
        };

        match self.event_loop.pump_app_events(timeout, &mut collector) {
            WinitPumpStatus::Continue => PumpStatus::Connected,
            WinitPumpStatus::Exit(code) => {
                log::debug!("event loop exited with code {code}");
                self.connected = false;
                PumpStatus::Disconnected
            }
        }
    }
}

/// Application handler for one pump: appends raw events to `queue`.
struct Collector<'a> {
    queue: &'a mut VecDeque<RawEvent>,
    pointer: &'a mut PointerState,
    pending_window: &'a mut Option<WindowAttributes>,
    created: &'a mut Option<Result<Window, OsError>>,
}

impl Collector<'_> {
    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attrs) = self.pending_window.take() {
            *self.created = Some(event_loop.create_window(attrs));
        }
    }

    fn push(&mut self, ev: RawEvent) {
        self.queue.push_back(ev);
    }
}

impl ApplicationHandler for Collector<'_> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                // winit 0.30: ModifiersChanged carries a wrapper with `.state()`.
                self.pointer.modifiers = m.state();
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = to_device_px(position);
                self.pointer.x = x;
                self.pointer.y = y;
                let primary_held = self.pointer.primary_held;
                self.push(RawEvent::Motion { x, y, primary_held });
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(button);
                let (x, y) = (self.pointer.x, self.pointer.y);
                match state {
                    ElementState::Pressed => {
                        if button == RawButton::Primary {
                            self.pointer.primary_held = true;
                        }
                        let shifted = self.pointer.modifiers.shift_key();
                        self.push(RawEvent::ButtonPress { button, x, y, shifted });
                    }
                    ElementState::Released => {
                        if button == RawButton::Primary {
                            self.pointer.primary_held = false;
                        }
                        self.push(RawEvent::ButtonRelease { button, x, y });
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(button) = wheel_button(delta) {
                    let (x, y) = (self.pointer.x, self.pointer.y);
                    let shifted = self.pointer.modifiers.shift_key();
                    self.push(RawEvent::ButtonPress { button, x, y, shifted });
                }
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.push(RawEvent::KeyPress);
            }

            WindowEvent::Resized(size) => self.push(RawEvent::Configure {
                width: size.width,
                height: size.height,
            }),

            WindowEvent::RedrawRequested => self.push(RawEvent::Expose),

            WindowEvent::CloseRequested => self.push(RawEvent::CloseRequested),

            _ => {}
        }
    }
}

fn to_device_px(pos: PhysicalPosition<f64>) -> (i32, i32) {
    (pos.x.floor() as i32, pos.y.floor() as i32)
}

fn map_mouse_button(b: WinitMouseButton) -> RawButton {
    match b {
        WinitMouseButton::Left => RawButton::Primary,
        WinitMouseButton::Right => RawButton::Secondary,
        WinitMouseButton::Middle => RawButton::Tertiary,
        // X11 numbers the side buttons 8 and 9.
        WinitMouseButton::Back => RawButton::Other(8),
        WinitMouseButton::Forward => RawButton::Other(9),
        WinitMouseButton::Other(v) => RawButton::Other(v),
    }
}

/// Wheel motion as the button press X11 reports for it; no release follows.
fn wheel_button(delta: MouseScrollDelta) -> Option<RawButton> {
    let y = match delta {
        MouseScrollDelta::LineDelta(_, y) => f64::from(y),
        MouseScrollDelta::PixelDelta(p) => p.y,
    };
    if y > 0.0 {
        Some(RawButton::WheelUp)
    } else if y < 0.0 {
        Some(RawButton::WheelDown)
    } else {
        None
    }
}
