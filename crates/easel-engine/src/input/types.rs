/// Application-facing input event.
///
/// Coordinates are device pixels with a top-left origin. `window_width` and
/// `window_height` snapshot the tracked surface size when the event was built.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InputEvent {
    Click {
        x: i32,
        y: i32,
        window_width: u32,
        window_height: u32,
        shifted: bool,
    },
    Unclick {
        x: i32,
        y: i32,
        window_width: u32,
        window_height: u32,
    },
    Zoom {
        x: i32,
        y: i32,
        window_width: u32,
        window_height: u32,
        shifted: bool,
    },
    /// Never carries a modifier flag.
    Unzoom {
        x: i32,
        y: i32,
        window_width: u32,
        window_height: u32,
    },
    /// Pointer motion, whether or not a button is held.
    Move {
        x: i32,
        y: i32,
        window_width: u32,
        window_height: u32,
    },
    Resize {
        width: u32,
        height: u32,
    },
}

/// Pointer button as reported by the platform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RawButton {
    Primary,
    Secondary,
    Tertiary,
    WheelUp,
    WheelDown,
    Other(u16),
}

/// Platform event as queued, before classification.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RawEvent {
    Motion { x: i32, y: i32, primary_held: bool },
    ButtonPress { button: RawButton, x: i32, y: i32, shifted: bool },
    ButtonRelease { button: RawButton, x: i32, y: i32 },
    /// Part of the window needs repainting.
    Expose,
    /// The window manager reports the window's current geometry.
    Configure { width: u32, height: u32 },
    KeyPress,
    CloseRequested,
}

/// Coarse platform class used for burst coalescing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EventClass {
    Motion,
    ButtonPress,
    ButtonRelease,
    Expose,
    Configure,
    KeyPress,
    CloseRequested,
}

impl EventClass {
    /// Classes that arrive in bursts and collapse to their latest member.
    pub fn coalesces(self) -> bool {
        matches!(self, Self::Motion | Self::Expose | Self::Configure)
    }
}

impl RawEvent {
    pub fn class(&self) -> EventClass {
        match self {
            Self::Motion { .. } => EventClass::Motion,
            Self::ButtonPress { .. } => EventClass::ButtonPress,
            Self::ButtonRelease { .. } => EventClass::ButtonRelease,
            Self::Expose => EventClass::Expose,
            Self::Configure { .. } => EventClass::Configure,
            Self::KeyPress => EventClass::KeyPress,
            Self::CloseRequested => EventClass::CloseRequested,
        }
    }
}
