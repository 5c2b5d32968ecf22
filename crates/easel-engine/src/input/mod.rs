//! Input subsystem.
//!
//! Public event types are platform-agnostic and do not expose winit types.
//! A platform pump delivers [`RawEvent`]s; the [`EventTranslator`] turns them
//! into [`InputEvent`]s.

mod platform;
mod pump;
mod translator;
mod types;

pub use platform::winit::WinitPump;
pub use pump::{EventPump, PumpStatus, ScriptedPump, Wait};
pub use translator::EventTranslator;
pub use types::{EventClass, InputEvent, RawButton, RawEvent};
