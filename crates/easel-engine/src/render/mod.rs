mod buffer;
mod dispatch;
mod primitive;

pub use buffer::{ColorBuffer, ColorSpec, ColorStream, Tuples, VertexBuffer};
pub use dispatch::{ClientState, Dispatcher};
pub use primitive::PrimitiveKind;
