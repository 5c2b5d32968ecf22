/// How a vertex stream is assembled into primitives.
///
/// Declaration order matches the integer tags hosts pass across the boundary.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
    Points,
    LineStrip,
    LineLoop,
    Lines,
    TriangleStrip,
    TriangleFan,
    Triangles,
}

impl PrimitiveKind {
    pub const ALL: [Self; 7] = [
        Self::Points,
        Self::LineStrip,
        Self::LineLoop,
        Self::Lines,
        Self::TriangleStrip,
        Self::TriangleFan,
        Self::Triangles,
    ];

    /// Maps a boundary tag (`0..=6`) to a kind.
    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.get(tag as usize).copied()
    }

    pub fn tag(self) -> u32 {
        self as u32
    }
}
