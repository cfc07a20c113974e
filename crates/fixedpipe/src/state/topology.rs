//! Primitive topology and index-to-primitive arithmetic.

use std::fmt;

/// Primitive topologies a mesh can be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    Points,
    Lines,
    LineStrip,
    #[default]
    Triangles,
    TriangleStrip,
}

impl PrimitiveType {
    /// Number of primitives a run of `index_count` indices produces. Runs too
    /// short to form a complete primitive yield zero.
    pub fn primitive_count(self, index_count: usize) -> usize {
        match self {
            PrimitiveType::Points => index_count,
            PrimitiveType::Lines => index_count / 2,
            PrimitiveType::LineStrip => index_count.saturating_sub(1),
            PrimitiveType::Triangles => index_count / 3,
            PrimitiveType::TriangleStrip => index_count.saturating_sub(2),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::Points => "points",
            PrimitiveType::Lines => "lines",
            PrimitiveType::LineStrip => "line strip",
            PrimitiveType::Triangles => "triangles",
            PrimitiveType::TriangleStrip => "triangle strip",
        };
        f.write_str(name)
    }
}
