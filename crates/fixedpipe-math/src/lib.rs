//! Small fixed-function-era 3D math library.
//!
//! Replacement for the vendor math helpers the renderer used to link against:
//! row-major matrices with the row-vector convention (`v' = v * M`), `f32`
//! throughout, no SIMD. The operation set is exactly what the fixed-function
//! pipeline needs: projection/translation matrix builders, Gauss-Jordan
//! inversion, vector and plane transforms, and a matrix stack for
//! hierarchical transforms.

mod matrix;
mod plane;
mod stack;
mod vector;

pub use matrix::Mat4;
pub use plane::Plane;
pub use stack::MatrixStack;
pub use vector::{Vec3, Vec4};
