//! The native device contract.
//!
//! [`NativeDevice`] is the narrow waist between the state/mesh layers and
//! whatever actually executes rendering. It is deliberately shaped like the
//! D3D9 fixed-function entry points the commit path needs and nothing more:
//! render states as a typed enum, whole texture stages, a single trailing
//! stage-disable call, and an indexed draw path over opaque buffer handles.

use thiserror::Error;

use crate::mesh::VertexFormat;
use crate::state::lights::Light;
use crate::state::topology::PrimitiveType;
use crate::state::tss::TextureStageState;
use crate::state::{
    BlendFactor, CompareFunc, CullMode, FogMode, MaterialProperties, PackedColor, ShadeMode,
    Viewport,
};

/// Opaque handle to a device-side buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u64);

/// Placement/update policy a buffer was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Rewritten every frame or more.
    Dynamic,
    /// Filled once, drawn many times.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    pub const fn index_size(self) -> usize {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// How an upload interacts with data the GPU may still be reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadMode {
    /// Plain write; the device may stall until prior draws finish.
    Default,
    /// The entire previous contents may be orphaned.
    Discard,
    /// The caller promises not to touch bytes in flight.
    NoOverwrite,
}

bitflags::bitflags! {
    /// Buffer selection for [`NativeDevice::clear`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const TARGET = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// One fixed-function render state and its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderState {
    DepthEnable(bool),
    DepthWriteEnable(bool),
    DepthFunc(CompareFunc),
    AlphaBlendEnable(bool),
    SrcBlend(BlendFactor),
    DestBlend(BlendFactor),
    CullMode(CullMode),
    Lighting(bool),
    Ambient(PackedColor),
    ShadeMode(ShadeMode),
    FogEnable(bool),
    FogColor(PackedColor),
    FogMode(FogMode),
    FogStart(f32),
    FogEnd(f32),
    FogDensity(f32),
    AlphaTestEnable(bool),
    AlphaRef(u8),
    AlphaFunc(CompareFunc),
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no device available")]
    DeviceUnavailable,
    #[error("out of device memory allocating {size_bytes} bytes")]
    OutOfMemory { size_bytes: usize },
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),
}

/// Device backend the pipeline drives.
///
/// Implementations must tolerate redundant calls; the commit path re-pushes
/// whole sections rather than diffing individual values.
pub trait NativeDevice {
    fn set_render_state(&mut self, state: RenderState);

    /// Configures one texture stage in full.
    fn set_texture_stage(&mut self, stage: usize, state: &TextureStageState);

    /// Disables `first_stage` and every stage after it.
    fn disable_texture_stages_from(&mut self, first_stage: usize);

    fn set_material(&mut self, material: &MaterialProperties);

    fn set_light(&mut self, index: usize, light: &Light);

    fn light_enable(&mut self, index: usize, enabled: bool);

    fn set_viewport(&mut self, viewport: &Viewport);

    fn clear(&mut self, flags: ClearFlags, color: PackedColor, depth: f32, stencil: u32);

    fn create_vertex_buffer(
        &mut self,
        size_bytes: usize,
        kind: BufferKind,
    ) -> Result<BufferId, DeviceError>;

    fn create_index_buffer(
        &mut self,
        size_bytes: usize,
        format: IndexFormat,
        kind: BufferKind,
    ) -> Result<BufferId, DeviceError>;

    fn destroy_buffer(&mut self, buffer: BufferId);

    fn upload_buffer(
        &mut self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
        mode: UploadMode,
    ) -> Result<(), DeviceError>;

    fn set_stream_source(&mut self, buffer: BufferId, stride: usize);

    fn set_indices(&mut self, buffer: BufferId, format: IndexFormat);

    fn set_vertex_format(&mut self, format: VertexFormat);

    /// Draws `primitive_count` primitives reading `num_vertices` vertices
    /// starting at index `first_index`.
    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        num_vertices: usize,
        first_index: usize,
        primitive_count: usize,
    );
}
