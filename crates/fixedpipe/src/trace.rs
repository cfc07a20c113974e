//! Recording device backend.
//!
//! [`RecordingDevice`] implements [`NativeDevice`] by appending every call to
//! a [`DeviceCall`] log. Tests assert on the log to pin down commit ordering
//! and gating without a real device; it also works as a tracing shim in front
//! of a backend under bring-up.

use crate::device::{
    BufferId, BufferKind, ClearFlags, DeviceError, IndexFormat, NativeDevice, RenderState,
    UploadMode,
};
use crate::mesh::VertexFormat;
use crate::state::lights::Light;
use crate::state::topology::PrimitiveType;
use crate::state::tss::TextureStageState;
use crate::state::{MaterialProperties, PackedColor, Viewport};

/// One recorded [`NativeDevice`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    RenderState(RenderState),
    TextureStage {
        stage: usize,
        state: TextureStageState,
    },
    DisableTextureStagesFrom {
        first_stage: usize,
    },
    Material(MaterialProperties),
    SetLight {
        index: usize,
        light: Light,
    },
    LightEnable {
        index: usize,
        enabled: bool,
    },
    Viewport(Viewport),
    Clear {
        flags: ClearFlags,
        color: PackedColor,
        depth: f32,
        stencil: u32,
    },
    CreateVertexBuffer {
        id: BufferId,
        size_bytes: usize,
        kind: BufferKind,
    },
    CreateIndexBuffer {
        id: BufferId,
        size_bytes: usize,
        format: IndexFormat,
        kind: BufferKind,
    },
    DestroyBuffer {
        id: BufferId,
    },
    UploadBuffer {
        id: BufferId,
        offset: usize,
        data: Vec<u8>,
        mode: UploadMode,
    },
    StreamSource {
        id: BufferId,
        stride: usize,
    },
    Indices {
        id: BufferId,
        format: IndexFormat,
    },
    SetVertexFormat(VertexFormat),
    DrawIndexed {
        primitive: PrimitiveType,
        num_vertices: usize,
        first_index: usize,
        primitive_count: usize,
    },
}

/// [`NativeDevice`] that records calls instead of executing them.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    next_buffer_id: u64,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn next_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next_buffer_id);
        self.next_buffer_id += 1;
        id
    }
}

impl NativeDevice for RecordingDevice {
    fn set_render_state(&mut self, state: RenderState) {
        self.calls.push(DeviceCall::RenderState(state));
    }

    fn set_texture_stage(&mut self, stage: usize, state: &TextureStageState) {
        self.calls.push(DeviceCall::TextureStage {
            stage,
            state: *state,
        });
    }

    fn disable_texture_stages_from(&mut self, first_stage: usize) {
        self.calls
            .push(DeviceCall::DisableTextureStagesFrom { first_stage });
    }

    fn set_material(&mut self, material: &MaterialProperties) {
        self.calls.push(DeviceCall::Material(*material));
    }

    fn set_light(&mut self, index: usize, light: &Light) {
        self.calls.push(DeviceCall::SetLight {
            index,
            light: *light,
        });
    }

    fn light_enable(&mut self, index: usize, enabled: bool) {
        self.calls.push(DeviceCall::LightEnable { index, enabled });
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.calls.push(DeviceCall::Viewport(*viewport));
    }

    fn clear(&mut self, flags: ClearFlags, color: PackedColor, depth: f32, stencil: u32) {
        self.calls.push(DeviceCall::Clear {
            flags,
            color,
            depth,
            stencil,
        });
    }

    fn create_vertex_buffer(
        &mut self,
        size_bytes: usize,
        kind: BufferKind,
    ) -> Result<BufferId, DeviceError> {
        let id = self.next_buffer();
        self.calls.push(DeviceCall::CreateVertexBuffer {
            id,
            size_bytes,
            kind,
        });
        Ok(id)
    }

    fn create_index_buffer(
        &mut self,
        size_bytes: usize,
        format: IndexFormat,
        kind: BufferKind,
    ) -> Result<BufferId, DeviceError> {
        let id = self.next_buffer();
        self.calls.push(DeviceCall::CreateIndexBuffer {
            id,
            size_bytes,
            format,
            kind,
        });
        Ok(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.calls.push(DeviceCall::DestroyBuffer { id: buffer });
    }

    fn upload_buffer(
        &mut self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
        mode: UploadMode,
    ) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::UploadBuffer {
            id: buffer,
            offset,
            data: data.to_vec(),
            mode,
        });
        Ok(())
    }

    fn set_stream_source(&mut self, buffer: BufferId, stride: usize) {
        self.calls.push(DeviceCall::StreamSource {
            id: buffer,
            stride,
        });
    }

    fn set_indices(&mut self, buffer: BufferId, format: IndexFormat) {
        self.calls.push(DeviceCall::Indices { id: buffer, format });
    }

    fn set_vertex_format(&mut self, format: VertexFormat) {
        self.calls.push(DeviceCall::SetVertexFormat(format));
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        num_vertices: usize,
        first_index: usize,
        primitive_count: usize,
    ) {
        self.calls.push(DeviceCall::DrawIndexed {
            primitive,
            num_vertices,
            first_index,
            primitive_count,
        });
    }
}
