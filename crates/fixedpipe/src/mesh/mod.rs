//! Meshes and the buffer/mesh manager.
//!
//! A [`Mesh`] is a lightweight binding of one vertex buffer, one index buffer,
//! a vertex format and a topology; drawing walks a list of index ranges and
//! issues one indexed draw per non-empty range. The [`MeshManager`] owns all
//! buffers and meshes behind plain handles and keeps the shared dynamic
//! buffer pair that immediate-mode geometry streams through.

mod buffers;

pub use buffers::{
    IndexBuffer, IndexWriter, MeshError, StandardVertex, VertexBuffer, VertexFormat, VertexWriter,
    MAX_TEXCOORD_SETS,
};

use tracing::{debug, warn};

use crate::device::{BufferKind, IndexFormat, NativeDevice};
use crate::state::topology::PrimitiveType;

/// Vertex capacity of the shared dynamic vertex buffer.
pub const DYNAMIC_VERTEX_COUNT: usize = 32768;
/// Index capacity of the shared dynamic index buffer (16-bit indices).
pub const DYNAMIC_INDEX_COUNT: usize = 32768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(usize);

/// Contiguous run of indices to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub first_index: usize,
    pub index_count: usize,
}

/// Binding of buffers, format and topology; the unit of drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mesh {
    pub vertex_buffer: Option<VertexBufferHandle>,
    pub index_buffer: Option<IndexBufferHandle>,
    pub primitive_type: PrimitiveType,
    pub vertex_format: VertexFormat,
}

impl Mesh {
    fn new(vertex_format: VertexFormat) -> Self {
        Mesh {
            vertex_buffer: None,
            index_buffer: None,
            primitive_type: PrimitiveType::Triangles,
            vertex_format,
        }
    }
}

/// Paired vertex/index writers from [`MeshManager::lock_mesh`].
#[derive(Debug)]
pub struct MeshWriter<'a> {
    pub vertices: VertexWriter<'a>,
    pub indices: IndexWriter<'a>,
}

/// Owner of all buffers and meshes.
///
/// Resources live behind copyable handles; destroyed slots stay occupied so
/// handles are never reused. [`MeshManager::init`] builds the dynamic buffer
/// pair and the dynamic mesh, [`MeshManager::shutdown`] releases everything.
#[derive(Debug, Default)]
pub struct MeshManager {
    vertex_buffers: Vec<Option<VertexBuffer>>,
    index_buffers: Vec<Option<IndexBuffer>>,
    meshes: Vec<Option<Mesh>>,
    dynamic_vertex_buffer: Option<VertexBufferHandle>,
    dynamic_index_buffer: Option<IndexBufferHandle>,
    dynamic_mesh: Option<MeshHandle>,
}

impl MeshManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the shared dynamic buffers and mesh. Called when a device is
    /// attached; calling again after a prior init re-creates them.
    pub fn init(&mut self, mut device: Option<&mut (dyn NativeDevice + '_)>) {
        debug!(
            vertices = DYNAMIC_VERTEX_COUNT,
            indices = DYNAMIC_INDEX_COUNT,
            "creating dynamic mesh buffers"
        );
        if self.dynamic_mesh.is_some() {
            self.release_dynamic(device.as_deref_mut());
        }
        let vb = self.create_vertex_buffer(
            BufferKind::Dynamic,
            VertexFormat::STANDARD,
            DYNAMIC_VERTEX_COUNT,
            device.as_deref_mut(),
        );
        let ib = self.create_index_buffer(
            BufferKind::Dynamic,
            IndexFormat::U16,
            DYNAMIC_INDEX_COUNT,
            device,
        );
        let mesh = self.create_mesh(VertexFormat::STANDARD);
        self.set_mesh_buffers(mesh, Some(vb), Some(ib));
        self.dynamic_vertex_buffer = Some(vb);
        self.dynamic_index_buffer = Some(ib);
        self.dynamic_mesh = Some(mesh);
    }

    fn release_dynamic(&mut self, mut device: Option<&mut (dyn NativeDevice + '_)>) {
        if let Some(vb) = self.dynamic_vertex_buffer.take() {
            self.destroy_vertex_buffer(vb, device.as_deref_mut());
        }
        if let Some(ib) = self.dynamic_index_buffer.take() {
            self.destroy_index_buffer(ib, device);
        }
        if let Some(mesh) = self.dynamic_mesh.take() {
            self.destroy_mesh(mesh);
        }
    }

    /// Releases every buffer and mesh, device-side buffers included.
    pub fn shutdown(&mut self, mut device: Option<&mut (dyn NativeDevice + '_)>) {
        debug!("releasing mesh buffers");
        for slot in &mut self.vertex_buffers {
            if let Some(vb) = slot.as_mut() {
                vb.destroy(device.as_deref_mut());
            }
            *slot = None;
        }
        for slot in &mut self.index_buffers {
            if let Some(ib) = slot.as_mut() {
                ib.destroy(device.as_deref_mut());
            }
            *slot = None;
        }
        self.vertex_buffers.clear();
        self.index_buffers.clear();
        self.meshes.clear();
        self.dynamic_vertex_buffer = None;
        self.dynamic_index_buffer = None;
        self.dynamic_mesh = None;
    }

    // ---- buffers --------------------------------------------------------

    pub fn create_vertex_buffer(
        &mut self,
        kind: BufferKind,
        format: VertexFormat,
        count: usize,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) -> VertexBufferHandle {
        let buffer = VertexBuffer::create(kind, format, count, device);
        let handle = VertexBufferHandle(self.vertex_buffers.len());
        self.vertex_buffers.push(Some(buffer));
        handle
    }

    pub fn create_index_buffer(
        &mut self,
        kind: BufferKind,
        format: IndexFormat,
        count: usize,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) -> IndexBufferHandle {
        let buffer = IndexBuffer::create(kind, format, count, device);
        let handle = IndexBufferHandle(self.index_buffers.len());
        self.index_buffers.push(Some(buffer));
        handle
    }

    pub fn destroy_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        match self.vertex_buffers.get_mut(handle.0) {
            Some(slot) => {
                if let Some(vb) = slot.as_mut() {
                    vb.destroy(device);
                }
                *slot = None;
            }
            None => warn!(?handle, "destroy of unknown vertex buffer ignored"),
        }
    }

    pub fn destroy_index_buffer(
        &mut self,
        handle: IndexBufferHandle,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        match self.index_buffers.get_mut(handle.0) {
            Some(slot) => {
                if let Some(ib) = slot.as_mut() {
                    ib.destroy(device);
                }
                *slot = None;
            }
            None => warn!(?handle, "destroy of unknown index buffer ignored"),
        }
    }

    pub fn vertex_buffer(&self, handle: VertexBufferHandle) -> Option<&VertexBuffer> {
        self.vertex_buffers.get(handle.0).and_then(Option::as_ref)
    }

    pub fn vertex_buffer_mut(&mut self, handle: VertexBufferHandle) -> Option<&mut VertexBuffer> {
        self.vertex_buffers
            .get_mut(handle.0)
            .and_then(Option::as_mut)
    }

    pub fn index_buffer(&self, handle: IndexBufferHandle) -> Option<&IndexBuffer> {
        self.index_buffers.get(handle.0).and_then(Option::as_ref)
    }

    pub fn index_buffer_mut(&mut self, handle: IndexBufferHandle) -> Option<&mut IndexBuffer> {
        self.index_buffers
            .get_mut(handle.0)
            .and_then(Option::as_mut)
    }

    pub fn lock_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        count: usize,
        append: bool,
    ) -> Result<VertexWriter<'_>, MeshError> {
        self.vertex_buffer_mut(handle)
            .ok_or(MeshError::UnknownHandle)?
            .lock(count, append)
    }

    pub fn unlock_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        vertex_count: usize,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        if let Some(vb) = self.vertex_buffer_mut(handle) {
            vb.unlock(vertex_count, device);
        }
    }

    pub fn lock_index_buffer(
        &mut self,
        handle: IndexBufferHandle,
        count: usize,
        append: bool,
    ) -> Result<IndexWriter<'_>, MeshError> {
        self.index_buffer_mut(handle)
            .ok_or(MeshError::UnknownHandle)?
            .lock(count, append)
    }

    pub fn unlock_index_buffer(
        &mut self,
        handle: IndexBufferHandle,
        index_count: usize,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        if let Some(ib) = self.index_buffer_mut(handle) {
            ib.unlock(index_count, device);
        }
    }

    // ---- meshes ---------------------------------------------------------

    pub fn create_mesh(&mut self, vertex_format: VertexFormat) -> MeshHandle {
        let handle = MeshHandle(self.meshes.len());
        self.meshes.push(Some(Mesh::new(vertex_format)));
        handle
    }

    pub fn destroy_mesh(&mut self, handle: MeshHandle) {
        match self.meshes.get_mut(handle.0) {
            Some(slot) => *slot = None,
            None => warn!(?handle, "destroy of unknown mesh ignored"),
        }
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0).and_then(Option::as_ref)
    }

    pub fn mesh_mut(&mut self, handle: MeshHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle.0).and_then(Option::as_mut)
    }

    pub fn set_mesh_buffers(
        &mut self,
        handle: MeshHandle,
        vertex_buffer: Option<VertexBufferHandle>,
        index_buffer: Option<IndexBufferHandle>,
    ) {
        if let Some(mesh) = self.mesh_mut(handle) {
            mesh.vertex_buffer = vertex_buffer;
            mesh.index_buffer = index_buffer;
        }
    }

    /// The shared dynamic mesh, retargeted to `vertex_format`. `None` before
    /// [`MeshManager::init`].
    pub fn dynamic_mesh(&mut self, vertex_format: VertexFormat) -> Option<MeshHandle> {
        let handle = self.dynamic_mesh?;
        if let Some(mesh) = self.mesh_mut(handle) {
            mesh.vertex_format = vertex_format;
        }
        Some(handle)
    }

    pub fn dynamic_vertex_buffer(&self) -> Option<VertexBufferHandle> {
        self.dynamic_vertex_buffer
    }

    pub fn dynamic_index_buffer(&self) -> Option<IndexBufferHandle> {
        self.dynamic_index_buffer
    }

    /// Locks both of a mesh's buffers for writing.
    pub fn lock_mesh(
        &mut self,
        handle: MeshHandle,
        vertex_count: usize,
        index_count: usize,
    ) -> Result<MeshWriter<'_>, MeshError> {
        let mesh = *self.mesh(handle).ok_or(MeshError::UnknownHandle)?;
        let (Some(vbh), Some(ibh)) = (mesh.vertex_buffer, mesh.index_buffer) else {
            return Err(MeshError::NoBuffersBound);
        };
        // Check both before locking either so a failure leaves no half-open
        // lock behind.
        self.vertex_buffer(vbh)
            .ok_or(MeshError::UnknownHandle)?
            .ensure_lockable(vertex_count)?;
        self.index_buffer(ibh)
            .ok_or(MeshError::UnknownHandle)?
            .ensure_lockable(index_count)?;
        let vb = self
            .vertex_buffers
            .get_mut(vbh.0)
            .and_then(Option::as_mut)
            .ok_or(MeshError::UnknownHandle)?;
        let ib = self
            .index_buffers
            .get_mut(ibh.0)
            .and_then(Option::as_mut)
            .ok_or(MeshError::UnknownHandle)?;
        Ok(MeshWriter {
            vertices: vb.lock(vertex_count, false)?,
            indices: ib.lock(index_count, false)?,
        })
    }

    /// Unlocks both of a mesh's buffers, uploading what was written.
    pub fn unlock_mesh(
        &mut self,
        handle: MeshHandle,
        vertex_count: usize,
        index_count: usize,
        mut device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        let Some(mesh) = self.mesh(handle).copied() else {
            return;
        };
        if let Some(vbh) = mesh.vertex_buffer {
            self.unlock_vertex_buffer(vbh, vertex_count, device.as_deref_mut());
        }
        if let Some(ibh) = mesh.index_buffer {
            self.unlock_index_buffer(ibh, index_count, device);
        }
    }

    // ---- drawing --------------------------------------------------------

    /// Draws the given index ranges of a mesh. Binds stream, indices and
    /// vertex format once, then issues one indexed draw per range that forms
    /// at least one whole primitive. With no non-empty range nothing is
    /// bound or drawn.
    pub fn draw_mesh(
        &self,
        handle: MeshHandle,
        ranges: &[IndexRange],
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        let Some(device) = device else { return };
        let Some(mesh) = self.mesh(handle) else {
            warn!(?handle, "draw of unknown mesh ignored");
            return;
        };
        if !ranges.iter().any(|r| r.index_count > 0) {
            return;
        }
        let (Some(vbh), Some(ibh)) = (mesh.vertex_buffer, mesh.index_buffer) else {
            warn!(?handle, "draw of mesh with unbound buffers ignored");
            return;
        };
        let (Some(vb), Some(ib)) = (self.vertex_buffer(vbh), self.index_buffer(ibh)) else {
            warn!(?handle, "draw of mesh with stale buffers ignored");
            return;
        };
        let (Some(vb_id), Some(ib_id)) = (vb.device_buffer(), ib.device_buffer()) else {
            warn!(?handle, "draw of mesh with storageless buffers ignored");
            return;
        };
        device.set_stream_source(vb_id, vb.stride());
        device.set_indices(ib_id, ib.format());
        device.set_vertex_format(mesh.vertex_format);
        for range in ranges {
            let primitive_count = mesh.primitive_type.primitive_count(range.index_count);
            if primitive_count == 0 {
                continue;
            }
            device.draw_indexed(
                mesh.primitive_type,
                vb.vertex_count(),
                range.first_index,
                primitive_count,
            );
        }
    }

    /// Draws a mesh's entire index buffer as one range.
    pub fn draw_mesh_all(&self, handle: MeshHandle, device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(index_count) = self
            .mesh(handle)
            .and_then(|m| m.index_buffer)
            .and_then(|ibh| self.index_buffer(ibh))
            .map(IndexBuffer::index_count)
        else {
            return;
        };
        self.draw_mesh(
            handle,
            &[IndexRange {
                first_index: 0,
                index_count,
            }],
            device,
        );
    }
}
