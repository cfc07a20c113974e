//! Vertex and index buffers with CPU staging.
//!
//! A buffer owns a staging allocation plus (when a device was present at
//! creation) a device-side buffer. Locking hands out a writer over the
//! staging bytes; unlocking uploads the written prefix. A buffer created
//! without a device has no storage at all and refuses to lock, matching the
//! fail-soft behavior of the surrounding pipeline.

use thiserror::Error;
use tracing::warn;

use crate::device::{BufferId, BufferKind, IndexFormat, NativeDevice, UploadMode};
use crate::state::PackedColor;

/// Number of 2D texture coordinate sets a vertex format can carry.
pub const MAX_TEXCOORD_SETS: usize = 8;

bitflags::bitflags! {
    /// Vertex component selection, FVF-style. Components are laid out in
    /// declaration order: position, normal, packed color, then each texcoord
    /// set as two floats.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexFormat: u32 {
        const POSITION = 1 << 0;
        const NORMAL = 1 << 1;
        const COLOR = 1 << 2;
        const TEXCOORD0 = 1 << 3;
        const TEXCOORD1 = 1 << 4;
        const TEXCOORD2 = 1 << 5;
        const TEXCOORD3 = 1 << 6;
        const TEXCOORD4 = 1 << 7;
        const TEXCOORD5 = 1 << 8;
        const TEXCOORD6 = 1 << 9;
        const TEXCOORD7 = 1 << 10;
    }
}

impl VertexFormat {
    /// Position, normal, packed color and one 2D texcoord set; the format of
    /// the shared dynamic buffers.
    pub const STANDARD: VertexFormat = VertexFormat::from_bits_truncate(
        VertexFormat::POSITION.bits()
            | VertexFormat::NORMAL.bits()
            | VertexFormat::COLOR.bits()
            | VertexFormat::TEXCOORD0.bits(),
    );

    pub fn texcoord(set: usize) -> VertexFormat {
        if set >= MAX_TEXCOORD_SETS {
            return VertexFormat::empty();
        }
        VertexFormat::from_bits_truncate(VertexFormat::TEXCOORD0.bits() << set)
    }

    pub fn has_texcoord(self, set: usize) -> bool {
        set < MAX_TEXCOORD_SETS && self.contains(Self::texcoord(set))
    }

    pub fn texcoord_count(self) -> usize {
        (0..MAX_TEXCOORD_SETS).filter(|&s| self.has_texcoord(s)).count()
    }

    /// Byte stride of one vertex. A formatless buffer keeps the historical
    /// 32-byte stride.
    pub fn vertex_size(self) -> usize {
        let mut size = 0;
        if self.contains(VertexFormat::POSITION) {
            size += 12;
        }
        if self.contains(VertexFormat::NORMAL) {
            size += 12;
        }
        if self.contains(VertexFormat::COLOR) {
            size += 4;
        }
        size += 8 * self.texcoord_count();
        if size == 0 {
            32
        } else {
            size
        }
    }

    pub fn position_offset(self) -> Option<usize> {
        self.contains(VertexFormat::POSITION).then_some(0)
    }

    pub fn normal_offset(self) -> Option<usize> {
        if !self.contains(VertexFormat::NORMAL) {
            return None;
        }
        Some(if self.contains(VertexFormat::POSITION) {
            12
        } else {
            0
        })
    }

    pub fn color_offset(self) -> Option<usize> {
        if !self.contains(VertexFormat::COLOR) {
            return None;
        }
        let mut offset = 0;
        if self.contains(VertexFormat::POSITION) {
            offset += 12;
        }
        if self.contains(VertexFormat::NORMAL) {
            offset += 12;
        }
        Some(offset)
    }

    pub fn texcoord_offset(self, set: usize) -> Option<usize> {
        if !self.has_texcoord(set) {
            return None;
        }
        let mut offset = 0;
        if self.contains(VertexFormat::POSITION) {
            offset += 12;
        }
        if self.contains(VertexFormat::NORMAL) {
            offset += 12;
        }
        if self.contains(VertexFormat::COLOR) {
            offset += 4;
        }
        offset += 8 * (0..set).filter(|&s| self.has_texcoord(s)).count();
        Some(offset)
    }
}

/// CPU-side layout of [`VertexFormat::STANDARD`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StandardVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    /// Packed `0xAARRGGBB`, stored little-endian like the device expects.
    pub color: u32,
    pub texcoord: [f32; 2],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("buffer has no backing storage")]
    NoBackingStorage,
    #[error("buffer is already locked")]
    AlreadyLocked,
    #[error("lock of {requested} exceeds buffer capacity {capacity}")]
    LockTooLarge { requested: usize, capacity: usize },
    #[error("stale or unknown resource handle")]
    UnknownHandle,
    #[error("mesh has no buffers bound")]
    NoBuffersBound,
}

/// Vertex storage: staging bytes plus an optional device buffer.
#[derive(Debug)]
pub struct VertexBuffer {
    kind: BufferKind,
    format: VertexFormat,
    stride: usize,
    count: usize,
    device_buffer: Option<BufferId>,
    staging: Vec<u8>,
    pending: Option<UploadMode>,
}

impl VertexBuffer {
    pub(crate) fn create(
        kind: BufferKind,
        format: VertexFormat,
        count: usize,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) -> Self {
        let stride = format.vertex_size();
        let size_bytes = stride * count;
        let device_buffer = match device {
            Some(device) => match device.create_vertex_buffer(size_bytes, kind) {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(error = %err, size_bytes, "vertex buffer allocation failed");
                    None
                }
            },
            None => {
                warn!(size_bytes, "vertex buffer created without a device, no storage");
                None
            }
        };
        let staging = if device_buffer.is_some() {
            vec![0u8; size_bytes]
        } else {
            Vec::new()
        };
        VertexBuffer {
            kind,
            format,
            stride,
            count,
            device_buffer,
            staging,
            pending: None,
        }
    }

    pub fn format(&self) -> VertexFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn vertex_count(&self) -> usize {
        self.count
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn device_buffer(&self) -> Option<BufferId> {
        self.device_buffer
    }

    pub(crate) fn ensure_lockable(&self, count: usize) -> Result<(), MeshError> {
        if self.device_buffer.is_none() || self.staging.is_empty() {
            return Err(MeshError::NoBackingStorage);
        }
        if self.pending.is_some() {
            return Err(MeshError::AlreadyLocked);
        }
        if count > self.count {
            return Err(MeshError::LockTooLarge {
                requested: count,
                capacity: self.count,
            });
        }
        Ok(())
    }

    fn lock_mode(&self, append: bool) -> UploadMode {
        if append {
            UploadMode::NoOverwrite
        } else if self.kind == BufferKind::Dynamic {
            UploadMode::Discard
        } else {
            UploadMode::Default
        }
    }

    /// Opens the staging bytes for writing. `append` requests no-overwrite
    /// upload semantics; otherwise dynamic buffers discard on unlock.
    pub fn lock(&mut self, count: usize, append: bool) -> Result<VertexWriter<'_>, MeshError> {
        self.ensure_lockable(count)?;
        self.pending = Some(self.lock_mode(append));
        Ok(VertexWriter {
            format: self.format,
            stride: self.stride,
            data: &mut self.staging,
        })
    }

    /// Uploads the first `vertex_count` vertices and releases the lock.
    /// Calling without a prior lock does nothing.
    pub fn unlock(&mut self, vertex_count: usize, device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(mode) = self.pending.take() else {
            return;
        };
        let len = vertex_count.min(self.count) * self.stride;
        if len == 0 {
            return;
        }
        let (Some(device), Some(id)) = (device, self.device_buffer) else {
            return;
        };
        if let Err(err) = device.upload_buffer(id, 0, &self.staging[..len], mode) {
            warn!(error = %err, "vertex buffer upload failed");
        }
    }

    pub(crate) fn destroy(&mut self, device: Option<&mut (dyn NativeDevice + '_)>) {
        if let (Some(device), Some(id)) = (device, self.device_buffer.take()) {
            device.destroy_buffer(id);
        }
        self.device_buffer = None;
        self.staging = Vec::new();
        self.pending = None;
    }
}

/// Component-wise writer over locked vertex staging bytes. Writes to
/// components the format lacks, or past the end of the buffer, are dropped.
#[derive(Debug)]
pub struct VertexWriter<'a> {
    format: VertexFormat,
    stride: usize,
    data: &'a mut [u8],
}

impl VertexWriter<'_> {
    fn write_at(&mut self, offset: Option<usize>, vertex: usize, bytes: &[u8]) {
        let Some(offset) = offset else { return };
        let start = vertex * self.stride + offset;
        let Some(dst) = self.data.get_mut(start..start + bytes.len()) else {
            return;
        };
        dst.copy_from_slice(bytes);
    }

    pub fn write_position(&mut self, vertex: usize, position: [f32; 3]) {
        self.write_at(
            self.format.position_offset(),
            vertex,
            bytemuck::cast_slice(&position),
        );
    }

    pub fn write_normal(&mut self, vertex: usize, normal: [f32; 3]) {
        self.write_at(
            self.format.normal_offset(),
            vertex,
            bytemuck::cast_slice(&normal),
        );
    }

    pub fn write_color(&mut self, vertex: usize, color: PackedColor) {
        self.write_at(self.format.color_offset(), vertex, &color.0.to_le_bytes());
    }

    pub fn write_texcoord(&mut self, vertex: usize, set: usize, uv: [f32; 2]) {
        self.write_at(
            self.format.texcoord_offset(set),
            vertex,
            bytemuck::cast_slice(&uv),
        );
    }

    /// Bulk write for [`VertexFormat::STANDARD`] buffers; a no-op for any
    /// other format.
    pub fn write_standard(&mut self, first_vertex: usize, vertices: &[StandardVertex]) {
        if self.format != VertexFormat::STANDARD {
            return;
        }
        let start = first_vertex * self.stride;
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let Some(dst) = self.data.get_mut(start..start + bytes.len()) else {
            return;
        };
        dst.copy_from_slice(bytes);
    }
}

/// Index storage: staging bytes plus an optional device buffer.
#[derive(Debug)]
pub struct IndexBuffer {
    kind: BufferKind,
    format: IndexFormat,
    count: usize,
    device_buffer: Option<BufferId>,
    staging: Vec<u8>,
    pending: Option<UploadMode>,
}

impl IndexBuffer {
    pub(crate) fn create(
        kind: BufferKind,
        format: IndexFormat,
        count: usize,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) -> Self {
        let size_bytes = format.index_size() * count;
        let device_buffer = match device {
            Some(device) => match device.create_index_buffer(size_bytes, format, kind) {
                Ok(id) => Some(id),
                Err(err) => {
                    warn!(error = %err, size_bytes, "index buffer allocation failed");
                    None
                }
            },
            None => {
                warn!(size_bytes, "index buffer created without a device, no storage");
                None
            }
        };
        let staging = if device_buffer.is_some() {
            vec![0u8; size_bytes]
        } else {
            Vec::new()
        };
        IndexBuffer {
            kind,
            format,
            count,
            device_buffer,
            staging,
            pending: None,
        }
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    pub fn index_count(&self) -> usize {
        self.count
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn device_buffer(&self) -> Option<BufferId> {
        self.device_buffer
    }

    pub(crate) fn ensure_lockable(&self, count: usize) -> Result<(), MeshError> {
        if self.device_buffer.is_none() || self.staging.is_empty() {
            return Err(MeshError::NoBackingStorage);
        }
        if self.pending.is_some() {
            return Err(MeshError::AlreadyLocked);
        }
        if count > self.count {
            return Err(MeshError::LockTooLarge {
                requested: count,
                capacity: self.count,
            });
        }
        Ok(())
    }

    fn lock_mode(&self, append: bool) -> UploadMode {
        if append {
            UploadMode::NoOverwrite
        } else if self.kind == BufferKind::Dynamic {
            UploadMode::Discard
        } else {
            UploadMode::Default
        }
    }

    pub fn lock(&mut self, count: usize, append: bool) -> Result<IndexWriter<'_>, MeshError> {
        self.ensure_lockable(count)?;
        self.pending = Some(self.lock_mode(append));
        Ok(IndexWriter {
            format: self.format,
            data: &mut self.staging,
        })
    }

    /// Uploads the first `index_count` indices and releases the lock.
    /// Calling without a prior lock does nothing.
    pub fn unlock(&mut self, index_count: usize, device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(mode) = self.pending.take() else {
            return;
        };
        let len = index_count.min(self.count) * self.format.index_size();
        if len == 0 {
            return;
        }
        let (Some(device), Some(id)) = (device, self.device_buffer) else {
            return;
        };
        if let Err(err) = device.upload_buffer(id, 0, &self.staging[..len], mode) {
            warn!(error = %err, "index buffer upload failed");
        }
    }

    pub(crate) fn destroy(&mut self, device: Option<&mut (dyn NativeDevice + '_)>) {
        if let (Some(device), Some(id)) = (device, self.device_buffer.take()) {
            device.destroy_buffer(id);
        }
        self.device_buffer = None;
        self.staging = Vec::new();
        self.pending = None;
    }
}

/// Writer over locked index staging bytes. Out-of-bounds writes are dropped.
#[derive(Debug)]
pub struct IndexWriter<'a> {
    format: IndexFormat,
    data: &'a mut [u8],
}

impl IndexWriter<'_> {
    pub fn write(&mut self, i: usize, index: u32) {
        let size = self.format.index_size();
        let start = i * size;
        match self.format {
            IndexFormat::U16 => {
                let bytes = (index as u16).to_le_bytes();
                if let Some(dst) = self.data.get_mut(start..start + 2) {
                    dst.copy_from_slice(&bytes);
                }
            }
            IndexFormat::U32 => {
                let bytes = index.to_le_bytes();
                if let Some(dst) = self.data.get_mut(start..start + 4) {
                    dst.copy_from_slice(&bytes);
                }
            }
        }
    }

    pub fn write_slice(&mut self, first: usize, indices: &[u16]) {
        match self.format {
            IndexFormat::U16 => {
                let start = first * 2;
                let bytes: &[u8] = bytemuck::cast_slice(indices);
                if let Some(dst) = self.data.get_mut(start..start + bytes.len()) {
                    dst.copy_from_slice(bytes);
                }
            }
            IndexFormat::U32 => {
                for (i, &index) in indices.iter().enumerate() {
                    self.write(first + i, index as u32);
                }
            }
        }
    }
}
