use pretty_assertions::assert_eq;

use fixedpipe::device::{BufferId, BufferKind, IndexFormat, UploadMode};
use fixedpipe::mesh::{
    IndexRange, MeshError, MeshManager, StandardVertex, VertexFormat, DYNAMIC_INDEX_COUNT,
    DYNAMIC_VERTEX_COUNT,
};
use fixedpipe::state::topology::PrimitiveType;
use fixedpipe::trace::{DeviceCall, RecordingDevice};

fn vertex(x: f32) -> StandardVertex {
    StandardVertex {
        position: [x, 0.0, 0.0],
        normal: [0.0, 0.0, 1.0],
        color: 0xFFFF_FFFF,
        texcoord: [0.0, 0.0],
    }
}

/// Buffer ids in creation order, pulled from the recorded create calls.
fn created_ids(calls: Vec<DeviceCall>) -> Vec<BufferId> {
    calls
        .into_iter()
        .filter_map(|c| match c {
            DeviceCall::CreateVertexBuffer { id, .. } | DeviceCall::CreateIndexBuffer { id, .. } => {
                Some(id)
            }
            _ => None,
        })
        .collect()
}

fn uploads(calls: Vec<DeviceCall>) -> Vec<(BufferId, usize, Vec<u8>, UploadMode)> {
    calls
        .into_iter()
        .filter_map(|c| match c {
            DeviceCall::UploadBuffer {
                id,
                offset,
                data,
                mode,
            } => Some((id, offset, data, mode)),
            _ => None,
        })
        .collect()
}

#[test]
fn dynamic_pair_matches_documented_capacities() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    manager.init(Some(&mut device));

    let calls = device.take_calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        DeviceCall::CreateVertexBuffer {
            size_bytes,
            kind: BufferKind::Dynamic,
            ..
        } if *size_bytes == DYNAMIC_VERTEX_COUNT * 36
    )));
    assert!(calls.iter().any(|c| matches!(
        c,
        DeviceCall::CreateIndexBuffer {
            size_bytes,
            format: IndexFormat::U16,
            kind: BufferKind::Dynamic,
            ..
        } if *size_bytes == DYNAMIC_INDEX_COUNT * 2
    )));

    let vbh = manager.dynamic_vertex_buffer().unwrap();
    let vb = manager.vertex_buffer(vbh).unwrap();
    assert_eq!(vb.vertex_count(), DYNAMIC_VERTEX_COUNT);
    assert_eq!(vb.stride(), 36);
    let ibh = manager.dynamic_index_buffer().unwrap();
    assert_eq!(manager.index_buffer(ibh).unwrap().index_count(), DYNAMIC_INDEX_COUNT);
}

#[test]
fn static_lock_uploads_the_written_prefix_on_unlock() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    let ids = created_ids(device.take_calls());

    let tri = [vertex(0.0), vertex(1.0), vertex(2.0)];
    let mut writer = manager.lock_vertex_buffer(vbh, 3, false).unwrap();
    writer.write_standard(0, &tri);
    drop(writer);
    manager.unlock_vertex_buffer(vbh, 3, Some(&mut device));

    let uploads = uploads(device.take_calls());
    assert_eq!(uploads.len(), 1);
    let (id, offset, data, mode) = &uploads[0];
    assert_eq!(*id, ids[0]);
    assert_eq!(*offset, 0);
    assert_eq!(*mode, UploadMode::Default);
    // Only the locked prefix goes up, not the whole buffer.
    assert_eq!(data.len(), 3 * 36);
    assert_eq!(&data[..36], bytemuck::bytes_of(&tri[0]));
}

#[test]
fn lock_mode_tracks_buffer_kind_and_append() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let dynamic = manager.create_vertex_buffer(
        BufferKind::Dynamic,
        VertexFormat::STANDARD,
        8,
        Some(&mut device),
    );
    device.clear_calls();

    manager.lock_vertex_buffer(dynamic, 4, false).unwrap();
    manager.unlock_vertex_buffer(dynamic, 4, Some(&mut device));
    manager.lock_vertex_buffer(dynamic, 4, true).unwrap();
    manager.unlock_vertex_buffer(dynamic, 4, Some(&mut device));

    let modes: Vec<UploadMode> = uploads(device.take_calls())
        .into_iter()
        .map(|(_, _, _, mode)| mode)
        .collect();
    assert_eq!(modes, vec![UploadMode::Discard, UploadMode::NoOverwrite]);
}

#[test]
fn unlock_without_a_lock_uploads_nothing() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    device.clear_calls();

    manager.unlock_vertex_buffer(vbh, 4, Some(&mut device));
    assert_eq!(device.calls(), &[]);
}

#[test]
fn zero_count_unlock_releases_the_lock_without_uploading() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    device.clear_calls();

    manager.lock_vertex_buffer(vbh, 4, false).unwrap();
    manager.unlock_vertex_buffer(vbh, 0, Some(&mut device));
    assert_eq!(device.calls(), &[]);
    // The lock is gone; a second lock succeeds.
    assert!(manager.lock_vertex_buffer(vbh, 4, false).is_ok());
}

#[test]
fn deviceless_buffers_have_no_storage_to_lock() {
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(BufferKind::Static, VertexFormat::STANDARD, 4, None);
    let err = manager.lock_vertex_buffer(vbh, 4, false).unwrap_err();
    assert_eq!(err, MeshError::NoBackingStorage);
}

#[test]
fn oversized_locks_are_rejected() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    let err = manager.lock_vertex_buffer(vbh, 99, false).unwrap_err();
    assert_eq!(
        err,
        MeshError::LockTooLarge {
            requested: 99,
            capacity: 4,
        }
    );
}

#[test]
fn index_writer_stores_little_endian_indices() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let ibh = manager.create_index_buffer(
        BufferKind::Static,
        IndexFormat::U16,
        4,
        Some(&mut device),
    );
    device.clear_calls();

    let mut writer = manager.lock_index_buffer(ibh, 4, false).unwrap();
    writer.write(0, 0x0102);
    writer.write_slice(1, &[3, 4]);
    drop(writer);
    manager.unlock_index_buffer(ibh, 4, Some(&mut device));

    let uploads = uploads(device.take_calls());
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].2, vec![0x02, 0x01, 3, 0, 4, 0, 0, 0]);
}

#[test]
fn draw_binds_once_then_draws_each_range() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        12,
        Some(&mut device),
    );
    let ibh = manager.create_index_buffer(
        BufferKind::Static,
        IndexFormat::U16,
        9,
        Some(&mut device),
    );
    let mesh = manager.create_mesh(VertexFormat::STANDARD);
    manager.set_mesh_buffers(mesh, Some(vbh), Some(ibh));
    let ids = created_ids(device.take_calls());

    manager.draw_mesh(
        mesh,
        &[
            IndexRange {
                first_index: 0,
                index_count: 6,
            },
            IndexRange {
                first_index: 6,
                index_count: 0,
            },
            IndexRange {
                first_index: 6,
                index_count: 3,
            },
        ],
        Some(&mut device),
    );

    assert_eq!(
        device.take_calls(),
        vec![
            DeviceCall::StreamSource {
                id: ids[0],
                stride: 36,
            },
            DeviceCall::Indices {
                id: ids[1],
                format: IndexFormat::U16,
            },
            DeviceCall::SetVertexFormat(VertexFormat::STANDARD),
            DeviceCall::DrawIndexed {
                primitive: PrimitiveType::Triangles,
                num_vertices: 12,
                first_index: 0,
                primitive_count: 2,
            },
            DeviceCall::DrawIndexed {
                primitive: PrimitiveType::Triangles,
                num_vertices: 12,
                first_index: 6,
                primitive_count: 1,
            },
        ]
    );
}

#[test]
fn single_index_strip_binds_but_draws_nothing() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    let ibh = manager.create_index_buffer(
        BufferKind::Static,
        IndexFormat::U16,
        4,
        Some(&mut device),
    );
    let mesh = manager.create_mesh(VertexFormat::STANDARD);
    manager.set_mesh_buffers(mesh, Some(vbh), Some(ibh));
    manager.mesh_mut(mesh).unwrap().primitive_type = PrimitiveType::TriangleStrip;
    device.clear_calls();

    // One index is a non-empty range, so binding happens, but it forms no
    // whole primitive and must not reach the device as a draw.
    manager.draw_mesh(
        mesh,
        &[IndexRange {
            first_index: 0,
            index_count: 1,
        }],
        Some(&mut device),
    );

    let calls = device.take_calls();
    assert_eq!(calls.len(), 3);
    assert!(!calls
        .iter()
        .any(|c| matches!(c, DeviceCall::DrawIndexed { .. })));
}

#[test]
fn all_empty_ranges_touch_the_device_not_at_all() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    let ibh = manager.create_index_buffer(
        BufferKind::Static,
        IndexFormat::U16,
        4,
        Some(&mut device),
    );
    let mesh = manager.create_mesh(VertexFormat::STANDARD);
    manager.set_mesh_buffers(mesh, Some(vbh), Some(ibh));
    device.clear_calls();

    manager.draw_mesh(mesh, &[], Some(&mut device));
    manager.draw_mesh(
        mesh,
        &[
            IndexRange {
                first_index: 0,
                index_count: 0,
            },
            IndexRange {
                first_index: 2,
                index_count: 0,
            },
        ],
        Some(&mut device),
    );
    assert_eq!(device.calls(), &[]);
}

#[test]
fn destroyed_meshes_and_storageless_buffers_draw_nothing() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();

    // Mesh destroyed before the draw.
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    let ibh = manager.create_index_buffer(
        BufferKind::Static,
        IndexFormat::U16,
        4,
        Some(&mut device),
    );
    let mesh = manager.create_mesh(VertexFormat::STANDARD);
    manager.set_mesh_buffers(mesh, Some(vbh), Some(ibh));
    manager.destroy_mesh(mesh);
    device.clear_calls();
    manager.draw_mesh_all(mesh, Some(&mut device));
    assert_eq!(device.calls(), &[]);

    // Buffers created without a device never get device storage.
    let vbh = manager.create_vertex_buffer(BufferKind::Static, VertexFormat::STANDARD, 4, None);
    let ibh = manager.create_index_buffer(BufferKind::Static, IndexFormat::U16, 6, None);
    let mesh = manager.create_mesh(VertexFormat::STANDARD);
    manager.set_mesh_buffers(mesh, Some(vbh), Some(ibh));
    manager.draw_mesh_all(mesh, Some(&mut device));
    assert_eq!(device.calls(), &[]);
}

#[test]
fn lock_mesh_requires_bound_buffers() {
    let mut manager = MeshManager::new();
    let mesh = manager.create_mesh(VertexFormat::STANDARD);
    let err = manager.lock_mesh(mesh, 4, 4).unwrap_err();
    assert_eq!(err, MeshError::NoBuffersBound);
}

#[test]
fn dynamic_mesh_roundtrip_streams_geometry() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    manager.init(Some(&mut device));
    let mesh = manager.dynamic_mesh(VertexFormat::STANDARD).unwrap();
    device.clear_calls();

    let tri = [vertex(0.0), vertex(1.0), vertex(2.0)];
    {
        let mut writer = manager.lock_mesh(mesh, 3, 3).unwrap();
        writer.vertices.write_standard(0, &tri);
        writer.indices.write_slice(0, &[0, 1, 2]);
    }
    manager.unlock_mesh(mesh, 3, 3, Some(&mut device));

    let uploads = uploads(device.take_calls());
    assert_eq!(uploads.len(), 2);
    // Dynamic buffers discard on a non-append lock.
    assert_eq!(uploads[0].3, UploadMode::Discard);
    assert_eq!(uploads[0].2.len(), 3 * 36);
    assert_eq!(&uploads[0].2[..36], bytemuck::bytes_of(&tri[0]));
    assert_eq!(uploads[1].3, UploadMode::Discard);
    assert_eq!(uploads[1].2, vec![0, 0, 1, 0, 2, 0]);
}

#[test]
fn draw_mesh_all_covers_the_whole_index_buffer() {
    let mut device = RecordingDevice::new();
    let mut manager = MeshManager::new();
    let vbh = manager.create_vertex_buffer(
        BufferKind::Static,
        VertexFormat::STANDARD,
        4,
        Some(&mut device),
    );
    let ibh = manager.create_index_buffer(
        BufferKind::Static,
        IndexFormat::U16,
        6,
        Some(&mut device),
    );
    let mesh = manager.create_mesh(VertexFormat::STANDARD);
    manager.set_mesh_buffers(mesh, Some(vbh), Some(ibh));
    device.clear_calls();

    manager.draw_mesh_all(mesh, Some(&mut device));
    let draws: Vec<_> = device
        .take_calls()
        .into_iter()
        .filter(|c| matches!(c, DeviceCall::DrawIndexed { .. }))
        .collect();
    assert_eq!(
        draws,
        vec![DeviceCall::DrawIndexed {
            primitive: PrimitiveType::Triangles,
            num_vertices: 4,
            first_index: 0,
            primitive_count: 2,
        }]
    );
}
