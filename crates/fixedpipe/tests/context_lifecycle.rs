use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;

use fixedpipe::device::{
    BufferId, BufferKind, ClearFlags, DeviceError, IndexFormat, NativeDevice, RenderState,
    UploadMode,
};
use fixedpipe::material::{translate_material, FixedFunctionMaterialState, Material};
use fixedpipe::mesh::{IndexRange, VertexFormat};
use fixedpipe::state::lights::Light;
use fixedpipe::state::topology::PrimitiveType;
use fixedpipe::state::tss::TextureStageState;
use fixedpipe::state::{BlendFactor, CullMode, MaterialProperties, PackedColor, Viewport};
use fixedpipe::trace::{DeviceCall, RecordingDevice};
use fixedpipe::Context;

/// Hands a [`RecordingDevice`] to a [`Context`] while keeping the call log
/// inspectable from the test. The context owns the box; the test keeps the
/// other half of the [`Rc`].
struct SharedDevice(Rc<RefCell<RecordingDevice>>);

fn shared_device() -> (Rc<RefCell<RecordingDevice>>, Box<dyn NativeDevice>) {
    let log = Rc::new(RefCell::new(RecordingDevice::new()));
    (log.clone(), Box::new(SharedDevice(log)))
}

impl NativeDevice for SharedDevice {
    fn set_render_state(&mut self, state: RenderState) {
        self.0.borrow_mut().set_render_state(state);
    }

    fn set_texture_stage(&mut self, stage: usize, state: &TextureStageState) {
        self.0.borrow_mut().set_texture_stage(stage, state);
    }

    fn disable_texture_stages_from(&mut self, first_stage: usize) {
        self.0.borrow_mut().disable_texture_stages_from(first_stage);
    }

    fn set_material(&mut self, material: &MaterialProperties) {
        self.0.borrow_mut().set_material(material);
    }

    fn set_light(&mut self, index: usize, light: &Light) {
        self.0.borrow_mut().set_light(index, light);
    }

    fn light_enable(&mut self, index: usize, enabled: bool) {
        self.0.borrow_mut().light_enable(index, enabled);
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.0.borrow_mut().set_viewport(viewport);
    }

    fn clear(&mut self, flags: ClearFlags, color: PackedColor, depth: f32, stencil: u32) {
        self.0.borrow_mut().clear(flags, color, depth, stencil);
    }

    fn create_vertex_buffer(
        &mut self,
        size_bytes: usize,
        kind: BufferKind,
    ) -> Result<BufferId, DeviceError> {
        self.0.borrow_mut().create_vertex_buffer(size_bytes, kind)
    }

    fn create_index_buffer(
        &mut self,
        size_bytes: usize,
        format: IndexFormat,
        kind: BufferKind,
    ) -> Result<BufferId, DeviceError> {
        self.0
            .borrow_mut()
            .create_index_buffer(size_bytes, format, kind)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.0.borrow_mut().destroy_buffer(buffer);
    }

    fn upload_buffer(
        &mut self,
        buffer: BufferId,
        offset: usize,
        data: &[u8],
        mode: UploadMode,
    ) -> Result<(), DeviceError> {
        self.0.borrow_mut().upload_buffer(buffer, offset, data, mode)
    }

    fn set_stream_source(&mut self, buffer: BufferId, stride: usize) {
        self.0.borrow_mut().set_stream_source(buffer, stride);
    }

    fn set_indices(&mut self, buffer: BufferId, format: IndexFormat) {
        self.0.borrow_mut().set_indices(buffer, format);
    }

    fn set_vertex_format(&mut self, format: VertexFormat) {
        self.0.borrow_mut().set_vertex_format(format);
    }

    fn draw_indexed(
        &mut self,
        primitive: PrimitiveType,
        num_vertices: usize,
        first_index: usize,
        primitive_count: usize,
    ) {
        self.0
            .borrow_mut()
            .draw_indexed(primitive, num_vertices, first_index, primitive_count);
    }
}

#[test]
fn attach_builds_dynamic_buffers_and_commits_the_reset() {
    let (log, device) = shared_device();
    let mut context = Context::new();
    assert!(!context.has_device());

    context.attach_device(device);
    assert!(context.has_device());
    assert!(context.meshes.dynamic_vertex_buffer().is_some());
    assert!(context.meshes.dynamic_index_buffer().is_some());
    // The reset went through the device, so nothing is left pending.
    assert!(!context.state.current().dirty);

    let calls = log.borrow();
    let calls = calls.calls();
    let creations = calls
        .iter()
        .filter(|c| {
            matches!(
                c,
                DeviceCall::CreateVertexBuffer { .. } | DeviceCall::CreateIndexBuffer { .. }
            )
        })
        .count();
    assert_eq!(creations, 2);
    assert!(calls.contains(&DeviceCall::RenderState(RenderState::DepthEnable(true))));
}

#[test]
fn with_device_is_attach_on_a_fresh_context() {
    let (_, device) = shared_device();
    let context = Context::with_device(device);
    assert!(context.has_device());
    assert!(!context.state.current().dirty);
}

#[test]
fn deviceless_context_mutates_memory_only() {
    let mut context = Context::new();

    context.state.set_cull_mode(CullMode::None);
    context.commit_state_changes();
    // No device to commit against; the change stays pending.
    assert!(context.state.current().dirty);
    assert_eq!(context.state.current().cull_mode, CullMode::None);

    let vb = context.create_vertex_buffer(BufferKind::Static, VertexFormat::STANDARD, 8);
    assert!(context.meshes.lock_vertex_buffer(vb, 4, false).is_err());
    assert!(context.meshes.dynamic_mesh(VertexFormat::STANDARD).is_none());

    // Device-only operations fall through without panicking.
    context.clear_buffers(true, true, false);
    context.set_ambient_light(1.0, 1.0, 1.0);
    context.apply_material(&FixedFunctionMaterialState::default());
    context.reset_render_state();
    assert!(context.state.current().dirty);
}

#[test]
fn commit_routes_state_through_the_owned_device() {
    let (log, device) = shared_device();
    let mut context = Context::with_device(device);
    log.borrow_mut().clear_calls();

    context.state.set_cull_mode(CullMode::Clockwise);
    context.commit_state_changes();
    assert!(!context.state.current().dirty);
    assert!(log
        .borrow()
        .calls()
        .contains(&DeviceCall::RenderState(RenderState::CullMode(
            CullMode::Clockwise
        ))));
}

#[test]
fn render_pass_through_the_context_restores_and_commits() {
    let (log, device) = shared_device();
    let mut context = Context::with_device(device);

    context
        .state
        .set_alpha_blend(true, BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha);
    let translucent = context.state.take_snapshot();
    context
        .state
        .set_alpha_blend(false, BlendFactor::One, BlendFactor::Zero);
    context.commit_state_changes();
    log.borrow_mut().clear_calls();

    context.state.begin_pass(translucent);
    context.render_pass();
    assert_eq!(context.state.current_pass(), None);
    assert!(log
        .borrow()
        .calls()
        .contains(&DeviceCall::RenderState(RenderState::AlphaBlendEnable(true))));
}

#[test]
fn apply_material_reaches_the_device() {
    let (log, device) = shared_device();
    let mut context = Context::with_device(device);
    log.borrow_mut().clear_calls();

    let state = translate_material(&Material::new("UnlitGeneric"));
    context.apply_material(&state);
    let calls = log.borrow();
    let calls = calls.calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, DeviceCall::TextureStage { stage: 0, .. })));
    assert!(calls.contains(&DeviceCall::RenderState(RenderState::Lighting(false))));
}

#[test]
fn buffer_lifecycle_round_trips_through_the_context() {
    let (log, device) = shared_device();
    let mut context = Context::with_device(device);
    log.borrow_mut().clear_calls();

    let vb = context.create_vertex_buffer(BufferKind::Static, VertexFormat::STANDARD, 8);
    {
        let mut writer = context.meshes.lock_vertex_buffer(vb, 2, false).unwrap();
        writer.write_position(0, [1.0, 2.0, 3.0]);
        writer.write_position(1, [4.0, 5.0, 6.0]);
    }
    context.unlock_vertex_buffer(vb, 2);
    context.destroy_vertex_buffer(vb);

    let calls = log.borrow();
    let calls = calls.calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, DeviceCall::CreateVertexBuffer { .. })));
    assert!(calls.iter().any(|c| matches!(
        c,
        DeviceCall::UploadBuffer {
            mode: UploadMode::Default,
            ..
        }
    )));
    assert!(calls
        .iter()
        .any(|c| matches!(c, DeviceCall::DestroyBuffer { .. })));
}

#[test]
fn dynamic_mesh_draw_goes_out_through_the_context() {
    let (log, device) = shared_device();
    let mut context = Context::with_device(device);
    let mesh = context.meshes.dynamic_mesh(VertexFormat::STANDARD).unwrap();

    {
        let mut writer = context.meshes.lock_mesh(mesh, 3, 3).unwrap();
        writer.vertices.write_position(0, [0.0, 0.0, 0.0]);
        writer.vertices.write_position(1, [1.0, 0.0, 0.0]);
        writer.vertices.write_position(2, [0.0, 1.0, 0.0]);
        writer.indices.write_slice(0, &[0, 1, 2]);
    }
    context.unlock_mesh(mesh, 3, 3);
    log.borrow_mut().clear_calls();

    context.draw_mesh(
        mesh,
        &[IndexRange {
            first_index: 0,
            index_count: 3,
        }],
    );
    let calls = log.borrow();
    let calls = calls.calls();
    assert!(calls
        .iter()
        .any(|c| matches!(c, DeviceCall::StreamSource { .. })));
    assert!(calls.iter().any(|c| matches!(
        c,
        DeviceCall::DrawIndexed {
            primitive: PrimitiveType::Triangles,
            primitive_count: 1,
            ..
        }
    )));
}

#[test]
fn detach_releases_buffers_and_returns_the_device() {
    let (log, device) = shared_device();
    let mut context = Context::with_device(device);
    log.borrow_mut().clear_calls();

    let returned = context.detach_device();
    assert!(returned.is_some());
    assert!(!context.has_device());
    assert!(context.meshes.dynamic_vertex_buffer().is_none());

    let destroys = log
        .borrow()
        .calls()
        .iter()
        .filter(|c| matches!(c, DeviceCall::DestroyBuffer { .. }))
        .count();
    assert_eq!(destroys, 2);
    assert!(context.detach_device().is_none());
}

#[test]
fn attaching_over_a_device_detaches_the_old_one_first() {
    let (first_log, first) = shared_device();
    let (second_log, second) = shared_device();
    let mut context = Context::with_device(first);
    first_log.borrow_mut().clear_calls();

    context.attach_device(second);
    assert!(context.has_device());
    assert!(context.meshes.dynamic_vertex_buffer().is_some());

    // Old device saw the shutdown, new device saw the init.
    let old_destroys = first_log
        .borrow()
        .calls()
        .iter()
        .filter(|c| matches!(c, DeviceCall::DestroyBuffer { .. }))
        .count();
    assert_eq!(old_destroys, 2);
    assert!(second_log
        .borrow()
        .calls()
        .iter()
        .any(|c| matches!(c, DeviceCall::CreateVertexBuffer { .. })));
}
