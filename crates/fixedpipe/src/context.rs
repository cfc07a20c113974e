//! The rendering context: single owner of the device and the pipeline layers.
//!
//! A [`Context`] bundles the optional native device with the state engine and
//! the mesh manager, and is handed by reference to whatever needs rendering.
//! Every device-touching operation funnels through here so the "no device
//! attached" policy lives in one place: state and staging mutations go
//! through, device work silently does not happen.

use tracing::debug;

use fixedpipe_math::Vec4;

use crate::device::{BufferKind, IndexFormat, NativeDevice};
use crate::material::translate::{apply_material, FixedFunctionMaterialState};
use crate::mesh::{
    IndexBufferHandle, IndexRange, MeshHandle, MeshManager, VertexBufferHandle, VertexFormat,
};
use crate::state::{ShadeMode, StateEngine, Viewport};

/// Owner of the device, the state engine and the mesh manager.
///
/// The engine and manager are public: anything that only touches CPU-side
/// state goes through them directly. The methods here are the operations
/// that (also) need the device.
pub struct Context {
    device: Option<Box<dyn NativeDevice>>,
    pub state: StateEngine,
    pub meshes: MeshManager,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A context with no device; state mutates in memory only.
    pub fn new() -> Self {
        Context {
            device: None,
            state: StateEngine::new(),
            meshes: MeshManager::new(),
        }
    }

    pub fn with_device(device: Box<dyn NativeDevice>) -> Self {
        let mut context = Self::new();
        context.attach_device(device);
        context
    }

    /// Attaches a device, builds the dynamic mesh buffers and resets render
    /// state to the documented defaults. An already attached device is
    /// detached first.
    pub fn attach_device(&mut self, device: Box<dyn NativeDevice>) {
        if self.device.is_some() {
            self.detach_device();
        }
        debug!("attaching native device");
        self.device = Some(device);
        self.meshes.init(self.device.as_deref_mut());
        self.state.reset_render_state(self.device.as_deref_mut());
    }

    /// Releases device-side mesh buffers and returns the device, if any.
    pub fn detach_device(&mut self) -> Option<Box<dyn NativeDevice>> {
        self.device.as_ref()?;
        debug!("detaching native device");
        self.meshes.shutdown(self.device.as_deref_mut());
        self.device.take()
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn device_mut(&mut self) -> Option<&mut (dyn NativeDevice + 'static)> {
        self.device.as_deref_mut()
    }

    // ---- state engine, device-touching ----------------------------------

    pub fn commit_state_changes(&mut self) {
        self.state.commit_state_changes(self.device.as_deref_mut());
    }

    pub fn render_pass(&mut self) {
        self.state.render_pass(self.device.as_deref_mut());
    }

    pub fn reset_render_state(&mut self) {
        self.state.reset_render_state(self.device.as_deref_mut());
    }

    pub fn set_ambient_light(&mut self, r: f32, g: f32, b: f32) {
        self.state.set_ambient_light(r, g, b, self.device.as_deref_mut());
    }

    pub fn set_ambient_light_cube(&mut self, cube: &[Vec4; 6]) {
        self.state.set_ambient_light_cube(cube, self.device.as_deref_mut());
    }

    pub fn set_shade_mode(&mut self, mode: ShadeMode) {
        self.state.set_shade_mode(mode, self.device.as_deref_mut());
    }

    pub fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.state.set_viewports(viewports, self.device.as_deref_mut());
    }

    pub fn clear_buffers(&mut self, clear_color: bool, clear_depth: bool, clear_stencil: bool) {
        self.state.clear_buffers(
            clear_color,
            clear_depth,
            clear_stencil,
            self.device.as_deref_mut(),
        );
    }

    /// Applies translated material state directly to the device, bypassing
    /// the shadow. Without a device this does nothing.
    pub fn apply_material(&mut self, material: &FixedFunctionMaterialState) {
        let Some(device) = self.device.as_deref_mut() else {
            return;
        };
        apply_material(material, device);
    }

    // ---- mesh manager, device-touching ----------------------------------

    pub fn create_vertex_buffer(
        &mut self,
        kind: BufferKind,
        format: VertexFormat,
        count: usize,
    ) -> VertexBufferHandle {
        self.meshes
            .create_vertex_buffer(kind, format, count, self.device.as_deref_mut())
    }

    pub fn create_index_buffer(
        &mut self,
        kind: BufferKind,
        format: IndexFormat,
        count: usize,
    ) -> IndexBufferHandle {
        self.meshes
            .create_index_buffer(kind, format, count, self.device.as_deref_mut())
    }

    pub fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) {
        self.meshes
            .destroy_vertex_buffer(handle, self.device.as_deref_mut());
    }

    pub fn destroy_index_buffer(&mut self, handle: IndexBufferHandle) {
        self.meshes
            .destroy_index_buffer(handle, self.device.as_deref_mut());
    }

    pub fn unlock_vertex_buffer(&mut self, handle: VertexBufferHandle, vertex_count: usize) {
        self.meshes
            .unlock_vertex_buffer(handle, vertex_count, self.device.as_deref_mut());
    }

    pub fn unlock_index_buffer(&mut self, handle: IndexBufferHandle, index_count: usize) {
        self.meshes
            .unlock_index_buffer(handle, index_count, self.device.as_deref_mut());
    }

    pub fn unlock_mesh(&mut self, handle: MeshHandle, vertex_count: usize, index_count: usize) {
        self.meshes
            .unlock_mesh(handle, vertex_count, index_count, self.device.as_deref_mut());
    }

    pub fn draw_mesh(&mut self, handle: MeshHandle, ranges: &[IndexRange]) {
        self.meshes
            .draw_mesh(handle, ranges, self.device.as_deref_mut());
    }

    pub fn draw_mesh_all(&mut self, handle: MeshHandle) {
        self.meshes.draw_mesh_all(handle, self.device.as_deref_mut());
    }
}
