//! Render-state shadowing and lazy device commit.
//!
//! The engine keeps a CPU-side [`ShadowState`] of everything the
//! fixed-function pipeline cares about. Setters only mutate the shadow and
//! mark it dirty; nothing reaches the device until
//! [`StateEngine::commit_state_changes`] runs, which pushes the dirty state in
//! a fixed section order (depth/blend/cull, texture stages, material,
//! lighting, fog). Snapshots capture the shadow at material-precompute time
//! and are restored wholesale when a pass begins.

pub mod lights;
pub mod topology;
pub mod tss;

use fixedpipe_math::Vec4;
use tracing::debug;

use crate::device::{ClearFlags, NativeDevice, RenderState};
use lights::{Light, LightDesc, MAX_LIGHTS};
use tss::{TextureOp, TextureStageState, MAX_TEXTURE_STAGES};

/// Packed `0xAARRGGBB` color (`D3DCOLOR` layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedColor(pub u32);

impl PackedColor {
    pub const BLACK: PackedColor = PackedColor::from_rgb(0, 0, 0);
    pub const WHITE: PackedColor = PackedColor::from_rgb(255, 255, 255);

    /// Opaque color from 8-bit channels.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xff, r, g, b)
    }

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        PackedColor(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Packs normalized channels, clamping to `0.0..=1.0`.
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        fn channel(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0) as u8
        }
        Self::from_argb(channel(a), channel(r), channel(g), channel(b))
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    pub fn to_color_value(self) -> ColorValue {
        ColorValue {
            r: self.r() as f32 / 255.0,
            g: self.g() as f32 / 255.0,
            b: self.b() as f32 / 255.0,
            a: self.a() as f32 / 255.0,
        }
    }
}

/// Normalized RGBA color (`D3DCOLORVALUE`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorValue {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Fixed-function material block (`D3DMATERIAL9` minus the texture bindings).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialProperties {
    pub diffuse: ColorValue,
    pub ambient: ColorValue,
    pub specular: ColorValue,
    pub emissive: ColorValue,
    pub power: f32,
}

/// Depth/stencil comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    #[default]
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Alpha blend factor (`D3DBLEND` subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    None,
    Clockwise,
    #[default]
    CounterClockwise,
}

/// Fixed-function fog falloff curve. [`FogMode::None`] disables fog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FogMode {
    #[default]
    None,
    Exp,
    Exp2,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadeMode {
    Flat,
    #[default]
    Gouraud,
}

/// Render target viewport rectangle plus depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            min_z: 0.0,
            max_z: 1.0,
        }
    }
}

/// Stable handle to an entry in the snapshot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnapshotId(pub u32);

/// CPU-side mirror of all pipeline state the commit path manages.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowState {
    pub texture_stages: [TextureStageState; MAX_TEXTURE_STAGES],
    pub material: MaterialProperties,
    pub lighting_enabled: bool,
    pub fog_enabled: bool,
    pub fog_mode: FogMode,
    pub fog_color: PackedColor,
    pub fog_start: f32,
    pub fog_end: f32,
    pub fog_density: f32,
    pub alpha_blend_enabled: bool,
    pub src_blend: BlendFactor,
    pub dest_blend: BlendFactor,
    pub depth_enabled: bool,
    pub depth_write_enabled: bool,
    pub depth_func: CompareFunc,
    pub cull_mode: CullMode,
    /// Set by every shadow setter, cleared by commit.
    pub dirty: bool,
}

impl Default for ShadowState {
    fn default() -> Self {
        let mut stages: [TextureStageState; MAX_TEXTURE_STAGES] =
            std::array::from_fn(TextureStageState::disabled_for_stage);
        stages[0].enabled = true;
        stages[0].color_op = TextureOp::Modulate;
        stages[0].alpha_op = TextureOp::SelectArg1;
        ShadowState {
            texture_stages: stages,
            material: MaterialProperties::default(),
            lighting_enabled: false,
            fog_enabled: false,
            fog_mode: FogMode::None,
            fog_color: PackedColor::default(),
            fog_start: 0.0,
            fog_end: 1.0,
            fog_density: 0.0,
            alpha_blend_enabled: false,
            src_blend: BlendFactor::One,
            dest_blend: BlendFactor::Zero,
            depth_enabled: true,
            depth_write_enabled: true,
            depth_func: CompareFunc::LessEqual,
            cull_mode: CullMode::CounterClockwise,
            dirty: true,
        }
    }
}

/// Per-frame state that never enters snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicState {
    pub cull_mode: CullMode,
    pub viewport: Viewport,
    pub clear_color: PackedColor,
}

impl Default for DynamicState {
    fn default() -> Self {
        DynamicState {
            cull_mode: CullMode::CounterClockwise,
            viewport: Viewport::default(),
            clear_color: PackedColor::BLACK,
        }
    }
}

/// Shadow-state owner: setters, snapshots and the device commit path.
#[derive(Debug)]
pub struct StateEngine {
    current: ShadowState,
    snapshots: Vec<ShadowState>,
    lights: [Light; MAX_LIGHTS],
    light_enabled: [bool; MAX_LIGHTS],
    /// Gates the light array upload separately from the shadow dirty flag;
    /// any light edit re-uploads the whole array on the next commit.
    lights_dirty: bool,
    dynamic: DynamicState,
    current_snapshot: Option<SnapshotId>,
}

impl Default for StateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateEngine {
    pub fn new() -> Self {
        StateEngine {
            current: ShadowState::default(),
            snapshots: Vec::new(),
            lights: [Light::default(); MAX_LIGHTS],
            light_enabled: [false; MAX_LIGHTS],
            lights_dirty: true,
            dynamic: DynamicState::default(),
            current_snapshot: None,
        }
    }

    /// Current shadow state, as the next commit would push it.
    pub fn current(&self) -> &ShadowState {
        &self.current
    }

    pub fn cull_mode(&self) -> CullMode {
        self.dynamic.cull_mode
    }

    pub fn viewport(&self) -> Viewport {
        self.dynamic.viewport
    }

    pub fn clear_color(&self) -> PackedColor {
        self.dynamic.clear_color
    }

    // ---- shadow setters -------------------------------------------------

    /// Replaces the full configuration of one texture stage. Out-of-range
    /// stages are ignored.
    pub fn set_texture_stage_state(&mut self, stage: usize, state: TextureStageState) {
        if stage >= MAX_TEXTURE_STAGES {
            return;
        }
        self.current.texture_stages[stage] = state;
        self.current.dirty = true;
    }

    pub fn set_material(&mut self, material: MaterialProperties) {
        self.current.material = material;
        self.current.dirty = true;
    }

    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.current.lighting_enabled = enabled;
        self.current.dirty = true;
    }

    /// Stores a device-shaped light. Out-of-range indices are ignored.
    pub fn set_light(&mut self, index: usize, light: Light) {
        if index >= MAX_LIGHTS {
            return;
        }
        self.lights[index] = light;
        self.lights_dirty = true;
    }

    pub fn enable_light(&mut self, index: usize, enabled: bool) {
        if index >= MAX_LIGHTS {
            return;
        }
        self.light_enabled[index] = enabled;
        self.lights_dirty = true;
    }

    /// Converts an engine light descriptor, stores it and enables the slot.
    pub fn set_light_desc(&mut self, index: usize, desc: &LightDesc) {
        if index >= MAX_LIGHTS {
            return;
        }
        self.set_light(index, Light::from(desc));
        self.enable_light(index, true);
    }

    pub fn is_light_enabled(&self, index: usize) -> bool {
        index < MAX_LIGHTS && self.light_enabled[index]
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.current.cull_mode = mode;
        self.dynamic.cull_mode = mode;
        self.current.dirty = true;
    }

    /// Selects the fog curve; any mode other than [`FogMode::None`] also
    /// enables fog.
    pub fn set_fog_mode(&mut self, mode: FogMode) {
        self.current.fog_mode = mode;
        self.current.fog_enabled = mode != FogMode::None;
        self.current.dirty = true;
    }

    pub fn set_fog_color(&mut self, color: PackedColor) {
        self.current.fog_color = color;
        self.current.dirty = true;
    }

    pub fn set_fog_start(&mut self, start: f32) {
        self.current.fog_start = start;
        self.current.dirty = true;
    }

    pub fn set_fog_end(&mut self, end: f32) {
        self.current.fog_end = end;
        self.current.dirty = true;
    }

    pub fn set_fog_density(&mut self, density: f32) {
        self.current.fog_density = density;
        self.current.dirty = true;
    }

    pub fn set_alpha_blend(&mut self, enabled: bool, src: BlendFactor, dest: BlendFactor) {
        self.current.alpha_blend_enabled = enabled;
        self.current.src_blend = src;
        self.current.dest_blend = dest;
        self.current.dirty = true;
    }

    pub fn set_depth_state(&mut self, enabled: bool, write_enabled: bool, func: CompareFunc) {
        self.current.depth_enabled = enabled;
        self.current.depth_write_enabled = write_enabled;
        self.current.depth_func = func;
        self.current.dirty = true;
    }

    /// Forces the depth test to `Equal` for multi-pass rendering over already
    /// laid-down depth; releasing it restores `LessEqual`.
    pub fn force_depth_func_equals(&mut self, forced: bool) {
        self.current.depth_func = if forced {
            CompareFunc::Equal
        } else {
            CompareFunc::LessEqual
        };
        self.current.dirty = true;
    }

    /// While `overridden`, pins the depth test enable to `enabled`.
    pub fn override_depth_enable(&mut self, overridden: bool, enabled: bool) {
        if !overridden {
            return;
        }
        self.current.depth_enabled = enabled;
        self.current.dirty = true;
    }

    /// Marks everything dirty so the next commit re-uploads the full state.
    pub fn queue_reset_render_state(&mut self) {
        self.current.dirty = true;
        self.lights_dirty = true;
    }

    // ---- snapshots ------------------------------------------------------

    /// Captures the current shadow state. The returned handle stays valid
    /// until [`StateEngine::clear_snapshots`].
    pub fn take_snapshot(&mut self) -> SnapshotId {
        let mut state = self.current.clone();
        state.dirty = false;
        let id = SnapshotId(self.snapshots.len() as u32);
        self.snapshots.push(state);
        id
    }

    pub fn clear_snapshots(&mut self) {
        self.snapshots.clear();
        self.current_snapshot = None;
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Restores `snapshot` into the current state and marks it dirty. The
    /// handle is recorded as the in-progress pass even when it is out of
    /// range; the restore itself is then skipped.
    pub fn begin_pass(&mut self, snapshot: SnapshotId) {
        self.current_snapshot = Some(snapshot);
        if let Some(state) = self.snapshots.get(snapshot.0 as usize) {
            self.current = state.clone();
            self.current.dirty = true;
        }
    }

    pub fn current_pass(&self) -> Option<SnapshotId> {
        self.current_snapshot
    }

    /// Commits the pass state and ends the pass. Without a preceding
    /// [`StateEngine::begin_pass`] this does nothing.
    pub fn render_pass(&mut self, device: Option<&mut (dyn NativeDevice + '_)>) {
        if self.current_snapshot.is_none() {
            return;
        }
        self.commit_state_changes(device);
        self.current_snapshot = None;
    }

    // ---- snapshot queries -----------------------------------------------

    fn snapshot_state(&self, snapshot: SnapshotId) -> Option<&ShadowState> {
        self.snapshots.get(snapshot.0 as usize)
    }

    pub fn is_translucent(&self, snapshot: SnapshotId) -> bool {
        self.snapshot_state(snapshot)
            .is_some_and(|s| s.alpha_blend_enabled)
    }

    /// Always false: alpha testing rides the material path and never enters
    /// the shadow record.
    pub fn is_alpha_tested(&self, _snapshot: SnapshotId) -> bool {
        false
    }

    pub fn is_depth_write_enabled(&self, snapshot: SnapshotId) -> bool {
        self.snapshot_state(snapshot)
            .map_or(true, |s| s.depth_write_enabled)
    }

    /// Always false on this hardware class.
    pub fn uses_vertex_and_pixel_shaders(&self, _snapshot: SnapshotId) -> bool {
        false
    }

    // ---- device commit --------------------------------------------------

    /// Pushes dirty state to the device. Light edits are flushed even when
    /// the general shadow state is clean; with both flags clear this performs
    /// no device calls. Without a device nothing happens and the dirty flags
    /// survive for the next commit.
    pub fn commit_state_changes(&mut self, device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(device) = device else { return };
        if self.current.dirty {
            self.apply_render_state(device);
            self.apply_texture_stages(device);
            self.apply_material_state(device);
            self.apply_lighting_state(device);
            self.apply_fog_state(device);
            self.current.dirty = false;
        } else if self.lights_dirty {
            self.apply_lighting_state(device);
        }
    }

    fn apply_render_state(&self, device: &mut dyn NativeDevice) {
        let s = &self.current;
        device.set_render_state(RenderState::DepthEnable(s.depth_enabled));
        device.set_render_state(RenderState::DepthWriteEnable(s.depth_write_enabled));
        device.set_render_state(RenderState::DepthFunc(s.depth_func));
        device.set_render_state(RenderState::AlphaBlendEnable(s.alpha_blend_enabled));
        if s.alpha_blend_enabled {
            device.set_render_state(RenderState::SrcBlend(s.src_blend));
            device.set_render_state(RenderState::DestBlend(s.dest_blend));
        }
        device.set_render_state(RenderState::CullMode(s.cull_mode));
    }

    fn apply_texture_stages(&self, device: &mut dyn NativeDevice) {
        for (stage, state) in self.current.texture_stages.iter().enumerate() {
            if state.color_op == TextureOp::Disable {
                device.disable_texture_stages_from(stage);
                return;
            }
            device.set_texture_stage(stage, state);
        }
    }

    fn apply_material_state(&self, device: &mut dyn NativeDevice) {
        device.set_material(&self.current.material);
    }

    fn apply_lighting_state(&mut self, device: &mut dyn NativeDevice) {
        device.set_render_state(RenderState::Lighting(self.current.lighting_enabled));
        if !self.lights_dirty {
            return;
        }
        for index in 0..MAX_LIGHTS {
            if self.light_enabled[index] {
                device.set_light(index, &self.lights[index]);
                device.light_enable(index, true);
            } else {
                device.light_enable(index, false);
            }
        }
        self.lights_dirty = false;
    }

    fn apply_fog_state(&self, device: &mut dyn NativeDevice) {
        let s = &self.current;
        device.set_render_state(RenderState::FogEnable(s.fog_enabled));
        if !s.fog_enabled {
            return;
        }
        device.set_render_state(RenderState::FogColor(s.fog_color));
        device.set_render_state(RenderState::FogMode(s.fog_mode));
        device.set_render_state(RenderState::FogStart(s.fog_start));
        device.set_render_state(RenderState::FogEnd(s.fog_end));
        device.set_render_state(RenderState::FogDensity(s.fog_density));
    }

    /// Restores the documented default state, disables all light slots and
    /// commits. Requires a device; without one this is a full no-op.
    pub fn reset_render_state(&mut self, device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(device) = device else { return };
        debug!("resetting render state");
        self.current_snapshot = None;
        self.current = ShadowState::default();
        self.light_enabled = [false; MAX_LIGHTS];
        self.lights_dirty = true;
        self.dynamic.cull_mode = self.current.cull_mode;
        self.dynamic.clear_color = PackedColor::BLACK;
        self.commit_state_changes(Some(device));
    }

    // ---- immediate device state -----------------------------------------

    /// Sets the global ambient render state from normalized channels.
    pub fn set_ambient_light(&self, r: f32, g: f32, b: f32, device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(device) = device else { return };
        device.set_render_state(RenderState::Ambient(PackedColor::from_f32(r, g, b, 1.0)));
    }

    /// Collapses an ambient cube to a single color by averaging the two
    /// X-axis faces, then sets the ambient render state from it.
    pub fn set_ambient_light_cube(
        &self,
        cube: &[Vec4; 6],
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        let r = (cube[0].x + cube[1].x) * 0.5;
        let g = (cube[0].y + cube[1].y) * 0.5;
        let b = (cube[0].z + cube[1].z) * 0.5;
        self.set_ambient_light(r, g, b, device);
    }

    pub fn set_shade_mode(&self, mode: ShadeMode, device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(device) = device else { return };
        device.set_render_state(RenderState::ShadeMode(mode));
    }

    /// Applies the first viewport; this hardware class has a single viewport,
    /// additional entries are ignored. Without a device the stored viewport
    /// is left untouched as well.
    pub fn set_viewports(&mut self, viewports: &[Viewport], device: Option<&mut (dyn NativeDevice + '_)>) {
        let Some(device) = device else { return };
        let Some(first) = viewports.first() else {
            return;
        };
        device.set_viewport(first);
        self.dynamic.viewport = *first;
    }

    pub fn clear_color_3ub(&mut self, r: u8, g: u8, b: u8) {
        self.dynamic.clear_color = PackedColor::from_rgb(r, g, b);
    }

    pub fn clear_color_4ub(&mut self, r: u8, g: u8, b: u8, a: u8) {
        self.dynamic.clear_color = PackedColor::from_argb(a, r, g, b);
    }

    /// Clears the selected buffers, using the stored clear color for the
    /// render target and fixed 1.0/0 values for depth and stencil.
    pub fn clear_buffers(
        &self,
        clear_color: bool,
        clear_depth: bool,
        clear_stencil: bool,
        device: Option<&mut (dyn NativeDevice + '_)>,
    ) {
        let Some(device) = device else { return };
        let mut flags = ClearFlags::empty();
        if clear_color {
            flags |= ClearFlags::TARGET;
        }
        if clear_depth {
            flags |= ClearFlags::DEPTH;
        }
        if clear_stencil {
            flags |= ClearFlags::STENCIL;
        }
        if flags.is_empty() {
            return;
        }
        device.clear(flags, self.dynamic.clear_color, 1.0, 0);
    }
}
