//! Shader-name to fixed-function translation.
//!
//! The engine's materials name shaders this hardware class cannot run.
//! Translation maps each known shader onto up to four texture stage setups
//! plus lighting, blending and alpha-test decisions. Unknown shaders warn
//! and render as unlit base texture rather than failing.

use tracing::warn;

use crate::device::{NativeDevice, RenderState};
use crate::state::tss::{TextureArg, TextureOp, TextureStageState};
use crate::state::{BlendFactor, CompareFunc, CullMode, MaterialProperties, PackedColor};

use super::{Material, MaterialFlags, TextureHandle};

/// Texture stages material translation may populate.
pub const MAX_MATERIAL_STAGES: usize = 4;

/// Everything a material resolves to once translated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedFunctionMaterialState {
    pub base_texture: Option<TextureHandle>,
    pub lightmap: Option<TextureHandle>,
    pub detail: Option<TextureHandle>,
    pub envmap: Option<TextureHandle>,
    pub stages: [TextureStageState; MAX_MATERIAL_STAGES],
    pub stage_count: usize,
    pub diffuse: PackedColor,
    pub ambient: PackedColor,
    pub specular: PackedColor,
    pub emissive: PackedColor,
    pub shininess: f32,
    pub lighting_enabled: bool,
    /// Consumed by the geometry layer when choosing vertex formats.
    pub vertex_color: bool,
    pub alpha_blend: bool,
    pub src_blend: BlendFactor,
    pub dest_blend: BlendFactor,
    pub alpha_test: bool,
    /// Normalized alpha-test reference, applied as `GreaterEqual`.
    pub alpha_test_ref: f32,
    pub two_sided: bool,
}

impl Default for FixedFunctionMaterialState {
    fn default() -> Self {
        FixedFunctionMaterialState {
            base_texture: None,
            lightmap: None,
            detail: None,
            envmap: None,
            stages: std::array::from_fn(TextureStageState::disabled_for_stage),
            stage_count: 1,
            diffuse: PackedColor::WHITE,
            ambient: PackedColor::WHITE,
            specular: PackedColor::BLACK,
            emissive: PackedColor::BLACK,
            shininess: 0.0,
            lighting_enabled: true,
            vertex_color: false,
            alpha_blend: false,
            src_blend: BlendFactor::One,
            dest_blend: BlendFactor::Zero,
            alpha_test: false,
            alpha_test_ref: 0.0,
            two_sided: false,
        }
    }
}

fn combiner_stage(
    stage: usize,
    color_op: TextureOp,
    alpha_op: TextureOp,
    arg1: TextureArg,
    arg2: TextureArg,
) -> TextureStageState {
    TextureStageState {
        enabled: true,
        color_op,
        color_arg1: arg1,
        color_arg2: arg2,
        alpha_op,
        alpha_arg1: arg1,
        alpha_arg2: arg2,
        texcoord_index: stage as u8,
        ..TextureStageState::disabled_for_stage(stage)
    }
}

fn set_stage(state: &mut FixedFunctionMaterialState, stage: usize, config: TextureStageState) {
    if stage < MAX_MATERIAL_STAGES {
        state.stages[stage] = config;
    }
}

fn translate_lightmapped(material: &Material, state: &mut FixedFunctionMaterialState) {
    state.base_texture = material.texture_param("$basetexture");
    state.lightmap = material.texture_param("$lightmap");
    set_stage(
        state,
        0,
        combiner_stage(
            0,
            TextureOp::SelectArg1,
            TextureOp::SelectArg1,
            TextureArg::Texture,
            TextureArg::Diffuse,
        ),
    );
    if state.lightmap.is_some() {
        // Lightmap modulates at 2x to recover overbright range; alpha passes
        // the base texture's alpha through.
        set_stage(
            state,
            1,
            combiner_stage(
                1,
                TextureOp::Modulate2x,
                TextureOp::SelectArg2,
                TextureArg::Texture,
                TextureArg::Current,
            ),
        );
        state.stage_count = 2;
    } else {
        state.stage_count = 1;
    }
    state.lighting_enabled = false;
}

fn translate_vertex_lit(material: &Material, state: &mut FixedFunctionMaterialState) {
    state.base_texture = material.texture_param("$basetexture");
    set_stage(
        state,
        0,
        combiner_stage(
            0,
            TextureOp::Modulate,
            TextureOp::Modulate,
            TextureArg::Texture,
            TextureArg::Diffuse,
        ),
    );
    state.stage_count = 1;
    state.lighting_enabled = true;
    if material.int_param("$selfillum").unwrap_or(0) != 0 {
        state.emissive = PackedColor::WHITE;
    }
}

fn translate_unlit(material: &Material, state: &mut FixedFunctionMaterialState) {
    state.base_texture = material.texture_param("$basetexture");
    set_stage(
        state,
        0,
        combiner_stage(
            0,
            TextureOp::SelectArg1,
            TextureOp::SelectArg1,
            TextureArg::Texture,
            TextureArg::Diffuse,
        ),
    );
    state.stage_count = 1;
    state.lighting_enabled = false;
    if material.int_param("$vertexcolor").unwrap_or(0) != 0 {
        set_stage(
            state,
            0,
            combiner_stage(
                0,
                TextureOp::Modulate,
                TextureOp::Modulate,
                TextureArg::Texture,
                TextureArg::Diffuse,
            ),
        );
        state.vertex_color = true;
    }
}

fn translate_unlit_two_texture(material: &Material, state: &mut FixedFunctionMaterialState) {
    state.base_texture = material.texture_param("$basetexture");
    set_stage(
        state,
        0,
        combiner_stage(
            0,
            TextureOp::SelectArg1,
            TextureOp::SelectArg1,
            TextureArg::Texture,
            TextureArg::Diffuse,
        ),
    );
    state.stage_count = 1;
    state.lighting_enabled = false;
    if let Some(texture2) = material.texture_param("$texture2") {
        state.detail = Some(texture2);
        set_stage(
            state,
            1,
            combiner_stage(
                1,
                TextureOp::Modulate,
                TextureOp::Modulate,
                TextureArg::Texture,
                TextureArg::Current,
            ),
        );
        state.stage_count = 2;
    }
}

fn translate_modulate(material: &Material, state: &mut FixedFunctionMaterialState) {
    state.base_texture = material.texture_param("$basetexture");
    set_stage(
        state,
        0,
        combiner_stage(
            0,
            TextureOp::Modulate,
            TextureOp::Modulate,
            TextureArg::Texture,
            TextureArg::Diffuse,
        ),
    );
    state.stage_count = 1;
    state.lighting_enabled = false;
    state.vertex_color = true;
    state.alpha_blend = true;
    state.src_blend = BlendFactor::DestColor;
    state.dest_blend = BlendFactor::Zero;
}

fn translate_sky(material: &Material, state: &mut FixedFunctionMaterialState) {
    state.base_texture = material.texture_param("$basetexture");
    set_stage(
        state,
        0,
        combiner_stage(
            0,
            TextureOp::SelectArg1,
            TextureOp::SelectArg1,
            TextureArg::Texture,
            TextureArg::Diffuse,
        ),
    );
    state.stage_count = 1;
    state.lighting_enabled = false;
}

fn translate_water(material: &Material, state: &mut FixedFunctionMaterialState) {
    translate_sky(material, state);
    state.alpha_blend = true;
    state.src_blend = BlendFactor::SrcAlpha;
    state.dest_blend = BlendFactor::InvSrcAlpha;
}

fn translate_flags(material: &Material, state: &mut FixedFunctionMaterialState) {
    let flags = material.flags();
    if flags.contains(MaterialFlags::NO_CULL) {
        state.two_sided = true;
    }
    if flags.contains(MaterialFlags::ALPHA_TEST) {
        state.alpha_test = true;
        state.alpha_test_ref = material
            .float_param("$alphatestreference")
            .map_or(0.5, |v| v / 255.0);
    }
    if flags.contains(MaterialFlags::VERTEX_COLOR) {
        state.vertex_color = true;
    }
}

fn translate_blend_mode(material: &Material, state: &mut FixedFunctionMaterialState) {
    let flags = material.flags();
    if flags.contains(MaterialFlags::ADDITIVE) {
        state.alpha_blend = true;
        state.src_blend = BlendFactor::One;
        state.dest_blend = BlendFactor::One;
    } else if flags.contains(MaterialFlags::TRANSLUCENT) {
        state.alpha_blend = true;
        state.src_blend = BlendFactor::SrcAlpha;
        state.dest_blend = BlendFactor::InvSrcAlpha;
    }
}

/// Translates a material to fixed-function state by shader name, matched
/// case-insensitively. Unknown shaders warn once per call and translate as
/// unlit base texture; flag and blend handling still applies.
pub fn translate_material(material: &Material) -> FixedFunctionMaterialState {
    let mut state = FixedFunctionMaterialState::default();
    let name = material.shader_name();
    if name.eq_ignore_ascii_case("LightmappedGeneric")
        || name.eq_ignore_ascii_case("WorldVertexTransition")
        || name.eq_ignore_ascii_case("Lightmapped_4WayBlend")
    {
        translate_lightmapped(material, &mut state);
    } else if name.eq_ignore_ascii_case("VertexLitGeneric") {
        translate_vertex_lit(material, &mut state);
    } else if name.eq_ignore_ascii_case("UnlitGeneric") {
        translate_unlit(material, &mut state);
    } else if name.eq_ignore_ascii_case("UnlitTwoTexture") {
        translate_unlit_two_texture(material, &mut state);
    } else if name.eq_ignore_ascii_case("Modulate") {
        translate_modulate(material, &mut state);
    } else if name.eq_ignore_ascii_case("Sky") || name.eq_ignore_ascii_case("SkyBox") {
        translate_sky(material, &mut state);
    } else if name.eq_ignore_ascii_case("Water") || name.eq_ignore_ascii_case("Refract") {
        translate_water(material, &mut state);
    } else {
        warn!(shader = name, "unknown shader, using unlit fallback");
        translate_unlit(material, &mut state);
    }
    translate_flags(material, &mut state);
    translate_blend_mode(material, &mut state);
    state
}

/// Pushes translated material state straight to the device: the populated
/// stages, one disable for the rest of the material stage window, the
/// material block, then lighting, blending, alpha test and culling.
pub fn apply_material(state: &FixedFunctionMaterialState, device: &mut dyn NativeDevice) {
    let stage_count = state.stage_count.min(MAX_MATERIAL_STAGES);
    for (stage, config) in state.stages.iter().enumerate().take(stage_count) {
        device.set_texture_stage(stage, config);
    }
    if stage_count < MAX_MATERIAL_STAGES {
        device.disable_texture_stages_from(stage_count);
    }
    device.set_material(&MaterialProperties {
        diffuse: state.diffuse.to_color_value(),
        ambient: state.ambient.to_color_value(),
        specular: state.specular.to_color_value(),
        emissive: state.emissive.to_color_value(),
        power: state.shininess,
    });
    device.set_render_state(RenderState::Lighting(state.lighting_enabled));
    device.set_render_state(RenderState::AlphaBlendEnable(state.alpha_blend));
    if state.alpha_blend {
        device.set_render_state(RenderState::SrcBlend(state.src_blend));
        device.set_render_state(RenderState::DestBlend(state.dest_blend));
    }
    device.set_render_state(RenderState::AlphaTestEnable(state.alpha_test));
    if state.alpha_test {
        let reference = (state.alpha_test_ref * 255.0).clamp(0.0, 255.0) as u8;
        device.set_render_state(RenderState::AlphaRef(reference));
        device.set_render_state(RenderState::AlphaFunc(CompareFunc::GreaterEqual));
    }
    device.set_render_state(RenderState::CullMode(if state.two_sided {
        CullMode::None
    } else {
        CullMode::CounterClockwise
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_lit_white_single_stage() {
        let s = FixedFunctionMaterialState::default();
        assert_eq!(s.stage_count, 1);
        assert_eq!(s.diffuse, PackedColor::WHITE);
        assert_eq!(s.ambient, PackedColor::WHITE);
        assert_eq!(s.specular, PackedColor::BLACK);
        assert_eq!(s.emissive, PackedColor::BLACK);
        assert!(s.lighting_enabled);
        assert!(!s.alpha_blend);
        assert!(s.base_texture.is_none());
    }

    #[test]
    fn unknown_shader_translates_like_unlit() {
        let unknown = Material::new("SpriteCard_DX11_Or_Whatever");
        let unlit = Material::new("UnlitGeneric");
        assert_eq!(translate_material(&unknown), translate_material(&unlit));
    }
}
