//! Texture stage state: the per-unit combiner configuration of the
//! fixed-function texture pipeline.
//!
//! Each stage combines its bound texture with the running result of the
//! previous stages using one color and one alpha operator. Stage disabling
//! follows D3D9 semantics: a color op of [`TextureOp::Disable`] on stage N
//! disables stage N and all subsequent stages.

/// Number of texture stages the pipeline models.
pub const MAX_TEXTURE_STAGES: usize = 8;

/// Fixed-function texture combining operator (`D3DTEXTUREOP` subset this
/// hardware class supports).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureOp {
    #[default]
    Disable,
    SelectArg1,
    SelectArg2,
    Modulate,
    Modulate2x,
    Modulate4x,
    Add,
    AddSigned,
    Subtract,
    BlendDiffuseAlpha,
    BlendTextureAlpha,
}

/// Texture stage argument selector (`D3DTA_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureArg {
    /// Interpolated vertex color.
    Diffuse,
    /// Result of the previous stage (diffuse on stage 0).
    Current,
    /// The texture bound to this stage.
    Texture,
    /// The global texture factor render state.
    TextureFactor,
    /// Interpolated specular color.
    Specular,
}

/// Texture coordinate transform applied before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTransform {
    #[default]
    Disabled,
    /// Transform and use the first two output coordinates.
    Count2,
    /// Transform and use the first three output coordinates.
    Count3,
}

/// Full configuration of one texture stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureStageState {
    pub enabled: bool,
    pub color_op: TextureOp,
    pub color_arg1: TextureArg,
    pub color_arg2: TextureArg,
    pub alpha_op: TextureOp,
    pub alpha_arg1: TextureArg,
    pub alpha_arg2: TextureArg,
    /// Which vertex texcoord set this stage samples with.
    pub texcoord_index: u8,
    pub texture_transform: TextureTransform,
}

impl TextureStageState {
    /// Reset configuration for `stage`: disabled, texture/current argument
    /// wiring, texcoord set matching the stage index.
    pub fn disabled_for_stage(stage: usize) -> Self {
        Self {
            enabled: false,
            color_op: TextureOp::Disable,
            color_arg1: TextureArg::Texture,
            color_arg2: TextureArg::Current,
            alpha_op: TextureOp::Disable,
            alpha_arg1: TextureArg::Texture,
            alpha_arg2: TextureArg::Current,
            texcoord_index: stage as u8,
            texture_transform: TextureTransform::Disabled,
        }
    }
}

impl Default for TextureStageState {
    fn default() -> Self {
        Self::disabled_for_stage(0)
    }
}
