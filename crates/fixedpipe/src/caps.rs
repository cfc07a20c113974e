//! Hardware capability model.
//!
//! Whatever the adapter reports, the pipeline presents itself as DX8-class
//! fixed-function hardware: shader support is forced off, stage counts clamp
//! to what the commit path models, and everything else passes through.
//! Callers probe for features through [`HardwareCaps::supports`] or demand
//! them with [`HardwareCaps::require`], which turns a missing feature into a
//! typed error instead of a crash deeper in the pipeline.

use std::fmt;

use thiserror::Error;

use crate::state::tss::MAX_TEXTURE_STAGES;

/// DX support level this hardware class reports, regardless of the adapter.
pub const DX_SUPPORT_LEVEL: u32 = 80;

/// A feature callers may probe for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    VertexShaders,
    PixelShaders,
    OcclusionQueries,
    HdrRendering,
    ShadowDepthTextures,
    VertexMorphing,
    HardwareLighting,
    CubeMaps,
    MipmappedCubeMaps,
    NonPow2Textures,
    GammaRampControl,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::VertexShaders => "vertex shaders",
            Capability::PixelShaders => "pixel shaders",
            Capability::OcclusionQueries => "occlusion queries",
            Capability::HdrRendering => "HDR rendering",
            Capability::ShadowDepthTextures => "shadow depth textures",
            Capability::VertexMorphing => "vertex morphing",
            Capability::HardwareLighting => "hardware lighting",
            Capability::CubeMaps => "cube maps",
            Capability::MipmappedCubeMaps => "mipmapped cube maps",
            Capability::NonPow2Textures => "non-power-of-two textures",
            Capability::GammaRampControl => "gamma ramp control",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CapsError {
    #[error("{0} not supported on this hardware class")]
    Unsupported(Capability),
}

/// Capabilities as the adapter backend reports them, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawCaps {
    pub max_texture_blend_stages: usize,
    pub max_simultaneous_textures: usize,
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    pub max_volume_extent: u32,
    pub max_texture_aspect_ratio: u32,
    pub max_primitive_count: u32,
    pub max_anisotropy: u32,
    pub hardware_transform_and_light: bool,
    pub cube_maps: bool,
    pub mipmapped_cube_maps: bool,
    pub pow2_textures_required: bool,
    pub can_calibrate_gamma: bool,
}

/// Adapter capabilities after clamping to the fixed-function feature set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardwareCaps {
    pub dx_support_level: u32,
    pub max_dx_support_level: u32,
    pub supports_vertex_shaders: bool,
    pub supports_pixel_shaders: bool,
    pub num_texture_stages: usize,
    pub num_samplers: usize,
    pub max_texture_width: u32,
    pub max_texture_height: u32,
    pub max_texture_depth: u32,
    pub max_texture_aspect_ratio: u32,
    pub max_primitive_count: u32,
    pub max_anisotropy: u32,
    pub hardware_lighting: bool,
    pub software_vertex_processing: bool,
    pub cube_maps: bool,
    pub mipmapped_cube_maps: bool,
    pub non_pow2_textures: bool,
    pub gamma_ramp_control: bool,
}

impl HardwareCaps {
    /// Clamps reported caps to the fixed-function feature set: DX level is
    /// pinned, shaders are off, stage and sampler counts cap at what the
    /// commit path models, and transform/lighting falls back to software
    /// when the hardware lacks it.
    pub fn from_raw(raw: &RawCaps) -> Self {
        HardwareCaps {
            dx_support_level: DX_SUPPORT_LEVEL,
            max_dx_support_level: DX_SUPPORT_LEVEL,
            supports_vertex_shaders: false,
            supports_pixel_shaders: false,
            num_texture_stages: raw.max_texture_blend_stages.min(MAX_TEXTURE_STAGES),
            num_samplers: raw.max_simultaneous_textures.min(MAX_TEXTURE_STAGES),
            max_texture_width: raw.max_texture_width,
            max_texture_height: raw.max_texture_height,
            max_texture_depth: raw.max_volume_extent,
            max_texture_aspect_ratio: raw.max_texture_aspect_ratio,
            max_primitive_count: raw.max_primitive_count,
            max_anisotropy: raw.max_anisotropy,
            hardware_lighting: raw.hardware_transform_and_light,
            software_vertex_processing: !raw.hardware_transform_and_light,
            cube_maps: raw.cube_maps,
            mipmapped_cube_maps: raw.mipmapped_cube_maps,
            non_pow2_textures: !raw.pow2_textures_required,
            gamma_ramp_control: raw.can_calibrate_gamma,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::VertexShaders => self.supports_vertex_shaders,
            Capability::PixelShaders => self.supports_pixel_shaders,
            // Never present on this hardware class, whatever the adapter says.
            Capability::OcclusionQueries
            | Capability::HdrRendering
            | Capability::ShadowDepthTextures
            | Capability::VertexMorphing => false,
            Capability::HardwareLighting => self.hardware_lighting,
            Capability::CubeMaps => self.cube_maps,
            Capability::MipmappedCubeMaps => self.mipmapped_cube_maps,
            Capability::NonPow2Textures => self.non_pow2_textures,
            Capability::GammaRampControl => self.gamma_ramp_control,
        }
    }

    /// Demands a capability, turning its absence into a typed error.
    pub fn require(&self, capability: Capability) -> Result<(), CapsError> {
        if self.supports(capability) {
            Ok(())
        } else {
            Err(CapsError::Unsupported(capability))
        }
    }
}
