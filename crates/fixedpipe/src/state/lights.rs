//! Fixed-function light sources.
//!
//! Two shapes exist: [`LightDesc`] is what scene code hands us, [`Light`] is
//! the device-facing record (mirroring `D3DLIGHT9`). The state engine stores
//! the device shape so commits can push the array verbatim.

use fixedpipe_math::Vec3;

use super::ColorValue;

/// Number of hardware light slots the pipeline models.
pub const MAX_LIGHTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LightType {
    #[default]
    Point,
    Spot,
    Directional,
}

/// Device-shaped light record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Light {
    pub light_type: LightType,
    pub diffuse: ColorValue,
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    pub falloff: f32,
    pub attenuation0: f32,
    pub attenuation1: f32,
    pub attenuation2: f32,
    /// Inner cone angle in radians, spot lights only.
    pub theta: f32,
    /// Outer cone angle in radians, spot lights only.
    pub phi: f32,
}

/// Engine-facing light descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightDesc {
    pub light_type: LightType,
    pub color: Vec3,
    pub position: Vec3,
    pub direction: Vec3,
    pub range: f32,
    pub falloff: f32,
    pub attenuation0: f32,
    pub attenuation1: f32,
    pub attenuation2: f32,
    pub theta: f32,
    pub phi: f32,
}

impl From<&LightDesc> for Light {
    fn from(desc: &LightDesc) -> Self {
        Light {
            light_type: desc.light_type,
            diffuse: ColorValue {
                r: desc.color.x,
                g: desc.color.y,
                b: desc.color.z,
                a: 1.0,
            },
            position: desc.position,
            direction: desc.direction,
            range: desc.range,
            falloff: desc.falloff,
            attenuation0: desc.attenuation0,
            attenuation1: desc.attenuation1,
            attenuation2: desc.attenuation2,
            theta: desc.theta,
            phi: desc.phi,
        }
    }
}
