//! Materials and their translation to fixed-function pipeline state.
//!
//! A [`Material`] is the engine-facing description: a shader name, a bag of
//! `$`-prefixed parameters and a set of behavior flags. None of it executes
//! anything; [`translate::translate_material`] maps it onto texture stage
//! setups, blend modes and a material block the commit path can push.

pub mod translate;

pub use translate::{apply_material, translate_material, FixedFunctionMaterialState};

use hashbrown::HashMap;

/// Opaque handle to a texture owned by the caller's texture system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

bitflags::bitflags! {
    /// Behavior flags a material carries alongside its shader parameters.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        const NO_CULL = 1 << 0;
        const ALPHA_TEST = 1 << 1;
        const VERTEX_COLOR = 1 << 2;
        const ADDITIVE = 1 << 3;
        const TRANSLUCENT = 1 << 4;
    }
}

/// One shader parameter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Texture(TextureHandle),
    Float(f32),
    Int(i32),
    Vector([f32; 3]),
}

/// Engine-facing material description. Parameter names are matched
/// case-insensitively, `$basetexture` and `$BaseTexture` are the same key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Material {
    shader_name: String,
    params: HashMap<String, ParamValue>,
    flags: MaterialFlags,
}

impl Material {
    pub fn new(shader_name: impl Into<String>) -> Self {
        Material {
            shader_name: shader_name.into(),
            params: HashMap::new(),
            flags: MaterialFlags::empty(),
        }
    }

    pub fn shader_name(&self) -> &str {
        &self.shader_name
    }

    pub fn flags(&self) -> MaterialFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: MaterialFlags) {
        self.flags = flags;
    }

    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn set_param(&mut self, name: &str, value: ParamValue) {
        self.params.insert(name.to_ascii_lowercase(), value);
    }

    pub fn with_param(mut self, name: &str, value: ParamValue) -> Self {
        self.set_param(name, value);
        self
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(&name.to_ascii_lowercase())
    }

    pub fn texture_param(&self, name: &str) -> Option<TextureHandle> {
        match self.param(name) {
            Some(ParamValue::Texture(handle)) => Some(*handle),
            _ => None,
        }
    }

    /// Numeric parameter as a float; integer values coerce.
    pub fn float_param(&self, name: &str) -> Option<f32> {
        match self.param(name) {
            Some(ParamValue::Float(v)) => Some(*v),
            Some(ParamValue::Int(v)) => Some(*v as f32),
            _ => None,
        }
    }

    /// Numeric parameter as an integer; float values truncate.
    pub fn int_param(&self, name: &str) -> Option<i32> {
        match self.param(name) {
            Some(ParamValue::Int(v)) => Some(*v),
            Some(ParamValue::Float(v)) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn vector_param(&self, name: &str) -> Option<[f32; 3]> {
        match self.param(name) {
            Some(ParamValue::Vector(v)) => Some(*v),
            _ => None,
        }
    }
}
