// Logical lights, material and light-model state.

use serde::{Deserialize, Serialize};

use super::DirtyFlags;
use crate::matrix::{self, Mtx};

/// Logical lights (`Capability::Light(0..MAX_LIGHTS)`).
pub const MAX_LIGHTS: usize = 8;

/// Scale applied to a directional light's direction so it can be handed to
/// GX as a very distant point.
pub const DIRECTIONAL_DISTANCE: f32 = 100_000.0;

/// Hardware slot marker for "not allocated this frame".
pub const UNALLOCATED: i8 = -1;

/// One logical light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub enabled: bool,
    /// Eye-space position; w == 0 means directional.
    pub position: [f32; 4],
    pub spot_direction: [f32; 3],
    pub spot_cutoff: f32,
    pub spot_exponent: f32,
    /// Constant, linear, quadratic.
    pub attenuation: [f32; 3],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],

    // Hardware light slots assigned by the last allocation, or UNALLOCATED.
    pub gx_ambient: i8,
    pub gx_diffuse: i8,
    pub gx_specular: i8,
}

impl Light {
    /// Power-on state of light `index`. Light 0 is white, the others black.
    pub fn new(index: usize) -> Self {
        let (diffuse, specular) = if index == 0 {
            ([1.0; 4], [1.0; 4])
        } else {
            ([0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 0.0, 1.0])
        };
        Self {
            enabled: false,
            position: [0.0, 0.0, DIRECTIONAL_DISTANCE, 0.0],
            spot_direction: [0.0, 0.0, -1.0],
            spot_cutoff: 180.0,
            spot_exponent: 0.0,
            attenuation: [1.0, 0.0, 0.0],
            ambient: [0.0, 0.0, 0.0, 1.0],
            diffuse,
            specular,
            gx_ambient: UNALLOCATED,
            gx_diffuse: UNALLOCATED,
            gx_specular: UNALLOCATED,
        }
    }

    pub fn is_directional(&self) -> bool {
        self.position[3] == 0.0
    }

    pub fn clear_allocation(&mut self) {
        self.gx_ambient = UNALLOCATED;
        self.gx_diffuse = UNALLOCATED;
        self.gx_specular = UNALLOCATED;
    }
}

/// RGB all zero; alpha is ignored.
pub fn is_black(color: &[f32; 4]) -> bool {
    color[0] == 0.0 && color[1] == 0.0 && color[2] == 0.0
}

/// Which material colors follow the current color when color material is on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMaterialMode {
    Ambient,
    Diffuse,
    #[default]
    AmbientAndDiffuse,
    Specular,
    Emission,
}

impl ColorMaterialMode {
    pub fn tracks_ambient(self) -> bool {
        matches!(self, ColorMaterialMode::Ambient | ColorMaterialMode::AmbientAndDiffuse)
    }

    pub fn tracks_diffuse(self) -> bool {
        matches!(self, ColorMaterialMode::Diffuse | ColorMaterialMode::AmbientAndDiffuse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emission: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            emission: [0.0, 0.0, 0.0, 1.0],
            shininess: 0.0,
        }
    }
}

/// Hardware light masks for the ambient, diffuse and specular contributions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LightMasks {
    pub ambient: u8,
    pub diffuse: u8,
    pub specular: u8,
}

#[derive(Debug, Clone)]
pub struct LightingState {
    pub enabled: bool,
    pub lights: [Light; MAX_LIGHTS],
    pub global_ambient: [f32; 4],
    pub material: Material,
    pub color_material_enabled: bool,
    pub color_material_mode: ColorMaterialMode,
    /// Masks from the last light resolution.
    pub masks: LightMasks,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            enabled: false,
            lights: core::array::from_fn(Light::new),
            global_ambient: [0.2, 0.2, 0.2, 1.0],
            material: Material::default(),
            color_material_enabled: false,
            color_material_mode: ColorMaterialMode::AmbientAndDiffuse,
            masks: LightMasks::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parameter tables
// ---------------------------------------------------------------------------

/// `light(index, param)` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "param", content = "value", rename_all = "snake_case")]
pub enum LightParam {
    Ambient([f32; 4]),
    Diffuse([f32; 4]),
    Specular([f32; 4]),
    /// Object-space position, transformed by the current model-view.
    Position([f32; 4]),
    SpotDirection([f32; 3]),
    SpotCutoff(f32),
    SpotExponent(f32),
    ConstantAttenuation(f32),
    LinearAttenuation(f32),
    QuadraticAttenuation(f32),
}

impl LightParam {
    /// Store the parameter into `light`. `modelview` is the model-view matrix
    /// current at call time.
    pub fn apply(self, light: &mut Light, modelview: &Mtx) {
        match self {
            LightParam::Ambient(c) => light.ambient = c,
            LightParam::Diffuse(c) => light.diffuse = c,
            LightParam::Specular(c) => light.specular = c,
            LightParam::Position(p) => {
                let scale = if p[3] == 0.0 { DIRECTIONAL_DISTANCE } else { 1.0 };
                let eye = matrix::transform_point(modelview, [p[0] * scale, p[1] * scale, p[2] * scale]);
                light.position = [eye[0], eye[1], eye[2], p[3]];
            }
            LightParam::SpotDirection(d) => light.spot_direction = d,
            LightParam::SpotCutoff(v) => light.spot_cutoff = v,
            LightParam::SpotExponent(v) => light.spot_exponent = v,
            LightParam::ConstantAttenuation(v) => light.attenuation[0] = v,
            LightParam::LinearAttenuation(v) => light.attenuation[1] = v,
            LightParam::QuadraticAttenuation(v) => light.attenuation[2] = v,
        }
    }

    pub fn dirty(self) -> DirtyFlags {
        DirtyFlags::LIGHTING
    }
}

/// `material(param)` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "param", content = "value", rename_all = "snake_case")]
pub enum MaterialParam {
    Ambient([f32; 4]),
    Diffuse([f32; 4]),
    AmbientAndDiffuse([f32; 4]),
    Emission([f32; 4]),
    Specular([f32; 4]),
    Shininess(f32),
}

impl MaterialParam {
    pub fn apply(self, material: &mut Material) {
        match self {
            MaterialParam::Ambient(c) => material.ambient = c,
            MaterialParam::Diffuse(c) => material.diffuse = c,
            MaterialParam::AmbientAndDiffuse(c) => {
                material.ambient = c;
                material.diffuse = c;
            }
            MaterialParam::Emission(c) => material.emission = c,
            MaterialParam::Specular(c) => material.specular = c,
            MaterialParam::Shininess(s) => material.shininess = s,
        }
    }

    pub fn dirty(self) -> DirtyFlags {
        DirtyFlags::MATERIAL
    }
}
