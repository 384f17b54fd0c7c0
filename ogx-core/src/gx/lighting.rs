// GX lighting: color channel control and hardware light objects.
use serde::Serialize;

use super::GxColor;
use crate::matrix;

/// One color channel configuration (material + ambient source + light mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ColorChannel {
    pub enabled: bool,
    pub amb_src: ColorSrc,
    pub mat_src: ColorSrc,
    /// Bitmask over hardware light object slots.
    pub light_mask: u8,
    pub diff_fn: DiffuseFunction,
    pub attn_fn: AttenuationFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColorSrc {
    Register = 0,
    Vertex = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiffuseFunction {
    None = 0,
    Sign = 1,
    Clamp = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttenuationFunction {
    None = 0,
    Spec = 1,
    Spot = 2,
}

impl Default for ColorChannel {
    fn default() -> Self {
        Self::unlit(ColorSrc::Register)
    }
}

impl ColorChannel {
    /// Lighting disabled; the channel outputs its material source.
    pub fn unlit(mat_src: ColorSrc) -> Self {
        Self {
            enabled: false,
            amb_src: ColorSrc::Register,
            mat_src,
            light_mask: 0,
            diff_fn: DiffuseFunction::None,
            attn_fn: AttenuationFunction::None,
        }
    }

    pub fn lit(mat_src: ColorSrc, light_mask: u8, diff_fn: DiffuseFunction, attn_fn: AttenuationFunction) -> Self {
        Self {
            enabled: true,
            amb_src: ColorSrc::Register,
            mat_src,
            light_mask,
            diff_fn,
            attn_fn,
        }
    }
}

/// Hardware light object, as loaded into one of the `MAX_GX_LIGHTS` slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LightObj {
    pub color: GxColor,
    pub position: [f32; 3],
    pub direction: [f32; 3],
    /// Angle attenuation coefficients.
    pub attn_a: [f32; 3],
    /// Distance attenuation coefficients.
    pub attn_k: [f32; 3],
}

/// Distance used to push the specular light source to infinity.
const LARGE_NUMBER: f32 = 1_048_576.0;

impl LightObj {
    pub fn new(color: GxColor, position: [f32; 3]) -> Self {
        Self {
            color,
            position,
            direction: [0.0, 0.0, 0.0],
            attn_a: [1.0, 0.0, 0.0],
            attn_k: [1.0, 0.0, 0.0],
        }
    }

    pub fn set_attn(&mut self, a: [f32; 3], k: [f32; 3]) {
        self.attn_a = a;
        self.attn_k = k;
    }

    /// Configure a specular light from its light direction. The half-angle
    /// vector assumes a viewer at (0, 0, 1).
    pub fn set_specular_dir(&mut self, dir: [f32; 3]) {
        let half = matrix::normalize([-dir[0], -dir[1], -dir[2] + 1.0]);
        self.position = [
            -dir[0] * LARGE_NUMBER,
            -dir[1] * LARGE_NUMBER,
            -dir[2] * LARGE_NUMBER,
        ];
        self.direction = half;
    }

    /// Shininess falloff through the angle/distance attenuation terms.
    pub fn set_shininess(&mut self, shininess: f32) {
        let half = shininess / 2.0;
        self.set_attn([0.0, 0.0, 1.0], [half, 0.0, 1.0 - half]);
    }
}
