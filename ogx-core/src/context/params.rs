// Argument types of the public API.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::gx::state::BlendFactor;
use crate::state::FogMode;

/// Toggles for `enable`, `disable` and `is_enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    #[serde(rename = "texture_2d")]
    Texture2D,
    TextureGenS,
    TextureGenT,
    TextureGenR,
    TextureGenQ,
    ColorMaterial,
    CullFace,
    AlphaTest,
    Blend,
    DepthTest,
    StencilTest,
    Fog,
    Lighting,
    Light(u8),
    ClipPlane(u8),
    PolygonOffsetFill,
}

/// Blend factors as the API names them. Some have no GX counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlBlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    ConstantColor,
    OneMinusConstantColor,
    ConstantAlpha,
    OneMinusConstantAlpha,
    SrcAlphaSaturate,
}

impl GlBlendFactor {
    /// The GX factor, or `None` when the blender cannot express it.
    pub fn to_gx(self) -> Option<BlendFactor> {
        let factor = match self {
            GlBlendFactor::Zero => BlendFactor::Zero,
            GlBlendFactor::One => BlendFactor::One,
            GlBlendFactor::SrcColor => BlendFactor::SrcColor,
            GlBlendFactor::OneMinusSrcColor => BlendFactor::InvSrcColor,
            GlBlendFactor::DstColor => BlendFactor::DstColor,
            GlBlendFactor::OneMinusDstColor => BlendFactor::InvDstColor,
            GlBlendFactor::SrcAlpha => BlendFactor::SrcAlpha,
            GlBlendFactor::OneMinusSrcAlpha => BlendFactor::InvSrcAlpha,
            GlBlendFactor::DstAlpha => BlendFactor::DstAlpha,
            GlBlendFactor::OneMinusDstAlpha => BlendFactor::InvDstAlpha,
            GlBlendFactor::ConstantColor
            | GlBlendFactor::OneMinusConstantColor
            | GlBlendFactor::ConstantAlpha
            | GlBlendFactor::OneMinusConstantAlpha
            | GlBlendFactor::SrcAlphaSaturate => return None,
        };
        Some(factor)
    }
}

/// Matrix read back by `get_matrix`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixTarget {
    Modelview,
    Projection,
}

/// Values readable through `get_integer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegerQuery {
    MaxLights,
    MaxModelviewStackDepth,
    MaxProjectionStackDepth,
    ModelviewStackDepth,
    ProjectionStackDepth,
    MaxTextureSize,
    MaxClipPlanes,
    /// x, y, width, height.
    Viewport,
}

bitflags! {
    /// Buffers cleared by `clear`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ClearMask: u8 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Layouts accepted by `interleaved_arrays`. All components are floats
/// except the `C4ub` colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterleavedFormat {
    V2f,
    V3f,
    N3fV3f,
    T2fV3f,
    T2fN3fV3f,
    C4fN3fV3f,
    C3fV3f,
    T2fC3fV3f,
    T2fC4fN3fV3f,
    C4ubV2f,
    C4ubV3f,
    T2fC4ubV3f,
    T4fC4fN3fV4f,
    T4fV4f,
}

/// Float offsets of each attribute inside one interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterleavedLayout {
    pub tex_coord: Option<usize>,
    pub color: Option<(usize, u8)>,
    pub normal: Option<usize>,
    pub vertex: (usize, u8),
    /// Floats per vertex.
    pub floats: usize,
}

impl InterleavedFormat {
    /// Attribute offsets, or `None` for the formats that are not handled.
    pub fn layout(self) -> Option<InterleavedLayout> {
        let layout = |tex_coord, color, normal, vertex, floats| InterleavedLayout {
            tex_coord,
            color,
            normal,
            vertex,
            floats,
        };
        let found = match self {
            InterleavedFormat::V2f => layout(None, None, None, (0, 2), 2),
            InterleavedFormat::V3f => layout(None, None, None, (0, 3), 3),
            InterleavedFormat::N3fV3f => layout(None, None, Some(0), (3, 3), 6),
            InterleavedFormat::T2fV3f => layout(Some(0), None, None, (2, 3), 5),
            InterleavedFormat::T2fN3fV3f => layout(Some(0), None, Some(2), (5, 3), 8),
            InterleavedFormat::C4fN3fV3f => layout(None, Some((0, 4)), Some(4), (7, 3), 10),
            InterleavedFormat::C3fV3f => layout(None, Some((0, 3)), None, (3, 3), 6),
            InterleavedFormat::T2fC3fV3f => layout(Some(0), Some((2, 3)), None, (5, 3), 8),
            InterleavedFormat::T2fC4fN3fV3f => layout(Some(0), Some((2, 4)), Some(6), (9, 3), 12),
            InterleavedFormat::C4ubV2f
            | InterleavedFormat::C4ubV3f
            | InterleavedFormat::T2fC4ubV3f
            | InterleavedFormat::T4fC4fN3fV4f
            | InterleavedFormat::T4fV4f => return None,
        };
        Some(found)
    }
}

/// `fog(param)` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "param", content = "value", rename_all = "snake_case")]
pub enum FogParam {
    Mode(FogMode),
    Density(f32),
    Start(f32),
    End(f32),
    Color([f32; 4]),
}

/// Plane set addressed by `tex_gen_plane`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TexGenPlane {
    Object,
    Eye,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_blend_factors() {
        assert_eq!(GlBlendFactor::OneMinusSrcAlpha.to_gx(), Some(BlendFactor::InvSrcAlpha));
        assert_eq!(GlBlendFactor::SrcAlphaSaturate.to_gx(), None);
        assert_eq!(GlBlendFactor::ConstantColor.to_gx(), None);
    }

    #[test]
    fn interleaved_offsets() {
        let full = InterleavedFormat::T2fC4fN3fV3f.layout().expect("handled");
        assert_eq!(full.tex_coord, Some(0));
        assert_eq!(full.color, Some((2, 4)));
        assert_eq!(full.normal, Some(6));
        assert_eq!(full.vertex, (9, 3));
        assert_eq!(full.floats, 12);
        assert!(InterleavedFormat::T4fV4f.layout().is_none());
    }

    #[test]
    fn capability_from_json() {
        let cap: Capability = serde_json::from_str(r#"{"light":3}"#).expect("valid");
        assert_eq!(cap, Capability::Light(3));
        let cap: Capability = serde_json::from_str(r#""depth_test""#).expect("valid");
        assert_eq!(cap, Capability::DepthTest);
    }
}
