// Geometry walker.
//
// Streams the vertices of one draw call to GX. Every enabled attribute is
// fetched from its array reader by logical index at emission time, and
// colors leave the reader already in 8-bit RGBA. GX has no line loop: a
// loop is drawn as a line strip that re-emits the first vertex at the end.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{GlError, GlResult};
use crate::gx::state::{CompType, VtxAttr, VtxAttrFmt, VtxInputType};
use crate::gx::vertex::GxPrimitive;
use crate::gx::{GxBackend, GxCommand};
use crate::state::arrays::ArrayBindings;
use crate::state::GraphicsState;

/// Primitive topology requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    Polygon,
}

/// Hardware primitive plus whether the first vertex must be repeated to close
/// the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawMode {
    pub primitive: GxPrimitive,
    pub loop_back: bool,
}

impl From<PrimitiveMode> for DrawMode {
    fn from(mode: PrimitiveMode) -> Self {
        let primitive = match mode {
            PrimitiveMode::Points => GxPrimitive::Points,
            PrimitiveMode::Lines => GxPrimitive::Lines,
            PrimitiveMode::LineLoop | PrimitiveMode::LineStrip => GxPrimitive::LineStrip,
            PrimitiveMode::Triangles => GxPrimitive::Triangles,
            // A quad strip has the same vertex order as a triangle strip.
            PrimitiveMode::TriangleStrip | PrimitiveMode::QuadStrip => GxPrimitive::TriangleStrip,
            // Convex polygons only.
            PrimitiveMode::TriangleFan | PrimitiveMode::Polygon => GxPrimitive::TriangleFan,
            PrimitiveMode::Quads => GxPrimitive::Quads,
        };
        DrawMode {
            primitive,
            loop_back: mode == PrimitiveMode::LineLoop,
        }
    }
}

/// Index buffer for `draw_elements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indices<'a> {
    U8(&'a [u8]),
    U16(&'a [u16]),
    U32(&'a [u32]),
}

impl Indices<'_> {
    pub fn len(&self) -> usize {
        match self {
            Indices::U8(i) => i.len(),
            Indices::U16(i) => i.len(),
            Indices::U32(i) => i.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, position: usize) -> Option<usize> {
        match self {
            Indices::U8(i) => i.get(position).map(|&v| v as usize),
            Indices::U16(i) => i.get(position).map(|&v| v as usize),
            Indices::U32(i) => i.get(position).map(|&v| v as usize),
        }
    }
}

/// How the walker turns a vertex position in the draw into an array index.
#[derive(Debug, Clone, Copy)]
pub enum VertexSource<'a> {
    /// `first + i`.
    Range { first: usize, count: usize },
    /// `indices[i]`.
    Indexed(Indices<'a>),
}

impl VertexSource<'_> {
    pub fn count(&self) -> usize {
        match self {
            VertexSource::Range { count, .. } => *count,
            VertexSource::Indexed(indices) => indices.len(),
        }
    }

    fn index(&self, position: usize) -> usize {
        match self {
            VertexSource::Range { first, .. } => first + position,
            VertexSource::Indexed(indices) => indices.get(position).unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Vertex layout
// ---------------------------------------------------------------------------

/// Attributes streamed with each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexLayout {
    pub normal: bool,
    /// Number of color channels fed from the color array (0, 1 or 2).
    pub colors: u8,
    pub tex_coord: bool,
}

impl VertexLayout {
    /// Positions only, for stencil passes.
    pub const FLAT: VertexLayout = VertexLayout {
        normal: false,
        colors: 0,
        tex_coord: false,
    };

    /// Layout for a regular draw with the current state.
    ///
    /// Vertex colors are only sent when they reach the output: unlit, or lit
    /// with color material on. The lit path needs them in both channels.
    pub fn for_state(state: &GraphicsState) -> Self {
        let arrays = &state.arrays;
        let lighting = &state.lighting;
        let colors = if arrays.color.is_active() && (!lighting.enabled || lighting.color_material_enabled) {
            if lighting.enabled {
                2
            } else {
                1
            }
        } else {
            0
        };
        VertexLayout {
            normal: arrays.normal.is_active(),
            colors,
            tex_coord: arrays.tex_coord.is_active() && state.texture.enabled,
        }
    }

    /// Vertex descriptor entries in stream order.
    pub fn descriptors(&self) -> SmallVec<[VtxAttr; VtxAttr::COUNT]> {
        let mut attrs = SmallVec::new();
        attrs.push(VtxAttr::Position);
        if self.normal {
            attrs.push(VtxAttr::Normal);
        }
        if self.colors > 0 {
            attrs.push(VtxAttr::Color0);
        }
        if self.colors > 1 {
            attrs.push(VtxAttr::Color1);
        }
        if self.tex_coord {
            attrs.push(VtxAttr::Tex0);
        }
        attrs
    }
}

/// Vertex format 0 as used by array draws.
const ARRAY_FORMATS: [(VtxAttr, VtxAttrFmt); VtxAttr::COUNT] = [
    (VtxAttr::Position, VtxAttrFmt::new(3, CompType::F32)),
    (VtxAttr::Normal, VtxAttrFmt::new(3, CompType::F32)),
    (VtxAttr::Tex0, VtxAttrFmt::new(2, CompType::F32)),
    (VtxAttr::Color0, VtxAttrFmt::new(4, CompType::Rgba8)),
    (VtxAttr::Color1, VtxAttrFmt::new(4, CompType::Rgba8)),
];

/// Push the array-draw vertex formats.
pub fn load_array_formats(gx: &mut dyn GxBackend) {
    for (attr, fmt) in ARRAY_FORMATS {
        gx.submit(GxCommand::SetVtxAttrFmt { attr, fmt });
    }
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// Number of vertices the hardware will receive, including the closing one.
pub fn emitted_count(mode: DrawMode, count: usize) -> GlResult<u16> {
    let total = count + mode.loop_back as usize;
    u16::try_from(total).map_err(|_| GlError::InvalidValue)
}

/// Stream one draw call.
///
/// The caller has already checked the count with `emitted_count`; an empty
/// source emits nothing.
pub fn walk(
    arrays: &ArrayBindings,
    mode: DrawMode,
    source: &VertexSource<'_>,
    layout: VertexLayout,
    gx: &mut dyn GxBackend,
) {
    let count = source.count();
    if count == 0 {
        return;
    }
    let Ok(total) = emitted_count(mode, count) else {
        return;
    };

    gx.submit(GxCommand::ClearVtxDesc);
    for attr in layout.descriptors() {
        gx.submit(GxCommand::SetVtxDesc {
            attr,
            input: VtxInputType::Direct,
        });
    }
    load_array_formats(gx);
    // Client memory may have changed since the last draw.
    gx.submit(GxCommand::InvVtxCache);

    let position = arrays.vertex.active();
    let normal = arrays.normal.active().filter(|_| layout.normal);
    let color = arrays.color.active().filter(|_| layout.colors > 0);
    let tex_coord = arrays.tex_coord.active().filter(|_| layout.tex_coord);

    gx.submit(GxCommand::Begin {
        primitive: mode.primitive,
        count: total,
    });
    for i in 0..total as usize {
        let index = source.index(i % count);

        let pos = position.map_or([0.0; 3], |r| r.read_float3(index));
        gx.submit(GxCommand::Position3f32(pos));

        if let Some(reader) = normal {
            gx.submit(GxCommand::Normal3f32(reader.read_float3(index)));
        }
        if let Some(reader) = color {
            let rgba = reader.read_color(index);
            for _ in 0..layout.colors {
                gx.submit(GxCommand::Color4u8(rgba));
            }
        }
        if let Some(reader) = tex_coord {
            gx.submit(GxCommand::TexCoord2f32(reader.read_tex2(index)));
        }
    }
    gx.submit(GxCommand::End);
}
