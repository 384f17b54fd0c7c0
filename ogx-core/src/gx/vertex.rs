// GX vertex stream recording.
//
// Between Begin and End the core emits vertex components one at a time
// (position first, then normal, colors and texture coordinate, in
// descriptor order). The accumulator regroups them into whole vertices so a
// recorded draw can be inspected attribute by attribute.

use log::warn;
use serde::Serialize;

use super::GxColor;

// ── GX primitive types ──────────────────────────────────────────

/// GameCube GX primitive types, matching hardware command values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum GxPrimitive {
    Quads = 0x80,
    Triangles = 0x90,
    TriangleStrip = 0x98,
    TriangleFan = 0xA0,
    Lines = 0xA8,
    LineStrip = 0xB0,
    Points = 0xB8,
}

// ── Recorded vertex ─────────────────────────────────────────────

/// One vertex as it reached the hardware. Attributes that were not part of
/// the stream are `None`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct RecordedVertex {
    pub position: [f32; 3],
    pub normal: Option<[f32; 3]>,
    pub colors: [Option<GxColor>; 2],
    pub tex_coord: Option<[f32; 2]>,
}

// ── Completed draw call ─────────────────────────────────────────

/// A Begin/End block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawCall {
    pub primitive: GxPrimitive,
    /// Vertex count announced in Begin.
    pub expected_count: u16,
    pub vertices: Vec<RecordedVertex>,
}

impl DrawCall {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

// ── Vertex accumulator ──────────────────────────────────────────

#[derive(Debug, Default)]
pub struct VertexAccumulator {
    primitive: Option<GxPrimitive>,
    expected_count: u16,
    vertices: Vec<RecordedVertex>,
    /// Vertex being assembled; flushed when the next position arrives.
    current: Option<RecordedVertex>,
}

impl VertexAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.primitive.is_some()
    }

    pub fn begin(&mut self, primitive: GxPrimitive, count: u16) {
        if let Some(previous) = self.primitive {
            warn!(
                "GX begin while {:?} still open, dropped {} vertices",
                previous,
                self.vertices.len()
            );
        }
        self.primitive = Some(primitive);
        self.expected_count = count;
        self.vertices.clear();
        self.current = None;
    }

    /// Finalize the block. Returns `None` without a matching begin or when
    /// no vertex was emitted.
    pub fn end(&mut self) -> Option<DrawCall> {
        let Some(primitive) = self.primitive.take() else {
            warn!("GX end called without matching begin");
            return None;
        };
        self.flush();

        if self.vertices.len() != self.expected_count as usize {
            warn!(
                "GX end: expected {} vertices but got {}",
                self.expected_count,
                self.vertices.len()
            );
        }
        if self.vertices.is_empty() {
            return None;
        }
        Some(DrawCall {
            primitive,
            expected_count: self.expected_count,
            vertices: std::mem::take(&mut self.vertices),
        })
    }

    // ── Attribute submissions ───────────────────────────────────

    pub fn position(&mut self, position: [f32; 3]) {
        if !self.is_active() {
            warn!("position emitted outside begin/end");
            return;
        }
        self.flush();
        self.current = Some(RecordedVertex {
            position,
            ..RecordedVertex::default()
        });
    }

    pub fn normal(&mut self, normal: [f32; 3]) {
        if let Some(vertex) = self.current_mut("normal") {
            vertex.normal = Some(normal);
        }
    }

    /// Colors fill channel 0, then channel 1.
    pub fn color(&mut self, color: GxColor) {
        if let Some(vertex) = self.current_mut("color") {
            match vertex.colors.iter_mut().find(|slot| slot.is_none()) {
                Some(slot) => *slot = Some(color),
                None => warn!("color: both color channels already filled"),
            }
        }
    }

    pub fn tex_coord(&mut self, st: [f32; 2]) {
        if let Some(vertex) = self.current_mut("tex_coord") {
            vertex.tex_coord = Some(st);
        }
    }

    // ── Internal helpers ────────────────────────────────────────

    fn current_mut(&mut self, what: &str) -> Option<&mut RecordedVertex> {
        if !self.is_active() {
            warn!("{} emitted outside begin/end", what);
            return None;
        }
        if self.current.is_none() {
            warn!("{} emitted before a position", what);
        }
        self.current.as_mut()
    }

    fn flush(&mut self) {
        if let Some(vertex) = self.current.take() {
            self.vertices.push(vertex);
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_triangle() {
        let mut acc = VertexAccumulator::new();
        acc.begin(GxPrimitive::Triangles, 3);
        acc.position([0.0, 1.0, 0.0]);
        acc.position([-1.0, -1.0, 0.0]);
        acc.position([1.0, -1.0, 0.0]);

        let dc = acc.end().expect("should produce a draw call");
        assert_eq!(dc.primitive, GxPrimitive::Triangles);
        assert_eq!(dc.vertex_count(), 3);
        assert!(dc.vertices.iter().all(|v| v.normal.is_none()));
    }

    #[test]
    fn attributes_attach_to_latest_position() {
        let mut acc = VertexAccumulator::new();
        acc.begin(GxPrimitive::TriangleStrip, 1);
        acc.position([1.0, 2.0, 3.0]);
        acc.color(GxColor::new(255, 0, 128, 255));
        acc.color(GxColor::new(1, 2, 3, 4));
        acc.tex_coord([0.5, 0.75]);

        let dc = acc.end().expect("should produce a draw call");
        let v = dc.vertices[0];
        assert_eq!(v.colors[0], Some(GxColor::new(255, 0, 128, 255)));
        assert_eq!(v.colors[1], Some(GxColor::new(1, 2, 3, 4)));
        assert_eq!(v.tex_coord, Some([0.5, 0.75]));
    }

    #[test]
    fn end_without_begin_returns_none() {
        let mut acc = VertexAccumulator::new();
        assert!(acc.end().is_none());
    }

    #[test]
    fn empty_draw_returns_none() {
        let mut acc = VertexAccumulator::new();
        acc.begin(GxPrimitive::Triangles, 3);
        assert!(acc.end().is_none());
        assert!(!acc.is_active());
    }

    #[test]
    fn attributes_outside_begin_are_dropped() {
        let mut acc = VertexAccumulator::new();
        acc.normal([0.0, 0.0, 1.0]);
        acc.begin(GxPrimitive::Points, 1);
        acc.position([0.0; 3]);
        let dc = acc.end().expect("should produce a draw call");
        assert_eq!(dc.vertices[0].normal, None);
    }
}
