// Immediate-mode (begin/end) vertex buffer.
//
// Vertices emitted between `begin` and `end` are collected here along with
// the current normal, texture coordinate and color. `end` hands the buffer to
// the regular array draw path through `ImmediateArray` readers.

use std::rc::Rc;

use super::arrays::ArrayReader;
use crate::draw::PrimitiveMode;
use crate::error::{GlError, GlResult};
use crate::gx::GxColor;

/// Vertices reserved by the first `begin`.
pub const INITIAL_CAPACITY: usize = 64;

/// One buffered vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRecord {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub color: GxColor,
}

#[derive(Debug, Clone)]
pub struct ImmediateState {
    pub active: bool,
    pub mode: PrimitiveMode,
    /// A color was given inside the current begin/end pair.
    pub has_color: bool,
    records: Vec<VertexRecord>,

    pub current_color: [f32; 4],
    pub current_normal: [f32; 3],
    pub current_tex_coord: [f32; 2],
}

impl Default for ImmediateState {
    fn default() -> Self {
        Self {
            active: false,
            mode: PrimitiveMode::Points,
            has_color: false,
            records: Vec::new(),
            current_color: [1.0; 4],
            current_normal: [0.0, 0.0, 1.0],
            current_tex_coord: [0.0; 2],
        }
    }
}

impl ImmediateState {
    pub fn begin(&mut self, mode: PrimitiveMode) -> GlResult<()> {
        if self.active {
            return Err(GlError::InvalidOperation);
        }
        self.records.clear();
        self.records
            .try_reserve(INITIAL_CAPACITY)
            .map_err(|_| GlError::OutOfMemory)?;
        self.mode = mode;
        self.has_color = false;
        self.active = true;
        Ok(())
    }

    /// Append a vertex carrying the current attributes.
    pub fn push_vertex(&mut self, position: [f32; 3]) -> GlResult<()> {
        if !self.active {
            return Err(GlError::InvalidOperation);
        }
        if self.records.len() == self.records.capacity() {
            let grow = self.records.len().max(INITIAL_CAPACITY);
            self.records.try_reserve(grow).map_err(|_| GlError::OutOfMemory)?;
        }
        self.records.push(VertexRecord {
            position,
            normal: self.current_normal,
            tex_coord: self.current_tex_coord,
            color: GxColor::from_f32(self.current_color),
        });
        Ok(())
    }

    pub fn set_color(&mut self, rgba: [f32; 4]) {
        self.current_color = rgba;
        if self.active {
            self.has_color = true;
        }
    }

    /// Close the begin/end pair and hand out the collected vertices.
    pub fn finish(&mut self) -> GlResult<Rc<[VertexRecord]>> {
        if !self.active {
            return Err(GlError::InvalidOperation);
        }
        self.active = false;
        let records = Rc::from(self.records.as_slice());
        self.records.clear();
        Ok(records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmediateAttribute {
    Position,
    Normal,
    TexCoord,
    Color,
}

/// Array reader over one attribute of a finished immediate-mode buffer.
#[derive(Debug, Clone)]
pub struct ImmediateArray {
    records: Rc<[VertexRecord]>,
    attribute: ImmediateAttribute,
}

impl ImmediateArray {
    pub fn new(records: Rc<[VertexRecord]>, attribute: ImmediateAttribute) -> Self {
        Self { records, attribute }
    }
}

impl ArrayReader for ImmediateArray {
    fn read_float3(&self, index: usize) -> [f32; 3] {
        match (self.records.get(index), self.attribute) {
            (Some(r), ImmediateAttribute::Position) => r.position,
            (Some(r), ImmediateAttribute::Normal) => r.normal,
            (Some(r), ImmediateAttribute::TexCoord) => [r.tex_coord[0], r.tex_coord[1], 0.0],
            _ => [0.0; 3],
        }
    }

    fn read_tex2(&self, index: usize) -> [f32; 2] {
        match (self.records.get(index), self.attribute) {
            (Some(r), ImmediateAttribute::TexCoord) => r.tex_coord,
            (Some(r), ImmediateAttribute::Position) => [r.position[0], r.position[1]],
            _ => [0.0; 2],
        }
    }

    fn read_color(&self, index: usize) -> GxColor {
        match (self.records.get(index), self.attribute) {
            (Some(r), ImmediateAttribute::Color) => r.color,
            _ => GxColor::BLACK,
        }
    }

    fn component_count(&self) -> u8 {
        match self.attribute {
            ImmediateAttribute::Position | ImmediateAttribute::Normal => 3,
            ImmediateAttribute::TexCoord => 2,
            ImmediateAttribute::Color => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_twice_is_invalid() {
        let mut imm = ImmediateState::default();
        imm.begin(PrimitiveMode::Triangles).unwrap();
        assert_eq!(imm.begin(PrimitiveMode::Lines), Err(GlError::InvalidOperation));
        assert_eq!(imm.mode, PrimitiveMode::Triangles);
    }

    #[test]
    fn finish_without_begin_is_invalid() {
        let mut imm = ImmediateState::default();
        assert_eq!(imm.finish().err(), Some(GlError::InvalidOperation));
    }

    #[test]
    fn vertices_capture_current_attributes() {
        let mut imm = ImmediateState::default();
        imm.current_normal = [0.0, 1.0, 0.0];
        imm.begin(PrimitiveMode::Points).unwrap();
        imm.push_vertex([1.0, 2.0, 3.0]).unwrap();
        imm.set_color([1.0, 0.0, 0.0, 1.0]);
        imm.current_tex_coord = [0.5, 0.25];
        imm.push_vertex([4.0, 5.0, 6.0]).unwrap();
        assert!(imm.has_color);

        let records = imm.finish().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].color, GxColor::WHITE);
        assert_eq!(records[0].normal, [0.0, 1.0, 0.0]);
        assert_eq!(records[1].color, GxColor::new(255, 0, 0, 255));
        assert_eq!(records[1].tex_coord, [0.5, 0.25]);
        assert!(imm.is_empty());
    }

    #[test]
    fn buffer_grows_past_initial_capacity() {
        let mut imm = ImmediateState::default();
        imm.begin(PrimitiveMode::Points).unwrap();
        for i in 0..(INITIAL_CAPACITY * 3) {
            imm.push_vertex([i as f32, 0.0, 0.0]).unwrap();
        }
        assert_eq!(imm.len(), INITIAL_CAPACITY * 3);
    }

    #[test]
    fn color_outside_begin_is_not_per_vertex() {
        let mut imm = ImmediateState::default();
        imm.set_color([0.0, 0.0, 1.0, 1.0]);
        imm.begin(PrimitiveMode::Points).unwrap();
        assert!(!imm.has_color);
    }

    #[test]
    fn readers_select_attribute() {
        let records: Rc<[VertexRecord]> = Rc::from(vec![VertexRecord {
            position: [1.0, 2.0, 3.0],
            normal: [0.0, 0.0, 1.0],
            tex_coord: [0.5, 1.0],
            color: GxColor::WHITE,
        }]);
        let pos = ImmediateArray::new(records.clone(), ImmediateAttribute::Position);
        let tex = ImmediateArray::new(records.clone(), ImmediateAttribute::TexCoord);
        let color = ImmediateArray::new(records, ImmediateAttribute::Color);
        assert_eq!(pos.read_float3(0), [1.0, 2.0, 3.0]);
        assert_eq!(tex.read_tex2(0), [0.5, 1.0]);
        assert_eq!(color.read_color(0), GxColor::WHITE);
        assert_eq!(color.read_color(1), GxColor::BLACK);
    }
}
