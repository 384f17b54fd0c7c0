// Client vertex arrays.
//
// The core never decodes client memory itself: every bound array is an
// `ArrayReader` that widens its elements to floats (or 8-bit colors) on
// demand. `ClientArray` is the stock reader over a shared byte buffer.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::gx::GxColor;

/// Per-vertex attribute source bound to one client array.
pub trait ArrayReader: fmt::Debug {
    /// Position or normal. Missing components read as 0.
    fn read_float3(&self, index: usize) -> [f32; 3];

    /// Texture coordinate. Missing components read as 0.
    fn read_tex2(&self, index: usize) -> [f32; 2];

    /// Color as 8-bit RGBA. Missing components read as (0, 0, 0, 1).
    fn read_color(&self, index: usize) -> GxColor;

    fn component_count(&self) -> u8;
}

/// Element type of a client array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl ElementType {
    pub const fn size(self) -> usize {
        match self {
            ElementType::I8 | ElementType::U8 => 1,
            ElementType::I16 | ElementType::U16 => 2,
            ElementType::I32 | ElementType::U32 | ElementType::F32 => 4,
        }
    }

    fn decode(self, bytes: &[u8]) -> Option<f64> {
        let value = match self {
            ElementType::I8 => i8::from_ne_bytes(bytes.try_into().ok()?) as f64,
            ElementType::U8 => *bytes.first()? as f64,
            ElementType::I16 => i16::from_ne_bytes(bytes.try_into().ok()?) as f64,
            ElementType::U16 => u16::from_ne_bytes(bytes.try_into().ok()?) as f64,
            ElementType::I32 => i32::from_ne_bytes(bytes.try_into().ok()?) as f64,
            ElementType::U32 => u32::from_ne_bytes(bytes.try_into().ok()?) as f64,
            ElementType::F32 => f32::from_ne_bytes(bytes.try_into().ok()?) as f64,
        };
        Some(value)
    }

    /// Map a raw value to [0, 1] (or [-1, 1] for signed types) the way GL
    /// normalizes integer colors.
    fn normalize(self, raw: f64) -> f64 {
        match self {
            ElementType::U8 => raw / u8::MAX as f64,
            ElementType::U16 => raw / u16::MAX as f64,
            ElementType::U32 => raw / u32::MAX as f64,
            ElementType::I8 => (2.0 * raw + 1.0) / u8::MAX as f64,
            ElementType::I16 => (2.0 * raw + 1.0) / u16::MAX as f64,
            ElementType::I32 => (2.0 * raw + 1.0) / u32::MAX as f64,
            ElementType::F32 => raw,
        }
    }
}

/// Array reader over client memory.
#[derive(Clone)]
pub struct ClientArray {
    data: Rc<[u8]>,
    element: ElementType,
    /// Bytes between consecutive vertices; 0 means tightly packed.
    stride: usize,
    offset: usize,
    components: u8,
}

impl fmt::Debug for ClientArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientArray")
            .field("len", &self.data.len())
            .field("element", &self.element)
            .field("stride", &self.stride)
            .field("offset", &self.offset)
            .field("components", &self.components)
            .finish()
    }
}

impl ClientArray {
    pub fn new(data: Rc<[u8]>, element: ElementType, components: u8, stride: usize) -> Self {
        Self {
            data,
            element,
            stride,
            offset: 0,
            components,
        }
    }

    /// Start reading `offset` bytes into the buffer.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Tightly packed float array.
    pub fn from_f32(values: &[f32], components: u8) -> Self {
        Self::new(f32_bytes(values), ElementType::F32, components, 0)
    }

    /// Tightly packed unsigned byte array, typically colors.
    pub fn from_u8(values: &[u8], components: u8) -> Self {
        Self::new(Rc::from(values), ElementType::U8, components, 0)
    }

    pub fn set_component_count(&mut self, components: u8) {
        self.components = components;
    }

    fn effective_stride(&self) -> usize {
        if self.stride == 0 {
            self.components as usize * self.element.size()
        } else {
            self.stride
        }
    }

    /// Raw value of component `component` of vertex `index`, if it lies
    /// inside the buffer.
    fn raw(&self, index: usize, component: usize) -> Option<f64> {
        let size = self.element.size();
        let start = index
            .checked_mul(self.effective_stride())?
            .checked_add(self.offset)?
            .checked_add(component * size)?;
        let bytes = self.data.get(start..start.checked_add(size)?)?;
        self.element.decode(bytes)
    }

    fn read_into<const N: usize>(&self, index: usize, mut out: [f32; N]) -> [f32; N] {
        let count = (self.components as usize).min(N);
        for (component, value) in out.iter_mut().enumerate().take(count) {
            if let Some(raw) = self.raw(index, component) {
                *value = raw as f32;
            }
        }
        out
    }
}

impl ArrayReader for ClientArray {
    fn read_float3(&self, index: usize) -> [f32; 3] {
        self.read_into(index, [0.0; 3])
    }

    fn read_tex2(&self, index: usize) -> [f32; 2] {
        self.read_into(index, [0.0; 2])
    }

    fn read_color(&self, index: usize) -> GxColor {
        let count = (self.components as usize).min(4);
        if self.element == ElementType::U8 {
            // already in hardware format
            let mut rgba = [0, 0, 0, u8::MAX];
            for (component, value) in rgba.iter_mut().enumerate().take(count) {
                if let Some(raw) = self.raw(index, component) {
                    *value = raw as u8;
                }
            }
            return GxColor::new(rgba[0], rgba[1], rgba[2], rgba[3]);
        }

        let mut rgba = [0.0, 0.0, 0.0, 1.0];
        for (component, value) in rgba.iter_mut().enumerate().take(count) {
            if let Some(raw) = self.raw(index, component) {
                *value = self.element.normalize(raw) as f32;
            }
        }
        GxColor::from_f32(rgba)
    }

    fn component_count(&self) -> u8 {
        self.components
    }
}

/// Native-endian bytes of a float slice, for building `ClientArray`s.
pub fn f32_bytes(values: &[f32]) -> Rc<[u8]> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// Client array slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientArrayKind {
    Vertex,
    Normal,
    Color,
    TexCoord,
}

#[derive(Debug, Clone, Default)]
pub struct ArrayBinding {
    pub enabled: bool,
    pub reader: Option<Rc<dyn ArrayReader>>,
}

impl ArrayBinding {
    /// The reader, if the array is enabled and bound.
    pub fn active(&self) -> Option<&dyn ArrayReader> {
        if self.enabled {
            self.reader.as_deref()
        } else {
            None
        }
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArrayBindings {
    pub vertex: ArrayBinding,
    pub normal: ArrayBinding,
    pub color: ArrayBinding,
    pub tex_coord: ArrayBinding,
}

impl ArrayBindings {
    pub fn get(&self, kind: ClientArrayKind) -> &ArrayBinding {
        match kind {
            ClientArrayKind::Vertex => &self.vertex,
            ClientArrayKind::Normal => &self.normal,
            ClientArrayKind::Color => &self.color,
            ClientArrayKind::TexCoord => &self.tex_coord,
        }
    }

    pub fn get_mut(&mut self, kind: ClientArrayKind) -> &mut ArrayBinding {
        match kind {
            ClientArrayKind::Vertex => &mut self.vertex,
            ClientArrayKind::Normal => &mut self.normal,
            ClientArrayKind::Color => &mut self.color,
            ClientArrayKind::TexCoord => &mut self.tex_coord,
        }
    }

    /// Disable every client array, keeping the readers.
    pub fn disable_all(&mut self) {
        self.vertex.enabled = false;
        self.normal.enabled = false;
        self.color.enabled = false;
        self.tex_coord.enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_positions_with_missing_components() {
        let array = ClientArray::from_f32(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(array.read_float3(1), [3.0, 4.0, 0.0]);
        assert_eq!(array.read_tex2(0), [1.0, 2.0]);
    }

    #[test]
    fn out_of_range_reads_defaults() {
        let array = ClientArray::from_f32(&[1.0, 2.0, 3.0], 3);
        assert_eq!(array.read_float3(5), [0.0; 3]);
        assert_eq!(array.read_color(usize::MAX), GxColor::BLACK);
    }

    #[test]
    fn unsigned_byte_colors() {
        let array = ClientArray::from_u8(&[255, 0, 51, 255, 10, 20, 30, 40], 4);
        assert_eq!(array.read_color(0), GxColor::new(255, 0, 51, 255));
        assert_eq!(array.read_color(1), GxColor::new(10, 20, 30, 40));
    }

    #[test]
    fn three_component_color_gets_opaque_alpha() {
        let array = ClientArray::from_f32(&[1.0, 0.0, 1.0], 3);
        assert_eq!(array.read_color(0), GxColor::new(255, 0, 255, 255));
    }

    #[test]
    fn component_count_can_shrink() {
        let mut array = ClientArray::from_f32(&[1.0, 2.0, 3.0, 4.0], 3);
        array.set_component_count(2);
        assert_eq!(array.component_count(), 2);
        assert_eq!(array.read_float3(1), [3.0, 4.0, 0.0]);
    }

    #[test]
    fn strided_short_positions() {
        // x, y as i16 followed by two bytes of padding
        let mut bytes = Vec::new();
        for (x, y) in [(1i16, -2i16), (300, 4)] {
            bytes.extend_from_slice(&x.to_ne_bytes());
            bytes.extend_from_slice(&y.to_ne_bytes());
            bytes.extend_from_slice(&[0, 0]);
        }
        let array = ClientArray::new(Rc::from(bytes), ElementType::I16, 2, 6);
        assert_eq!(array.read_float3(0), [1.0, -2.0, 0.0]);
        assert_eq!(array.read_float3(1), [300.0, 4.0, 0.0]);
    }

    #[test]
    fn offset_skips_leading_floats() {
        let array = ClientArray::new(f32_bytes(&[9.0, 1.0, 2.0, 9.0, 3.0, 4.0]), ElementType::F32, 2, 12)
            .with_offset(4);
        assert_eq!(array.read_tex2(1), [3.0, 4.0]);
    }

    #[test]
    fn binding_needs_enable_and_reader() {
        let mut bindings = ArrayBindings::default();
        assert!(!bindings.vertex.is_active());
        bindings.vertex.reader = Some(Rc::new(ClientArray::from_f32(&[0.0; 3], 3)));
        assert!(!bindings.get(ClientArrayKind::Vertex).is_active());
        bindings.get_mut(ClientArrayKind::Vertex).enabled = true;
        assert!(bindings.vertex.is_active());
        bindings.disable_all();
        assert!(!bindings.vertex.is_active());
    }
}
