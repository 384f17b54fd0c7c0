// Texture table.
//
// Texture objects are created and filled by the texture-management layer
// (format conversion and tiling live there). The translation core only looks
// up the currently bound handle when it wires a textured TEV stage, and
// never mutates texture contents.

use serde::{Deserialize, Serialize};

use crate::error::{GlError, GlResult};

/// Texture table capacity.
pub const MAX_TEXTURES: usize = 256;
/// Largest texture edge the hardware samples.
pub const MAX_TEXTURE_SIZE: u16 = 1024;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMode {
    Clamp,
    #[default]
    Repeat,
    Mirror,
}

/// Texel format of a texture object.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexFormat {
    I8,
    Ia8,
    Rgb565,
    Rgb5a3,
    #[default]
    Rgba8,
    /// 24-bit depth, used for the clear z texture.
    Z24X8,
}

/// Hardware texture object descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureObject {
    /// Identifier of the texel data in texture memory.
    pub id: u32,
    pub width: u16,
    pub height: u16,
    #[serde(default)]
    pub format: TexFormat,
    #[serde(default)]
    pub wrap_s: WrapMode,
    #[serde(default)]
    pub wrap_t: WrapMode,
}

impl TextureObject {
    /// Reserved id of the 1x1 depth texture written by clears.
    pub const Z_BUFFER_ID: u32 = u32::MAX;

    pub fn new(id: u32, width: u16, height: u16) -> Self {
        Self {
            id,
            width,
            height,
            format: TexFormat::Rgba8,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
        }
    }

    /// The 1x1 Z24X8 clamp texture used to write the clear depth.
    pub fn z_buffer() -> Self {
        Self {
            id: Self::Z_BUFFER_ID,
            width: 1,
            height: 1,
            format: TexFormat::Z24X8,
            wrap_s: WrapMode::Clamp,
            wrap_t: WrapMode::Clamp,
        }
    }
}

/// Bounded handle → texture object table.
#[derive(Debug, Default)]
pub struct TextureTable {
    entries: heapless::Vec<(u32, TextureObject), MAX_TEXTURES>,
}

impl TextureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) the texture object for `handle`.
    pub fn define(&mut self, handle: u32, texture: TextureObject) -> GlResult<()> {
        if texture.width > MAX_TEXTURE_SIZE || texture.height > MAX_TEXTURE_SIZE {
            return Err(GlError::InvalidValue);
        }
        if let Some(entry) = self.entries.iter_mut().find(|(h, _)| *h == handle) {
            entry.1 = texture;
            return Ok(());
        }
        self.entries
            .push((handle, texture))
            .map_err(|_| GlError::OutOfMemory)
    }

    pub fn remove(&mut self, handle: u32) -> Option<TextureObject> {
        let index = self.entries.iter().position(|(h, _)| *h == handle)?;
        Some(self.entries.swap_remove(index).1)
    }

    pub fn get(&self, handle: u32) -> Option<&TextureObject> {
        self.entries
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, texture)| texture)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_lookup_remove() {
        let mut table = TextureTable::new();
        table.define(7, TextureObject::new(1, 64, 64)).unwrap();
        assert_eq!(table.get(7).map(|t| t.width), Some(64));

        table.define(7, TextureObject::new(1, 32, 32)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(7).map(|t| t.width), Some(32));

        assert!(table.remove(7).is_some());
        assert!(table.get(7).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn full_table_reports_out_of_memory() {
        let mut table = TextureTable::new();
        for handle in 0..MAX_TEXTURES as u32 {
            table.define(handle, TextureObject::new(handle, 8, 8)).unwrap();
        }
        assert_eq!(
            table.define(9999, TextureObject::new(0, 8, 8)),
            Err(GlError::OutOfMemory)
        );
    }

    #[test]
    fn oversized_texture_rejected() {
        let mut table = TextureTable::new();
        assert_eq!(
            table.define(1, TextureObject::new(1, 2048, 8)),
            Err(GlError::InvalidValue)
        );
    }
}
