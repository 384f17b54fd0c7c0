// Capability dispatch.
//
// Each capability maps to a handler record: how to store the toggle, how to
// read it back and which hardware aspects it makes stale. Indexed
// capabilities (lights, clip planes, texgen axes) share one record and carry
// their index as the argument.

use super::params::Capability;
use crate::emulation::{ClipPlaneEmulation, StencilEmulation};
use crate::state::lighting::MAX_LIGHTS;
use crate::state::{DirtyFlags, GraphicsState, TexCoordAxis, MAX_CLIP_PLANES};

/// Everything a capability setter may touch.
pub(crate) struct Toggles<'a> {
    pub state: &'a mut GraphicsState,
    pub stencil: &'a mut dyn StencilEmulation,
    pub clip: &'a mut dyn ClipPlaneEmulation,
}

pub(crate) struct CapHandler {
    /// Valid arguments are `0..limit`.
    pub limit: usize,
    pub set: fn(&mut Toggles<'_>, usize, bool),
    pub get: fn(&GraphicsState, usize) -> bool,
    pub dirty: DirtyFlags,
}

static TEXTURE_2D: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.texture.enabled = on,
    get: |s, _| s.texture.enabled,
    dirty: DirtyFlags::empty(),
};

static TEXTURE_GEN: CapHandler = CapHandler {
    limit: TexCoordAxis::ALL.len(),
    set: |t, axis, on| t.state.texture.gen_enabled[axis] = on,
    get: |s, axis| s.texture.gen_enabled[axis],
    dirty: DirtyFlags::TEXTURE_GEN,
};

static COLOR_MATERIAL: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.lighting.color_material_enabled = on,
    get: |s, _| s.lighting.color_material_enabled,
    dirty: DirtyFlags::empty(),
};

static CULL_FACE: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.raster.cull_enabled = on,
    get: |s, _| s.raster.cull_enabled,
    dirty: DirtyFlags::CULL,
};

static ALPHA_TEST: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.raster.alpha_test = on,
    get: |s, _| s.raster.alpha_test,
    dirty: DirtyFlags::ALPHA_TEST,
};

static BLEND: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.raster.blend_enabled = on,
    get: |s, _| s.raster.blend_enabled,
    dirty: DirtyFlags::BLEND,
};

static DEPTH_TEST: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.raster.depth_test = on,
    get: |s, _| s.raster.depth_test,
    dirty: DirtyFlags::Z,
};

static STENCIL_TEST: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.stencil_enabled = t.stencil.set_enabled(on),
    get: |s, _| s.stencil_enabled,
    dirty: DirtyFlags::STENCIL,
};

static FOG: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.fog.enabled = on,
    get: |s, _| s.fog.enabled,
    dirty: DirtyFlags::empty(),
};

static LIGHTING: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.lighting.enabled = on,
    get: |s, _| s.lighting.enabled,
    dirty: DirtyFlags::LIGHTING,
};

static LIGHT: CapHandler = CapHandler {
    limit: MAX_LIGHTS,
    set: |t, index, on| t.state.lighting.lights[index].enabled = on,
    get: |s, index| s.lighting.lights[index].enabled,
    dirty: DirtyFlags::LIGHTING,
};

static CLIP_PLANE: CapHandler = CapHandler {
    limit: MAX_CLIP_PLANES,
    set: |t, index, on| t.state.clip_plane_mask = t.clip.set_plane(index as u8, on),
    get: |s, index| s.clip_plane_mask & (1 << index) != 0,
    dirty: DirtyFlags::CLIP_PLANES,
};

static POLYGON_OFFSET_FILL: CapHandler = CapHandler {
    limit: 1,
    set: |t, _, on| t.state.raster.polygon_offset_fill = on,
    get: |s, _| s.raster.polygon_offset_fill,
    // The offset is folded into the projection matrix.
    dirty: DirtyFlags::MATRICES,
};

impl Capability {
    /// Handler record and argument for this capability.
    pub(crate) fn handler(self) -> (&'static CapHandler, usize) {
        match self {
            Capability::Texture2D => (&TEXTURE_2D, 0),
            Capability::TextureGenS => (&TEXTURE_GEN, TexCoordAxis::S as usize),
            Capability::TextureGenT => (&TEXTURE_GEN, TexCoordAxis::T as usize),
            Capability::TextureGenR => (&TEXTURE_GEN, TexCoordAxis::R as usize),
            Capability::TextureGenQ => (&TEXTURE_GEN, TexCoordAxis::Q as usize),
            Capability::ColorMaterial => (&COLOR_MATERIAL, 0),
            Capability::CullFace => (&CULL_FACE, 0),
            Capability::AlphaTest => (&ALPHA_TEST, 0),
            Capability::Blend => (&BLEND, 0),
            Capability::DepthTest => (&DEPTH_TEST, 0),
            Capability::StencilTest => (&STENCIL_TEST, 0),
            Capability::Fog => (&FOG, 0),
            Capability::Lighting => (&LIGHTING, 0),
            Capability::Light(index) => (&LIGHT, index as usize),
            Capability::ClipPlane(index) => (&CLIP_PLANE, index as usize),
            Capability::PolygonOffsetFill => (&POLYGON_OFFSET_FILL, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::{NoClipPlanes, NoStencil};

    fn toggle(state: &mut GraphicsState, cap: Capability, on: bool) {
        let (handler, arg) = cap.handler();
        let (mut stencil, mut clip) = (NoStencil, NoClipPlanes);
        let mut toggles = Toggles {
            state: &mut *state,
            stencil: &mut stencil,
            clip: &mut clip,
        };
        (handler.set)(&mut toggles, arg, on);
        state.mark(handler.dirty);
    }

    #[test]
    fn indexed_capabilities_share_a_record() {
        let (a, i) = Capability::Light(2).handler();
        let (b, j) = Capability::Light(5).handler();
        assert!(std::ptr::eq(a, b));
        assert_eq!((i, j), (2, 5));
        assert_eq!(a.limit, MAX_LIGHTS);
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut state = GraphicsState::default();
        state.dirty = DirtyFlags::empty();
        toggle(&mut state, Capability::TextureGenT, true);
        let (handler, arg) = Capability::TextureGenT.handler();
        assert!((handler.get)(&state, arg));
        assert!(state.texture.gen_enabled[1]);
        assert_eq!(state.dirty, DirtyFlags::TEXTURE_GEN);
    }

    #[test]
    fn stencil_follows_collaborator() {
        let mut state = GraphicsState::default();
        toggle(&mut state, Capability::StencilTest, true);
        assert!(!state.stencil_enabled);
        toggle(&mut state, Capability::ClipPlane(1), true);
        assert_eq!(state.clip_plane_mask, 0);
    }
}
