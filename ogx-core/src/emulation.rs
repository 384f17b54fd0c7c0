// Stencil and clip-plane emulation hooks.
//
// GX has neither a stencil buffer nor user clip planes. Both are emulated by
// collaborators that borrow TEV stages, texture coordinates and the alpha
// compare unit at stage-synthesis time. The core only negotiates the stage
// budget with them; the stock implementations report the features as
// unavailable.

use crate::gx::GxBackend;
use crate::state::GraphicsState;

/// Hardware resources consumed by the stages synthesized so far.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageBudget {
    pub stages: u8,
    pub tex_coords: u8,
    pub tex_maps: u8,
    pub tex_mtxs: u8,
}

pub trait StencilEmulation {
    /// Request stencil testing on or off; returns the effective state.
    fn set_enabled(&mut self, enabled: bool) -> bool;

    /// Append the stencil-test stages after the color stages. Returning
    /// `false` vetoes the draw.
    fn setup_stages(&mut self, state: &GraphicsState, budget: &mut StageBudget, gx: &mut dyn GxBackend) -> bool;

    /// Run the stencil-buffer update pass. `draw` streams the geometry with
    /// positions only.
    fn draw_pass(&mut self, gx: &mut dyn GxBackend, draw: &mut dyn FnMut(&mut dyn GxBackend));

    fn clear(&mut self, gx: &mut dyn GxBackend);
}

pub trait ClipPlaneEmulation {
    /// Enable or disable plane `index`; returns the resulting plane mask.
    fn set_plane(&mut self, index: u8, enabled: bool) -> u8;

    /// Append the clip-test stages.
    fn setup_stages(&mut self, state: &GraphicsState, budget: &mut StageBudget, gx: &mut dyn GxBackend);
}

/// Stencil emulation that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStencil;

impl StencilEmulation for NoStencil {
    fn set_enabled(&mut self, _enabled: bool) -> bool {
        false
    }

    fn setup_stages(&mut self, _state: &GraphicsState, _budget: &mut StageBudget, _gx: &mut dyn GxBackend) -> bool {
        true
    }

    fn draw_pass(&mut self, _gx: &mut dyn GxBackend, _draw: &mut dyn FnMut(&mut dyn GxBackend)) {}

    fn clear(&mut self, _gx: &mut dyn GxBackend) {}
}

/// Clip-plane emulation that is never available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoClipPlanes;

impl ClipPlaneEmulation for NoClipPlanes {
    fn set_plane(&mut self, _index: u8, _enabled: bool) -> u8 {
        0
    }

    fn setup_stages(&mut self, _state: &GraphicsState, _budget: &mut StageBudget, _gx: &mut dyn GxBackend) {}
}
