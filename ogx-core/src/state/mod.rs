// Graphics state store.
//
// `GraphicsState` holds every piece of tracked API state plus one dirty bit
// per hardware aspect. API calls only mutate this structure and set bits;
// the stage synthesizer and the dirty-state applier turn it into GX commands
// at draw time.

pub mod arrays;
pub mod immediate;
pub mod lighting;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use self::arrays::ArrayBindings;
use self::immediate::ImmediateState;
use self::lighting::LightingState;
use crate::config::Config;
use crate::error::{ErrorSlot, GlError, GlResult};
use crate::gx::state::{BlendFactor, CompareFunction};
use crate::gx::GxColor;
use crate::matrix::{Mtx, Mtx44, IDENTITY, IDENTITY44};

/// Saved model-view matrices.
pub const MAX_MODELVIEW_STACK: usize = 32;
/// Saved projection matrices.
pub const MAX_PROJECTION_STACK: usize = 4;
/// Clip planes addressable through `Capability::ClipPlane`.
pub const MAX_CLIP_PLANES: usize = 6;

bitflags! {
    /// Hardware aspects whose registers are stale.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u32 {
        const MATRICES = 1 << 0;
        const CULL = 1 << 1;
        const Z = 1 << 2;
        const BLEND = 1 << 3;
        const ALPHA_TEST = 1 << 4;
        const COLOR_UPDATE = 1 << 5;
        const LIGHTING = 1 << 6;
        const MATERIAL = 1 << 7;
        const CLEAR_Z = 1 << 8;
        const TEXTURE_GEN = 1 << 9;
        const STENCIL = 1 << 10;
        const CLIP_PLANES = 1 << 11;
        const VIEWPORT = 1 << 12;
        const SCISSOR = 1 << 13;
        const RASTER_SIZE = 1 << 14;
    }
}

// ---------------------------------------------------------------------------
// Matrix stacks
// ---------------------------------------------------------------------------

/// Matrix-edit target selected by `matrix_mode`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixMode {
    None,
    Projection,
    #[default]
    Modelview,
}

/// Bounded push/pop stack of saved matrices.
#[derive(Debug, Clone, Default)]
pub struct MatrixStack<M, const N: usize> {
    saved: heapless::Vec<M, N>,
}

impl<M: Copy, const N: usize> MatrixStack<M, N> {
    pub fn new() -> Self {
        Self {
            saved: heapless::Vec::new(),
        }
    }

    /// Save `current`. A full stack is left untouched.
    pub fn push(&mut self, current: &M) -> GlResult<()> {
        self.saved.push(*current).map_err(|_| GlError::StackOverflow)
    }

    /// Restore the most recently saved matrix.
    pub fn pop(&mut self) -> GlResult<M> {
        self.saved.pop().ok_or(GlError::StackUnderflow)
    }

    /// Number of saved matrices.
    pub fn len(&self) -> usize {
        self.saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saved.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

// ---------------------------------------------------------------------------
// Rasterizer, fog and texturing state
// ---------------------------------------------------------------------------

/// Faces selected by `cull_face`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullFace {
    Front,
    #[default]
    Back,
    FrontAndBack,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontFace {
    Cw,
    #[default]
    Ccw,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterState {
    pub cull_enabled: bool,
    pub cull_face: CullFace,
    pub front_face: FrontFace,

    pub depth_test: bool,
    pub depth_func: CompareFunction,
    pub depth_write: bool,

    pub blend_enabled: bool,
    pub blend_src: BlendFactor,
    pub blend_dst: BlendFactor,

    pub alpha_test: bool,
    pub alpha_func: CompareFunction,
    /// Reference value scaled to 0..255.
    pub alpha_ref: u8,

    pub color_update: bool,

    pub polygon_offset_fill: bool,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,

    /// Point size in 1/16 pixel.
    pub point_size: u8,
    /// Line width in 1/16 pixel.
    pub line_width: u8,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            cull_enabled: false,
            cull_face: CullFace::Back,
            front_face: FrontFace::Ccw,
            depth_test: false,
            depth_func: CompareFunction::Less,
            depth_write: true,
            blend_enabled: false,
            blend_src: BlendFactor::One,
            blend_dst: BlendFactor::Zero,
            alpha_test: false,
            alpha_func: CompareFunction::Always,
            alpha_ref: 0,
            color_update: true,
            polygon_offset_fill: false,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            point_size: 16,
            line_width: 16,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FogMode {
    Linear,
    #[default]
    Exp,
    Exp2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogState {
    pub enabled: bool,
    pub mode: FogMode,
    pub density: f32,
    pub start: f32,
    pub end: f32,
    pub color: [f32; 4],
}

impl Default for FogState {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: FogMode::Exp,
            density: 1.0,
            start: 0.0,
            end: 1.0,
            color: [0.0; 4],
        }
    }
}

/// Texture environment combine mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TexEnvMode {
    Replace,
    Add,
    Blend,
    #[default]
    Modulate,
    Decal,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TexGenMode {
    ObjectLinear,
    #[default]
    EyeLinear,
    SphereMap,
}

/// Texture coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TexCoordAxis {
    S = 0,
    T = 1,
    R = 2,
    Q = 3,
}

impl TexCoordAxis {
    pub const ALL: [TexCoordAxis; 4] = [TexCoordAxis::S, TexCoordAxis::T, TexCoordAxis::R, TexCoordAxis::Q];
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureState {
    /// `Texture2D` capability.
    pub enabled: bool,
    /// Handle looked up in the texture table at draw time.
    pub bound: u32,
    pub env_mode: TexEnvMode,
    /// Generation enabled per axis (S, T, R, Q).
    pub gen_enabled: [bool; 4],
    pub gen_mode: [TexGenMode; 4],
    pub object_planes: [[f32; 4]; 4],
    pub eye_planes: [[f32; 4]; 4],
}

impl TextureState {
    /// GX has one generation mode for both coordinates: the mode of the
    /// first enabled axis wins.
    pub fn effective_gen_mode(&self) -> Option<TexGenMode> {
        TexCoordAxis::ALL
            .iter()
            .find(|axis| self.gen_enabled[**axis as usize])
            .map(|axis| self.gen_mode[*axis as usize])
    }
}

impl Default for TextureState {
    fn default() -> Self {
        let planes = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
        ];
        Self {
            enabled: false,
            bound: 0,
            env_mode: TexEnvMode::Modulate,
            gen_enabled: [false; 4],
            gen_mode: [TexGenMode::EyeLinear; 4],
            object_planes: planes,
            eye_planes: planes,
        }
    }
}

/// Viewport or scissor rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for Rect {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 640,
            height: 480,
        }
    }
}

// ---------------------------------------------------------------------------
// State store
// ---------------------------------------------------------------------------

/// The complete tracked graphics state of one context.
#[derive(Debug)]
pub struct GraphicsState {
    pub config: Config,

    // -- Transform block -------------------------------------------------
    pub matrix_mode: MatrixMode,
    pub projection: Mtx44,
    pub modelview: Mtx,
    pub projection_stack: MatrixStack<Mtx44, MAX_PROJECTION_STACK>,
    pub modelview_stack: MatrixStack<Mtx, MAX_MODELVIEW_STACK>,

    pub dirty: DirtyFlags,

    pub raster: RasterState,
    pub fog: FogState,
    pub lighting: LightingState,
    pub texture: TextureState,
    pub arrays: ArrayBindings,
    pub immediate: ImmediateState,

    pub viewport: Rect,
    pub scissor: Rect,

    pub clear_color: GxColor,
    pub clear_depth: f32,

    /// Effective stencil-test state reported by the stencil collaborator.
    pub stencil_enabled: bool,
    /// Enabled clip planes, as reported by the clip-plane collaborator.
    pub clip_plane_mask: u8,

    /// Completed draw submissions (including clears).
    pub draw_count: u64,
    pub error: ErrorSlot,
}

impl GraphicsState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            matrix_mode: MatrixMode::Modelview,
            projection: IDENTITY44,
            modelview: IDENTITY,
            projection_stack: MatrixStack::new(),
            modelview_stack: MatrixStack::new(),
            dirty: DirtyFlags::all(),
            raster: RasterState::default(),
            fog: FogState::default(),
            lighting: LightingState::default(),
            texture: TextureState::default(),
            arrays: ArrayBindings::default(),
            immediate: ImmediateState::default(),
            viewport: Rect::default(),
            scissor: Rect::default(),
            clear_color: GxColor::BLACK,
            clear_depth: 1.0,
            stencil_enabled: false,
            clip_plane_mask: 0,
            draw_count: 0,
            error: ErrorSlot::new(),
        }
    }

    /// Mark aspects stale.
    pub fn mark(&mut self, flags: DirtyFlags) {
        self.dirty.insert(flags);
    }

    pub fn is_dirty(&self, flags: DirtyFlags) -> bool {
        self.dirty.intersects(flags)
    }

    /// Record `result`'s error, if any, in the sticky slot.
    pub fn record<T>(&mut self, result: GlResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.error.record(error);
                None
            }
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_fully_dirty() {
        let state = GraphicsState::default();
        assert_eq!(state.dirty, DirtyFlags::all());
        assert_eq!(state.matrix_mode, MatrixMode::Modelview);
        assert_eq!(state.clear_color, GxColor::BLACK);
    }

    #[test]
    fn stack_refuses_push_when_full() {
        let mut stack: MatrixStack<Mtx, 2> = MatrixStack::new();
        stack.push(&IDENTITY).unwrap();
        stack.push(&IDENTITY).unwrap();
        assert_eq!(stack.push(&IDENTITY), Err(GlError::StackOverflow));
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn stack_underflow() {
        let mut stack: MatrixStack<Mtx44, 4> = MatrixStack::new();
        assert_eq!(stack.pop(), Err(GlError::StackUnderflow));
        assert_eq!(stack.capacity(), 4);
    }

    #[test]
    fn first_enabled_axis_picks_gen_mode() {
        let mut tex = TextureState::default();
        assert_eq!(tex.effective_gen_mode(), None);
        tex.gen_mode[TexCoordAxis::T as usize] = TexGenMode::ObjectLinear;
        tex.gen_enabled[TexCoordAxis::T as usize] = true;
        tex.gen_enabled[TexCoordAxis::R as usize] = true;
        assert_eq!(tex.effective_gen_mode(), Some(TexGenMode::ObjectLinear));
    }

    #[test]
    fn record_keeps_first_error() {
        let mut state = GraphicsState::default();
        assert_eq!(state.record::<()>(Err(GlError::StackOverflow)), None);
        state.record::<()>(Err(GlError::OutOfMemory));
        assert_eq!(state.error.take(), Some(GlError::StackOverflow));
    }
}
