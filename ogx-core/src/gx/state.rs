// GX register state.
//
// The value types carried by hardware commands (compare functions, blend
// factors, vertex descriptors, fog parameters, ...) and `GxRegisters`, a
// shadow of every register the translation layer writes. The shadow is what
// a recording device updates, so the resulting pipeline configuration can be
// inspected after a sequence of API calls.

use serde::{Deserialize, Serialize};

use super::lighting::{ColorChannel, LightObj};
use super::tev::{ChannelId, TevRegId, TevStageConfig};
use super::{GxColor, GxCommand, MAX_GX_LIGHTS, MAX_TEV_STAGES};
use crate::matrix::{Mtx, Mtx44, ProjectionKind, IDENTITY, IDENTITY44};
use crate::texture::TextureObject;

/// Position/normal matrix slots.
pub const MAX_POS_MATRICES: usize = 10;
/// Texture matrix slots.
pub const MAX_TEX_MATRICES: usize = 10;
/// Texture coordinate generators / texture maps.
pub const MAX_TEX_COORDS: usize = 8;

// ---------------------------------------------------------------------------
// Vertex attribute types
// ---------------------------------------------------------------------------

/// Vertex attribute slots used by the translation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VtxAttr {
    Position = 0,
    Normal = 1,
    Color0 = 2,
    Color1 = 3,
    Tex0 = 4,
}

impl VtxAttr {
    pub const COUNT: usize = 5;
}

/// How vertex data for a particular attribute is supplied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VtxInputType {
    /// Attribute is not present in the vertex.
    #[default]
    None = 0,
    /// Data is inlined in the vertex stream.
    Direct = 1,
}

/// Component type of an attribute in the vertex stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompType {
    U8,
    U16,
    #[default]
    F32,
    Rgba8,
}

/// Binary layout of one attribute in vertex format 0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VtxAttrFmt {
    pub component_count: u8,
    pub component_type: CompType,
}

impl VtxAttrFmt {
    pub const fn new(component_count: u8, component_type: CompType) -> Self {
        Self {
            component_count,
            component_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Blend, depth, and rasterizer state
// ---------------------------------------------------------------------------

/// Blend-mode factor selectors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlendFactor {
    Zero = 0,
    #[default]
    One = 1,
    SrcColor = 2,
    InvSrcColor = 3,
    SrcAlpha = 4,
    InvSrcAlpha = 5,
    DstAlpha = 6,
    InvDstAlpha = 7,
    /// Shares the SrcColor encoding; selects the framebuffer color when used
    /// as a source factor.
    DstColor = 8,
    /// Shares the InvSrcColor encoding.
    InvDstColor = 9,
}

/// Logic-op selectors (used when the blend type is `Logic`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LogicOp {
    #[default]
    Clear = 0,
    And = 1,
    RevAnd = 2,
    Copy = 3,
    InvAnd = 4,
    Noop = 5,
    Xor = 6,
    Or = 7,
    Nor = 8,
    Equiv = 9,
    Inv = 10,
    RevOr = 11,
    InvCopy = 12,
    InvOr = 13,
    Nand = 14,
    Set = 15,
}

/// Blend unit operating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendType {
    #[default]
    None,
    Blend,
    Logic,
    Subtract,
}

/// Full blend-mode register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendMode {
    pub mode: BlendType,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
    pub logic_op: LogicOp,
}

/// GX compare function, shared by depth test and alpha compare.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CompareFunction {
    Never = 0,
    #[default]
    Less = 1,
    Equal = 2,
    LessEqual = 3,
    Greater = 4,
    NotEqual = 5,
    GreaterEqual = 6,
    Always = 7,
}

/// Z-buffer (depth) mode register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZMode {
    pub enable: bool,
    pub function: CompareFunction,
    pub update: bool,
}

impl Default for ZMode {
    fn default() -> Self {
        Self {
            enable: true,
            function: CompareFunction::LessEqual,
            update: true,
        }
    }
}

/// How the two alpha comparisons are combined.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlphaOp {
    #[default]
    And,
    Or,
    Xor,
    Xnor,
}

/// The single alpha-compare unit: `comp0(alpha, ref0) OP comp1(alpha, ref1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlphaCompare {
    pub comp0: CompareFunction,
    pub ref0: u8,
    pub op: AlphaOp,
    pub comp1: CompareFunction,
    pub ref1: u8,
}

impl Default for AlphaCompare {
    fn default() -> Self {
        Self {
            comp0: CompareFunction::Always,
            ref0: 0,
            op: AlphaOp::And,
            comp1: CompareFunction::Always,
            ref1: 0,
        }
    }
}

/// Scissor rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scissor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for Scissor {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 640,
            height: 480,
        }
    }
}

/// Viewport transform parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 640.0,
            height: 480.0,
            near: 0.0,
            far: 1.0,
        }
    }
}

/// Face-culling mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CullMode {
    #[default]
    None = 0,
    Front = 1,
    Back = 2,
    All = 3,
}

// ---------------------------------------------------------------------------
// Texture coordinates, z texture, fog
// ---------------------------------------------------------------------------

/// Input of a texture coordinate generator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexGenSrc {
    /// Incoming texture coordinate 0.
    #[default]
    Tex0,
    /// Object-space vertex position.
    Position,
}

/// Matrix applied by a texture coordinate generator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TexMtxSource {
    #[default]
    Identity,
    /// Texture matrix slot.
    TexMtx(u8),
}

/// One 2x4 texture coordinate generator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TexCoordGen {
    pub coord: u8,
    pub src: TexGenSrc,
    pub mtx: TexMtxSource,
}

/// Z texture operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZTexOp {
    #[default]
    Disable,
    Replace,
}

/// Hardware fog curve.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FogType {
    #[default]
    None,
    PerspLinear,
    PerspExp,
    PerspExp2,
    OrthoLinear,
    OrthoExp,
    OrthoExp2,
}

impl FogType {
    /// The orthographic variant of a perspective curve.
    pub fn to_ortho(self) -> Self {
        match self {
            FogType::PerspLinear => FogType::OrthoLinear,
            FogType::PerspExp => FogType::OrthoExp,
            FogType::PerspExp2 => FogType::OrthoExp2,
            other => other,
        }
    }
}

/// Fog register block.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogParams {
    pub fog_type: FogType,
    pub start: f32,
    pub end: f32,
    pub near: f32,
    pub far: f32,
    pub color: GxColor,
}

// ---------------------------------------------------------------------------
// Shadow register file
// ---------------------------------------------------------------------------

/// Last value written to every register the translation layer touches.
#[derive(Debug, Clone)]
pub struct GxRegisters {
    // -- Pixel engine ----------------------------------------------------
    pub z_mode: ZMode,
    pub z_comp_before_tex: bool,
    pub color_update: bool,
    pub blend: BlendMode,
    pub alpha_compare: AlphaCompare,
    pub cull_mode: CullMode,

    // -- Transform -------------------------------------------------------
    pub pos_matrices: [Mtx; MAX_POS_MATRICES],
    pub nrm_matrices: [Mtx; MAX_POS_MATRICES],
    pub current_mtx: u8,
    pub projection: Mtx44,
    pub projection_kind: ProjectionKind,
    pub viewport: Viewport,
    pub scissor: Scissor,

    // -- Lighting / channels ---------------------------------------------
    pub num_chans: u8,
    pub chan_ctrl: [ColorChannel; 2],
    pub chan_amb: [GxColor; 2],
    pub chan_mat: [GxColor; 2],
    pub lights: [Option<LightObj>; MAX_GX_LIGHTS],

    // -- TEV -------------------------------------------------------------
    pub tev_colors: [GxColor; 4],
    pub tev_stages: [TevStageConfig; MAX_TEV_STAGES],
    pub num_tev_stages: u8,

    // -- Texturing -------------------------------------------------------
    pub num_tex_gens: u8,
    pub tex_coord_gens: [TexCoordGen; MAX_TEX_COORDS],
    pub tex_matrices: [Mtx; MAX_TEX_MATRICES],
    pub tex_maps: [Option<TextureObject>; MAX_TEX_COORDS],
    pub z_texture: ZTexOp,
    pub z_texel: Option<u32>,

    // -- Misc ------------------------------------------------------------
    pub fog: FogParams,
    pub vtx_desc: [VtxInputType; VtxAttr::COUNT],
    pub vtx_fmt: [VtxAttrFmt; VtxAttr::COUNT],
    pub point_size: u8,
    pub line_width: u8,
}

impl GxRegisters {
    pub fn new() -> Self {
        Self {
            z_mode: ZMode::default(),
            z_comp_before_tex: true,
            color_update: true,
            blend: BlendMode::default(),
            alpha_compare: AlphaCompare::default(),
            cull_mode: CullMode::Back,
            pos_matrices: [IDENTITY; MAX_POS_MATRICES],
            nrm_matrices: [IDENTITY; MAX_POS_MATRICES],
            current_mtx: 0,
            projection: IDENTITY44,
            projection_kind: ProjectionKind::Orthographic,
            viewport: Viewport::default(),
            scissor: Scissor::default(),
            num_chans: 0,
            chan_ctrl: [ColorChannel::default(); 2],
            chan_amb: [GxColor::BLACK; 2],
            chan_mat: [GxColor::WHITE; 2],
            lights: [None; MAX_GX_LIGHTS],
            tev_colors: [GxColor::ZERO; 4],
            tev_stages: [TevStageConfig::default(); MAX_TEV_STAGES],
            num_tev_stages: 1,
            num_tex_gens: 0,
            tex_coord_gens: core::array::from_fn(|i| TexCoordGen {
                coord: i as u8,
                ..TexCoordGen::default()
            }),
            tex_matrices: [IDENTITY; MAX_TEX_MATRICES],
            tex_maps: [None; MAX_TEX_COORDS],
            z_texture: ZTexOp::Disable,
            z_texel: None,
            fog: FogParams::default(),
            vtx_desc: [VtxInputType::None; VtxAttr::COUNT],
            vtx_fmt: [VtxAttrFmt::default(); VtxAttr::COUNT],
            point_size: 6,
            line_width: 6,
        }
    }

    /// Mirror one register write. Vertex stream commands do not touch
    /// register state and are ignored here.
    pub fn apply(&mut self, command: &GxCommand) {
        match *command {
            GxCommand::SetZMode(mode) => self.z_mode = mode,
            GxCommand::SetZCompLoc { before_tex } => self.z_comp_before_tex = before_tex,
            GxCommand::SetColorUpdate(enable) => self.color_update = enable,
            GxCommand::SetBlendMode(blend) => self.blend = blend,
            GxCommand::SetAlphaCompare(compare) => self.alpha_compare = compare,
            GxCommand::SetCullMode(mode) => self.cull_mode = mode,
            GxCommand::LoadPosMtx { slot, mtx } => {
                if let Some(dst) = self.pos_matrices.get_mut(slot as usize) {
                    *dst = mtx;
                } else {
                    log::warn!("LoadPosMtx: invalid slot {}", slot);
                }
            }
            GxCommand::LoadNrmMtx { slot, mtx } => {
                if let Some(dst) = self.nrm_matrices.get_mut(slot as usize) {
                    *dst = mtx;
                } else {
                    log::warn!("LoadNrmMtx: invalid slot {}", slot);
                }
            }
            GxCommand::SetCurrentMtx(slot) => self.current_mtx = slot,
            GxCommand::LoadProjection { mtx, kind } => {
                self.projection = mtx;
                self.projection_kind = kind;
            }
            GxCommand::SetViewport(viewport) => self.viewport = viewport,
            GxCommand::SetScissor(scissor) => self.scissor = scissor,
            GxCommand::SetNumChans(n) => self.num_chans = n.min(2),
            GxCommand::SetChanCtrl { channel, ctrl } => {
                if let Some(index) = channel.index() {
                    self.chan_ctrl[index] = ctrl;
                }
            }
            GxCommand::SetChanAmbColor { channel, color } => {
                if let Some(index) = channel.index() {
                    self.chan_amb[index] = color;
                }
            }
            GxCommand::SetChanMatColor { channel, color } => {
                if let Some(index) = channel.index() {
                    self.chan_mat[index] = color;
                }
            }
            GxCommand::SetTevColor { reg, color } => {
                self.tev_colors[reg as usize] = color;
            }
            GxCommand::SetTevStage { stage, config } => {
                if let Some(dst) = self.tev_stages.get_mut(stage as usize) {
                    *dst = config;
                } else {
                    log::warn!("SetTevStage: invalid stage {}", stage);
                }
            }
            GxCommand::SetNumTevStages(n) => self.num_tev_stages = n.clamp(1, MAX_TEV_STAGES as u8),
            GxCommand::SetNumTexGens(n) => self.num_tex_gens = n.min(MAX_TEX_COORDS as u8),
            GxCommand::SetTexCoordGen(generator) => {
                if let Some(dst) = self.tex_coord_gens.get_mut(generator.coord as usize) {
                    *dst = generator;
                }
            }
            GxCommand::LoadTexMtx { slot, mtx } => {
                if let Some(dst) = self.tex_matrices.get_mut(slot as usize) {
                    *dst = mtx;
                } else {
                    log::warn!("LoadTexMtx: invalid slot {}", slot);
                }
            }
            GxCommand::LoadTexObj { map, texture } => {
                if let Some(dst) = self.tex_maps.get_mut(map as usize) {
                    *dst = Some(texture);
                }
            }
            GxCommand::SetZTexture(op) => self.z_texture = op,
            GxCommand::UploadZTexel { depth } => self.z_texel = Some(depth),
            GxCommand::LoadLightObj { slot, light } => {
                if let Some(dst) = self.lights.get_mut(slot as usize) {
                    *dst = Some(light);
                } else {
                    log::warn!("LoadLightObj: invalid slot {}", slot);
                }
            }
            GxCommand::SetFog(fog) => self.fog = fog,
            GxCommand::ClearVtxDesc => self.vtx_desc = [VtxInputType::None; VtxAttr::COUNT],
            GxCommand::SetVtxDesc { attr, input } => self.vtx_desc[attr as usize] = input,
            GxCommand::SetVtxAttrFmt { attr, fmt } => self.vtx_fmt[attr as usize] = fmt,
            GxCommand::SetPointSize(size) => self.point_size = size,
            GxCommand::SetLineWidth(width) => self.line_width = width,
            GxCommand::InvVtxCache
            | GxCommand::Begin { .. }
            | GxCommand::Position3f32(_)
            | GxCommand::Position2u16(_)
            | GxCommand::Normal3f32(_)
            | GxCommand::Color4u8(_)
            | GxCommand::TexCoord2f32(_)
            | GxCommand::TexCoord2u8(_)
            | GxCommand::End => {}
        }
    }

    /// The active TEV stages, in order.
    pub fn active_stages(&self) -> &[TevStageConfig] {
        &self.tev_stages[..self.num_tev_stages as usize]
    }

    pub fn tev_color(&self, reg: TevRegId) -> GxColor {
        self.tev_colors[reg as usize]
    }

    pub fn chan(&self, channel: ChannelId) -> Option<&ColorChannel> {
        channel.index().map(|i| &self.chan_ctrl[i])
    }
}

impl Default for GxRegisters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_register_writes() {
        let mut regs = GxRegisters::new();
        regs.apply(&GxCommand::SetZMode(ZMode {
            enable: false,
            function: CompareFunction::Always,
            update: false,
        }));
        regs.apply(&GxCommand::SetNumTevStages(3));
        regs.apply(&GxCommand::SetCullMode(CullMode::All));
        assert!(!regs.z_mode.enable);
        assert_eq!(regs.active_stages().len(), 3);
        assert_eq!(regs.cull_mode, CullMode::All);
    }

    #[test]
    fn out_of_range_slots_are_ignored() {
        let mut regs = GxRegisters::new();
        let before = regs.pos_matrices;
        regs.apply(&GxCommand::LoadPosMtx {
            slot: 42,
            mtx: [[2.0; 4]; 3],
        });
        assert_eq!(regs.pos_matrices, before);
    }

    #[test]
    fn fog_ortho_variant() {
        assert_eq!(FogType::PerspExp2.to_ortho(), FogType::OrthoExp2);
        assert_eq!(FogType::None.to_ortho(), FogType::None);
    }
}
