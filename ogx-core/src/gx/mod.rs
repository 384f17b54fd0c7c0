// GX (Graphics eXecutor) command model.
//
// Everything the translation layer does to the hardware goes through
// `GxBackend::submit` as a `GxCommand`. Submodules hold the register value
// types; `recorder` provides the backend that records the command stream and
// mirrors it into a shadow register file.

pub mod lighting;
pub mod recorder;
pub mod state;
pub mod tev;
pub mod vertex;

use serde::{Deserialize, Serialize};

use self::lighting::{ColorChannel, LightObj};
use self::state::{
    AlphaCompare, BlendMode, CullMode, FogParams, Scissor, TexCoordGen, Viewport, VtxAttr, VtxAttrFmt,
    VtxInputType, ZMode, ZTexOp,
};
use self::tev::{ChannelId, TevRegId, TevStageConfig};
use self::vertex::GxPrimitive;
use crate::matrix::{Mtx, Mtx44, ProjectionKind};
use crate::texture::TextureObject;

/// Hardware light object slots.
pub const MAX_GX_LIGHTS: usize = 8;
/// TEV stages.
pub const MAX_TEV_STAGES: usize = 16;

/// 8-bit RGBA color, the hardware's color register and vertex color format.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GxColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl GxColor {
    pub const ZERO: GxColor = GxColor::new(0, 0, 0, 0);
    pub const BLACK: GxColor = GxColor::new(0, 0, 0, 255);
    pub const WHITE: GxColor = GxColor::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert a float color, clamping each channel to [0, 1] first.
    pub fn from_f32(rgba: [f32; 4]) -> Self {
        let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
        Self::new(ch(rgba[0]), ch(rgba[1]), ch(rgba[2]), ch(rgba[3]))
    }

    pub fn to_f32(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f32 / 255.0)
    }
}

/// One hardware interaction: a register write or a vertex stream element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum GxCommand {
    // -- Pixel engine ----------------------------------------------------
    SetZMode(ZMode),
    SetZCompLoc { before_tex: bool },
    SetColorUpdate(bool),
    SetBlendMode(BlendMode),
    SetAlphaCompare(AlphaCompare),
    SetCullMode(CullMode),

    // -- Transform -------------------------------------------------------
    LoadPosMtx { slot: u8, mtx: Mtx },
    LoadNrmMtx { slot: u8, mtx: Mtx },
    SetCurrentMtx(u8),
    LoadProjection { mtx: Mtx44, kind: ProjectionKind },
    SetViewport(Viewport),
    SetScissor(Scissor),

    // -- Lighting / channels ---------------------------------------------
    SetNumChans(u8),
    SetChanCtrl { channel: ChannelId, ctrl: ColorChannel },
    SetChanAmbColor { channel: ChannelId, color: GxColor },
    SetChanMatColor { channel: ChannelId, color: GxColor },
    LoadLightObj { slot: u8, light: LightObj },

    // -- TEV -------------------------------------------------------------
    SetTevColor { reg: TevRegId, color: GxColor },
    SetTevStage { stage: u8, config: TevStageConfig },
    SetNumTevStages(u8),

    // -- Texturing -------------------------------------------------------
    SetNumTexGens(u8),
    SetTexCoordGen(TexCoordGen),
    LoadTexMtx { slot: u8, mtx: Mtx },
    LoadTexObj { map: u8, texture: TextureObject },
    SetZTexture(ZTexOp),
    /// 24-bit depth value for the 1x1 z texture used by clears.
    UploadZTexel { depth: u32 },

    // -- Misc ------------------------------------------------------------
    SetFog(FogParams),
    ClearVtxDesc,
    SetVtxDesc { attr: VtxAttr, input: VtxInputType },
    SetVtxAttrFmt { attr: VtxAttr, fmt: VtxAttrFmt },
    /// In 1/16 pixel units.
    SetPointSize(u8),
    /// In 1/16 pixel units.
    SetLineWidth(u8),
    InvVtxCache,

    // -- Vertex stream ---------------------------------------------------
    Begin { primitive: GxPrimitive, count: u16 },
    Position3f32([f32; 3]),
    Position2u16([u16; 2]),
    Normal3f32([f32; 3]),
    Color4u8(GxColor),
    TexCoord2f32([f32; 2]),
    TexCoord2u8([u8; 2]),
    End,
}

impl GxCommand {
    /// Whether the command is part of a Begin/End vertex stream.
    pub fn is_vertex_data(&self) -> bool {
        matches!(
            self,
            GxCommand::Begin { .. }
                | GxCommand::Position3f32(_)
                | GxCommand::Position2u16(_)
                | GxCommand::Normal3f32(_)
                | GxCommand::Color4u8(_)
                | GxCommand::TexCoord2f32(_)
                | GxCommand::TexCoord2u8(_)
                | GxCommand::End
        )
    }
}

/// Sink for hardware commands.
pub trait GxBackend {
    fn submit(&mut self, command: GxCommand);

    /// Block until every submitted command has retired.
    fn draw_done(&mut self) {}
}

impl<T: GxBackend + ?Sized> GxBackend for &mut T {
    fn submit(&mut self, command: GxCommand) {
        (**self).submit(command);
    }

    fn draw_done(&mut self) {
        (**self).draw_done();
    }
}
