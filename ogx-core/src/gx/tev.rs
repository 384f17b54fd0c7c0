// TEV (Texture Environment) stage configuration.
//
// GX combines rasterized colors, texture samples and constant registers in a
// chain of TEV stages. Each stage computes, separately for color and alpha:
//   d OP ((1 - c) * a + c * b) + bias
// followed by a scale and an optional clamp, and writes to one of four
// registers. This module holds the per-stage configuration written by the
// stage synthesizer and a reference evaluator used to check what a stage
// chain computes for given inputs.

use serde::Serialize;

// ---------------------------------------------------------------------------
// TEV enums
// ---------------------------------------------------------------------------

/// Color channel input selector for a TEV stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TevColorArg {
    /// Previous stage color.
    Cprev = 0,
    /// Previous stage alpha broadcast to RGB.
    Aprev = 1,
    /// Color register 0.
    C0 = 2,
    /// Alpha register 0 broadcast to RGB.
    A0 = 3,
    C1 = 4,
    A1 = 5,
    C2 = 6,
    A2 = 7,
    /// Texture color.
    Texc = 8,
    /// Texture alpha broadcast to RGB.
    Texa = 9,
    /// Rasterized (lit or vertex) color.
    Rasc = 10,
    /// Rasterized alpha broadcast to RGB.
    Rasa = 11,
    One = 12,
    Half = 13,
    Zero = 15,
}

/// Alpha channel input selector for a TEV stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TevAlphaArg {
    Aprev = 0,
    A0 = 1,
    A1 = 2,
    A2 = 3,
    Texa = 4,
    Rasa = 5,
    Zero = 7,
}

/// Arithmetic operation applied in a TEV stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TevOp {
    Add = 0,
    Sub = 1,
}

/// Output scale factor applied after the combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TevScale {
    Scale1 = 0,
    Scale2 = 1,
    Scale4 = 2,
    DivideBy2 = 3,
}

/// Bias added before scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TevBias {
    Zero = 0,
    AddHalf = 1,
    SubHalf = 2,
}

/// TEV register. `Prev` is the implicit register passed between stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum TevRegId {
    Prev = 0,
    Reg0 = 1,
    Reg1 = 2,
    Reg2 = 3,
}

/// Rasterized color channel selected by a stage's TEV order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelId {
    Color0A0,
    Color1A1,
    /// No rasterized color.
    ColorNull,
}

impl ChannelId {
    /// Index into the two hardware color channels, `None` for `ColorNull`.
    pub fn index(self) -> Option<usize> {
        match self {
            ChannelId::Color0A0 => Some(0),
            ChannelId::Color1A1 => Some(1),
            ChannelId::ColorNull => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TEV stage configuration
// ---------------------------------------------------------------------------

/// Complete configuration for a single TEV stage: combiner inputs and
/// operation for color and alpha, plus the stage's TEV order (which texture
/// coordinate, texture map and rasterized channel it samples).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TevStageConfig {
    /// Color inputs [a, b, c, d].
    pub color_in: [TevColorArg; 4],
    /// Alpha inputs [a, b, c, d].
    pub alpha_in: [TevAlphaArg; 4],

    pub color_op: TevOp,
    pub alpha_op: TevOp,
    pub color_bias: TevBias,
    pub alpha_bias: TevBias,
    pub color_scale: TevScale,
    pub alpha_scale: TevScale,
    pub color_clamp: bool,
    pub alpha_clamp: bool,
    pub color_dest: TevRegId,
    pub alpha_dest: TevRegId,

    /// Texture coordinate slot, `None` for TEXCOORDNULL.
    pub tex_coord: Option<u8>,
    /// Texture map slot, `None` when texturing is disabled for the stage.
    pub tex_map: Option<u8>,
    pub channel: ChannelId,
}

impl Default for TevStageConfig {
    /// Pass-through of the previous stage, no texture, no raster color.
    fn default() -> Self {
        Self {
            color_in: [
                TevColorArg::Zero,
                TevColorArg::Zero,
                TevColorArg::Zero,
                TevColorArg::Cprev,
            ],
            alpha_in: [
                TevAlphaArg::Zero,
                TevAlphaArg::Zero,
                TevAlphaArg::Zero,
                TevAlphaArg::Aprev,
            ],
            color_op: TevOp::Add,
            alpha_op: TevOp::Add,
            color_bias: TevBias::Zero,
            alpha_bias: TevBias::Zero,
            color_scale: TevScale::Scale1,
            alpha_scale: TevScale::Scale1,
            color_clamp: true,
            alpha_clamp: true,
            color_dest: TevRegId::Prev,
            alpha_dest: TevRegId::Prev,
            tex_coord: None,
            tex_map: None,
            channel: ChannelId::ColorNull,
        }
    }
}

impl TevStageConfig {
    /// A stage that outputs `d` unchanged, for color and alpha.
    pub fn pass(color: TevColorArg, alpha: TevAlphaArg) -> Self {
        Self::default().with_inputs(
            [TevColorArg::Zero, TevColorArg::Zero, TevColorArg::Zero, color],
            [TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::Zero, alpha],
        )
    }

    /// The PASSCLR preset: rasterized color straight through.
    pub fn pass_raster() -> Self {
        Self::pass(TevColorArg::Rasc, TevAlphaArg::Rasa).with_order(
            None,
            None,
            ChannelId::Color0A0,
        )
    }

    pub fn with_inputs(mut self, color_in: [TevColorArg; 4], alpha_in: [TevAlphaArg; 4]) -> Self {
        self.color_in = color_in;
        self.alpha_in = alpha_in;
        self
    }

    /// Set the TEV order.
    pub fn with_order(mut self, tex_coord: Option<u8>, tex_map: Option<u8>, channel: ChannelId) -> Self {
        self.tex_coord = tex_coord;
        self.tex_map = tex_map;
        self.channel = channel;
        self
    }

    /// Whether the stage samples a texture.
    pub fn uses_texture(&self) -> bool {
        self.tex_map.is_some()
            && (self.color_in.iter().any(|a| matches!(a, TevColorArg::Texc | TevColorArg::Texa))
                || self.alpha_in.contains(&TevAlphaArg::Texa))
    }
}

// ---------------------------------------------------------------------------
// Reference evaluation
// ---------------------------------------------------------------------------

/// Inputs visible to a stage chain, as normalized RGBA.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TevInputs {
    /// Rasterized color per hardware channel.
    pub(crate) raster: [[f32; 4]; 2],
    /// Texture sample (the same for every textured stage).
    pub(crate) texture: [f32; 4],
    /// Initial values of Prev, Reg0, Reg1, Reg2.
    pub(crate) registers: [[f32; 4]; 4],
}

#[cfg(test)]
impl Default for TevInputs {
    fn default() -> Self {
        Self {
            raster: [[0.0; 4]; 2],
            texture: [1.0; 4],
            registers: [[0.0; 4]; 4],
        }
    }
}

#[cfg(test)]
fn scale_factor(scale: TevScale) -> f32 {
    match scale {
        TevScale::Scale1 => 1.0,
        TevScale::Scale2 => 2.0,
        TevScale::Scale4 => 4.0,
        TevScale::DivideBy2 => 0.5,
    }
}

#[cfg(test)]
fn bias_value(bias: TevBias) -> f32 {
    match bias {
        TevBias::Zero => 0.0,
        TevBias::AddHalf => 0.5,
        TevBias::SubHalf => -0.5,
    }
}

#[cfg(test)]
fn combine(a: f32, b: f32, c: f32, d: f32, op: TevOp, bias: TevBias, scale: TevScale, clamp: bool) -> f32 {
    let lerp = (1.0 - c) * a + c * b;
    let value = match op {
        TevOp::Add => d + lerp,
        TevOp::Sub => d - lerp,
    };
    let value = (value + bias_value(bias)) * scale_factor(scale);
    if clamp {
        value.clamp(0.0, 1.0)
    } else {
        value
    }
}

/// Run `stages` over `inputs` and return the final Prev register.
#[cfg(test)]
pub(crate) fn evaluate(stages: &[TevStageConfig], inputs: &TevInputs) -> [f32; 4] {
    let mut regs = inputs.registers;
    for stage in stages {
        let raster = stage
            .channel
            .index()
            .map(|i| inputs.raster[i])
            .unwrap_or([0.0; 4]);
        let texture = if stage.tex_map.is_some() {
            inputs.texture
        } else {
            [0.0; 4]
        };

        let color_arg = |arg: TevColorArg, ch: usize| -> f32 {
            match arg {
                TevColorArg::Cprev => regs[0][ch],
                TevColorArg::Aprev => regs[0][3],
                TevColorArg::C0 => regs[1][ch],
                TevColorArg::A0 => regs[1][3],
                TevColorArg::C1 => regs[2][ch],
                TevColorArg::A1 => regs[2][3],
                TevColorArg::C2 => regs[3][ch],
                TevColorArg::A2 => regs[3][3],
                TevColorArg::Texc => texture[ch],
                TevColorArg::Texa => texture[3],
                TevColorArg::Rasc => raster[ch],
                TevColorArg::Rasa => raster[3],
                TevColorArg::One => 1.0,
                TevColorArg::Half => 0.5,
                TevColorArg::Zero => 0.0,
            }
        };
        let alpha_arg = |arg: TevAlphaArg| -> f32 {
            match arg {
                TevAlphaArg::Aprev => regs[0][3],
                TevAlphaArg::A0 => regs[1][3],
                TevAlphaArg::A1 => regs[2][3],
                TevAlphaArg::A2 => regs[3][3],
                TevAlphaArg::Texa => texture[3],
                TevAlphaArg::Rasa => raster[3],
                TevAlphaArg::Zero => 0.0,
            }
        };

        let mut color = [0.0f32; 3];
        for (ch, out) in color.iter_mut().enumerate() {
            let [a, b, c, d] = stage.color_in.map(|arg| color_arg(arg, ch));
            *out = combine(a, b, c, d, stage.color_op, stage.color_bias, stage.color_scale, stage.color_clamp);
        }
        let [a, b, c, d] = stage.alpha_in.map(alpha_arg);
        let alpha = combine(a, b, c, d, stage.alpha_op, stage.alpha_bias, stage.alpha_scale, stage.alpha_clamp);

        let color_dest = &mut regs[stage.color_dest as usize];
        color_dest[..3].copy_from_slice(&color);
        regs[stage.alpha_dest as usize][3] = alpha;
    }
    regs[0]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
