// Scene scripts: a JSON list of API calls replayed against a context.
use std::rc::Rc;

use anyhow::{Context as _, Result};
use ogx_core::state::arrays::f32_bytes;
use ogx_core::{
    Capability, ClearMask, ClientArray, ClientArrayKind, ColorMaterialMode, CompareFunction, Config, Context, CullFace,
    FogParam, FrontFace, GlBlendFactor, GxBackend, Indices, InterleavedFormat, LightParam, MaterialParam,
    MatrixMode, PrimitiveMode, TexCoordAxis, TexEnvMode, TexGenMode, TexGenPlane, TextureObject,
};
use serde::{Deserialize, Serialize};

fn one() -> f32 {
    1.0
}

/// One API call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum Call {
    Enable { cap: Capability },
    Disable { cap: Capability },

    MatrixMode { mode: MatrixMode },
    LoadIdentity,
    LoadMatrix { m: [f32; 16] },
    MultMatrix { m: [f32; 16] },
    Translate { x: f32, y: f32, z: f32 },
    Scale { x: f32, y: f32, z: f32 },
    Rotate { angle: f32, x: f32, y: f32, z: f32 },
    Frustum { left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32 },
    Ortho { left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32 },
    PushMatrix,
    PopMatrix,

    Light { index: u8, param: LightParam },
    Material { param: MaterialParam },
    LightModelAmbient { rgba: [f32; 4] },
    ColorMaterial { mode: ColorMaterialMode },
    Fog { param: FogParam },

    CullFace { face: CullFace },
    FrontFace { face: FrontFace },
    DepthFunc { func: CompareFunction },
    DepthMask { write: bool },
    AlphaFunc { func: CompareFunction, reference: f32 },
    BlendFunc { src: GlBlendFactor, dst: GlBlendFactor },
    ColorMask { red: bool, green: bool, blue: bool, alpha: bool },
    PolygonOffset { factor: f32, units: f32 },
    PointSize { size: f32 },
    LineWidth { width: f32 },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    Scissor { x: i32, y: i32, width: i32, height: i32 },

    BindTexture { handle: u32 },
    TexEnv { mode: TexEnvMode },
    TexGen { axis: TexCoordAxis, mode: TexGenMode },
    TexGenPlane { axis: TexCoordAxis, plane: TexGenPlane, coefficients: [f32; 4] },

    ClearColor { r: f32, g: f32, b: f32, #[serde(default = "one")] a: f32 },
    ClearDepth { depth: f32 },
    Clear { mask: ClearMask },

    Begin { mode: PrimitiveMode },
    Vertex { x: f32, y: f32, #[serde(default)] z: f32 },
    Normal { x: f32, y: f32, z: f32 },
    Color { r: f32, g: f32, b: f32, #[serde(default = "one")] a: f32 },
    TexCoord { s: f32, t: f32 },
    End,
    ArrayElement { index: usize },

    /// Float client array; `components` applies to vertex and color arrays.
    Array { kind: ClientArrayKind, #[serde(default = "three")] components: u8, data: Vec<f32> },
    EnableClientState { kind: ClientArrayKind },
    DisableClientState { kind: ClientArrayKind },
    Interleaved { format: InterleavedFormat, #[serde(default)] stride: usize, data: Vec<f32> },
    DrawArrays { mode: PrimitiveMode, first: usize, count: usize },
    DrawElements { mode: PrimitiveMode, indices: Vec<u32> },

    GetError,
    Flush,
    Finish,
}

fn three() -> u8 {
    3
}

/// Texture object preloaded into the context's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureDef {
    pub handle: u32,
    #[serde(flatten)]
    pub texture: TextureObject,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Diagnostics for the replay; `OPENGX_DEBUG` applies when absent.
    #[serde(default)]
    pub config: Option<Config>,
    #[serde(default)]
    pub textures: Vec<TextureDef>,
    pub calls: Vec<Call>,
}

/// Outcome of a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplayReport {
    pub calls: usize,
    pub draws: u64,
    /// `(call index, GL error code)` for every `get_error` that found one.
    pub errors: Vec<(usize, u32)>,
    /// Error still pending in the sticky slot after the last call.
    pub final_error: Option<u32>,
}

impl Scene {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse scene")
    }

    /// Load the textures and run every call in order.
    pub fn replay<B: GxBackend>(&self, ctx: &mut Context<B>) -> Result<ReplayReport> {
        for def in &self.textures {
            ctx.textures_mut()
                .define(def.handle, def.texture)
                .with_context(|| format!("Failed to define texture {}", def.handle))?;
        }

        let mut report = ReplayReport::default();
        for (index, call) in self.calls.iter().enumerate() {
            log::trace!("call {}: {:?}", index, call);
            if let Some(error) = call.apply(ctx) {
                log::debug!("call {} reported {}", index, error);
                report.errors.push((index, error.code()));
            }
            report.calls += 1;
        }
        report.draws = ctx.draw_count();
        report.final_error = ctx.get_error().map(|e| e.code());
        Ok(report)
    }
}

impl Call {
    /// Issue the call. Only `GetError` returns anything.
    pub fn apply<B: GxBackend>(&self, ctx: &mut Context<B>) -> Option<ogx_core::GlError> {
        match self {
            Call::Enable { cap } => ctx.enable(*cap),
            Call::Disable { cap } => ctx.disable(*cap),

            Call::MatrixMode { mode } => ctx.matrix_mode(*mode),
            Call::LoadIdentity => ctx.load_identity(),
            Call::LoadMatrix { m } => ctx.load_matrix(m),
            Call::MultMatrix { m } => ctx.mult_matrix(m),
            Call::Translate { x, y, z } => ctx.translate(*x, *y, *z),
            Call::Scale { x, y, z } => ctx.scale(*x, *y, *z),
            Call::Rotate { angle, x, y, z } => ctx.rotate(*angle, *x, *y, *z),
            Call::Frustum { left, right, bottom, top, near, far } => {
                ctx.frustum(*left, *right, *bottom, *top, *near, *far)
            }
            Call::Ortho { left, right, bottom, top, near, far } => ctx.ortho(*left, *right, *bottom, *top, *near, *far),
            Call::PushMatrix => ctx.push_matrix(),
            Call::PopMatrix => ctx.pop_matrix(),

            Call::Light { index, param } => ctx.light(*index, *param),
            Call::Material { param } => ctx.material(*param),
            Call::LightModelAmbient { rgba } => ctx.light_model_ambient(*rgba),
            Call::ColorMaterial { mode } => ctx.color_material(*mode),
            Call::Fog { param } => ctx.fog(*param),

            Call::CullFace { face } => ctx.cull_face(*face),
            Call::FrontFace { face } => ctx.front_face(*face),
            Call::DepthFunc { func } => ctx.depth_func(*func),
            Call::DepthMask { write } => ctx.depth_mask(*write),
            Call::AlphaFunc { func, reference } => ctx.alpha_func(*func, *reference),
            Call::BlendFunc { src, dst } => ctx.blend_func(*src, *dst),
            Call::ColorMask { red, green, blue, alpha } => ctx.color_mask(*red, *green, *blue, *alpha),
            Call::PolygonOffset { factor, units } => ctx.polygon_offset(*factor, *units),
            Call::PointSize { size } => ctx.point_size(*size),
            Call::LineWidth { width } => ctx.line_width(*width),
            Call::Viewport { x, y, width, height } => ctx.viewport(*x, *y, *width, *height),
            Call::Scissor { x, y, width, height } => ctx.scissor(*x, *y, *width, *height),

            Call::BindTexture { handle } => ctx.bind_texture(*handle),
            Call::TexEnv { mode } => ctx.tex_env_mode(*mode),
            Call::TexGen { axis, mode } => ctx.tex_gen_mode(*axis, *mode),
            Call::TexGenPlane { axis, plane, coefficients } => ctx.tex_gen_plane(*axis, *plane, *coefficients),

            Call::ClearColor { r, g, b, a } => ctx.clear_color(*r, *g, *b, *a),
            Call::ClearDepth { depth } => ctx.clear_depth(*depth),
            Call::Clear { mask } => ctx.clear(*mask),

            Call::Begin { mode } => ctx.begin(*mode),
            Call::Vertex { x, y, z } => ctx.vertex3f(*x, *y, *z),
            Call::Normal { x, y, z } => ctx.normal3f(*x, *y, *z),
            Call::Color { r, g, b, a } => ctx.color4f(*r, *g, *b, *a),
            Call::TexCoord { s, t } => ctx.tex_coord2f(*s, *t),
            Call::End => ctx.end(),
            Call::ArrayElement { index } => ctx.array_element(*index),

            Call::Array { kind, components, data } => {
                let components = match kind {
                    ClientArrayKind::Vertex | ClientArrayKind::Color => *components,
                    ClientArrayKind::Normal => 3,
                    ClientArrayKind::TexCoord => 2,
                };
                let array = Rc::new(ClientArray::from_f32(data, components));
                match kind {
                    ClientArrayKind::Vertex => ctx.vertex_pointer(array),
                    ClientArrayKind::Normal => ctx.normal_pointer(array),
                    ClientArrayKind::Color => ctx.color_pointer(array),
                    ClientArrayKind::TexCoord => ctx.tex_coord_pointer(array),
                }
            }
            Call::EnableClientState { kind } => ctx.enable_client_state(*kind),
            Call::DisableClientState { kind } => ctx.disable_client_state(*kind),
            Call::Interleaved { format, stride, data } => ctx.interleaved_arrays(*format, *stride, f32_bytes(data)),
            Call::DrawArrays { mode, first, count } => ctx.draw_arrays(*mode, *first, *count),
            Call::DrawElements { mode, indices } => ctx.draw_elements(*mode, Indices::U32(indices)),

            Call::GetError => return ctx.get_error(),
            Call::Flush => ctx.flush(),
            Call::Finish => ctx.finish(),
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogx_core::GxRecorder;

    #[test]
    fn parses_tagged_calls() {
        let scene = Scene::from_json(
            r#"{
                "calls": [
                    {"call": "enable", "cap": {"light": 0}},
                    {"call": "light", "index": 0, "param": {"param": "diffuse", "value": [1, 0, 0, 1]}},
                    {"call": "clear", "mask": "COLOR | DEPTH"},
                    {"call": "vertex", "x": 1, "y": 2}
                ]
            }"#,
        )
        .expect("valid scene");

        assert_eq!(scene.calls[0], Call::Enable { cap: Capability::Light(0) });
        assert_eq!(scene.calls[2], Call::Clear { mask: ClearMask::COLOR | ClearMask::DEPTH });
        assert_eq!(scene.calls[3], Call::Vertex { x: 1.0, y: 2.0, z: 0.0 });
    }

    #[test]
    fn replay_collects_errors() {
        let scene = Scene {
            calls: vec![Call::PopMatrix, Call::GetError, Call::GetError],
            ..Scene::default()
        };
        let mut ctx = Context::with_config(GxRecorder::new(), Config::default());
        let report = scene.replay(&mut ctx).expect("replay");
        assert_eq!(report.calls, 3);
        assert_eq!(report.errors, vec![(1, ogx_core::GlError::StackUnderflow.code())]);
        assert_eq!(report.final_error, None);
    }

    #[test]
    fn unread_error_is_reported_at_the_end() {
        let scene = Scene {
            calls: vec![Call::End],
            ..Scene::default()
        };
        let mut ctx = Context::with_config(GxRecorder::new(), Config::default());
        let report = scene.replay(&mut ctx).expect("replay");
        assert!(report.errors.is_empty());
        assert_eq!(report.final_error, Some(ogx_core::GlError::InvalidOperation.code()));
    }
}
