// Dirty-state application.
//
// `apply_state` is the per-draw synchronization point: each aspect whose
// dirty bit is set is pushed to GX and its bit cleared. This module is the
// only place that clears dirty bits; `take_dirty` lets the stage synthesizer
// and `apply_clear` consume the texgen and clear-depth bits they own.

use crate::context::params::ClearMask;
use crate::emulation::StencilEmulation;
use crate::gx::lighting::{ColorChannel, ColorSrc};
use crate::gx::state::{
    AlphaCompare, AlphaOp, BlendFactor, BlendMode, BlendType, CompType, CompareFunction, CullMode, FogParams,
    FogType, LogicOp, Scissor, TexCoordGen, TexGenSrc, TexMtxSource, Viewport, VtxAttr, VtxAttrFmt, VtxInputType,
    ZMode, ZTexOp,
};
use crate::gx::tev::{ChannelId, TevStageConfig};
use crate::gx::vertex::GxPrimitive;
use crate::gx::{GxBackend, GxCommand};
use crate::matrix::{self, ProjectionKind, POLYGON_OFFSET_SCALE};
use crate::state::{CullFace, DirtyFlags, FrontFace, GraphicsState, Rect};
use crate::texture::TextureObject;

/// Position/normal matrix slot used for the model-view.
pub const MODELVIEW_SLOT: u8 = 3;
/// Position matrix slot that always holds identity.
pub const IDENTITY_SLOT: u8 = 0;

/// Largest value of the 24-bit depth buffer.
const DEPTH_MAX: f32 = ((1u32 << 24) - 1) as f32;

/// Clear `flag` and report whether it was set.
pub fn take_dirty(state: &mut GraphicsState, flag: DirtyFlags) -> bool {
    let was_set = state.dirty.contains(flag);
    state.dirty.remove(flag);
    was_set
}

/// Bits cleared at the end of `apply_state`. TEXTURE_GEN and CLEAR_Z are
/// consumed by their own users.
const APPLIED: DirtyFlags = DirtyFlags::CULL
    .union(DirtyFlags::LIGHTING)
    .union(DirtyFlags::MATERIAL)
    .union(DirtyFlags::MATRICES)
    .union(DirtyFlags::STENCIL)
    .union(DirtyFlags::ALPHA_TEST)
    .union(DirtyFlags::BLEND)
    .union(DirtyFlags::CLIP_PLANES)
    .union(DirtyFlags::COLOR_UPDATE)
    .union(DirtyFlags::Z)
    .union(DirtyFlags::VIEWPORT)
    .union(DirtyFlags::SCISSOR)
    .union(DirtyFlags::RASTER_SIZE);

/// Push every dirty aspect to GX and clear its bit.
pub fn apply_state(state: &mut GraphicsState, gx: &mut dyn GxBackend) {
    let dirty = state.dirty;
    let raster = state.raster;

    if dirty.contains(DirtyFlags::Z) {
        // GX has no write-without-test.
        gx.submit(GxCommand::SetZMode(ZMode {
            enable: raster.depth_test,
            function: raster.depth_func,
            update: raster.depth_write && raster.depth_test,
        }));
    }

    if dirty.contains(DirtyFlags::COLOR_UPDATE) {
        gx.submit(GxCommand::SetColorUpdate(raster.color_update));
    }

    if dirty.contains(DirtyFlags::BLEND) {
        gx.submit(GxCommand::SetBlendMode(BlendMode {
            mode: if raster.blend_enabled { BlendType::Blend } else { BlendType::None },
            src_factor: raster.blend_src,
            dst_factor: raster.blend_dst,
            logic_op: LogicOp::Clear,
        }));
    }

    if dirty.intersects(DirtyFlags::ALPHA_TEST | DirtyFlags::STENCIL | DirtyFlags::CLIP_PLANES) {
        let (compare, comparisons) = alpha_compare(state);
        gx.submit(GxCommand::SetZCompLoc {
            before_tex: comparisons == 0,
        });
        gx.submit(GxCommand::SetAlphaCompare(compare));
    }

    if dirty.contains(DirtyFlags::CULL) {
        gx.submit(GxCommand::SetCullMode(cull_mode(state)));
    }

    if dirty.contains(DirtyFlags::MATRICES) {
        gx.submit(GxCommand::LoadPosMtx {
            slot: MODELVIEW_SLOT,
            mtx: state.modelview,
        });
        gx.submit(GxCommand::SetCurrentMtx(MODELVIEW_SLOT));

        let z_offset = if raster.polygon_offset_fill {
            raster.polygon_offset_units * POLYGON_OFFSET_SCALE
        } else {
            0.0
        };
        let (mtx, kind) = matrix::update_projection(&state.projection, z_offset);
        gx.submit(GxCommand::LoadProjection { mtx, kind });
    }
    if dirty.intersects(DirtyFlags::MATRICES | DirtyFlags::LIGHTING) {
        gx.submit(GxCommand::LoadNrmMtx {
            slot: MODELVIEW_SLOT,
            mtx: matrix::normal_matrix(&state.modelview),
        });
    }

    if dirty.contains(DirtyFlags::VIEWPORT) {
        gx.submit(GxCommand::SetViewport(viewport(&state.viewport)));
    }
    if dirty.contains(DirtyFlags::SCISSOR) {
        gx.submit(GxCommand::SetScissor(scissor(&state.scissor)));
    }

    if dirty.contains(DirtyFlags::RASTER_SIZE) {
        gx.submit(GxCommand::SetPointSize(raster.point_size));
        gx.submit(GxCommand::SetLineWidth(raster.line_width));
    }

    state.dirty.remove(APPLIED);
}

/// Push the viewport and scissor if either is stale.
pub fn apply_viewport(state: &mut GraphicsState, gx: &mut dyn GxBackend) {
    if take_dirty(state, DirtyFlags::VIEWPORT) {
        gx.submit(GxCommand::SetViewport(viewport(&state.viewport)));
    }
    if take_dirty(state, DirtyFlags::SCISSOR) {
        gx.submit(GxCommand::SetScissor(scissor(&state.scissor)));
    }
}

/// The single alpha-compare unit shared by alpha test, stencil and clip
/// planes, plus the number of comparisons in use. Only two fit.
fn alpha_compare(state: &GraphicsState) -> (AlphaCompare, usize) {
    let mut params = [(CompareFunction::Always, 0u8); 2];
    let mut comparisons = 0;

    if state.raster.alpha_test {
        params[0] = (state.raster.alpha_func, state.raster.alpha_ref);
        comparisons += 1;
    }
    if state.stencil_enabled || state.clip_plane_mask != 0 {
        // The emulation stages write 0 alpha for rejected pixels.
        params[comparisons] = (CompareFunction::Greater, 0);
        comparisons += 1;
    }

    let compare = AlphaCompare {
        comp0: params[0].0,
        ref0: params[0].1,
        op: AlphaOp::And,
        comp1: params[1].0,
        ref1: params[1].1,
    };
    (compare, comparisons)
}

fn cull_mode(state: &GraphicsState) -> CullMode {
    let raster = &state.raster;
    if !raster.cull_enabled {
        return CullMode::None;
    }
    let front_cw = raster.front_face == FrontFace::Cw;
    match raster.cull_face {
        CullFace::Front if front_cw => CullMode::Front,
        CullFace::Front => CullMode::Back,
        CullFace::Back if front_cw => CullMode::Back,
        CullFace::Back => CullMode::Front,
        CullFace::FrontAndBack => CullMode::All,
    }
}

fn viewport(rect: &Rect) -> Viewport {
    Viewport {
        x: rect.x as f32,
        y: rect.y as f32,
        width: rect.width as f32,
        height: rect.height as f32,
        near: 0.0,
        far: 1.0,
    }
}

fn scissor(rect: &Rect) -> Scissor {
    Scissor {
        x: rect.x,
        y: rect.y,
        width: rect.width.max(0) as u32,
        height: rect.height.max(0) as u32,
    }
}

// ---------------------------------------------------------------------------
// Clear
// ---------------------------------------------------------------------------

/// Clear the requested buffers by drawing a screen-aligned quad.
///
/// Depth is written through a 1x1 z texture holding the clear depth; the
/// texel is only re-uploaded when the clear depth changed.
pub fn apply_clear(state: &mut GraphicsState, stencil: &mut dyn StencilEmulation, mask: ClearMask, gx: &mut dyn GxBackend) {
    if mask.contains(ClearMask::STENCIL) {
        stencil.clear(gx);
    }

    apply_viewport(state, gx);

    let mut stage = TevStageConfig::pass_raster();
    if mask.contains(ClearMask::DEPTH) {
        gx.submit(GxCommand::SetZMode(ZMode {
            enable: true,
            function: CompareFunction::Always,
            update: true,
        }));
        gx.submit(GxCommand::SetZCompLoc { before_tex: false });
        gx.submit(GxCommand::SetZTexture(ZTexOp::Replace));
        gx.submit(GxCommand::SetNumTexGens(1));

        if take_dirty(state, DirtyFlags::CLEAR_Z) {
            gx.submit(GxCommand::UploadZTexel {
                depth: (state.clear_depth * DEPTH_MAX) as u32,
            });
        }
        gx.submit(GxCommand::LoadTexObj {
            map: 0,
            texture: TextureObject::z_buffer(),
        });
        stage = stage.with_order(Some(0), Some(0), ChannelId::Color0A0);
    } else {
        gx.submit(GxCommand::SetZMode(ZMode {
            enable: false,
            function: CompareFunction::Always,
            update: false,
        }));
        gx.submit(GxCommand::SetNumTexGens(0));
    }

    gx.submit(GxCommand::SetColorUpdate(true));
    gx.submit(GxCommand::SetBlendMode(BlendMode {
        mode: BlendType::None,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        logic_op: LogicOp::Copy,
    }));
    gx.submit(GxCommand::SetCullMode(CullMode::None));
    gx.submit(GxCommand::SetAlphaCompare(AlphaCompare::default()));

    setup_2d_projection(state, gx);

    gx.submit(GxCommand::SetNumChans(1));
    gx.submit(GxCommand::SetNumTevStages(1));
    gx.submit(GxCommand::SetTevStage { stage: 0, config: stage });
    gx.submit(GxCommand::SetChanCtrl {
        channel: ChannelId::Color0A0,
        ctrl: ColorChannel {
            amb_src: ColorSrc::Vertex,
            ..ColorChannel::unlit(ColorSrc::Vertex)
        },
    });

    gx.submit(GxCommand::ClearVtxDesc);
    for (attr, fmt) in [
        (VtxAttr::Position, VtxAttrFmt::new(2, CompType::U16)),
        (VtxAttr::Color0, VtxAttrFmt::new(4, CompType::Rgba8)),
        (VtxAttr::Tex0, VtxAttrFmt::new(2, CompType::U8)),
    ] {
        gx.submit(GxCommand::SetVtxDesc {
            attr,
            input: VtxInputType::Direct,
        });
        gx.submit(GxCommand::SetVtxAttrFmt { attr, fmt });
    }
    gx.submit(GxCommand::SetTexCoordGen(TexCoordGen {
        coord: 0,
        src: TexGenSrc::Tex0,
        mtx: TexMtxSource::Identity,
    }));
    gx.submit(GxCommand::InvVtxCache);

    if state.fog.enabled {
        gx.submit(GxCommand::SetFog(FogParams {
            fog_type: FogType::None,
            color: state.clear_color,
            ..FogParams::default()
        }));
    }

    let width = state.viewport.width.clamp(0, u16::MAX as i32) as u16;
    let height = state.viewport.height.clamp(0, u16::MAX as i32) as u16;
    gx.submit(GxCommand::Begin {
        primitive: GxPrimitive::Quads,
        count: 4,
    });
    for (position, tex_coord) in [
        ([0, 0], [0, 0]),
        ([0, height], [0, 1]),
        ([width, height], [1, 1]),
        ([width, 0], [1, 0]),
    ] {
        gx.submit(GxCommand::Position2u16(position));
        gx.submit(GxCommand::Color4u8(state.clear_color));
        gx.submit(GxCommand::TexCoord2u8(tex_coord));
    }
    gx.submit(GxCommand::End);

    gx.submit(GxCommand::SetZTexture(ZTexOp::Disable));

    state.mark(
        DirtyFlags::ALPHA_TEST
            | DirtyFlags::BLEND
            | DirtyFlags::Z
            | DirtyFlags::COLOR_UPDATE
            | DirtyFlags::MATRICES
            | DirtyFlags::CULL
            | DirtyFlags::TEXTURE_GEN,
    );
    state.draw_count += 1;
}

/// Pixel-aligned orthographic projection over the viewport, drawn with the
/// identity position matrix.
fn setup_2d_projection(state: &GraphicsState, gx: &mut dyn GxBackend) {
    gx.submit(GxCommand::SetCurrentMtx(IDENTITY_SLOT));

    let vp = &state.viewport;
    let left = vp.x as f32 + 0.5;
    let top = vp.y as f32 + 0.5;
    let mtx = matrix::gx_ortho(
        top,
        top + (vp.height - 1) as f32,
        left,
        left + (vp.width - 1) as f32,
        0.0,
        1.0,
    );
    gx.submit(GxCommand::LoadProjection {
        mtx,
        kind: ProjectionKind::Orthographic,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::NoStencil;
    use crate::gx::recorder::GxRecorder;

    #[test]
    fn second_apply_is_a_no_op() {
        let mut state = GraphicsState::default();
        let mut gx = GxRecorder::new();
        apply_state(&mut state, &mut gx);
        let first = gx.command_count();
        assert!(first > 0);

        apply_state(&mut state, &mut gx);
        assert_eq!(gx.command_count(), first);
    }

    #[test]
    fn depth_write_needs_depth_test() {
        let mut state = GraphicsState::default();
        state.raster.depth_write = true;
        state.raster.depth_test = false;
        let mut gx = GxRecorder::new();
        apply_state(&mut state, &mut gx);
        assert!(!gx.regs.z_mode.update);

        state.raster.depth_test = true;
        state.mark(DirtyFlags::Z);
        apply_state(&mut state, &mut gx);
        assert!(gx.regs.z_mode.enable && gx.regs.z_mode.update);
    }

    #[test]
    fn alpha_test_and_stencil_share_compare_unit() {
        let mut state = GraphicsState::default();
        state.raster.alpha_test = true;
        state.raster.alpha_func = CompareFunction::GreaterEqual;
        state.raster.alpha_ref = 128;
        state.stencil_enabled = true;
        let mut gx = GxRecorder::new();
        apply_state(&mut state, &mut gx);

        let compare = gx.regs.alpha_compare;
        assert_eq!((compare.comp0, compare.ref0), (CompareFunction::GreaterEqual, 128));
        assert_eq!((compare.comp1, compare.ref1), (CompareFunction::Greater, 0));
        assert!(!gx.regs.z_comp_before_tex);
    }

    #[test]
    fn no_alpha_features_compares_early() {
        let mut state = GraphicsState::default();
        let mut gx = GxRecorder::new();
        apply_state(&mut state, &mut gx);
        assert!(gx.regs.z_comp_before_tex);
        assert_eq!(gx.regs.alpha_compare, AlphaCompare::default());
    }

    #[test]
    fn cull_face_translation() {
        let mut state = GraphicsState::default();
        state.raster.cull_enabled = true;
        assert_eq!(cull_mode(&state), CullMode::Front);
        state.raster.front_face = FrontFace::Cw;
        assert_eq!(cull_mode(&state), CullMode::Back);
        state.raster.cull_face = CullFace::FrontAndBack;
        assert_eq!(cull_mode(&state), CullMode::All);
        state.raster.cull_enabled = false;
        assert_eq!(cull_mode(&state), CullMode::None);
    }

    #[test]
    fn matrices_go_to_slot_three() {
        let mut state = GraphicsState::default();
        matrix::apply_translation(&mut state.modelview, 1.0, 2.0, 3.0);
        let mut gx = GxRecorder::new();
        apply_state(&mut state, &mut gx);
        assert_eq!(gx.regs.current_mtx, MODELVIEW_SLOT);
        assert_eq!(gx.regs.pos_matrices[3], state.modelview);
        assert_eq!(gx.regs.pos_matrices[3][1][3], 2.0);
    }

    #[test]
    fn polygon_offset_shifts_depth() {
        let mut state = GraphicsState::default();
        state.projection = matrix::ortho(-1.0, 1.0, -1.0, 1.0, 0.0, 1.0);
        let mut gx = GxRecorder::new();
        apply_state(&mut state, &mut gx);
        let base = gx.regs.projection[2][3];

        state.raster.polygon_offset_fill = true;
        state.raster.polygon_offset_units = 100.0;
        state.mark(DirtyFlags::MATRICES);
        apply_state(&mut state, &mut gx);
        assert!((gx.regs.projection[2][3] - base - 0.001).abs() < 1e-6);
    }

    #[test]
    fn take_dirty_consumes() {
        let mut state = GraphicsState::default();
        assert!(take_dirty(&mut state, DirtyFlags::CLEAR_Z));
        assert!(!take_dirty(&mut state, DirtyFlags::CLEAR_Z));
    }

    #[test]
    fn apply_leaves_owned_bits_alone() {
        let mut state = GraphicsState::default();
        let mut gx = GxRecorder::new();
        apply_state(&mut state, &mut gx);
        assert_eq!(state.dirty, DirtyFlags::TEXTURE_GEN | DirtyFlags::CLEAR_Z);
    }

    #[test]
    fn clear_depth_uploads_texel_once() {
        let mut state = GraphicsState::default();
        state.clear_depth = 1.0;
        let mut gx = GxRecorder::new();

        apply_clear(&mut state, &mut NoStencil, ClearMask::DEPTH, &mut gx);
        assert_eq!(gx.regs.z_texel, Some((1 << 24) - 1));
        let uploads = |gx: &GxRecorder| {
            gx.commands()
                .iter()
                .filter(|c| matches!(c, GxCommand::UploadZTexel { .. }))
                .count()
        };
        assert_eq!(uploads(&gx), 1);

        apply_clear(&mut state, &mut NoStencil, ClearMask::DEPTH, &mut gx);
        assert_eq!(uploads(&gx), 1);
        assert_eq!(gx.draws().len(), 2);
        assert_eq!(state.draw_count, 2);
    }

    #[test]
    fn clear_quad_covers_viewport() {
        let mut state = GraphicsState::default();
        state.clear_color = crate::gx::GxColor::new(10, 20, 30, 255);
        let mut gx = GxRecorder::new();
        apply_clear(&mut state, &mut NoStencil, ClearMask::COLOR, &mut gx);

        let draw = gx.last_draw().expect("clear quad");
        assert_eq!(draw.primitive, GxPrimitive::Quads);
        assert_eq!(draw.vertex_count(), 4);
        assert_eq!(draw.vertices[2].position, [640.0, 480.0, 0.0]);
        assert!(draw.vertices.iter().all(|v| v.colors[0] == Some(state.clear_color)));
        assert!(!gx.regs.z_mode.enable);
        assert_eq!(gx.regs.z_texture, ZTexOp::Disable);
        assert!(state.is_dirty(DirtyFlags::MATRICES | DirtyFlags::TEXTURE_GEN));
    }
}
