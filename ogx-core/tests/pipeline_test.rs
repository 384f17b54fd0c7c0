// Draw-time pipeline: state application, projection handling and clears.
mod utils;

use ogx_core::gx::state::CullMode;
use ogx_core::matrix::ProjectionKind;
use ogx_core::{Capability, ClearMask, CullFace, GxCommand, MatrixMode, PrimitiveMode};
use utils::{bind_positions, recording_context, UNIT_QUAD};

#[test]
fn second_identical_draw_skips_register_writes() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD);

    ctx.draw_arrays(PrimitiveMode::Quads, 0, 4);
    let first = ctx.gx().commands().to_vec();
    assert!(first.iter().any(|c| matches!(c, GxCommand::SetZMode(_))));

    ctx.gx_mut().clear_log();
    ctx.draw_arrays(PrimitiveMode::Quads, 0, 4);
    let second = ctx.gx().commands();
    assert!(!second.iter().any(|c| matches!(c, GxCommand::SetZMode(_) | GxCommand::LoadProjection { .. })));
    assert_eq!(ctx.draw_count(), 2);
}

#[test]
fn cull_state_reaches_hardware_at_draw() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD);
    let logged = ctx.gx().command_count();
    ctx.enable(Capability::CullFace);
    ctx.cull_face(CullFace::Front);
    // state calls only touch the store
    assert_eq!(ctx.gx().command_count(), logged);
    assert!(!ctx.gx().commands().iter().any(|c| matches!(c, GxCommand::SetCullMode(_))));

    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);
    // GX faces are wound the other way
    assert_eq!(ctx.gx().regs.cull_mode, CullMode::Back);
    ctx.cull_face(CullFace::Back);
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);
    assert_eq!(ctx.gx().regs.cull_mode, CullMode::Front);
}

#[test]
fn frustum_loads_perspective_projection() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD);
    ctx.matrix_mode(MatrixMode::Projection);
    ctx.frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
    ctx.draw_arrays(PrimitiveMode::Points, 0, 1);

    let regs = &ctx.gx().regs;
    assert_eq!(regs.projection_kind, ProjectionKind::Perspective);
    // depth maps near..far onto -1..0
    let p = regs.projection;
    let z_near = (p[2][2] * -1.0 + p[2][3]) / 1.0;
    let z_far = (p[2][2] * -100.0 + p[2][3]) / 100.0;
    assert!((z_near + 1.0).abs() < 1e-4, "{}", z_near);
    assert!(z_far.abs() < 1e-4, "{}", z_far);
}

#[test]
fn depth_clear_uploads_texel_once() {
    let mut ctx = recording_context();
    ctx.clear_depth(0.5);
    ctx.clear(ClearMask::COLOR | ClearMask::DEPTH);
    let uploads = |ctx: &ogx_core::Context<ogx_core::GxRecorder>| {
        ctx.gx()
            .commands()
            .iter()
            .filter(|c| matches!(c, GxCommand::UploadZTexel { .. }))
            .count()
    };
    assert_eq!(uploads(&ctx), 1);

    ctx.clear(ClearMask::COLOR | ClearMask::DEPTH);
    assert_eq!(uploads(&ctx), 1);
    assert_eq!(ctx.gx().draws().len(), 2);
}

#[test]
fn draws_without_vertex_array_are_skipped() {
    let mut ctx = recording_context();
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);
    assert!(ctx.gx().draws().is_empty());
    assert_eq!(ctx.draw_count(), 0);
    assert_eq!(ctx.get_error(), None);
}

#[test]
fn draw_inside_begin_is_invalid() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD);
    ctx.begin(PrimitiveMode::Points);
    ctx.draw_arrays(PrimitiveMode::Points, 0, 1);
    assert_eq!(ctx.get_error(), Some(ogx_core::GlError::InvalidOperation));
}
