// Geometry submission: immediate mode, arrays and indexed draws.
mod utils;

use std::rc::Rc;

use ogx_core::gx::tev::TevColorArg;
use ogx_core::gx::vertex::GxPrimitive;
use ogx_core::state::arrays::f32_bytes;
use ogx_core::{
    Capability, ClientArray, ClientArrayKind, GxColor, Indices, InterleavedFormat, PrimitiveMode, TextureObject,
};
use utils::{bind_positions, recording_context, UNIT_QUAD};

#[test]
fn immediate_white_quad() {
    let mut ctx = recording_context();
    ctx.begin(PrimitiveMode::Quads);
    ctx.color3f(1.0, 1.0, 1.0);
    for v in UNIT_QUAD.chunks(3) {
        ctx.vertex3f(v[0], v[1], v[2]);
    }
    ctx.end();

    let draw = ctx.gx().last_draw().expect("quad drawn");
    assert_eq!(draw.primitive, GxPrimitive::Quads);
    assert_eq!(draw.vertex_count(), 4);
    assert!(draw.vertices.iter().all(|v| v.colors[0] == Some(GxColor::WHITE)));
    assert_eq!(draw.vertices[2].position, [1.0, 1.0, 0.0]);
    assert!(draw.vertices.iter().all(|v| v.tex_coord.is_none()));

    let stage = ctx.gx().regs.tev_stages[0];
    assert_eq!(stage.color_in[3], TevColorArg::Rasc);
    assert_eq!(ctx.gx().regs.num_tev_stages, 1);
    assert_eq!(ctx.draw_count(), 1);
}

#[test]
fn immediate_without_color_uses_constant_register() {
    let mut ctx = recording_context();
    ctx.color4ub(10, 20, 30, 255);
    ctx.begin(PrimitiveMode::Triangles);
    ctx.vertex2f(0.0, 0.0);
    ctx.vertex2f(1.0, 0.0);
    ctx.vertex2f(0.0, 1.0);
    ctx.end();

    let regs = &ctx.gx().regs;
    assert_eq!(regs.tev_colors[1], GxColor::new(10, 20, 30, 255));
    assert_eq!(regs.tev_stages[0].color_in[3], TevColorArg::C0);
    let draw = ctx.gx().last_draw().expect("triangle drawn");
    assert!(draw.vertices.iter().all(|v| v.colors[0].is_none()));
}

#[test]
fn line_loop_closes_on_first_vertex() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
    ctx.draw_arrays(PrimitiveMode::LineLoop, 0, 3);

    let draw = ctx.gx().last_draw().expect("loop drawn");
    assert_eq!(draw.primitive, GxPrimitive::LineStrip);
    assert_eq!(draw.expected_count, 4);
    assert_eq!(draw.vertices[3].position, draw.vertices[0].position);
}

#[test]
fn indexed_draw_follows_indices() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD);
    ctx.draw_elements(PrimitiveMode::Triangles, Indices::U16(&[0, 2, 3]));

    let draw = ctx.gx().last_draw().expect("triangle drawn");
    let xs: Vec<f32> = draw.vertices.iter().map(|v| v.position[0]).collect();
    assert_eq!(xs, [-1.0, 1.0, -1.0]);
    assert_eq!(draw.vertices[1].position[1], 1.0);
}

#[test]
fn vertex_colors_from_array() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD[..9]);
    ctx.color_pointer(Rc::new(ClientArray::from_f32(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0], 3)));
    ctx.enable_client_state(ClientArrayKind::Color);
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);

    let draw = ctx.gx().last_draw().expect("triangle drawn");
    assert_eq!(draw.vertices[1].colors[0], Some(GxColor::new(0, 255, 0, 255)));
    assert_eq!(draw.vertices[1].colors[1], None);
}

#[test]
fn interleaved_textured_draw() {
    let mut ctx = recording_context();
    ctx.textures_mut().define(7, TextureObject::new(42, 64, 64)).expect("table has room");
    ctx.bind_texture(7);
    ctx.enable(Capability::Texture2D);

    #[rustfmt::skip]
    let data = f32_bytes(&[
        0.0, 0.0, -1.0, -1.0, 0.0,
        1.0, 0.0, 1.0, -1.0, 0.0,
        0.5, 1.0, 0.0, 1.0, 0.0,
    ]);
    ctx.interleaved_arrays(InterleavedFormat::T2fV3f, 0, data);
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);

    let regs = &ctx.gx().regs;
    assert_eq!(regs.tex_maps[0].map(|t| t.id), Some(42));
    assert_eq!(regs.num_tex_gens, 1);
    let draw = ctx.gx().last_draw().expect("triangle drawn");
    assert_eq!(draw.vertices[2].tex_coord, Some([0.5, 1.0]));
    assert_eq!(draw.vertices[1].position, [1.0, -1.0, 0.0]);
}

#[test]
fn tex_coords_ignored_while_texturing_is_off() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD);
    ctx.tex_coord_pointer(Rc::new(ClientArray::from_f32(&[0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0], 2)));
    ctx.enable_client_state(ClientArrayKind::TexCoord);
    ctx.draw_arrays(PrimitiveMode::Quads, 0, 4);

    let draw = ctx.gx().last_draw().expect("quad drawn");
    assert_eq!(draw.vertex_count(), 4);
    assert!(draw.vertices.iter().all(|v| v.tex_coord.is_none()));
    assert_eq!(ctx.gx().regs.num_tex_gens, 0);
}

#[test]
fn unbound_texture_draws_untextured() {
    let mut ctx = recording_context();
    ctx.bind_texture(3);
    ctx.enable(Capability::Texture2D);
    bind_positions(&mut ctx, &UNIT_QUAD);
    ctx.draw_arrays(PrimitiveMode::Quads, 0, 4);

    assert_eq!(ctx.gx().regs.num_tex_gens, 0);
    assert_eq!(ctx.draw_count(), 1);
}

#[test]
fn oversized_loop_is_rejected() {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &UNIT_QUAD);
    ctx.draw_arrays(PrimitiveMode::LineLoop, 0, u16::MAX as usize);
    assert_eq!(ctx.get_error(), Some(ogx_core::GlError::InvalidValue));
    assert!(ctx.gx().draws().is_empty());
}
