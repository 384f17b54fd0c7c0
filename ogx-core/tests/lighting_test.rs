// Lit draws: channel setup, light allocation and color material.
mod utils;

use std::rc::Rc;

use ogx_core::gx::lighting::ColorSrc;
use ogx_core::{
    Capability, ClientArray, ClientArrayKind, ColorMaterialMode, GxColor, LightParam, MaterialParam, PrimitiveMode,
};
use utils::{bind_positions, recording_context};

const TRIANGLE: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];

fn lit_context() -> ogx_core::Context<ogx_core::GxRecorder> {
    let mut ctx = recording_context();
    bind_positions(&mut ctx, &TRIANGLE);
    ctx.normal_pointer(Rc::new(ClientArray::from_f32(&[0.0f32, 0.0, 1.0].repeat(3), 3)));
    ctx.enable_client_state(ClientArrayKind::Normal);
    ctx.enable(Capability::Lighting);
    ctx.enable(Capability::Light(0));
    ctx
}

#[test]
fn single_light_feeds_diffuse_channel() {
    let mut ctx = lit_context();
    ctx.light(0, LightParam::Diffuse([1.0, 0.0, 0.0, 1.0]));
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);

    let regs = &ctx.gx().regs;
    assert_eq!(regs.num_chans, 2);
    assert_eq!(regs.num_tev_stages, 2);
    assert_eq!(regs.chan_ctrl[1].light_mask, 0b1);
    // light 0 has black ambient and specular
    assert_eq!(regs.chan_ctrl[0].light_mask, 0);
    let light = regs.lights[0].expect("light object loaded");
    assert_eq!(light.color, GxColor::new(255, 0, 0, 255));

    let draw = ctx.gx().last_draw().expect("triangle drawn");
    assert_eq!(draw.vertices[0].normal, Some([0.0, 0.0, 1.0]));
}

#[test]
fn ambient_and_diffuse_take_separate_slots() {
    let mut ctx = lit_context();
    ctx.light(0, LightParam::Ambient([0.5, 0.5, 0.5, 1.0]));
    ctx.enable(Capability::Light(1));
    ctx.light(1, LightParam::Diffuse([0.0, 1.0, 0.0, 1.0]));
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);

    let regs = &ctx.gx().regs;
    // light 0: ambient slot 0, diffuse slot 1; light 1: diffuse slot 2
    assert_eq!(regs.chan_ctrl[0].light_mask, 0b001);
    assert_eq!(regs.chan_ctrl[1].light_mask, 0b110);
}

#[test]
fn material_colors_go_to_registers() {
    let mut ctx = lit_context();
    ctx.material(MaterialParam::Diffuse([0.0, 0.0, 1.0, 1.0]));
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);

    let regs = &ctx.gx().regs;
    assert_eq!(regs.chan_ctrl[1].mat_src, ColorSrc::Register);
    assert_eq!(regs.chan_mat[1], GxColor::new(0, 0, 255, 255));
}

#[test]
fn color_material_streams_vertex_colors_twice() {
    let mut ctx = lit_context();
    ctx.color_material(ColorMaterialMode::AmbientAndDiffuse);
    ctx.enable(Capability::ColorMaterial);
    ctx.color_pointer(Rc::new(ClientArray::from_u8(&[255u8, 128, 0, 255].repeat(3), 4)));
    ctx.enable_client_state(ClientArrayKind::Color);
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);

    let regs = &ctx.gx().regs;
    assert_eq!(regs.chan_ctrl[1].mat_src, ColorSrc::Vertex);
    let draw = ctx.gx().last_draw().expect("triangle drawn");
    let orange = Some(GxColor::new(255, 128, 0, 255));
    assert_eq!(draw.vertices[2].colors, [orange, orange]);
}

#[test]
fn lighting_off_returns_to_one_channel() {
    let mut ctx = lit_context();
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);
    ctx.disable(Capability::Lighting);
    ctx.draw_arrays(PrimitiveMode::Triangles, 0, 3);
    assert_eq!(ctx.gx().regs.num_chans, 1);
    assert_eq!(ctx.gx().regs.num_tev_stages, 1);
}
