// Render-stage synthesis.
//
// Builds the color-channel and TEV configuration for the next draw from the
// current lighting, texturing and fog state:
//
// - Unlit: one stage passing the vertex color (or the current color through
//   TEV register 0), optionally combined with texture 0.
// - Lit: channel 0 accumulates ambient and specular lights, channel 1 the
//   diffuse ones. Stage 0 adds the emission color to channel 0, stage 1 adds
//   channel 1, and an optional stage 2 applies the texture.
//
// Stencil and clip-plane emulation then append their own stages.

use crate::apply::take_dirty;
use crate::config::LogFeature;
use crate::emulation::{ClipPlaneEmulation, StageBudget, StencilEmulation};
use crate::gx::lighting::{AttenuationFunction, ColorChannel, ColorSrc, DiffuseFunction};
use crate::gx::state::{FogParams, FogType, TexCoordGen, TexGenSrc, TexMtxSource};
use crate::gx::tev::{ChannelId, TevAlphaArg, TevColorArg, TevRegId, TevStageConfig};
use crate::gx::{GxBackend, GxColor, GxCommand};
use crate::lights;
use crate::matrix::{self, Mtx, ProjectionKind};
use crate::state::lighting::{ColorMaterialMode, LightMasks};
use crate::state::{DirtyFlags, FogMode, GraphicsState, TexCoordAxis, TexEnvMode, TexGenMode};
use crate::texture::{TextureObject, TextureTable};
use crate::{ogx_debug, ogx_warn};

/// Configure channels and TEV stages for the next draw.
///
/// Returns the consumed stage budget, or `None` when stencil emulation
/// determined that nothing would be drawn.
pub fn synthesize(
    state: &mut GraphicsState,
    textures: &TextureTable,
    stencil: &mut dyn StencilEmulation,
    clip: &mut dyn ClipPlaneEmulation,
    gx: &mut dyn GxBackend,
) -> Option<StageBudget> {
    let texture = bound_texture(state, textures);
    let mut budget = StageBudget::default();

    if state.lighting.enabled {
        setup_lit(state, texture, &mut budget, gx);
    } else {
        setup_unlit(state, texture, &mut budget, gx);
    }

    if state.stencil_enabled && !stencil.setup_stages(state, &mut budget, gx) {
        ogx_debug!(state.config, LogFeature::STENCIL, "stencil test rejects the draw");
        return None;
    }
    if state.clip_plane_mask != 0 {
        clip.setup_stages(state, &mut budget, gx);
    }

    gx.submit(GxCommand::SetNumTevStages(budget.stages));
    gx.submit(GxCommand::SetNumTexGens(budget.tex_coords));

    gx.submit(GxCommand::SetFog(fog_params(state)));
    Some(budget)
}

/// The texture object to apply, if texturing is on and the bound handle
/// resolves.
fn bound_texture(state: &GraphicsState, textures: &TextureTable) -> Option<TextureObject> {
    if !state.texture.enabled {
        return None;
    }
    let texture = textures.get(state.texture.bound).copied();
    if texture.is_none() {
        ogx_debug!(
            state.config,
            LogFeature::TEXTURE,
            "texture {} is not defined, drawing untextured",
            state.texture.bound
        );
    }
    texture
}

// ---------------------------------------------------------------------------
// Lighting regimes
// ---------------------------------------------------------------------------

fn setup_lit(state: &mut GraphicsState, texture: Option<TextureObject>, budget: &mut StageBudget, gx: &mut dyn GxBackend) {
    let masks = if state.is_dirty(DirtyFlags::LIGHTING | DirtyFlags::MATERIAL) {
        lights::prepare_lighting(&mut state.lighting, &state.config, gx)
    } else {
        state.lighting.masks
    };

    let lighting = &state.lighting;
    let current = state.immediate.current_color;
    let color_material = lighting.color_material_enabled;
    let mode = lighting.color_material_mode;

    budget.stages = 2;
    gx.submit(GxCommand::SetNumChans(2));

    let vertex_colors = state.arrays.color.is_active() && color_material;
    let mat_src = if vertex_colors {
        ColorSrc::Vertex
    } else {
        let follows = |tracked: bool, own: [f32; 4]| {
            if color_material && tracked {
                GxColor::from_f32(current)
            } else {
                GxColor::from_f32(own)
            }
        };
        let ambient = follows(mode.tracks_ambient(), lighting.material.ambient);
        let diffuse = follows(mode.tracks_diffuse(), lighting.material.diffuse);
        let specular = follows(mode == ColorMaterialMode::Specular, lighting.material.specular);

        // Channel 0 material color serves both ambient and specular lights;
        // ambient takes precedence.
        let chan0 = if masks.ambient != 0 { ambient } else { specular };
        gx.submit(GxCommand::SetChanMatColor {
            channel: ChannelId::Color0A0,
            color: chan0,
        });
        gx.submit(GxCommand::SetChanMatColor {
            channel: ChannelId::Color1A1,
            color: diffuse,
        });
        ColorSrc::Register
    };

    let emission = if color_material && mode == ColorMaterialMode::Emission {
        GxColor::from_f32(current)
    } else {
        GxColor::from_f32(lighting.material.emission)
    };

    setup_lit_channels(masks, mat_src, GxColor::from_f32(lighting.global_ambient), gx);

    // Stage 0: emission + ambient/specular channel.
    gx.submit(GxCommand::SetTevColor {
        reg: TevRegId::Reg0,
        color: emission,
    });
    let stage0 = TevStageConfig::default()
        .with_inputs(
            [TevColorArg::C0, TevColorArg::Zero, TevColorArg::Zero, TevColorArg::Rasc],
            [TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::Rasa],
        )
        .with_order(None, None, ChannelId::Color0A0);
    gx.submit(GxCommand::SetTevStage { stage: 0, config: stage0 });

    // Stage 1: previous + diffuse channel.
    let stage1 = TevStageConfig::default()
        .with_inputs(
            [TevColorArg::Cprev, TevColorArg::Zero, TevColorArg::Zero, TevColorArg::Rasc],
            [TevAlphaArg::Aprev, TevAlphaArg::Zero, TevAlphaArg::Zero, TevAlphaArg::Rasa],
        )
        .with_order(None, None, ChannelId::Color1A1);
    gx.submit(GxCommand::SetTevStage { stage: 1, config: stage1 });

    if let Some(texture) = texture {
        setup_texture_stage(
            state,
            &texture,
            2,
            (TevColorArg::Cprev, TevAlphaArg::Aprev),
            ChannelId::ColorNull,
            budget,
            gx,
        );
        budget.stages += 1;
        budget.tex_coords += 1;
        budget.tex_maps += 1;
    }
}

fn setup_lit_channels(masks: LightMasks, mat_src: ColorSrc, global_ambient: GxColor, gx: &mut dyn GxBackend) {
    gx.submit(GxCommand::SetChanCtrl {
        channel: ChannelId::Color0A0,
        ctrl: ColorChannel::lit(
            mat_src,
            masks.ambient | masks.specular,
            DiffuseFunction::None,
            AttenuationFunction::Spec,
        ),
    });
    gx.submit(GxCommand::SetChanAmbColor {
        channel: ChannelId::Color0A0,
        color: global_ambient,
    });

    gx.submit(GxCommand::SetChanCtrl {
        channel: ChannelId::Color1A1,
        ctrl: ColorChannel::lit(mat_src, masks.diffuse, DiffuseFunction::Clamp, AttenuationFunction::Spot),
    });
    gx.submit(GxCommand::SetChanAmbColor {
        channel: ChannelId::Color1A1,
        color: GxColor::ZERO,
    });
}

fn setup_unlit(state: &mut GraphicsState, texture: Option<TextureObject>, budget: &mut StageBudget, gx: &mut dyn GxBackend) {
    // A constant color goes through TEV register 0 instead of being sent
    // with every vertex.
    let (raster, channel) = if state.arrays.color.is_active() {
        ((TevColorArg::Rasc, TevAlphaArg::Rasa), ChannelId::Color0A0)
    } else {
        gx.submit(GxCommand::SetTevColor {
            reg: TevRegId::Reg0,
            color: GxColor::from_f32(state.immediate.current_color),
        });
        ((TevColorArg::C0, TevAlphaArg::A0), ChannelId::ColorNull)
    };

    budget.stages = 1;
    gx.submit(GxCommand::SetNumChans(1));
    gx.submit(GxCommand::SetChanCtrl {
        channel: ChannelId::Color0A0,
        ctrl: ColorChannel::unlit(ColorSrc::Vertex),
    });
    gx.submit(GxCommand::SetChanCtrl {
        channel: ChannelId::Color1A1,
        ctrl: ColorChannel::unlit(ColorSrc::Register),
    });

    match texture {
        Some(texture) => {
            setup_texture_stage(state, &texture, 0, raster, channel, budget, gx);
            budget.tex_coords += 1;
            budget.tex_maps += 1;
        }
        None => {
            let stage = TevStageConfig::pass(raster.0, raster.1).with_order(None, None, channel);
            gx.submit(GxCommand::SetTevStage { stage: 0, config: stage });
        }
    }
}

// ---------------------------------------------------------------------------
// Texturing
// ---------------------------------------------------------------------------

/// Combiner inputs for texture environment `mode`, given the incoming
/// color/alpha arguments.
pub fn tex_env_inputs(mode: TexEnvMode, color: TevColorArg, alpha: TevAlphaArg) -> ([TevColorArg; 4], [TevAlphaArg; 4]) {
    use TevAlphaArg as A;
    use TevColorArg as C;

    match mode {
        // a
        TexEnvMode::Replace => ([C::Texc, C::Zero, C::Zero, C::Zero], [A::Texa, A::Zero, A::Zero, A::Zero]),
        // a + d
        TexEnvMode::Add => ([color, C::Zero, C::Zero, C::Texc], [alpha, A::Zero, A::Zero, A::Texa]),
        // a(1 - c) + b*c, with a white environment color
        TexEnvMode::Blend => ([color, C::One, C::Texc, C::Zero], [A::Zero, alpha, A::Texa, A::Zero]),
        // b*c
        TexEnvMode::Modulate | TexEnvMode::Decal => {
            ([C::Zero, color, C::Texc, C::Zero], [A::Zero, alpha, A::Texa, A::Zero])
        }
    }
}

fn setup_texture_stage(
    state: &mut GraphicsState,
    texture: &TextureObject,
    stage: u8,
    raster: (TevColorArg, TevAlphaArg),
    channel: ChannelId,
    budget: &mut StageBudget,
    gx: &mut dyn GxBackend,
) {
    let (color_in, alpha_in) = tex_env_inputs(state.texture.env_mode, raster.0, raster.1);
    let config = TevStageConfig::default()
        .with_inputs(color_in, alpha_in)
        .with_order(Some(0), Some(0), channel);
    gx.submit(GxCommand::SetTevStage { stage, config });
    gx.submit(GxCommand::LoadTexObj {
        map: 0,
        texture: *texture,
    });
    setup_texture_gen(state, budget, gx);
}

fn plane_matrix(s: [f32; 4], t: [f32; 4]) -> Mtx {
    [s, t, [0.0, 0.0, 1.0, 0.0]]
}

/// Texture coordinate 0 generation. S and T share one generator, so the
/// mode of the first enabled axis applies to both.
fn setup_texture_gen(state: &mut GraphicsState, budget: &mut StageBudget, gx: &mut dyn GxBackend) {
    let gen_dirty = take_dirty(state, DirtyFlags::TEXTURE_GEN);
    let mode = state.texture.effective_gen_mode();
    let slot = budget.tex_mtxs;
    if matches!(mode, Some(TexGenMode::ObjectLinear | TexGenMode::EyeLinear)) {
        budget.tex_mtxs += 1;
    }

    // Eye-linear planes follow the model-view, so a matrix change also
    // needs a new texture matrix.
    let eye_moved = mode == Some(TexGenMode::EyeLinear) && state.is_dirty(DirtyFlags::MATRICES);
    if !gen_dirty && !eye_moved {
        return;
    }

    let (s, t) = (TexCoordAxis::S as usize, TexCoordAxis::T as usize);
    let identity = TexCoordGen {
        coord: 0,
        src: TexGenSrc::Tex0,
        mtx: TexMtxSource::Identity,
    };
    let generator = match mode {
        None => identity,
        Some(TexGenMode::ObjectLinear) => {
            let planes = &state.texture.object_planes;
            gx.submit(GxCommand::LoadTexMtx {
                slot,
                mtx: plane_matrix(planes[s], planes[t]),
            });
            TexCoordGen {
                coord: 0,
                src: TexGenSrc::Position,
                mtx: TexMtxSource::TexMtx(slot),
            }
        }
        Some(TexGenMode::EyeLinear) => {
            let planes = &state.texture.eye_planes;
            let mtx = matrix::concat(&plane_matrix(planes[s], planes[t]), &state.modelview);
            gx.submit(GxCommand::LoadTexMtx { slot, mtx });
            TexCoordGen {
                coord: 0,
                src: TexGenSrc::Position,
                mtx: TexMtxSource::TexMtx(slot),
            }
        }
        Some(other) => {
            ogx_warn!(state.config, "Unsupported texture coordinate generation mode {:?}", other);
            identity
        }
    };
    gx.submit(GxCommand::SetTexCoordGen(generator));
}

// ---------------------------------------------------------------------------
// Fog
// ---------------------------------------------------------------------------

/// Hardware fog registers for the current fog state and projection.
///
/// GX takes explicit near/far planes and applies start/end to every curve;
/// it has no density. Exponential curves get an end distance calibrated
/// against desktop GL output instead.
pub fn fog_params(state: &GraphicsState) -> FogParams {
    let fog = &state.fog;
    if !fog.enabled {
        return FogParams {
            fog_type: FogType::None,
            start: 0.0,
            end: 0.0,
            near: 0.0,
            far: 0.0,
            color: GxColor::from_f32(fog.color),
        };
    }

    let info = matrix::projection_info(&state.projection);
    let mut fog_type = match fog.mode {
        FogMode::Linear => FogType::PerspLinear,
        FogMode::Exp => FogType::PerspExp,
        FogMode::Exp2 => FogType::PerspExp2,
    };
    if info.kind == ProjectionKind::Orthographic {
        fog_type = fog_type.to_ortho();
    }

    let (start, end) = match fog.mode {
        FogMode::Linear => (fog.start, fog.end),
        _ if fog.density <= 0.0 => (info.near, info.far),
        FogMode::Exp2 => (info.near, 2.0 / fog.density),
        FogMode::Exp => (info.near, 5.0 / fog.density),
    };

    FogParams {
        fog_type,
        start,
        end,
        near: info.near,
        far: info.far,
        color: GxColor::from_f32(fog.color),
    }
}
