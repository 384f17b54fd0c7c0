// Light allocation.
//
// Each logical light can need up to three hardware light objects: one each
// for its ambient, diffuse and specular contributions, since GX lights carry
// a single color and the two color channels accumulate them separately.
// Hardware objects are handed out first come, first served: lights in index
// order, and ambient, diffuse, specular within a light.

use crate::config::{Config, LogFeature};
use crate::gx::lighting::LightObj;
use crate::gx::{GxBackend, GxColor, GxCommand, MAX_GX_LIGHTS};
use crate::matrix;
use crate::state::lighting::{is_black, LightMasks, LightingState, UNALLOCATED};
use crate::{ogx_debug, ogx_warn};

/// Assign hardware light objects to the enabled lights' contributions.
///
/// Returns the number of contributions that did not fit in the pool.
pub fn allocate(lighting: &mut LightingState, config: &Config) -> usize {
    let global_ambient_off = is_black(&lighting.global_ambient);
    let material_specular_off = is_black(&lighting.material.specular);
    let shininess = lighting.material.shininess;

    let mut needed = 0usize;
    let mut next_slot = |wanted: bool| -> i8 {
        if !wanted {
            return UNALLOCATED;
        }
        let slot = needed;
        needed += 1;
        if slot < MAX_GX_LIGHTS {
            slot as i8
        } else {
            UNALLOCATED
        }
    };

    for light in lighting.lights.iter_mut() {
        light.clear_allocation();
        if !light.enabled {
            continue;
        }
        light.gx_ambient = next_slot(!is_black(&light.ambient) && !global_ambient_off);
        light.gx_diffuse = next_slot(!is_black(&light.diffuse));
        // GX only does specular highlights for directional lights
        light.gx_specular = next_slot(
            !is_black(&light.specular) && !material_specular_off && shininess > 0.0 && light.is_directional(),
        );
    }

    let excluded = needed.saturating_sub(MAX_GX_LIGHTS);
    if excluded > 0 {
        ogx_warn!(config, "Excluded {} lights since max is {}", excluded, MAX_GX_LIGHTS);
    }
    excluded
}

fn slot(index: i8) -> Option<u8> {
    u8::try_from(index).ok()
}

/// Allocate hardware lights, load their light objects and return the
/// per-contribution masks.
pub fn prepare_lighting(lighting: &mut LightingState, config: &Config, gx: &mut dyn GxBackend) -> LightMasks {
    allocate(lighting, config);

    let shininess = lighting.material.shininess;
    let mut masks = LightMasks::default();

    for light in lighting.lights.iter().filter(|l| l.enabled) {
        let position = [light.position[0], light.position[1], light.position[2]];
        let ambient = slot(light.gx_ambient);
        let diffuse = slot(light.gx_diffuse);
        let specular = slot(light.gx_specular);

        let mut ambient_obj = LightObj::new(GxColor::from_f32(light.ambient), position);
        let mut diffuse_obj = LightObj::new(GxColor::from_f32(light.diffuse), position);
        let mut specular_obj = None;

        if light.is_directional() {
            // A very distant point light without attenuation.
            ambient_obj.set_attn([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
            diffuse_obj.set_attn([1.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
            if specular.is_some() {
                let mut obj = LightObj::new(GxColor::from_f32(light.specular), position);
                obj.set_specular_dir(matrix::normalize([-position[0], -position[1], -position[2]]));
                obj.set_shininess(shininess);
                specular_obj = Some(obj);
            }
        } else {
            // Spot cutoff and exponent are not modeled; spots light as plain point lights.
            for obj in [&mut ambient_obj, &mut diffuse_obj] {
                obj.set_attn([1.0, 0.0, 0.0], light.attenuation);
                obj.direction = [0.0, -1.0, 0.0];
            }
        }

        if let Some(index) = ambient {
            gx.submit(GxCommand::LoadLightObj {
                slot: index,
                light: ambient_obj,
            });
            masks.ambient |= 1 << index;
        }
        if let Some(index) = diffuse {
            gx.submit(GxCommand::LoadLightObj {
                slot: index,
                light: diffuse_obj,
            });
            masks.diffuse |= 1 << index;
        }
        if let (Some(index), Some(obj)) = (specular, specular_obj) {
            gx.submit(GxCommand::LoadLightObj { slot: index, light: obj });
            masks.specular |= 1 << index;
        }
    }

    ogx_debug!(
        config,
        LogFeature::LIGHTING,
        "Ambient mask {:#04x}, diffuse {:#04x}, specular {:#04x}",
        masks.ambient,
        masks.diffuse,
        masks.specular
    );
    lighting.masks = masks;
    masks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gx::recorder::GxRecorder;

    fn lit(count: usize) -> LightingState {
        let mut lighting = LightingState::default();
        for light in lighting.lights.iter_mut().take(count) {
            light.enabled = true;
            light.ambient = [0.1, 0.1, 0.1, 1.0];
            light.diffuse = [1.0; 4];
            light.specular = [1.0; 4];
        }
        lighting.material.specular = [1.0; 4];
        lighting.material.shininess = 8.0;
        lighting
    }

    #[test]
    fn default_light_zero_gets_only_diffuse() {
        let mut lighting = LightingState::default();
        lighting.lights[0].enabled = true;
        assert_eq!(allocate(&mut lighting, &Config::default()), 0);
        let light = &lighting.lights[0];
        assert_eq!(light.gx_ambient, UNALLOCATED);
        assert_eq!(light.gx_diffuse, 0);
        // default material specular is black
        assert_eq!(light.gx_specular, UNALLOCATED);
    }

    #[test]
    fn ambient_needs_global_ambient() {
        let mut lighting = LightingState::default();
        lighting.lights[0].enabled = true;
        lighting.lights[0].ambient = [0.5, 0.5, 0.5, 1.0];

        allocate(&mut lighting, &Config::default());
        assert_eq!(lighting.lights[0].gx_ambient, 0);
        assert_eq!(lighting.lights[0].gx_diffuse, 1);

        lighting.global_ambient = [0.0, 0.0, 0.0, 1.0];
        allocate(&mut lighting, &Config::default());
        assert_eq!(lighting.lights[0].gx_ambient, UNALLOCATED);
        assert_eq!(lighting.lights[0].gx_diffuse, 0);
    }

    #[test]
    fn greedy_order_and_overflow() {
        let mut lighting = lit(4);
        // 4 lights x 3 contributions = 12 > 8
        assert_eq!(allocate(&mut lighting, &Config::default()), 4);
        let slots: Vec<_> = lighting
            .lights
            .iter()
            .take(4)
            .flat_map(|l| [l.gx_ambient, l.gx_diffuse, l.gx_specular])
            .collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5, 6, 7, -1, -1, -1, -1]);
    }

    #[test]
    fn point_lights_never_get_specular() {
        let mut lighting = lit(1);
        lighting.lights[0].position = [1.0, 2.0, 3.0, 1.0];
        allocate(&mut lighting, &Config::default());
        assert_eq!(lighting.lights[0].gx_specular, UNALLOCATED);
    }

    #[test]
    fn disabled_lights_keep_nothing_allocated() {
        let mut lighting = lit(2);
        allocate(&mut lighting, &Config::default());
        assert_eq!(lighting.lights[0].gx_diffuse, 1);

        lighting.lights[0].enabled = false;
        allocate(&mut lighting, &Config::default());
        assert_eq!(lighting.lights[0].gx_diffuse, UNALLOCATED);
        assert_eq!(lighting.lights[1].gx_ambient, 0);
    }

    #[test]
    fn prepare_builds_masks_and_loads_objects() {
        let mut lighting = lit(1);
        let mut gx = GxRecorder::new();
        let masks = prepare_lighting(&mut lighting, &Config::default(), &mut gx);
        assert_eq!(masks, LightMasks { ambient: 0b001, diffuse: 0b010, specular: 0b100 });
        assert_eq!(lighting.masks, masks);

        let diffuse = gx.regs.lights[1].expect("diffuse object loaded");
        assert_eq!(diffuse.color, GxColor::WHITE);
        assert_eq!(diffuse.attn_a, [1.0, 0.0, 0.0]);
        assert_eq!(diffuse.attn_k, [1.0, 0.0, 0.0]);

        let specular = gx.regs.lights[2].expect("specular object loaded");
        assert_eq!(specular.attn_a, [0.0, 0.0, 1.0]);
        assert_eq!(specular.attn_k, [4.0, 0.0, -3.0]);
    }

    #[test]
    fn point_light_uses_distance_attenuation() {
        let mut lighting = LightingState::default();
        lighting.lights[0].enabled = true;
        lighting.lights[0].position = [0.0, 0.0, 5.0, 1.0];
        lighting.lights[0].attenuation = [1.0, 0.5, 0.25];
        let mut gx = GxRecorder::new();
        prepare_lighting(&mut lighting, &Config::default(), &mut gx);

        let diffuse = gx.regs.lights[0].expect("diffuse object loaded");
        assert_eq!(diffuse.attn_k, [1.0, 0.5, 0.25]);
        assert_eq!(diffuse.direction, [0.0, -1.0, 0.0]);
        assert_eq!(diffuse.position, [0.0, 0.0, 5.0]);
    }
}
