// Built-in scenes.
use ogx_core::{
    Capability, ClearMask, ClientArrayKind, ColorMaterialMode, FogMode, FogParam, LightParam, MatrixMode,
    PrimitiveMode, TextureObject,
};

use crate::script::{Call, Scene, TextureDef};

/// Names accepted by `ogx-trace run`.
pub const BUILTIN_SCENES: &[&str] = &["clear", "unlit-quad", "lit-triangle", "line-loop", "textured-fog"];

pub fn builtin(name: &str) -> Option<Scene> {
    let scene = match name {
        "clear" => clear(),
        "unlit-quad" => unlit_quad(),
        "lit-triangle" => lit_triangle(),
        "line-loop" => line_loop(),
        "textured-fog" => textured_fog(),
        _ => return None,
    };
    Some(scene)
}

fn clear() -> Scene {
    Scene {
        name: "clear".into(),
        description: "Color and depth clear to dark blue".into(),
        calls: vec![
            Call::ClearColor { r: 0.0, g: 0.0, b: 0.25, a: 1.0 },
            Call::ClearDepth { depth: 1.0 },
            Call::Clear { mask: ClearMask::COLOR | ClearMask::DEPTH },
        ],
        ..Scene::default()
    }
}

fn perspective() -> Vec<Call> {
    vec![
        Call::Viewport { x: 0, y: 0, width: 640, height: 480 },
        Call::MatrixMode { mode: MatrixMode::Projection },
        Call::LoadIdentity,
        Call::Frustum { left: -1.0, right: 1.0, bottom: -0.75, top: 0.75, near: 1.0, far: 100.0 },
        Call::MatrixMode { mode: MatrixMode::Modelview },
        Call::LoadIdentity,
        Call::Translate { x: 0.0, y: 0.0, z: -5.0 },
    ]
}

fn unlit_quad() -> Scene {
    let mut calls = perspective();
    calls.push(Call::Enable { cap: Capability::DepthTest });
    calls.push(Call::Begin { mode: PrimitiveMode::Quads });
    calls.push(Call::Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 });
    for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        calls.push(Call::Vertex { x, y, z: 0.0 });
    }
    calls.push(Call::End);
    calls.push(Call::Finish);

    Scene {
        name: "unlit-quad".into(),
        description: "White quad through immediate mode".into(),
        calls,
        ..Scene::default()
    }
}

fn lit_triangle() -> Scene {
    let mut calls = perspective();
    calls.extend([
        Call::Enable { cap: Capability::Lighting },
        Call::Enable { cap: Capability::Light(0) },
        Call::Light { index: 0, param: LightParam::Position([0.0, 0.0, 1.0, 0.0]) },
        Call::Light { index: 0, param: LightParam::Ambient([0.2, 0.2, 0.2, 1.0]) },
        Call::Enable { cap: Capability::ColorMaterial },
        Call::ColorMaterial { mode: ColorMaterialMode::AmbientAndDiffuse },
        Call::Array { kind: ClientArrayKind::Vertex, components: 3, data: vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0] },
        Call::Array { kind: ClientArrayKind::Normal, components: 3, data: [0.0f32, 0.0, 1.0].repeat(3) },
        Call::Array { kind: ClientArrayKind::Color, components: 3, data: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] },
        Call::EnableClientState { kind: ClientArrayKind::Vertex },
        Call::EnableClientState { kind: ClientArrayKind::Normal },
        Call::EnableClientState { kind: ClientArrayKind::Color },
        Call::DrawArrays { mode: PrimitiveMode::Triangles, first: 0, count: 3 },
        Call::Finish,
    ]);

    Scene {
        name: "lit-triangle".into(),
        description: "Vertex-colored triangle under one directional light".into(),
        calls,
        ..Scene::default()
    }
}

fn line_loop() -> Scene {
    let mut calls = perspective();
    calls.extend([
        Call::LineWidth { width: 2.0 },
        Call::Array {
            kind: ClientArrayKind::Vertex,
            components: 2,
            data: vec![-1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, 1.0],
        },
        Call::EnableClientState { kind: ClientArrayKind::Vertex },
        Call::DrawElements { mode: PrimitiveMode::LineLoop, indices: vec![0, 1, 2, 3] },
        Call::Finish,
    ]);

    Scene {
        name: "line-loop".into(),
        description: "Indexed line loop closing on its first vertex".into(),
        calls,
        ..Scene::default()
    }
}

fn textured_fog() -> Scene {
    let mut calls = perspective();
    calls.extend([
        Call::Enable { cap: Capability::Texture2D },
        Call::BindTexture { handle: 1 },
        Call::Enable { cap: Capability::Fog },
        Call::Fog { param: FogParam::Mode(FogMode::Linear) },
        Call::Fog { param: FogParam::Start(2.0) },
        Call::Fog { param: FogParam::End(20.0) },
        Call::Fog { param: FogParam::Color([0.5, 0.5, 0.5, 1.0]) },
        Call::Begin { mode: PrimitiveMode::TriangleStrip },
    ]);
    for (s, t, x, y) in [(0.0, 0.0, -1.0, -1.0), (1.0, 0.0, 1.0, -1.0), (0.0, 1.0, -1.0, 1.0), (1.0, 1.0, 1.0, 1.0)] {
        calls.push(Call::TexCoord { s, t });
        calls.push(Call::Vertex { x, y, z: 0.0 });
    }
    calls.push(Call::End);
    calls.push(Call::Finish);

    Scene {
        name: "textured-fog".into(),
        description: "Textured strip with linear fog".into(),
        textures: vec![TextureDef {
            handle: 1,
            texture: TextureObject::new(100, 64, 64),
        }],
        calls,
        ..Scene::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scene_exists() {
        for name in BUILTIN_SCENES {
            let scene = builtin(name).expect("listed scene");
            assert_eq!(scene.name, *name);
        }
        assert!(builtin("missing").is_none());
    }

    #[test]
    fn scenes_survive_json() {
        let scene = lit_triangle();
        let text = serde_json::to_string(&scene).expect("serializable");
        assert_eq!(Scene::from_json(&text).expect("parses back"), scene);
    }
}
