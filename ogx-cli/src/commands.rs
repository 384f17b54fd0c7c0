// CLI command handlers
use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use ogx_core::{Config, Context, GxRecorder};

use crate::scene::{builtin, BUILTIN_SCENES};
use crate::script::{ReplayReport, Scene};

/// Output of `run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Counts and final register highlights.
    #[default]
    Summary,
    /// Full command log and recorded draws.
    Json,
}

pub fn list_scenes() -> Result<()> {
    for name in BUILTIN_SCENES {
        let scene = builtin(name).with_context(|| format!("Missing built-in scene {}", name))?;
        println!("{:<14} {}", name, scene.description);
    }
    Ok(())
}

/// A built-in scene name, or a path to a scene JSON file.
pub fn load_scene(source: &str) -> Result<Scene> {
    if let Some(scene) = builtin(source) {
        return Ok(scene);
    }
    let text = fs::read_to_string(source).with_context(|| format!("Failed to read scene file: {}", source))?;
    Scene::from_json(&text).with_context(|| format!("Invalid scene file: {}", source))
}

/// Replay `scene` against a recording backend.
pub fn replay(scene: &Scene, config: Config) -> Result<(ReplayReport, GxRecorder)> {
    let mut ctx = Context::with_config(GxRecorder::new(), config);
    let report = scene.replay(&mut ctx)?;
    Ok((report, ctx.into_backend()))
}

pub fn render_summary(scene: &Scene, report: &ReplayReport, gx: &GxRecorder) -> String {
    let regs = &gx.regs;
    let mut out = String::new();
    let name = if scene.name.is_empty() { "<unnamed>" } else { scene.name.as_str() };
    out.push_str(&format!("Scene: {}\n", name));
    out.push_str(&format!("  Calls replayed: {}\n", report.calls));
    out.push_str(&format!("  Draws: {}\n", report.draws));
    out.push_str(&format!("  GX commands: {}\n", gx.command_count()));
    out.push_str(&format!("  Register writes: {}\n", gx.register_writes().count()));
    out.push_str(&format!("  Channels: {}, TEV stages: {}, tex gens: {}\n", regs.num_chans, regs.num_tev_stages, regs.num_tex_gens));
    for (i, draw) in gx.draws().iter().enumerate() {
        out.push_str(&format!("  Draw {}: {:?} with {} vertices\n", i, draw.primitive, draw.vertex_count()));
    }
    for (call, code) in &report.errors {
        out.push_str(&format!("  Error at call {}: 0x{:04X}\n", call, code));
    }
    match report.final_error {
        Some(code) => out.push_str(&format!("  Final error: 0x{:04X}\n", code)),
        None => out.push_str("  Final error: none\n"),
    }
    out
}

pub fn run_scene(source: &str, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let scene = load_scene(source)?;
    log::info!("Replaying {} calls", scene.calls.len());

    let config = scene.config.unwrap_or_else(Config::from_env);
    let (report, gx) = replay(&scene, config)?;
    let text = match format {
        OutputFormat::Summary => render_summary(&scene, &report, &gx),
        OutputFormat::Json => gx.trace_json().context("Failed to serialize trace")?,
    };

    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write output: {}", path.display()))?;
            println!("Trace written to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}
