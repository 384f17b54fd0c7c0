// Recording GX device.
//
// `GxRecorder` stands in for the hardware FIFO: every command is appended to
// a log, register writes are mirrored into `GxRegisters`, and vertex stream
// commands are regrouped into `DrawCall`s. The command log can be dumped as
// JSON for offline inspection.

use serde::Serialize;

use super::state::GxRegisters;
use super::vertex::{DrawCall, VertexAccumulator};
use super::{GxBackend, GxCommand};

/// Command-log backend with a shadow register file.
#[derive(Debug, Default)]
pub struct GxRecorder {
    /// Last value written to each register.
    pub regs: GxRegisters,
    commands: Vec<GxCommand>,
    draws: Vec<DrawCall>,
    accumulator: VertexAccumulator,
    draw_done_calls: usize,
}

#[derive(Serialize)]
struct Trace<'a> {
    commands: &'a [GxCommand],
    draws: &'a [DrawCall],
}

impl GxRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command submitted so far, in order.
    pub fn commands(&self) -> &[GxCommand] {
        &self.commands
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Register writes only, excluding vertex stream commands.
    pub fn register_writes(&self) -> impl Iterator<Item = &GxCommand> {
        self.commands.iter().filter(|c| !c.is_vertex_data())
    }

    /// Completed Begin/End blocks.
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn last_draw(&self) -> Option<&DrawCall> {
        self.draws.last()
    }

    pub fn draw_done_calls(&self) -> usize {
        self.draw_done_calls
    }

    /// Forget the logged commands and draws, keeping register state.
    pub fn clear_log(&mut self) {
        self.commands.clear();
        self.draws.clear();
    }

    /// Serialize the command log and draws.
    pub fn trace_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Trace {
            commands: &self.commands,
            draws: &self.draws,
        })
    }
}

impl GxBackend for GxRecorder {
    fn submit(&mut self, command: GxCommand) {
        match command {
            GxCommand::Begin { primitive, count } => self.accumulator.begin(primitive, count),
            GxCommand::Position3f32(p) => self.accumulator.position(p),
            GxCommand::Position2u16([x, y]) => self.accumulator.position([x as f32, y as f32, 0.0]),
            GxCommand::Normal3f32(n) => self.accumulator.normal(n),
            GxCommand::Color4u8(c) => self.accumulator.color(c),
            GxCommand::TexCoord2f32(st) => self.accumulator.tex_coord(st),
            GxCommand::TexCoord2u8([s, t]) => self.accumulator.tex_coord([s as f32, t as f32]),
            GxCommand::End => {
                if let Some(draw) = self.accumulator.end() {
                    self.draws.push(draw);
                }
            }
            ref register => self.regs.apply(register),
        }
        self.commands.push(command);
    }

    fn draw_done(&mut self) {
        self.draw_done_calls += 1;
    }
}
