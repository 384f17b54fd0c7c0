//! Test Utilities
//!
//! Helpers shared by the integration tests: recording contexts, common
//! geometry and float comparisons.

#![allow(dead_code)]

use std::rc::Rc;

use ogx_core::{ClientArray, ClientArrayKind, Config, Context, GxRecorder};

/// A context recording into a fresh [`GxRecorder`], with diagnostics off.
pub fn recording_context() -> Context<GxRecorder> {
    Context::with_config(GxRecorder::new(), Config::default())
}

/// Positions of a unit quad in the z = 0 plane, counter-clockwise.
pub const UNIT_QUAD: [f32; 12] = [
    -1.0, -1.0, 0.0, //
    1.0, -1.0, 0.0, //
    1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0,
];

/// Bind `positions` (xyz triples) as the enabled vertex array.
pub fn bind_positions(ctx: &mut Context<GxRecorder>, positions: &[f32]) {
    ctx.vertex_pointer(Rc::new(ClientArray::from_f32(positions, 3)));
    ctx.enable_client_state(ClientArrayKind::Vertex);
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-4 * b.abs().max(1.0)
}

/// Assert two column-major matrices match element-wise.
pub fn assert_matrix_eq(actual: &[f32; 16], expected: &[f32; 16]) {
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(approx_eq(*a, *e), "element {}: {} != {}\n{:?}", i, a, e, actual);
    }
}

/// Column-major identity.
pub const GL_IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];
