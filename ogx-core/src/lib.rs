//! OpenGL 1.x fixed-function state tracking on top of the GX pipeline.
//!
//! Applications drive a [`Context`] with the familiar calls (`enable`,
//! `translate`, `light`, `begin`/`end`, `draw_arrays`, ...). The context keeps
//! the GL-visible state, marks which hardware aspects went stale, and at draw
//! time configures color channels and TEV stages, pushes the dirty registers
//! and streams the vertices to a [`gx::GxBackend`].
//!
//! [`gx::recorder::GxRecorder`] is a backend that keeps a shadow register file
//! and a command log, which is what the tests and the `ogx-trace` tool use.

pub mod apply;
pub mod config;
pub mod context;
pub mod draw;
pub mod emulation;
pub mod error;
pub mod gx;
pub mod lights;
pub mod matrix;
pub mod stages;
pub mod state;
pub mod texture;

pub use config::{Config, LogFeature};
pub use context::params::{
    Capability, ClearMask, FogParam, GlBlendFactor, IntegerQuery, InterleavedFormat, MatrixTarget, TexGenPlane,
};
pub use context::Context;
pub use draw::{Indices, PrimitiveMode};
pub use emulation::{ClipPlaneEmulation, StageBudget, StencilEmulation};
pub use error::{GlError, GlResult};
pub use gx::recorder::GxRecorder;
pub use gx::state::CompareFunction;
pub use gx::{GxBackend, GxColor, GxCommand};
pub use state::arrays::{ArrayReader, ClientArray, ClientArrayKind, ElementType};
pub use state::lighting::{ColorMaterialMode, LightParam, MaterialParam};
pub use state::{CullFace, FogMode, FrontFace, MatrixMode, TexCoordAxis, TexEnvMode, TexGenMode};
pub use texture::{TexFormat, TextureObject, TextureTable, WrapMode};
