//! Scene replay for `ogx-core`: JSON call scripts, built-in scenes and the
//! handlers behind the `ogx-trace` binary.

pub mod commands;
pub mod scene;
pub mod script;
