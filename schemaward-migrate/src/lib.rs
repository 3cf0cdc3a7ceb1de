//! Schemaward Migration Library
//!
//! Helpers behind the `migrate` CLI tool (main.rs).

pub mod generate;
pub mod render;
