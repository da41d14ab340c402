//! Tessera CLI library - argument helpers shared by the `tessera` binary.

pub mod emit;
pub mod input;
