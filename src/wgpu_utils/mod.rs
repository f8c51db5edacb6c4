// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Thin builders and typed buffers shared by the material tables, the bounds
//! pass and the scene renderer.

pub mod binding_builder;
pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc};
pub use uniform_buffer::{ArrayBuffer, UniformBuffer};
