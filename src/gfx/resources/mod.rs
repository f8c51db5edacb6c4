// src/gfx/resources/mod.rs
//! Scene resources
//!
//! Texture indexing, image decoding, materials and the GPU textures behind them.

pub mod image_decoder;
pub mod material;
pub mod texture_resource;
pub mod texture_table;

// Re-export main types
pub use image_decoder::{DecodedImage, ImageCrateDecoder, ImageDecodeError, ImageDecoder};
pub use material::{Material, MaterialConstants};
pub use texture_resource::{ImageTexture, TextureResource};
pub use texture_table::{TextureSlot, TextureTable};
