//! Decoding texture files into RGBA8 pixels
//!
//! Scenes never decode images themselves: the builder asks an [`ImageDecoder`]
//! for every referenced file. [`ImageCrateDecoder`] is the default and relies on
//! the `image` crate; tests substitute in-memory decoders.

use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ImageDecodeError {
    #[error("texture file {0} does not exist")]
    NotFound(PathBuf),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("decoded image is {width}x{height} but holds {len} bytes")]
    BadDimensions { width: u32, height: u32, len: usize },
}

/// Tightly packed RGBA8 pixels, rows top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageDecodeError> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize * 4 {
            return Err(ImageDecodeError::BadDimensions {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 1x1 image of a single colour
    pub fn solid_color(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }
}

pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError>;
}

/// Decodes any format the `image` crate understands
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, ImageDecodeError> {
        if !path.exists() {
            return Err(ImageDecodeError::NotFound(path.to_path_buf()));
        }
        let rgba = image::open(path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        DecodedImage::new(width, height, rgba.into_raw())
    }
}
