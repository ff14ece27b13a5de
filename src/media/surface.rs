// SPDX-License-Identifier: GPL-3.0-only

//! Decoded frames and the 2D drawing surface
//!
//! A [`Surface`] is the pixel target frames are drawn into before being
//! encoded as JPEG. One surface may be reused across sequential extractions;
//! it is resized on each draw.

use crate::errors::ExtractError;
use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use std::sync::Arc;

/// A decoded RGBA frame
#[derive(Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row (at least `width * 4`)
    pub stride: u32,
    pub data: Arc<[u8]>,
}

impl VideoFrame {
    /// Build a tightly packed frame from raw RGBA bytes
    pub fn from_rgba(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            data: data.into(),
        }
    }

    /// Build a frame filled with one color
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data: Vec<u8> = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self::from_rgba(width, height, data)
    }

    /// Copy into an image buffer, dropping any row padding
    pub fn to_image(&self) -> Option<RgbaImage> {
        let row_bytes = (self.width * 4) as usize;
        let stride = self.stride as usize;
        if stride < row_bytes || self.data.len() < stride * self.height.saturating_sub(1) as usize + row_bytes {
            return None;
        }
        if stride == row_bytes {
            let len = row_bytes * self.height as usize;
            return RgbaImage::from_raw(self.width, self.height, self.data[..len].to_vec());
        }
        let mut packed = Vec::with_capacity(row_bytes * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            packed.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        RgbaImage::from_raw(self.width, self.height, packed)
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VideoFrame({}x{}, {} bytes)", self.width, self.height, self.data.len())
    }
}

/// Reusable 2D pixel surface
#[derive(Debug, Default)]
pub struct Surface {
    canvas: Option<RgbaImage>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current surface size, if anything has been drawn
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.canvas.as_ref().map(|c| c.dimensions())
    }

    /// Pixel at a position of the last drawn frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let canvas = self.canvas.as_ref()?;
        if x < canvas.width() && y < canvas.height() {
            Some(canvas.get_pixel(x, y).0)
        } else {
            None
        }
    }

    /// Draw a frame scaled to `width × height`, replacing previous contents
    pub fn draw(&mut self, frame: &VideoFrame, width: u32, height: u32) -> Result<(), ExtractError> {
        let width = width.max(1);
        let height = height.max(1);
        let source = frame.to_image().ok_or_else(|| {
            ExtractError::Decoder(format!(
                "frame buffer too small for {}x{} (stride {})",
                frame.width, frame.height, frame.stride
            ))
        })?;

        let canvas = if source.dimensions() == (width, height) {
            source
        } else {
            image::imageops::resize(&source, width, height, FilterType::Triangle)
        };
        self.canvas = Some(canvas);
        Ok(())
    }

    /// Fill the surface with one color at the given size
    pub fn clear(&mut self, width: u32, height: u32) {
        self.canvas = Some(RgbaImage::from_pixel(width.max(1), height.max(1), Rgba([0, 0, 0, 255])));
    }

    /// Encode the surface contents as JPEG
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, ExtractError> {
        let canvas = self
            .canvas
            .as_ref()
            .ok_or_else(|| ExtractError::Encoding("surface is empty".into()))?;
        encode_jpeg(canvas, quality)
    }
}

/// Encode an RGBA image as JPEG (alpha is dropped)
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, ExtractError> {
    let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);

    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.clamp(1, 100));
    encoder.encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ExtendedColorType::Rgb8,
    )?;

    Ok(buffer)
}
