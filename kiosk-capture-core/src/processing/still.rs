//! Frame-to-JPEG rendering with orientation normalization.

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, ExtendedColorType, RgbaImage};

use crate::models::artifacts::VideoFrame;
use crate::models::error::CaptureError;
use crate::models::profile::Orientation;
use crate::models::state::FrameDimensions;

/// Rotation applied to a frame before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Clockwise90,
    CounterClockwise90,
}

/// An encoded still and its output dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStill {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Rotation needed to bring `source` into `target` orientation.
pub fn rotation_for(source: FrameDimensions, target: Option<Orientation>) -> Rotation {
    match (source.orientation(), target) {
        (Orientation::Landscape, Some(Orientation::Portrait)) => Rotation::Clockwise90,
        // Square frames report portrait and are never rotated.
        (Orientation::Portrait, Some(Orientation::Landscape)) if source.width != source.height => {
            Rotation::CounterClockwise90
        }
        _ => Rotation::None,
    }
}

/// Copy `frame` into a pixel buffer sized to the source and rotate it.
pub fn render_frame(frame: VideoFrame, target: Option<Orientation>) -> Result<RgbaImage, CaptureError> {
    let dims = FrameDimensions::new(frame.width, frame.height);
    let buffer = RgbaImage::from_raw(frame.width, frame.height, frame.pixels).ok_or_else(|| {
        CaptureError::EncodingFailed(format!(
            "frame buffer does not match {}x{} RGBA",
            dims.width, dims.height
        ))
    })?;

    Ok(match rotation_for(dims, target) {
        Rotation::None => buffer,
        Rotation::Clockwise90 => imageops::rotate90(&buffer),
        Rotation::CounterClockwise90 => imageops::rotate270(&buffer),
    })
}

/// Encode an RGBA buffer as JPEG at `quality` (1-100).
pub fn encode_jpeg(image: RgbaImage, quality: u8) -> Result<EncodedStill, CaptureError> {
    let (width, height) = image.dimensions();
    let rgb = DynamicImage::ImageRgba8(image).to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .map_err(|e| CaptureError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    Ok(EncodedStill { jpeg, width, height })
}

/// Render and encode one grabbed frame.
pub fn render_still(frame: VideoFrame, target: Option<Orientation>, quality: u8) -> Result<EncodedStill, CaptureError> {
    encode_jpeg(render_frame(frame, target)?, quality)
}
