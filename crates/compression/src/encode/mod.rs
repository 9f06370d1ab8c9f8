use image::{DynamicImage, ImageResult};

use crate::ImageFormat;

pub mod jpeg;
pub mod png;
pub mod webp;

/// Maps a `(0, 1]` quality onto the `1..=100` scale the encoders use
pub fn encoder_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

pub fn encode(image: &DynamicImage, format: ImageFormat, quality: f32) -> ImageResult<Vec<u8>> {
    let quality = encoder_quality(quality);

    match format {
        ImageFormat::Jpeg => self::jpeg::encode_jpeg(image, quality),
        ImageFormat::Png => self::png::encode_png(image, quality).map_err(Into::into),
        ImageFormat::Webp => self::webp::encode_webp(image, quality),
    }
}
