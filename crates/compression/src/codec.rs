//! The raster primitives the pipeline is built on.
//!
//! The pipeline never touches pixels itself, it only asks a [`RasterCodec`] to decode,
//! resample and encode surfaces, and to say which formats it can produce at all.

use image::{DynamicImage, GenericImageView, ImageResult};

use crate::{
    read_image::{read_image, ImageReadError, Limits},
    ImageFormat,
};

pub trait RasterCodec {
    /// Decoded, in-memory raster
    type Surface;

    fn decode(&self, buffer: &[u8]) -> Result<Self::Surface, ImageReadError>;

    fn dimensions(&self, surface: &Self::Surface) -> (u32, u32);

    /// Resamples with a smoothing filter, never nearest-neighbor
    fn resample(&self, surface: &Self::Surface, width: u32, height: u32) -> Self::Surface;

    /// Encodes at `quality` in `(0, 1]`
    fn encode(&self, surface: &Self::Surface, format: ImageFormat, quality: f32) -> ImageResult<Vec<u8>>;

    /// Capability query, evaluated before a format is attempted
    fn supports(&self, format: ImageFormat) -> bool {
        let _ = format;
        true
    }
}

/// Default codec, backed by the `image`, `png`, `jpeg-decoder`, mozjpeg, oxipng and libwebp crates
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCodec {
    pub limits: Limits,
}

impl ImageCodec {
    pub const fn new(limits: Limits) -> Self {
        ImageCodec { limits }
    }
}

impl RasterCodec for ImageCodec {
    type Surface = DynamicImage;

    fn decode(&self, buffer: &[u8]) -> Result<DynamicImage, ImageReadError> {
        read_image(buffer, &self.limits)
    }

    fn dimensions(&self, surface: &DynamicImage) -> (u32, u32) {
        surface.dimensions()
    }

    fn resample(&self, surface: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        crate::resample::resample(surface, width, height)
    }

    fn encode(&self, surface: &DynamicImage, format: ImageFormat, quality: f32) -> ImageResult<Vec<u8>> {
        crate::encode::encode(surface, format, quality)
    }

    fn supports(&self, format: ImageFormat) -> bool {
        match format {
            ImageFormat::Webp => crate::encode::webp::is_supported(),
            ImageFormat::Jpeg | ImageFormat::Png => true,
        }
    }
}
