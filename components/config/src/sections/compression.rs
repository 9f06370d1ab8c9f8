use compression::{
    options::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_SIZE_BYTES, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY},
    CompressionOptions, ImageFormat, Limits,
};

use crate::util;

const DEFAULT_MAX_PIXELS: u64 = 8192 * 8192;

crate::section! {
    #[serde(default)]
    pub struct Compression {
        /// Maximum output width in pixels
        pub max_width: u32 = DEFAULT_MAX_WIDTH => "COMPRESS_MAX_WIDTH" | util::parse[DEFAULT_MAX_WIDTH],

        /// Maximum output height in pixels
        pub max_height: u32 = DEFAULT_MAX_HEIGHT => "COMPRESS_MAX_HEIGHT" | util::parse[DEFAULT_MAX_HEIGHT],

        /// Target size of the encoded image, as a byte count or a string like `"100 KiB"`
        #[serde(with = "util::bytes")]
        pub max_size: u64 = DEFAULT_MAX_SIZE_BYTES => "COMPRESS_MAX_SIZE" | util::parse_bytes[DEFAULT_MAX_SIZE_BYTES],

        /// Initial encoder quality, in `(0, 1]`
        pub quality: f32 = DEFAULT_QUALITY => "COMPRESS_QUALITY" | util::parse[DEFAULT_QUALITY],

        /// Preferred output format, one of `webp`, `jpeg` or `png`
        pub format: ImageFormat = ImageFormat::Webp => "COMPRESS_FORMAT" | util::parse[ImageFormat::Webp],

        /// Images with more pixels than this are rejected before decoding
        pub max_pixels: u64 = DEFAULT_MAX_PIXELS => "COMPRESS_MAX_PIXELS" | util::parse[DEFAULT_MAX_PIXELS],
    }

    impl Extra {
        fn configure(&mut self) {
            if !(self.quality > 0.0 && self.quality <= 1.0) {
                tracing::warn!("Invalid compression quality {}, using {}", self.quality, DEFAULT_QUALITY);
                self.quality = DEFAULT_QUALITY;
            }

            if self.max_width == 0 || self.max_height == 0 {
                tracing::warn!("Maximum dimensions must be non-zero, using {DEFAULT_MAX_WIDTH}x{DEFAULT_MAX_HEIGHT}");
                self.max_width = DEFAULT_MAX_WIDTH;
                self.max_height = DEFAULT_MAX_HEIGHT;
            }

            if self.max_size == 0 {
                tracing::warn!("Maximum size must be non-zero, using {DEFAULT_MAX_SIZE_BYTES} bytes");
                self.max_size = DEFAULT_MAX_SIZE_BYTES;
            }

            if self.max_pixels == 0 {
                self.max_pixels = DEFAULT_MAX_PIXELS;
            }
        }
    }
}

impl Compression {
    pub fn options(&self) -> CompressionOptions {
        CompressionOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            max_size_bytes: self.max_size,
            quality: self.quality,
            preferred_format: self.format,
        }
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_pixels: self.max_pixels,
        }
    }
}
