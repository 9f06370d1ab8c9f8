use crate::{pipeline::CompressionError, ImageFormat};

pub const DEFAULT_MAX_WIDTH: u32 = 500;
pub const DEFAULT_MAX_HEIGHT: u32 = 500;
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024; // 100 KiB
pub const DEFAULT_QUALITY: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompressionOptions {
    /// Upper bound on output width, in pixels
    pub max_width: u32,
    /// Upper bound on output height, in pixels
    pub max_height: u32,
    /// Encoded-size ceiling the pipeline tries to get under
    pub max_size_bytes: u64,
    /// Initial encoder quality, in `(0, 1]`
    pub quality: f32,
    /// First format attempted
    pub preferred_format: ImageFormat,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        CompressionOptions {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            quality: DEFAULT_QUALITY,
            preferred_format: ImageFormat::Webp,
        }
    }
}

impl CompressionOptions {
    pub fn validate(&self) -> Result<(), CompressionError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CompressionError::InvalidOptions("maximum dimensions must be positive"));
        }

        if self.max_size_bytes == 0 {
            return Err(CompressionError::InvalidOptions("maximum size must be positive"));
        }

        // written this way so NaN fails too
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(CompressionError::InvalidOptions("quality must be within (0, 1]"));
        }

        Ok(())
    }
}
