use base64::engine::{general_purpose::STANDARD, Engine};

use crate::ImageFormat;

/// Result of a single compression call.
///
/// Sizes and the format are measured from the encoded buffer itself.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EncodedArtifact {
    #[serde(serialize_with = "serialize_base64")]
    pub(crate) encoded_image: Vec<u8>,
    pub(crate) format: ImageFormat,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) original_byte_size: u64,
    pub(crate) compressed_byte_size: u64,
    pub(crate) original_size_estimated: bool,
    pub(crate) quality: f32,
    pub(crate) passes: u32,
}

fn serialize_base64<S: serde::Serializer>(buffer: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(buffer))
}

impl EncodedArtifact {
    #[inline]
    pub fn encoded_image(&self) -> &[u8] {
        &self.encoded_image
    }

    #[inline]
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte length of the input buffer, or `width * height * 4` when the
    /// input was already decoded, see [`original_size_estimated`](Self::original_size_estimated)
    #[inline]
    pub fn original_byte_size(&self) -> u64 {
        self.original_byte_size
    }

    #[inline]
    pub fn compressed_byte_size(&self) -> u64 {
        self.compressed_byte_size
    }

    #[inline]
    pub fn original_size_estimated(&self) -> bool {
        self.original_size_estimated
    }

    /// Encoder quality of the pass that produced this artifact
    #[inline]
    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Number of successful encode passes, including the initial one
    #[inline]
    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn exceeds_budget(&self, max_size_bytes: u64) -> bool {
        self.compressed_byte_size > max_size_bytes
    }

    pub fn budget_met(&self, max_size_bytes: u64) -> bool {
        !self.exceeds_budget(max_size_bytes)
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.original_byte_size == 0 {
            return 1.0;
        }

        self.compressed_byte_size as f64 / self.original_byte_size as f64
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Embeddable `data:` URL form of the encoded image
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.encoded_image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> EncodedArtifact {
        EncodedArtifact {
            encoded_image: vec![0xFF, 0xD8, 0xFF, 0xE0],
            format: ImageFormat::Jpeg,
            width: 2,
            height: 1,
            original_byte_size: 16,
            compressed_byte_size: 4,
            original_size_estimated: false,
            quality: 0.8,
            passes: 1,
        }
    }

    #[test]
    fn test_budget() {
        let a = artifact();

        assert!(a.budget_met(4));
        assert!(a.exceeds_budget(3));
        assert_eq!(a.compression_ratio(), 0.25);
    }

    #[test]
    fn test_data_url() {
        assert_eq!(artifact().to_data_url(), "data:image/jpeg;base64,/9j/4A==");
    }
}
