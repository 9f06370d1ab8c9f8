use std::{fmt, str::FromStr};

/// Output formats the pipeline can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Webp,
    Jpeg,
    Png,
}

impl ImageFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Webp => "image/webp",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    /// Detects the format of an encoded buffer from its signature,
    /// returning `None` for anything that isn't one of our output formats.
    pub fn detect(buffer: &[u8]) -> Option<ImageFormat> {
        match image::guess_format(buffer) {
            Ok(image::ImageFormat::WebP) => Some(ImageFormat::Webp),
            Ok(image::ImageFormat::Jpeg) => Some(ImageFormat::Jpeg),
            Ok(image::ImageFormat::Png) => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Formats to attempt, in order, when this one is preferred.
    ///
    /// JPEG is the first fallback for everything, and PNG is the last resort.
    pub fn candidates(self) -> impl Iterator<Item = ImageFormat> {
        let chain = [self, ImageFormat::Jpeg, ImageFormat::Png];

        chain.into_iter().enumerate().filter_map(move |(i, f)| (!chain[..i].contains(&f)).then_some(f))
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown image format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "webp" => ImageFormat::Webp,
            "jpeg" | "jpg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            _ => return Err(UnknownFormat(s.to_owned())),
        })
    }
}
