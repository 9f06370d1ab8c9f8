use std::path::Path;

use compression::{EncodedArtifact, ImageFormat};

/// Summary printed with `--json`, the encoded image itself is written to disk
#[derive(Debug, serde::Serialize)]
pub struct Report<'a> {
    pub output: &'a Path,
    pub format: ImageFormat,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub original_byte_size: u64,
    pub original_size_estimated: bool,
    pub compressed_byte_size: u64,
    pub compression_ratio: f64,
    pub quality: f32,
    pub passes: u32,
    pub budget_met: bool,
}

impl<'a> Report<'a> {
    pub fn new(output: &'a Path, artifact: &EncodedArtifact, max_size_bytes: u64) -> Self {
        Report {
            output,
            format: artifact.format(),
            mime_type: artifact.mime_type(),
            width: artifact.width(),
            height: artifact.height(),
            original_byte_size: artifact.original_byte_size(),
            original_size_estimated: artifact.original_size_estimated(),
            compressed_byte_size: artifact.compressed_byte_size(),
            compression_ratio: artifact.compression_ratio(),
            quality: artifact.quality(),
            passes: artifact.passes(),
            budget_met: artifact.budget_met(max_size_bytes),
        }
    }
}

/// `photo.png` becomes `photo.webp` next to it, `photo.webp` becomes `photo.compressed.webp`.
/// URLs land in the working directory.
pub fn default_output(input: &str, format: ImageFormat) -> std::path::PathBuf {
    let name = match input.split_once("://") {
        Some((_, rest)) => rest.split(['?', '#']).next().unwrap_or(rest).rsplit('/').next().unwrap_or(rest),
        None => input,
    };

    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).filter(|s| !s.is_empty()).unwrap_or("image");

    let ext = format.extension();

    if input.contains("://") {
        return format!("{stem}.{ext}").into();
    }

    let output = path.with_file_name(format!("{stem}.{ext}"));

    // never overwrite the input itself
    match output == path {
        true => path.with_file_name(format!("{stem}.compressed.{ext}")),
        false => output,
    }
}
