//! Adaptive compression: fit an image into a pixel footprint and a byte budget.
//!
//! The search is bounded in both dimensions it explores. Encoder quality is lowered in
//! fixed steps for at most [`MAX_QUALITY_ATTEMPTS`] passes over the same resampled surface,
//! then, if the budget still isn't met, the image is rescaled exactly once by the square root
//! of the remaining size ratio and encoded at [`RESCALE_QUALITY`]. Whatever comes out of that
//! is the result, even if it is still over budget. Once an initial encode has succeeded, a
//! failing refinement pass ends the search with the last good attempt.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    codec::{ImageCodec, RasterCodec},
    read_image::ImageReadError,
    resample::{scale_dimensions, target_dimensions},
    CompressionOptions, EncodedArtifact, ImageFormat,
};

/// The quality loop never pushes quality below this
pub const QUALITY_FLOOR: f32 = 0.1;
pub const QUALITY_STEP: f32 = 0.08;
pub const MAX_QUALITY_ATTEMPTS: u32 = 10;

/// Fixed quality for the single rescale pass
pub const RESCALE_QUALITY: f32 = 0.6;

/// Used to approximate the original size of inputs that were never a byte buffer
pub const ESTIMATED_BYTES_PER_PIXEL: u64 = 4;

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Invalid Options: {0}")]
    InvalidOptions(&'static str),

    #[error("Decode Error: {0}")]
    Decode(#[from] ImageReadError),

    #[error("Encode Error: {0}")]
    Encode(String),

    #[error("Cancelled")]
    Cancelled,
}

pub enum ImageSource<'a, S> {
    /// Encoded image bytes, the common case
    Bytes(&'a [u8]),

    /// An already-decoded surface, e.g. one fetched and decoded elsewhere.
    ///
    /// There is no buffer to measure, so the original size is estimated.
    Surface(S),
}

struct CompressionAttempt {
    quality: f32,
    format: ImageFormat,
    buffer: Vec<u8>,
}

impl CompressionAttempt {
    #[inline]
    fn size(&self) -> u64 {
        self.buffer.len() as u64
    }
}

/// Compresses encoded image bytes with the default codec
pub fn compress(input: &[u8], options: &CompressionOptions) -> Result<EncodedArtifact, CompressionError> {
    compress_with(&ImageCodec::default(), ImageSource::Bytes(input), options, None)
}

/// Compresses with a specific codec, optionally checking `cancel` between encode passes
pub fn compress_with<C: RasterCodec>(
    codec: &C,
    source: ImageSource<'_, C::Surface>,
    options: &CompressionOptions,
    cancel: Option<&AtomicBool>,
) -> Result<EncodedArtifact, CompressionError> {
    options.validate()?;

    let (original, original_byte_size, original_size_estimated) = match source {
        ImageSource::Bytes(buffer) => (codec.decode(buffer)?, buffer.len() as u64, false),
        ImageSource::Surface(surface) => {
            let (width, height) = codec.dimensions(&surface);
            let estimate = width as u64 * height as u64 * ESTIMATED_BYTES_PER_PIXEL;

            (surface, estimate, true)
        }
    };

    let (width, height) = codec.dimensions(&original);
    let (target_width, target_height) = target_dimensions(width, height, options.max_width, options.max_height);

    let resized = if (target_width, target_height) != (width, height) {
        log::trace!("Resizing image from {width}x{height} to {target_width}x{target_height}");

        Some(codec.resample(&original, target_width, target_height))
    } else {
        None
    };

    let surface = resized.as_ref().unwrap_or(&original);

    let mut attempt = initial_encode(codec, surface, options)?;
    let mut passes = 1;

    let max_size = options.max_size_bytes;

    let mut attempts = 0;
    let mut refine_failed = false;
    while attempt.size() > max_size && attempt.quality > QUALITY_FLOOR && attempts < MAX_QUALITY_ATTEMPTS {
        check_cancel(cancel)?;

        attempts += 1;

        let quality = (options.quality - QUALITY_STEP * attempts as f32).max(QUALITY_FLOOR);

        match encode_attempt(codec, surface, attempt.format, quality) {
            Ok(next) => attempt = next,
            Err(e) => {
                log::debug!("Stopping quality reduction at {quality:.2}: {e}");
                refine_failed = true;
                break;
            }
        }

        passes += 1;
    }

    let (mut out_width, mut out_height) = (target_width, target_height);

    if attempt.size() > max_size && !refine_failed {
        check_cancel(cancel)?;

        // encoded size is assumed to scale roughly with pixel area
        let scale = (max_size as f64 / attempt.size() as f64).sqrt();
        let (new_width, new_height) = scale_dimensions(target_width, target_height, scale);

        log::debug!(
            "{} bytes still over budget of {max_size} bytes after {attempts} quality reductions, rescaling to {new_width}x{new_height}",
            attempt.size()
        );

        drop(resized);

        let rescaled = codec.resample(&original, new_width, new_height);

        match encode_attempt(codec, &rescaled, attempt.format, RESCALE_QUALITY) {
            Ok(next) => {
                (out_width, out_height) = codec.dimensions(&rescaled);
                attempt = next;
                passes += 1;
            }
            Err(e) => log::debug!("Rescale pass failed, keeping the previous attempt: {e}"),
        }
    }

    let CompressionAttempt { quality, buffer, .. } = attempt;

    if buffer.is_empty() {
        return Err(CompressionError::Encode("encoder produced an empty buffer".to_owned()));
    }

    let Some(format) = ImageFormat::detect(&buffer) else {
        return Err(CompressionError::Encode("encoder produced an unrecognized buffer".to_owned()));
    };

    if buffer.len() as u64 > max_size {
        log::warn!("Unable to compress image below {max_size} bytes, best effort is {} bytes", buffer.len());
    }

    Ok(EncodedArtifact {
        compressed_byte_size: buffer.len() as u64,
        encoded_image: buffer,
        format,
        width: out_width,
        height: out_height,
        original_byte_size,
        original_size_estimated,
        quality,
        passes,
    })
}

fn check_cancel(cancel: Option<&AtomicBool>) -> Result<(), CompressionError> {
    match cancel {
        Some(cancel) if cancel.load(Ordering::Relaxed) => Err(CompressionError::Cancelled),
        _ => Ok(()),
    }
}

/// Walks the candidate formats, settling on the first one that actually encodes
fn initial_encode<C: RasterCodec>(
    codec: &C,
    surface: &C::Surface,
    options: &CompressionOptions,
) -> Result<CompressionAttempt, CompressionError> {
    let mut last_error = None;

    for format in options.preferred_format.candidates() {
        if !codec.supports(format) {
            log::debug!("Codec does not support {format}, skipping");
            continue;
        }

        match encode_attempt(codec, surface, format, options.quality) {
            Ok(attempt) => {
                if format != options.preferred_format {
                    log::debug!("Falling back from {} to {format}", options.preferred_format);
                }

                return Ok(attempt);
            }
            Err(e) => {
                log::debug!("Unable to encode {format}: {e}");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| CompressionError::Encode("no supported output format".to_owned())))
}

/// A single encode pass. Output that doesn't carry the requested format's
/// signature counts as a failure, encoders are known to substitute PNG silently.
fn encode_attempt<C: RasterCodec>(
    codec: &C,
    surface: &C::Surface,
    format: ImageFormat,
    quality: f32,
) -> Result<CompressionAttempt, CompressionError> {
    let buffer = codec.encode(surface, format, quality).map_err(|e| CompressionError::Encode(e.to_string()))?;

    match ImageFormat::detect(&buffer) {
        Some(detected) if detected == format => {}
        Some(detected) => {
            return Err(CompressionError::Encode(format!("requested {format}, but encoder produced {detected}")));
        }
        None => return Err(CompressionError::Encode(format!("encoder produced invalid {format} output"))),
    }

    log::trace!("Encoded {format} at quality {quality:.2}: {} bytes", buffer.len());

    Ok(CompressionAttempt { quality, format, buffer })
}
