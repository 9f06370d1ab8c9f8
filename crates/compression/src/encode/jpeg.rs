use image::{
    error::{EncodingError, ImageFormatHint},
    ColorType, DynamicImage, GenericImageView, ImageError, ImageFormat, ImageResult,
};

use crate::util::{actually_has_alpha, flatten_alpha};

/// JPEG has no alpha channel, transparent areas become white
const BACKGROUND: [u8; 3] = [255, 255, 255];

pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    debug_assert!((1..=100).contains(&quality));

    let flattened;
    let image = match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
        _ => {
            flattened = if actually_has_alpha(image) {
                DynamicImage::ImageRgb8(flatten_alpha(image, BACKGROUND))
            } else if image.color().has_color() {
                DynamicImage::ImageRgb8(image.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(image.to_luma8())
            };

            &flattened
        }
    };

    let out = match try_encode_mozjpeg(image, quality) {
        Some(out) => out,
        None => encode_fallback(image, quality)?,
    };

    log::trace!("JPEG Encoder produced {} bytes at quality {quality}", out.len());

    Ok(out)
}

fn try_encode_mozjpeg(image: &DynamicImage, quality: u8) -> Option<Vec<u8>> {
    let res = std::panic::catch_unwind(move || -> std::io::Result<Vec<u8>> {
        use mozjpeg::{ColorSpace, Compress};

        let mut encoder = Compress::new(match image.color() {
            ColorType::L8 => ColorSpace::JCS_GRAYSCALE,
            _ => ColorSpace::JCS_RGB,
        });

        let (width, height) = image.dimensions();
        encoder.set_size(width as usize, height as usize);
        encoder.set_quality(quality as f32);
        encoder.set_use_scans_in_trellis(true);
        encoder.set_optimize_coding(true);

        // with decreasing quality, increase smoothing, from 5% at 100 to 40% at 0
        encoder.set_smoothing_factor({ 40u16.saturating_sub(quality as u16 * 7 / 20) } as u8);

        if quality >= 60 {
            for component in encoder.components_mut() {
                component.h_samp_factor = 1;
                component.v_samp_factor = 1;
            }
        }

        let mut encoder = encoder.start_compress(Vec::with_capacity(1024 * 16))?;
        encoder.write_scanlines(image.as_bytes())?;
        encoder.finish()
    });

    match res {
        Ok(Ok(out)) => Some(out),
        Ok(Err(e)) => {
            log::error!("Error encoding JPEG with mozjpeg: {e}");
            None
        }
        Err(_) => {
            log::error!("Error encoding JPEG with mozjpeg");
            None
        }
    }
}

fn encode_fallback(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    use jpeg_encoder::{ColorType as C, Encoder, QuantizationTableType as Q, SamplingFactor as S};

    let mut out = Vec::new();

    let mut encoder = Encoder::new(&mut out, quality);
    encoder.set_optimized_huffman_tables(true);
    encoder.set_quantization_tables(Q::ImageMagick, Q::ImageMagick);
    encoder.set_sampling_factor(S::F_1_1);

    let (width, height) = image.dimensions();

    let (Ok(width), Ok(height)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(ImageError::Encoding(EncodingError::new(
            ImageFormatHint::Exact(ImageFormat::Jpeg),
            format!("{width}x{height} exceeds the JPEG dimension limit of 65535"),
        )));
    };

    encoder
        .encode(
            image.as_bytes(),
            width,
            height,
            match image.color() {
                ColorType::L8 => C::Luma,
                _ => C::Rgb,
            },
        )
        .map_err(|e| ImageError::Encoding(EncodingError::new(ImageFormatHint::Exact(ImageFormat::Jpeg), e)))?;

    Ok(out)
}
