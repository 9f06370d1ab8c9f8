use image::{DynamicImage, ImageResult};

#[cfg(feature = "webp")]
pub fn encode_webp(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    use image::{
        error::{EncodingError, ImageFormatHint},
        GenericImageView, ImageError, ImageFormat,
    };

    debug_assert!((1..=100).contains(&quality));

    let (width, height) = image.dimensions();

    let rgb;
    let rgba;
    let encoder = match image {
        DynamicImage::ImageRgb8(img) => webp::Encoder::from_rgb(img.as_raw(), width, height),
        DynamicImage::ImageRgba8(img) if crate::util::actually_has_alpha(image) => {
            webp::Encoder::from_rgba(img.as_raw(), width, height)
        }
        _ if crate::util::actually_has_alpha(image) => {
            rgba = image.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        }
        _ => {
            rgb = image.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height)
        }
    };

    match encoder.encode_simple(false, quality as f32) {
        Ok(out) => {
            log::trace!("WebP Encoder produced {} bytes at quality {quality}", out.len());

            Ok(out.to_vec())
        }
        Err(e) => Err(ImageError::Encoding(EncodingError::new(
            ImageFormatHint::Exact(ImageFormat::WebP),
            format!("{e:?}"),
        ))),
    }
}

#[cfg(not(feature = "webp"))]
pub fn encode_webp(_image: &DynamicImage, _quality: u8) -> ImageResult<Vec<u8>> {
    use image::{
        error::{ImageFormatHint, UnsupportedError, UnsupportedErrorKind},
        ImageError, ImageFormat,
    };

    let hint = ImageFormatHint::Exact(ImageFormat::WebP);

    Err(ImageError::Unsupported(UnsupportedError::from_format_and_kind(
        hint.clone(),
        UnsupportedErrorKind::Format(hint),
    )))
}

/// Whether this build can produce WebP at all
pub const fn is_supported() -> bool {
    cfg!(feature = "webp")
}

#[cfg(all(test, feature = "webp"))]
mod tests {
    use super::*;

    #[test]
    fn test_encode_webp() {
        let img = image::RgbImage::from_fn(64, 48, |x, y| image::Rgb([x as u8 * 4, y as u8 * 5, 90]));

        let out = encode_webp(&DynamicImage::ImageRgb8(img), 80).unwrap();

        assert_eq!(&out[..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");
    }
}
