use std::io;

use image::{ColorType, DynamicImage, GenericImageView};

use crate::util::normalize_8bit;

pub fn encode_png(image: &DynamicImage, quality: u8) -> io::Result<Vec<u8>> {
    use png::{AdaptiveFilterType, BitDepth, Compression, Encoder as PngEncoder, FilterType};

    debug_assert!((1..=100).contains(&quality));

    let image = normalize_8bit(image);

    let bytes = image.as_bytes();
    let (width, height) = image.dimensions();
    let num_pixels = width as usize * height as usize;

    // 1.5 bytes per pixel
    const BYTES_PER_PIXEL_D: usize = 3;
    const BYTES_PER_PIXEL_N: usize = 2;

    let expected_bytes = (num_pixels * BYTES_PER_PIXEL_D) / BYTES_PER_PIXEL_N;

    let mut out = Vec::with_capacity(1024 * 4);

    let mut encoder = PngEncoder::new(&mut out, width, height);

    encoder.set_depth(BitDepth::Eight);
    encoder.set_color(match image.color() {
        ColorType::L8 => png::ColorType::Grayscale,
        ColorType::La8 => png::ColorType::GrayscaleAlpha,
        ColorType::Rgb8 => png::ColorType::Rgb,
        ColorType::Rgba8 => png::ColorType::Rgba,
        _ => return Err(io::Error::new(io::ErrorKind::InvalidInput, "unsupported PNG color type")),
    });

    encoder.set_compression(Compression::Fast);
    encoder.set_filter(FilterType::NoFilter);
    encoder.set_adaptive_filter(AdaptiveFilterType::NonAdaptive);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(bytes)?;
    drop(writer);

    log::trace!("Initial PNG Encoded, now optimizing...");

    let small = num_pixels <= (256 * 256);
    let mut opts = oxipng::Options::from_preset(if small { 3 } else { 1 });
    opts.palette_reduction = true;
    opts.bit_depth_reduction = quality <= 60;

    let out = match oxipng::optimize_from_memory(&out, &opts) {
        Ok(new_out) => {
            log::trace!("PNG optimized from {} to {} bytes", out.len(), new_out.len());
            new_out
        }
        Err(e) => {
            log::error!("Error optimizing PNG: {}", e);
            out
        }
    };

    log::trace!("PNG Encoder expected {expected_bytes} bytes, got {} bytes", out.len());

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_grayscale_alpha() {
        let img = image::GrayAlphaImage::from_fn(24, 24, |x, _| image::LumaA([x as u8 * 10, (x * 10) as u8]));

        let out = encode_png(&DynamicImage::ImageLumaA8(img), 80).unwrap();

        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!(decoded.dimensions(), (24, 24));
    }
}
