use std::io::Cursor;

use compression::{
    compress, compress_with,
    image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage},
    CompressionError, CompressionOptions, ImageCodec, ImageFormat, ImageSource,
};

fn encode_png(image: DynamicImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    }))
}

/// Deterministic noise, which no lossy encoder can shrink much
fn noise(width: u32, height: u32) -> DynamicImage {
    let mut state = 0x2545_F491u32;

    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        };

        Rgb([next(), next(), next()])
    }))
}

#[test]
fn wide_image_is_downscaled_into_budget() {
    let input = encode_png(gradient(2000, 1000));

    let options = CompressionOptions {
        max_width: 500,
        max_height: 500,
        max_size_bytes: 102400,
        ..CompressionOptions::default()
    };

    let out = compress(&input, &options).unwrap();

    assert_eq!((out.width(), out.height()), (500, 250));
    assert!(out.budget_met(102400));
    assert!(matches!(out.format(), ImageFormat::Webp | ImageFormat::Jpeg));
    assert_eq!(out.original_byte_size(), input.len() as u64);
    assert_eq!(out.compressed_byte_size(), out.encoded_image().len() as u64);

    let decoded = compression::image::load_from_memory(out.encoded_image()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (500, 250));
}

#[test]
fn small_image_is_untouched_in_a_single_pass() {
    let input = encode_png(gradient(100, 100));

    let out = compress(&input, &CompressionOptions::default()).unwrap();

    assert_eq!((out.width(), out.height()), (100, 100));
    assert_eq!(out.passes(), 1);
    assert_eq!(out.quality(), 0.8);
}

#[test]
fn compression_is_deterministic() {
    let input = encode_png(gradient(640, 480));
    let options = CompressionOptions {
        max_size_bytes: 4096,
        ..CompressionOptions::default()
    };

    let a = compress(&input, &options).unwrap();
    let b = compress(&input, &options).unwrap();

    assert_eq!(a.encoded_image(), b.encoded_image());
    assert_eq!(a, b);
}

#[test]
fn pathological_input_returns_best_effort() {
    let input = encode_png(noise(400, 400));
    let options = CompressionOptions {
        // smaller than any WebP or JPEG container header
        max_size_bytes: 16,
        ..CompressionOptions::default()
    };

    let out = compress(&input, &options).unwrap();

    assert!(out.exceeds_budget(16));
    assert!(out.width() < 400 && out.height() < 400);
    assert_eq!(ImageFormat::detect(out.encoded_image()), Some(out.format()));
}

#[test]
fn format_matches_signature_for_every_preference() {
    let input = encode_png(gradient(120, 80));

    for preferred_format in [ImageFormat::Webp, ImageFormat::Jpeg, ImageFormat::Png] {
        let options = CompressionOptions {
            preferred_format,
            ..CompressionOptions::default()
        };

        let out = compress(&input, &options).unwrap();

        assert_eq!(ImageFormat::detect(out.encoded_image()), Some(out.format()));

        if preferred_format != ImageFormat::Webp {
            assert_eq!(out.format(), preferred_format);
        }
    }
}

#[test]
fn transparent_logo_as_jpeg() {
    let mut logo = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0]));
    for i in 16..48 {
        logo.put_pixel(i, i, Rgba([20, 40, 200, 255]));
    }

    let input = encode_png(DynamicImage::ImageRgba8(logo));

    let options = CompressionOptions {
        preferred_format: ImageFormat::Jpeg,
        ..CompressionOptions::default()
    };

    let out = compress(&input, &options).unwrap();

    assert_eq!(out.format(), ImageFormat::Jpeg);
    assert!(out.to_data_url().starts_with("data:image/jpeg;base64,/9j/"));
}

#[test]
fn undecodable_input_is_a_decode_error() {
    let res = compress(b"GIF89a but not really", &CompressionOptions::default());
    assert!(matches!(res, Err(CompressionError::Decode(_))));

    let res = compress(&[], &CompressionOptions::default());
    assert!(matches!(res, Err(CompressionError::Decode(_))));
}

#[test]
fn decoded_surface_uses_estimated_size() {
    let out = compress_with(
        &ImageCodec::default(),
        ImageSource::Surface(gradient(50, 40)),
        &CompressionOptions::default(),
        None,
    )
    .unwrap();

    assert!(out.original_size_estimated());
    assert_eq!(out.original_byte_size(), 50 * 40 * 4);
}
