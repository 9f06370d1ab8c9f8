use image::{DynamicImage, GenericImageView, Pixel, Rgb, RgbImage};

/// Checks whether any pixel is meaningfully transparent, not just whether the color type has an alpha channel
pub fn actually_has_alpha(image: &DynamicImage) -> bool {
    match image {
        DynamicImage::ImageLuma8(_) => false,
        DynamicImage::ImageRgb8(_) => false,
        DynamicImage::ImageLuma16(_) => false,
        DynamicImage::ImageRgb16(_) => false,
        DynamicImage::ImageRgb32F(_) => false,

        DynamicImage::ImageLumaA8(img) => check_pixels_for_alpha(img),
        DynamicImage::ImageRgba8(img) => check_pixels_for_alpha(img),
        DynamicImage::ImageLumaA16(img) => check_pixels_for_alpha(img),
        DynamicImage::ImageRgba16(img) => check_pixels_for_alpha(img),
        DynamicImage::ImageRgba32F(img) => check_pixels_for_alpha(img),
        _ => true,
    }
}

// NOTE: These are adjusted to ignore about 1% of alpha

pub(crate) trait AlphaValue: PartialOrd + std::fmt::Debug {
    const MAX: Self;
}

impl AlphaValue for u8 {
    const MAX: u8 = u8::MAX - (u8::MAX / 100 + 1);
}

impl AlphaValue for u16 {
    const MAX: u16 = u16::MAX - (u16::MAX / 100 + 1);
}

impl AlphaValue for f32 {
    const MAX: f32 = 0.99;
}

fn check_pixels_for_alpha<G>(image: &G) -> bool
where
    G: GenericImageView<Pixel: Pixel<Subpixel: AlphaValue>>,
{
    // use last channel as alpha
    let x = <<G as GenericImageView>::Pixel as Pixel>::CHANNEL_COUNT as usize - 1;
    for (_, _, p) in image.pixels() {
        if p.channels()[x] < AlphaValue::MAX {
            return true;
        }
    }

    false
}

/// Reduces any color type to one of the four 8-bit layouts the encoders accept,
/// dropping the alpha channel when it isn't actually used.
pub fn normalize_8bit(image: &DynamicImage) -> DynamicImage {
    let has_alpha = actually_has_alpha(image);

    match (image, has_alpha) {
        (DynamicImage::ImageLuma8(_), _) | (DynamicImage::ImageRgb8(_), _) => image.clone(),
        (DynamicImage::ImageLumaA8(_), true) | (DynamicImage::ImageRgba8(_), true) => image.clone(),
        _ => match (has_alpha, image.color().has_color()) {
            (true, true) => DynamicImage::ImageRgba8(image.to_rgba8()),
            (false, true) => DynamicImage::ImageRgb8(image.to_rgb8()),
            (true, false) => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
            (false, false) => DynamicImage::ImageLuma8(image.to_luma8()),
        },
    }
}

/// Composites the image over a solid background, for formats without an alpha channel
pub fn flatten_alpha(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
    let rgba = image.to_rgba8();

    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;

        let blend = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;

        Rgb([blend(r, background[0]), blend(g, background[1]), blend(b, background[2])])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_opaque_rgba_has_no_alpha() {
        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255])));
        assert!(!actually_has_alpha(&opaque));
        assert!(matches!(normalize_8bit(&opaque), DynamicImage::ImageRgb8(_)));

        let mut transparent = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));
        transparent.put_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let transparent = DynamicImage::ImageRgba8(transparent);
        assert!(actually_has_alpha(&transparent));
        assert!(matches!(normalize_8bit(&transparent), DynamicImage::ImageRgba8(_)));
    }

    #[test]
    fn test_normalize_16bit_gray() {
        let gray = DynamicImage::ImageLuma16(image::ImageBuffer::from_pixel(2, 2, image::Luma([40000u16])));
        assert!(matches!(normalize_8bit(&gray), DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn test_flatten_alpha() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));

        let flat = flatten_alpha(&DynamicImage::ImageRgba8(img), [255, 255, 255]);

        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [0, 0, 0]);
    }
}
