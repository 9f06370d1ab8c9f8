use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel};

/// Computes the largest dimensions within `max_width`x`max_height` that keep the aspect ratio.
///
/// Images already within bounds are returned unchanged, never upscaled.
pub fn target_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let ratio = f64::min(max_width as f64 / width as f64, max_height as f64 / height as f64);

    scale_dimensions(width, height, ratio)
}

/// Applies a uniform scale factor to both axes, rounding and keeping at least one pixel
pub fn scale_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scale_axis = |x: u32| ((x as f64 * scale).round() as u32).max(1);

    (scale_axis(width), scale_axis(height))
}

/// Resamples the image with a Lanczos3 filter, preserving its color type where possible
pub fn resample(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(img) => DynamicImage::ImageLuma8(resize(img, width, height)),
        DynamicImage::ImageLumaA8(img) => DynamicImage::ImageLumaA8(resize(img, width, height)),
        DynamicImage::ImageRgb8(img) => DynamicImage::ImageRgb8(resize(img, width, height)),
        DynamicImage::ImageRgba8(img) => DynamicImage::ImageRgba8(resize(img, width, height)),
        _ if image.color().has_alpha() => DynamicImage::ImageRgba8(resize(&image.to_rgba8(), width, height)),
        _ => DynamicImage::ImageRgb8(resize(&image.to_rgb8(), width, height)),
    }
}

fn sinc(mut a: f32) -> f32 {
    a *= std::f32::consts::PI;
    a.sin() / a
}

fn lanczos(x: f32, t: f32) -> f32 {
    if x.abs() < t {
        if x != 0.0 {
            sinc(x) * sinc(x / t)
        } else {
            1.0
        }
    } else {
        0.0
    }
}

/// Based on image::imageops::resize routines, but merged together and only using a single
/// line buffer to reduce memory usage by a factor of `new_height`
///
/// Only ever shrinks, requested dimensions larger than the source are clamped.
pub fn resize<I, P>(image: &I, new_width: u32, new_height: u32) -> ImageBuffer<P, Vec<u8>>
where
    I: GenericImageView<Pixel = P>,
    P: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();

    let new_width = new_width.clamp(1, width);
    let new_height = new_height.clamp(1, height);

    let w_ratio = width as f32 / new_width as f32;
    let h_ratio = height as f32 / new_height as f32;

    let w_sratio = if w_ratio < 1.0 { 1.0 } else { w_ratio };
    let h_sratio = if h_ratio < 1.0 { 1.0 } else { h_ratio };

    let w_isratio = 1.0 / w_sratio;
    let h_isratio = 1.0 / h_sratio;

    let support = 3.0;
    let w_src_support = support * w_sratio;
    let h_src_support = support * h_sratio;

    let num_channels = P::CHANNEL_COUNT as usize;
    let mut line_buffer = vec![0.0f32; num_channels * width as usize];
    let mut ws: Vec<f32> = Vec::new();

    let mut out: ImageBuffer<P, Vec<u8>> = ImageBuffer::new(new_width, new_height);

    // for every vertical line
    for outy in 0..new_height {
        // Find the point in the input image corresponding to the centre
        // of the current pixel in the output image.
        let inputy = (outy as f32 + 0.5) * h_ratio;

        let top = (inputy - h_src_support) as i64; // truncate f32 -> i64
        let top = top.clamp(0, height as i64 - 1);

        let bottom = (inputy + h_src_support) as i64;
        let bottom = bottom.clamp(top + 1, height as i64);

        let top = top as u32;
        let bottom = bottom as u32;

        // Go back to top boundary of pixel, to properly compare with i
        // below, as the kernel treats the centre of a pixel as 0.
        let inputy = inputy - 0.5;

        ws.clear();
        let mut sum = 0.0;
        for i in top..bottom {
            let w = lanczos((i as f32 - inputy) * h_isratio, support);
            ws.push(w);
            sum += w;
        }

        // normalize and add u8->f32 factor
        let factor = (1.0 / 255.0) / sum;
        ws.iter_mut().for_each(|w| *w *= factor);

        let mut offset = 0;
        for x in 0..width {
            let t = &mut [0.0f32; 4][..num_channels];

            for (i, &w) in ws.iter().enumerate() {
                let p = image.get_pixel(x, top + i as u32);

                for (t, &c) in t.iter_mut().zip(p.channels()) {
                    *t += c as f32 * w;
                }
            }

            // insert vertical resampling into line buffer
            let next_offset = offset + num_channels;
            line_buffer[offset..next_offset].copy_from_slice(t);
            offset = next_offset;
        }

        for outx in 0..new_width {
            let inputx = (outx as f32 + 0.5) * w_ratio;

            let left = (inputx - w_src_support) as i64; // truncate f32 -> i64
            let left = left.clamp(0, width as i64 - 1);

            let right = (inputx + w_src_support) as i64;
            let right = right.clamp(left + 1, width as i64);

            let left = left as u32;
            let right = right as u32;

            let inputx = inputx - 0.5;

            let t = &mut [0.0f32; 4][..num_channels];

            let mut sum = 0.0;
            let mut offset = left as usize * num_channels;
            for i in left..right {
                let w = lanczos((i as f32 - inputx) * w_isratio, support);
                sum += w;

                let next_offset = offset + num_channels;
                for (t, &c) in t.iter_mut().zip(&line_buffer[offset..next_offset]) {
                    *t += w * c;
                }

                offset = next_offset;
            }

            // normalize and add f32->u8 factor
            let factor = 255.0 / sum;
            for (&t, c) in t.iter().zip(out.get_pixel_mut(outx, outy).channels_mut()) {
                *c = (t * factor).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_target_dimensions_never_upscale() {
        assert_eq!(target_dimensions(100, 100, 500, 500), (100, 100));
        assert_eq!(target_dimensions(500, 500, 500, 500), (500, 500));
        assert_eq!(target_dimensions(1, 499, 500, 500), (1, 499));
    }

    #[test]
    fn test_target_dimensions_keep_aspect() {
        assert_eq!(target_dimensions(2000, 1000, 500, 500), (500, 250));
        assert_eq!(target_dimensions(1000, 2000, 500, 500), (250, 500));
        assert_eq!(target_dimensions(1600, 900, 500, 500), (500, 281));
        assert_eq!(target_dimensions(1000, 300, 800, 100), (333, 100));

        // very thin images keep at least a single pixel
        assert_eq!(target_dimensions(10000, 2, 500, 500), (500, 1));
    }

    #[test]
    fn test_target_dimensions_aspect_within_a_pixel() {
        for (w, h) in [(1234, 567), (3001, 2999), (640, 4800), (777, 501)] {
            let (nw, nh) = target_dimensions(w, h, 500, 400);

            assert!(nw <= 500 && nh <= 400);

            // each axis is within a pixel of the exact scaled size
            let ratio = f64::min(500.0 / w as f64, 400.0 / h as f64);
            assert!((w as f64 * ratio - nw as f64).abs() <= 1.0, "{w}x{h} -> {nw}x{nh}");
            assert!((h as f64 * ratio - nh as f64).abs() <= 1.0, "{w}x{h} -> {nw}x{nh}");
        }
    }

    #[test]
    fn test_scale_dimensions() {
        assert_eq!(scale_dimensions(500, 250, 0.5), (250, 125));
        assert_eq!(scale_dimensions(500, 250, 0.0001), (1, 1));
    }

    #[test]
    fn test_resize_solid_color() {
        let img = RgbImage::from_pixel(64, 32, Rgb([200, 100, 50]));
        let out = resize(&img, 16, 8);

        assert_eq!(out.dimensions(), (16, 8));

        // a normalized kernel must reproduce flat colors exactly
        for p in out.pixels() {
            assert_eq!(p.0, [200, 100, 50]);
        }
    }

    #[test]
    fn test_resize_never_upscales() {
        let img = RgbImage::from_pixel(10, 10, Rgb([1, 2, 3]));
        assert_eq!(resize(&img, 20, 5).dimensions(), (10, 5));
    }

    #[test]
    fn test_resample_keeps_color_type() {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(20, 20));
        assert!(matches!(resample(&img, 5, 5), DynamicImage::ImageRgba8(_)));

        let img = DynamicImage::ImageRgb16(image::ImageBuffer::new(20, 20));
        let out = resample(&img, 5, 5);
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
        assert_eq!(out.dimensions(), (5, 5));
    }
}
