use std::io::{self, BufRead, Cursor, Read, Seek};

use image::{io::Reader, DynamicImage, ImageBuffer, ImageFormat};

/// Decoder limits, checked against the image header before any pixel buffers are allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_pixels: u64,
}

impl Default for Limits {
    fn default() -> Self {
        // 4-byte/32-bit color * 64 Mpx = 256 MiB RAM usage
        Limits { max_pixels: 8192 * 8192 }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImageReadError {
    #[error("Io Error: {0}")]
    Io(#[from] io::Error),

    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid Image Format")]
    InvalidImageFormat,

    #[error("Image Too Large")]
    ImageTooLarge,

    #[error("Png Decode Error: {0}")]
    PngDecodeError(#[from] png::DecodingError),

    #[error("Jpeg Decode Error: {0}")]
    JpegDecodeError(#[from] jpeg_decoder::Error),

    #[error("Unsupported format")]
    Unsupported,
}

pub fn read_image(buffer: &[u8], limits: &Limits) -> Result<DynamicImage, ImageReadError> {
    let format = match image::guess_format(buffer) {
        Ok(format) => format,
        Err(_) => return Err(ImageReadError::InvalidImageFormat),
    };

    let source = Cursor::new(buffer);

    let image = match format {
        ImageFormat::Png => read_png(source, limits)?,
        ImageFormat::Jpeg => read_jpeg(source, limits)?,
        _ => read_generic(source, format, limits)?,
    };

    let (width, height) = (image.width(), image.height());

    if width == 0 || height == 0 {
        return Err(ImageReadError::InvalidImageFormat);
    }

    log::trace!("Decoded {format:?} image {width}x{height} from {} bytes", buffer.len());

    Ok(image)
}

fn check_limits(width: u32, height: u32, limits: &Limits) -> Result<(), ImageReadError> {
    if (width as u64 * height as u64) > limits.max_pixels {
        return Err(ImageReadError::ImageTooLarge);
    }

    Ok(())
}

/// Anything not handled by a dedicated decoder goes through `image`'s reader
fn read_generic<R: BufRead + Seek>(
    mut source: R,
    format: ImageFormat,
    limits: &Limits,
) -> Result<DynamicImage, ImageReadError> {
    let (width, height) = {
        let mut reader = Reader::new(&mut source);
        reader.set_format(format);

        match reader.into_dimensions() {
            Ok(dim) => dim,
            Err(_) => return Err(ImageReadError::InvalidImageFormat),
        }
    };

    check_limits(width, height, limits)?;

    source.rewind()?;

    let mut reader = Reader::new(source);
    reader.set_format(format);

    match reader.decode() {
        Ok(image) => Ok(image),
        Err(_) => Err(ImageReadError::InvalidImageFormat),
    }
}

macro_rules! from_raw {
    ($width:expr, $height:expr, $buf:expr) => {
        match ImageBuffer::from_raw($width, $height, $buf) {
            Some(image) => image,
            None => return Err(ImageReadError::Unsupported),
        }
    };
}

/// Reads in a PNG image, converting it to 8-bit color channels and checking limits first
fn read_png<R: Read>(source: R, limits: &Limits) -> Result<DynamicImage, ImageReadError> {
    use png::{BitDepth, ColorType, Decoder, Transformations};

    let mut decoder = Decoder::new(source);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    decoder.set_ignore_text_chunk(true);

    let mut reader = decoder.read_info()?;

    {
        let info = reader.info();
        check_limits(info.width, info.height, limits)?;
    }

    let mut buf = vec![0u8; reader.output_buffer_size()];

    let frame_info = reader.next_frame(&mut buf)?;
    buf.truncate(frame_info.buffer_size());

    if frame_info.bit_depth != BitDepth::Eight {
        return Err(ImageReadError::Unsupported);
    }

    let (width, height) = (frame_info.width, frame_info.height);

    Ok(match frame_info.color_type {
        ColorType::Grayscale => DynamicImage::ImageLuma8(from_raw!(width, height, buf)),
        ColorType::GrayscaleAlpha => DynamicImage::ImageLumaA8(from_raw!(width, height, buf)),
        ColorType::Rgb => DynamicImage::ImageRgb8(from_raw!(width, height, buf)),
        ColorType::Rgba => DynamicImage::ImageRgba8(from_raw!(width, height, buf)),
        // EXPAND turns indexed colors into RGB(A)
        ColorType::Indexed => return Err(ImageReadError::Unsupported),
    })
}

fn read_jpeg<R: Read>(source: R, limits: &Limits) -> Result<DynamicImage, ImageReadError> {
    use jpeg_decoder::{Decoder, PixelFormat};

    let mut decoder = Decoder::new(source);

    decoder.read_info()?;

    let Some(info) = decoder.info() else {
        return Err(ImageReadError::InvalidImageFormat);
    };

    let (width, height) = (info.width as u32, info.height as u32);

    check_limits(width, height, limits)?;

    let buf = decoder.decode()?;

    Ok(match info.pixel_format {
        PixelFormat::L8 => DynamicImage::ImageLuma8(from_raw!(width, height, buf)),
        PixelFormat::L16 => DynamicImage::ImageLuma8(from_raw!(width, height, l16_to_l8(buf))),
        PixelFormat::RGB24 => DynamicImage::ImageRgb8(from_raw!(width, height, buf)),
        PixelFormat::CMYK32 => DynamicImage::ImageRgb8(from_raw!(width, height, cmyk_to_rgb(buf))),
    })
}

// maps 2x->x without re-allocating, keeping the high byte of each big-endian u16
fn l16_to_l8(mut input: Vec<u8>) -> Vec<u8> {
    let new_len = input.len() / 2;
    for i in 0..new_len {
        input[i] = input[i * 2];
    }

    input.truncate(new_len);

    input
}

// maps 4x->3x without re-allocating
fn cmyk_to_rgb(mut input: Vec<u8>) -> Vec<u8> {
    let mut rgb_offset = 0;
    let mut cmyk_offset = 0;

    let count = input.len() / 4;

    for _ in 0..count {
        let c = 255 - (input[cmyk_offset] as u16);
        let m = 255 - (input[cmyk_offset + 1] as u16);
        let y = 255 - (input[cmyk_offset + 2] as u16);
        let k = 255 - (input[cmyk_offset + 3] as u16);

        input[rgb_offset] = ((k * c) / 255) as u8;
        input[rgb_offset + 1] = ((k * m) / 255) as u8;
        input[rgb_offset + 2] = ((k * y) / 255) as u8;

        cmyk_offset += 4;
        rgb_offset += 3;
    }

    input.truncate(3 * count);

    input
}
