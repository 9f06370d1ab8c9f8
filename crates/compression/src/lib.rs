extern crate tracing as log;

pub mod artifact;
pub mod codec;
pub mod encode;
pub mod format;
pub mod options;
pub mod pipeline;
pub mod read_image;
pub mod resample;
pub mod util;

pub use artifact::EncodedArtifact;
pub use codec::{ImageCodec, RasterCodec};
pub use format::ImageFormat;
pub use options::CompressionOptions;
pub use pipeline::{compress, compress_with, CompressionError, ImageSource};
pub use read_image::{ImageReadError, Limits};

pub use image;
