use std::path::PathBuf;

use compression::ImageFormat;
use config::sections::compression::Compression;

/// Adaptive image compressor
#[derive(Debug, argh::FromArgs)]
pub struct CliOptions {
    /// print version information and exit
    #[argh(switch, short = 'V')]
    pub version: bool,

    /// logging level (0 = Info, 1 = Debug, 2 = Trace) [env COMPRESS_VERBOSE]
    #[argh(option, short = 'v')]
    pub verbose: Option<u8>,

    /// specify configuration file location
    #[argh(option, default = "PathBuf::from(\"./compress.toml\")", short = 'c')]
    pub config: PathBuf,

    /// writes out the configuration file with overrides having been applied
    #[argh(switch)]
    pub write_config: bool,

    /// print a JSON report instead of a log line
    #[argh(switch)]
    pub json: bool,

    /// output file, defaults to the input name with the new extension
    #[argh(option, short = 'o')]
    pub output: Option<PathBuf>,

    /// maximum output width in pixels
    #[argh(option)]
    pub max_width: Option<u32>,

    /// maximum output height in pixels
    #[argh(option)]
    pub max_height: Option<u32>,

    /// target size in bytes, or a size such as "64 KiB"
    #[argh(option)]
    pub max_size: Option<String>,

    /// initial encoder quality, in (0, 1]
    #[argh(option)]
    pub quality: Option<f32>,

    /// preferred output format: webp, jpeg or png
    #[argh(option)]
    pub format: Option<ImageFormat>,

    /// image file path or http(s) URL
    #[argh(positional)]
    pub input: Option<String>,
}

impl CliOptions {
    pub fn parse() -> Result<Self, anyhow::Error> {
        let mut args: CliOptions = argh::from_env();

        if args.version {
            println!("compress {}", env!("CARGO_PKG_VERSION"));
            std::process::exit(0);
        }

        if args.verbose.is_none() {
            if let Ok(verbose) = std::env::var("COMPRESS_VERBOSE") {
                if let Ok(verbose) = verbose.parse() {
                    args.verbose = Some(verbose);
                }
            }
        }

        Ok(args)
    }

    /// Command-line flags take precedence over both the file and the environment
    pub fn apply_overrides(&self, section: &mut Compression) -> Result<(), anyhow::Error> {
        if let Some(max_width) = self.max_width {
            section.max_width = max_width;
        }

        if let Some(max_height) = self.max_height {
            section.max_height = max_height;
        }

        if let Some(ref max_size) = self.max_size {
            section.max_size = match config::util::try_parse_bytes(max_size) {
                Some(bytes) => bytes,
                None => anyhow::bail!("Invalid size: {max_size}"),
            };
        }

        if let Some(quality) = self.quality {
            section.quality = quality;
        }

        if let Some(format) = self.format {
            section.format = format;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use argh::FromArgs;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::from_args(&["compress"], args).unwrap()
    }

    #[test]
    fn test_flags_override_section() {
        let args = parse(&["--max-width", "320", "--max-size", "20 KiB", "--format", "jpg", "in.png"]);

        let mut section = Compression::default();
        args.apply_overrides(&mut section).unwrap();

        assert_eq!(args.input.as_deref(), Some("in.png"));
        assert_eq!(section.max_width, 320);
        assert_eq!(section.max_height, 500);
        assert_eq!(section.max_size, 20 * 1024);
        assert_eq!(section.format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_invalid_size_is_rejected() {
        let args = parse(&["--max-size", "huge", "in.png"]);

        assert!(args.apply_overrides(&mut Compression::default()).is_err());
    }
}
