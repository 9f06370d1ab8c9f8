extern crate tracing as log;

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use cli::CliOptions;
use compression::{compress_with, ImageCodec, ImageSource};
use config::{Config, ConfigError, Configuration};

pub mod cli;
pub mod logging;
pub mod report;

async fn load_config(args: &CliOptions) -> anyhow::Result<Config> {
    log::debug!("Loading config from: {}", args.config.display());
    let mut config = match Config::load(&args.config).await {
        Ok(config) => config,
        Err(ConfigError::IOError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("Config file not found, assuming defaults");

            Config::default()
        }
        Err(e) => return Err(e.into()),
    };

    log::debug!("Applying environment overrides to configuration");
    config.configure();

    args.apply_overrides(&mut config.compression)?;

    Ok(config)
}

async fn read_input(input: &str) -> anyhow::Result<Vec<u8>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        log::info!("Fetching {input}");

        let resp = reqwest::get(input).await?.error_for_status()?;

        return Ok(resp.bytes().await?.to_vec());
    }

    Ok(tokio::fs::read(input).await?)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = CliOptions::parse()?;

    logging::init(args.verbose)?;

    log::debug!("Arguments: {:?}", args);

    let config = load_config(&args).await?;

    if args.write_config {
        log::info!("Saving config to: {}", args.config.display());
        config.save(&args.config).await?;

        return Ok(());
    }

    let Some(ref input) = args.input else {
        anyhow::bail!("No input image given, see `--help`");
    };

    let options = config.compression.options();
    options.validate()?;

    let buffer = read_input(input).await?;

    let cancel = Arc::new(AtomicBool::new(false));

    log::trace!("Setting up cancellation signal for Ctrl+C");
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Cancelling compression");
                cancel.store(true, Ordering::SeqCst);
            }
        }
    });

    let codec = ImageCodec::new(config.compression.limits());

    let artifact = tokio::task::spawn_blocking(move || {
        compress_with(&codec, ImageSource::Bytes(&buffer), &options, Some(&*cancel))
    })
    .await??;

    let output: PathBuf = match args.output {
        Some(ref output) => output.clone(),
        None => report::default_output(input, artifact.format()),
    };

    tokio::fs::write(&output, artifact.encoded_image()).await?;

    if args.json {
        let report = report::Report::new(&output, &artifact, options.max_size_bytes);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        log::info!(
            "Wrote {} ({}x{} {}, {} -> {} bytes, quality {:.2}, {} passes)",
            output.display(),
            artifact.width(),
            artifact.height(),
            artifact.format(),
            artifact.original_byte_size(),
            artifact.compressed_byte_size(),
            artifact.quality(),
            artifact.passes(),
        );
    }

    Ok(())
}
