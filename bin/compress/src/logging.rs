use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    FmtSubscriber,
};

fn create_filter(verbose: Option<u8>) -> anyhow::Result<EnvFilter> {
    #[allow(clippy::wildcard_in_or_patterns)]
    let level_filter = match verbose {
        None | Some(0) => LevelFilter::INFO,
        Some(1) => LevelFilter::DEBUG,
        Some(2) | _ => LevelFilter::TRACE,
    };

    let mut filter = EnvFilter::from_default_env()
        .add_directive(level_filter.into())
        .add_directive("hyper::client::pool=info".parse()?)
        .add_directive("hyper::proto=info".parse()?)
        .add_directive("h2::proto=info".parse()?);

    // codec internals only below -v 3
    if verbose.unwrap_or(0) < 3 {
        filter = filter.add_directive("oxipng=warn".parse()?);
    }

    Ok(filter)
}

/// Logs go to stderr, so stdout stays clean for `--json` reports
pub fn init(verbose: Option<u8>) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(create_filter(verbose)?)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
