use clap::Parser;

mod bootstrap;
mod cli;
mod commands;
mod output;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("memo error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let flags = cli.global_flags();

    let config = bootstrap::load_config()?;
    init_tracing(&flags, &config.logging)?;
    tracing::debug!(
        backend = ?config.storage.backend,
        probe_timeout_ms = config.session.probe_timeout_ms,
        "loaded configuration"
    );

    let identity = bootstrap::open_identity(&config)?;
    commands::dispatch(cli.command, &identity, &config, &flags).await
}

fn init_tracing(
    flags: &cli::GlobalFlags,
    logging: &memo_config::LoggingConfig,
) -> anyhow::Result<()> {
    let level = if flags.quiet {
        "error"
    } else if flags.verbose {
        "debug"
    } else {
        logging.filter.as_str()
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("MEMOREEE_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
