use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use readme_updater::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "updater",
    about = "Render the latest feed articles into README.md on stdout"
)]
struct Args {
    /// Config file (missing file means built-in defaults)
    #[arg(long, value_name = "FILE", default_value = "updater.toml")]
    config: PathBuf,

    /// Override the configured site root
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from '{}'", args.config.display()))?;

    if let Some(base_url) = &args.base_url {
        config.base_url = base_url.clone();
        config.feed_url().context("Invalid --base-url")?;
    }

    Ok(config)
}

fn fail(err: anyhow::Error) -> ! {
    eprintln!("Error during execution:\n{err:#}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    // stdout carries the rendered document, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = readme_updater::run(&config, &mut out).await {
        fail(e);
    }
}
