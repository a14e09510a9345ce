//! Renders the latest articles of an Atom feed into a README.
//!
//! One run fetches `<base_url>/articles.atom` (retrying transport failures on
//! a fixed backoff schedule), decodes its entries, and streams the rendered
//! `README.md.tmpl` to the given writer.

pub mod category;
pub mod config;
pub mod feed;
pub mod render;

use anyhow::{Context, Result};
use std::io::Write;

use config::Config;
use feed::{Fetcher, HttpTransport};
use render::{RenderContext, TemplateHelpers};

/// Runs the whole pipeline once.
///
/// The fetch runs as a single background task that is awaited before any
/// output is produced, so a fetch or decode failure writes nothing.
pub async fn run<W: Write + ?Sized>(config: &Config, out: &mut W) -> Result<()> {
    let url = config.feed_url()?;
    let helpers = TemplateHelpers::from_config(config)?;

    let transport = HttpTransport::new(config.request_timeout(), config.max_feed_bytes)
        .context("Failed to build HTTP client")?;
    let fetcher = Fetcher::new(transport, config.backoff_schedule());

    tracing::debug!(url = %url, "Fetching articles");
    let task = tokio::spawn(async move { feed::fetch_entries(&fetcher, url.as_str()).await });
    let entries = task.await.context("Article fetch task failed")??;

    let context = RenderContext { entries };
    render::render(&context, &helpers, out)?;

    Ok(())
}
