//! Feed retrieval and decoding.
//!
//! - [`fetcher`] - Retrying HTTP GET with a fixed backoff schedule
//! - [`parser`] - Atom decoding into [`FeedEntry`] values
//!
//! [`fetch_entries`] chains the two and is what the binary runs on its
//! background task.

mod fetcher;
mod parser;

pub use fetcher::{FetchError, FetchedResponse, Fetcher, HttpTransport, Transport};
pub use parser::{decode, DecodeError, FeedEntry};

use thiserror::Error;

/// Anything that can go wrong between the URL and a list of entries.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Fetches `url` and decodes it as an Atom feed.
///
/// Transport failures are retried per the fetcher's schedule; a non-200
/// status or an undecodable body fails immediately.
pub async fn fetch_entries<T: Transport>(
    fetcher: &Fetcher<T>,
    url: &str,
) -> Result<Vec<FeedEntry>, FeedError> {
    let body = fetcher.fetch_ok(url).await?;
    let entries = decode(&body)?;

    tracing::info!(url = %url, entries = entries.len(), "Fetched articles");
    Ok(entries)
}
