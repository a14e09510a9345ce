use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, FeedType};
use feed_rs::parser;
use thiserror::Error;

use crate::category::is_known_term;

/// Errors produced while turning feed bytes into entries.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not well-formed XML, or not recognizable as a feed at all
    #[error("Error unmarshaling Atom feed XML")]
    Parse(#[from] parser::ParseFeedError),
    /// A valid feed, but RSS/JSON Feed rather than Atom
    #[error("Expected an Atom feed, found {0:?}")]
    NotAtom(FeedType),
    /// Entry has neither `published` nor `updated`
    #[error("Entry '{title}' has no published timestamp")]
    MissingPublished { title: String },
}

/// One article from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Category terms in document order.
    pub categories: Vec<String>,
    pub link: String,
    pub summary: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// Decodes an Atom document into its entries, preserving document order.
pub fn decode(bytes: &[u8]) -> Result<Vec<FeedEntry>, DecodeError> {
    let feed = parser::parse(bytes)?;

    if feed.feed_type != FeedType::Atom {
        return Err(DecodeError::NotAtom(feed.feed_type));
    }

    feed.entries.into_iter().map(entry_from_atom).collect()
}

fn entry_from_atom(entry: Entry) -> Result<FeedEntry, DecodeError> {
    let title = entry.title.map(|t| t.content).unwrap_or_default();

    let published_at = entry
        .published
        .or(entry.updated)
        .ok_or_else(|| DecodeError::MissingPublished {
            title: title.clone(),
        })?;

    let categories: Vec<String> = entry.categories.into_iter().map(|c| c.term).collect();
    for term in categories.iter().filter(|t| !is_known_term(t)) {
        tracing::debug!(term = %term, title = %title, "Unrecognized category term");
    }

    Ok(FeedEntry {
        categories,
        link: entry
            .links
            .into_iter()
            .next()
            .map(|l| l.href)
            .unwrap_or_default(),
        summary: entry.summary.map(|s| s.content).unwrap_or_default(),
        title,
        published_at,
    })
}
