//! README rendering.
//!
//! The template lives in `templates/README.md.tmpl` and is compiled in by
//! askama. It sees the [`RenderContext`] as `context` and the
//! [`TemplateHelpers`] as `helpers`.
use askama::Template;
use chrono::{DateTime, FixedOffset, Utc};
use std::io::Write;
use thiserror::Error;

use crate::category::SymbolTable;
use crate::config::{Config, ConfigError};
use crate::feed::FeedEntry;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Template execution or the output sink failed. Output already written
    /// stays written.
    #[error("Error rendering README.md template")]
    Write(#[from] std::io::Error),
}

/// Everything the template iterates over.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub entries: Vec<FeedEntry>,
}

/// Functions callable from templates.
#[derive(Debug, Clone)]
pub struct TemplateHelpers {
    symbols: SymbolTable,
    offset: FixedOffset,
    date_format: String,
}

impl TemplateHelpers {
    /// `date_format` must be a valid strftime pattern; [`Config::load`]
    /// checks this for configured values.
    pub fn new(symbols: SymbolTable, offset: FixedOffset, date_format: impl Into<String>) -> Self {
        Self {
            symbols,
            offset,
            date_format: date_format.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.symbols.clone(),
            config.utc_offset()?,
            config.date_format.clone(),
        ))
    }

    pub fn symbol_for_categories(&self, categories: &[String]) -> &str {
        self.symbols.symbol_for(categories)
    }

    /// Calendar date of `at` in the configured offset, e.g. "March 4, 2024".
    pub fn format_date(&self, at: &DateTime<Utc>) -> String {
        at.with_timezone(&self.offset)
            .format(&self.date_format)
            .to_string()
    }
}

#[derive(Template)]
#[template(path = "README.md.tmpl", escape = "none")]
pub struct ReadmeTemplate<'a> {
    pub context: &'a RenderContext,
    pub helpers: &'a TemplateHelpers,
}

/// Streams the README for `context` into `out`.
pub fn render<W: Write + ?Sized>(
    context: &RenderContext,
    helpers: &TemplateHelpers,
    out: &mut W,
) -> Result<(), RenderError> {
    let template = ReadmeTemplate { context, helpers };
    write!(out, "{template}")?;
    out.flush()?;
    Ok(())
}
