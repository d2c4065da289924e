//! Helper functions for templates and commands

mod date;
mod html;
mod text;
mod url;

pub use date::*;
pub use html::*;
pub use text::*;
pub use url::*;

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;

/// Helpers bound to a site configuration
#[derive(Clone)]
pub struct Helpers {
    config: SiteConfig,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig) -> Self {
        Self { config }
    }

    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    pub fn full_url_for(&self, path: &str) -> String {
        full_url_for(&self.config, path)
    }

    pub fn post_path(&self, id: &str) -> String {
        post_path(&self.config, id)
    }

    pub fn listing_path(&self, page: usize) -> String {
        listing_path(&self.config, page)
    }

    /// Format a publication date with the site's format, language and
    /// timezone. Unpublished documents render as an empty string.
    pub fn date(&self, date: Option<&DateTime<Utc>>) -> String {
        date.map(|d| {
            format_date(
                d,
                &self.config.date_format,
                &self.config.language,
                &self.config.timezone,
            )
        })
        .unwrap_or_default()
    }

    pub fn reading_time(&self, words: usize) -> usize {
        reading_time(words, self.config.words_per_minute)
    }
}
