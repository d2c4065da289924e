//! Content sources
//!
//! The blog never talks to the CMS directly: everything goes through the
//! [`ContentSource`] trait so generation and the feed can run against
//! Prismic or an in-memory fixture.

mod memory;
mod prismic;

pub use memory::InMemorySource;
pub use prismic::PrismicClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::{Post, PostSummary};
use crate::error::SourceError;

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<PostSummary>,
    /// Opaque cursor for the following page, `None` on the last one
    pub next_page: Option<String>,
}

impl Page {
    pub fn new(items: Vec<PostSummary>, next_page: Option<String>) -> Self {
        Self { items, next_page }
    }
}

/// Listing query
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Custom type to list
    pub doc_type: String,
    /// Fields to fetch, without the type prefix
    pub fields: Vec<String>,
    pub page_size: usize,
}

impl Query {
    pub fn new(doc_type: impl Into<String>, page_size: usize) -> Self {
        Self {
            doc_type: doc_type.into(),
            fields: Vec::new(),
            page_size,
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_config(config: &crate::config::PrismicConfig) -> Self {
        Self::new(&config.document_type, config.page_size).with_fields(config.fields.clone())
    }
}

/// A paginated content repository
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// First page of documents matching `query`
    async fn query_first_page(&self, query: &Query) -> Result<Page, SourceError>;

    /// Page addressed by a token taken from a previous [`Page::next_page`]
    async fn fetch_page(&self, token: &str) -> Result<Page, SourceError>;

    /// Full document by type and UID
    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Post, SourceError>;
}

#[async_trait]
impl<S: ContentSource + ?Sized> ContentSource for std::sync::Arc<S> {
    async fn query_first_page(&self, query: &Query) -> Result<Page, SourceError> {
        (**self).query_first_page(query).await
    }

    async fn fetch_page(&self, token: &str) -> Result<Page, SourceError> {
        (**self).fetch_page(token).await
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Post, SourceError> {
        (**self).get_by_uid(doc_type, uid).await
    }
}
