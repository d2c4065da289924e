//! In-memory content source for tests and offline previews

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::{ContentSource, Page, Query};
use crate::content::Post;
use crate::error::SourceError;

/// A content source backed by fixed pages
#[derive(Default)]
pub struct InMemorySource {
    first: Page,
    pages: HashMap<String, Page>,
    posts: HashMap<String, Post>,
    delay: Option<Duration>,
    fail_next: AtomicBool,
    fetches: AtomicUsize,
}

impl InMemorySource {
    /// Paginate `posts` in order, `page_size` per page
    pub fn from_posts(posts: Vec<Post>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let chunks: Vec<Vec<Post>> = posts.chunks(page_size).map(|c| c.to_vec()).collect();

        let mut source = Self::default();
        for (i, chunk) in chunks.iter().enumerate() {
            let next_page = (i + 1 < chunks.len()).then(|| page_token(i + 2));
            let page = Page::new(chunk.iter().map(Post::summary).collect(), next_page);
            if i == 0 {
                source.first = page;
            } else {
                source.pages.insert(page_token(i + 1), page);
            }
        }
        source.posts = posts.into_iter().map(|p| (p.id.clone(), p)).collect();
        source
    }

    /// Serve explicit pages, each reachable through its token
    pub fn from_pages<I>(first: Page, rest: I) -> Self
    where
        I: IntoIterator<Item = (String, Page)>,
    {
        Self {
            first,
            pages: rest.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Serve full documents for `get_by_uid`
    pub fn with_posts<I: IntoIterator<Item = Post>>(mut self, posts: I) -> Self {
        self.posts
            .extend(posts.into_iter().map(|p| (p.id.clone(), p)));
        self
    }

    /// Delay every page request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next page request fail
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of `fetch_page` calls served so far, failed ones included
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn simulate_network(&self) -> Result<(), SourceError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SourceError::Api {
                status: 503,
                message: "simulated outage".to_string(),
            });
        }
        Ok(())
    }
}

fn page_token(page: usize) -> String {
    format!("memory://documents?page={}", page)
}

#[async_trait]
impl ContentSource for InMemorySource {
    async fn query_first_page(&self, _query: &Query) -> Result<Page, SourceError> {
        self.simulate_network().await?;
        Ok(self.first.clone())
    }

    async fn fetch_page(&self, token: &str) -> Result<Page, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_network().await?;
        self.pages
            .get(token)
            .cloned()
            .ok_or_else(|| SourceError::Api {
                status: 404,
                message: format!("unknown page token {}", token),
            })
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Post, SourceError> {
        self.posts
            .get(uid)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}
