//! Post feed with "load more" pagination
//!
//! [`FeedState`] is an immutable snapshot of the listing: the posts
//! accumulated so far plus the cursor for the next page. Loading more
//! never mutates a state; it produces a new one, so a failed load leaves
//! the caller holding exactly what it had before.
//!
//! [`FeedAccumulator`] is the owner used by a listing view. It keeps the
//! current snapshot, allows one load at a time, and bounds each load with
//! a timeout.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::content::PostSummary;
use crate::error::{FeedError, PreconditionError, SourceError};
use crate::source::{ContentSource, Page, Query};

/// Accumulated feed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    items: Vec<PostSummary>,
    next_page: Option<String>,
}

impl FeedState {
    /// Feed holding an already fetched first page
    pub fn initialize(page: Page) -> Self {
        Self {
            items: page.items,
            next_page: page.next_page,
        }
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether another page can be loaded
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Cursor the next load will use
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Fetch the next page with `fetch` and return the extended feed.
    ///
    /// Items are appended in arrival order with no deduplication. On any
    /// error `self` is untouched and `fetch` is not retried.
    pub async fn load_more_with<F, Fut>(&self, fetch: F) -> Result<FeedState, FeedError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Page, SourceError>>,
    {
        let token = self
            .next_page
            .clone()
            .ok_or(PreconditionError::Exhausted)?;

        let page = fetch(token).await?;

        let mut items = Vec::with_capacity(self.items.len() + page.items.len());
        items.extend_from_slice(&self.items);
        items.extend(page.items);

        Ok(FeedState {
            items,
            next_page: page.next_page,
        })
    }

    /// [`load_more_with`](Self::load_more_with) against a content source
    pub async fn load_more<S>(&self, source: &S) -> Result<FeedState, FeedError>
    where
        S: ContentSource + ?Sized,
    {
        self.load_more_with(|token| async move { source.fetch_page(&token).await })
            .await
    }
}

/// Owner of the feed shown by one listing view
pub struct FeedAccumulator<S> {
    source: S,
    state: RwLock<Arc<FeedState>>,
    in_flight: AtomicBool,
    timeout: Duration,
}

/// Clears the in-flight flag when a load finishes, fails, or is dropped
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, PreconditionError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| PreconditionError::InFlight)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: ContentSource> FeedAccumulator<S> {
    /// Wrap an already fetched first page
    pub fn new(source: S, first: Page, timeout: Duration) -> Self {
        Self {
            source,
            state: RwLock::new(Arc::new(FeedState::initialize(first))),
            in_flight: AtomicBool::new(false),
            timeout,
        }
    }

    /// Query the first page and build the feed from it
    pub async fn start(source: S, query: &Query, timeout: Duration) -> Result<Self, FeedError> {
        let first = match tokio::time::timeout(timeout, source.query_first_page(query)).await {
            Ok(page) => page?,
            Err(_) => return Err(SourceError::Timeout(timeout).into()),
        };
        tracing::debug!(
            "Feed started with {} posts (more: {})",
            first.items.len(),
            first.next_page.is_some()
        );
        Ok(Self::new(source, first, timeout))
    }

    /// Current feed
    pub fn snapshot(&self) -> Arc<FeedState> {
        match self.state.read() {
            Ok(state) => Arc::clone(&state),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether a load is currently running
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Load the next page and replace the current feed with the result.
    ///
    /// Rejected with [`PreconditionError::InFlight`] while another load is
    /// running and with [`PreconditionError::Exhausted`] once the last page
    /// has been seen. A fetch error or timeout leaves the feed as it was.
    pub async fn load_more(&self) -> Result<Arc<FeedState>, FeedError> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let current = self.snapshot();
        if !current.has_more() {
            return Err(PreconditionError::Exhausted.into());
        }

        let next = match tokio::time::timeout(self.timeout, current.load_more(&self.source)).await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("Loading more posts timed out after {:?}", self.timeout);
                return Err(SourceError::Timeout(self.timeout).into());
            }
        };

        let next = Arc::new(next);
        match self.state.write() {
            Ok(mut state) => *state = Arc::clone(&next),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&next),
        }

        tracing::debug!(
            "Feed now holds {} posts (more: {})",
            next.len(),
            next.has_more()
        );
        Ok(next)
    }

    /// Keep loading until the last page, returning every intermediate
    /// feed after the first
    pub async fn load_all(&self) -> Result<Vec<Arc<FeedState>>, FeedError> {
        let mut states = Vec::new();
        while self.snapshot().has_more() {
            states.push(self.load_more().await?);
        }
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;
    use std::sync::atomic::AtomicUsize;

    fn post(id: &str) -> PostSummary {
        PostSummary::new(id, None, id.to_uppercase(), "", "Ana")
    }

    fn posts(ids: &[&str]) -> Vec<PostSummary> {
        ids.iter().map(|id| post(id)).collect()
    }

    fn ids(state: &FeedState) -> Vec<&str> {
        state.items().iter().map(|p| p.id.as_str()).collect()
    }

    /// A, B, C, D then E, F
    fn two_page_source() -> InMemorySource {
        InMemorySource::from_pages(
            Page::new(posts(&["a", "b", "c", "d"]), Some("p2".to_string())),
            [("p2".to_string(), Page::new(posts(&["e", "f"]), None))],
        )
    }

    #[test]
    fn test_initialize_last_page() {
        let state = FeedState::initialize(Page::new(posts(&["a", "b"]), None));
        assert!(!state.has_more());
        assert_eq!(ids(&state), ["a", "b"]);
    }

    #[test]
    fn test_initialize_with_more() {
        let state = FeedState::initialize(Page::new(posts(&["a"]), Some("p2".to_string())));
        assert!(state.has_more());
        assert_eq!(state.next_page(), Some("p2"));
    }

    #[tokio::test]
    async fn test_load_more_appends_and_finishes() {
        let source = two_page_source();
        let first = source.query_first_page(&Query::new("posts", 4)).await.unwrap();

        let state = FeedState::initialize(first);
        assert_eq!(ids(&state), ["a", "b", "c", "d"]);
        assert!(state.has_more());

        let next = state.load_more(&source).await.unwrap();
        assert_eq!(ids(&next), ["a", "b", "c", "d", "e", "f"]);
        assert!(!next.has_more());

        // The previous state is still intact
        assert_eq!(state.len(), 4);

        let err = next.load_more(&source).await.unwrap_err();
        assert!(matches!(
            err,
            FeedError::Precondition(PreconditionError::Exhausted)
        ));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_load_more_passes_token_and_keeps_duplicates() {
        let state = FeedState::initialize(Page::new(posts(&["a", "b"]), Some("cursor-1".into())));
        let seen = std::sync::Mutex::new(Vec::new());

        let next = state
            .load_more_with(|token| {
                seen.lock().unwrap().push(token);
                async { Ok(Page::new(posts(&["b", "a", "c"]), Some("cursor-2".into()))) }
            })
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), ["cursor-1"]);
        assert_eq!(ids(&next), ["a", "b", "b", "a", "c"]);
        assert_eq!(next.next_page(), Some("cursor-2"));
    }

    #[tokio::test]
    async fn test_length_is_sum_of_pages() {
        let sizes = [3usize, 1, 0, 5];
        let mut state = FeedState::initialize(Page::new(posts(&["x", "y"]), Some("0".into())));
        let mut expected = state.len();

        for (i, size) in sizes.iter().enumerate() {
            let more = i + 1 < sizes.len();
            let batch: Vec<PostSummary> = (0..*size).map(|n| post(&format!("{}-{}", i, n))).collect();
            expected += batch.len();
            state = state
                .load_more_with(|_| async move {
                    Ok(Page::new(batch, more.then(|| (i + 1).to_string())))
                })
                .await
                .unwrap();
        }

        assert_eq!(state.len(), expected);
        assert_eq!(state.items()[0].id, "x");
        assert_eq!(state.items()[2].id, "0-0");
        assert_eq!(state.items().last().unwrap().id, "3-4");
        assert!(!state.has_more());
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_state() {
        let state = FeedState::initialize(Page::new(posts(&["a"]), Some("p2".into())));
        let before = state.clone();

        let err = state
            .load_more_with(|_| async {
                Err(SourceError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Fetch(_)));
        assert!(err.is_retryable());
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn test_exhausted_does_not_fetch() {
        let calls = AtomicUsize::new(0);
        let state = FeedState::initialize(Page::new(posts(&["a"]), None));

        let err = state
            .load_more_with(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Page::default()) }
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            FeedError::Precondition(PreconditionError::Exhausted)
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(ids(&state), ["a"]);
    }

    #[tokio::test]
    async fn test_accumulator_scenario() {
        let query = Query::new("posts", 4);
        let feed = FeedAccumulator::start(two_page_source(), &query, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(ids(&feed.snapshot()), ["a", "b", "c", "d"]);

        let next = feed.load_more().await.unwrap();
        assert_eq!(ids(&next), ["a", "b", "c", "d", "e", "f"]);
        assert!(!feed.snapshot().has_more());

        let err = feed.load_more().await.unwrap_err();
        assert!(matches!(
            err,
            FeedError::Precondition(PreconditionError::Exhausted)
        ));
        assert_eq!(feed.snapshot().len(), 6);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_accumulator_retries_after_failure() {
        let query = Query::new("posts", 4);
        let feed = FeedAccumulator::start(two_page_source(), &query, Duration::from_secs(5))
            .await
            .unwrap();
        let before = feed.snapshot();

        feed.source().fail_next();
        let err = feed.load_more().await.unwrap_err();
        assert!(matches!(err, FeedError::Fetch(_)));
        assert_eq!(*feed.snapshot(), *before);
        assert!(feed.snapshot().has_more());

        let next = feed.load_more().await.unwrap();
        assert_eq!(next.len(), 6);
    }

    #[tokio::test]
    async fn test_overlapping_loads_are_rejected() {
        let source = two_page_source().with_delay(Duration::from_millis(50));
        let feed = FeedAccumulator::new(
            source,
            Page::new(posts(&["a", "b", "c", "d"]), Some("p2".to_string())),
            Duration::from_secs(5),
        );

        let (first, second) = tokio::join!(feed.load_more(), feed.load_more());

        assert_eq!(first.unwrap().len(), 6);
        assert!(matches!(
            second,
            Err(FeedError::Precondition(PreconditionError::InFlight))
        ));
        assert_eq!(feed.source().fetch_count(), 1);
        assert_eq!(feed.snapshot().len(), 6);
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_timeout_keeps_state_and_releases_guard() {
        let source = two_page_source().with_delay(Duration::from_millis(200));
        let feed = FeedAccumulator::new(
            source,
            Page::new(posts(&["a", "b", "c", "d"]), Some("p2".to_string())),
            Duration::from_millis(20),
        );

        let err = feed.load_more().await.unwrap_err();
        assert!(matches!(err, FeedError::Fetch(SourceError::Timeout(_))));
        assert_eq!(feed.snapshot().len(), 4);
        assert!(feed.snapshot().has_more());
        assert!(!feed.is_loading());
    }

    #[tokio::test]
    async fn test_load_all() {
        let all: Vec<crate::content::Post> = (0..9)
            .map(|i| crate::content::Post {
                id: format!("post-{}", i),
                published_at: None,
                title: String::new(),
                subtitle: String::new(),
                author: String::new(),
                banner: Default::default(),
                content: Vec::new(),
            })
            .collect();
        let source = InMemorySource::from_posts(all, 4);
        let feed = FeedAccumulator::start(source, &Query::new("posts", 4), Duration::from_secs(5))
            .await
            .unwrap();

        let states = feed.load_all().await.unwrap();
        let lens: Vec<usize> = states.iter().map(|s| s.len()).collect();
        assert_eq!(lens, [8, 9]);
        assert_eq!(feed.snapshot().items()[8].id, "post-8");
    }
}
