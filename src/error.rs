//! Error types
//!
//! - `SourceError`: failures talking to the content source
//! - `PreconditionError`: a feed operation invoked in a state that forbids it
//! - `FeedError`: everything `load_more` can return

use std::time::Duration;
use thiserror::Error;

/// Content source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Document not found: {doc_type}/{uid}")]
    NotFound { doc_type: String, uid: String },

    #[error("Invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid document UID {0:?}")]
    InvalidUid(String),

    #[error("Repository has no master ref")]
    NoMasterRef,

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Feed operation invoked when it cannot run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("no more pages to load")]
    Exhausted,

    #[error("a page load is already in flight")]
    InFlight,
}

/// Errors returned by feed operations. None of them alter the feed state.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] SourceError),

    #[error("Precondition failed: {0}")]
    Precondition(#[from] PreconditionError),
}

impl FeedError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FeedError::Fetch(_) | FeedError::Precondition(PreconditionError::InFlight)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(FeedError::from(SourceError::NoMasterRef).is_retryable());
        assert!(FeedError::from(PreconditionError::InFlight).is_retryable());
        assert!(!FeedError::from(PreconditionError::Exhausted).is_retryable());
    }

    #[test]
    fn test_messages() {
        let err = SourceError::NotFound {
            doc_type: "posts".to_string(),
            uid: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "Document not found: posts/missing");
        assert_eq!(
            SourceError::InvalidUid("a\"b".to_string()).to_string(),
            r#"Invalid document UID "a\"b""#
        );
        assert_eq!(
            FeedError::from(PreconditionError::Exhausted).to_string(),
            "Precondition failed: no more pages to load"
        );
    }
}
