//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RichText;
use crate::helpers::{count_words, reading_time};

/// One entry in the post listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Document UID, used as the URL slug
    pub id: String,

    /// First publication date, absent for documents never published
    pub published_at: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    pub fn new(
        id: impl Into<String>,
        published_at: Option<DateTime<Utc>>,
        title: impl Into<String>,
        subtitle: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            published_at,
            title: title.into(),
            subtitle: subtitle.into(),
            author: author.into(),
        }
    }
}

/// Banner image shown above a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentGroup {
    pub heading: String,
    pub body: RichText,
}

/// A full post document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub published_at: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner: Banner,
    pub content: Vec<ContentGroup>,
}

impl Post {
    /// Listing entry for this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.id.clone(),
            published_at: self.published_at,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }

    /// Headings and body text of every section, whitespace separated
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|group| format!("{} {}", group.heading, group.body.as_text(" ")))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn word_count(&self) -> usize {
        count_words(&self.plain_text())
    }

    /// Estimated reading time in minutes
    pub fn reading_time(&self, words_per_minute: usize) -> usize {
        reading_time(self.word_count(), words_per_minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Block, BlockKind};

    fn group(heading: &str, paragraphs: &[&str]) -> ContentGroup {
        ContentGroup {
            heading: heading.to_string(),
            body: RichText(
                paragraphs
                    .iter()
                    .map(|p| Block::new(BlockKind::Paragraph, *p))
                    .collect(),
            ),
        }
    }

    fn post(content: Vec<ContentGroup>) -> Post {
        Post {
            id: "hello".to_string(),
            published_at: None,
            title: "Hello".to_string(),
            subtitle: "Sub".to_string(),
            author: "Ana".to_string(),
            banner: Banner::default(),
            content,
        }
    }

    #[test]
    fn test_reading_time_400_words() {
        // Heading (1 word) + 399 body words
        let body = vec!["word"; 399].join(" ");
        let p = post(vec![group("Intro", &[&body])]);
        assert_eq!(p.word_count(), 400);
        assert_eq!(p.reading_time(200), 2);
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let body = vec!["word"; 200].join(" ");
        let p = post(vec![group("Intro", &[&body])]);
        assert_eq!(p.word_count(), 201);
        assert_eq!(p.reading_time(200), 2);
    }

    #[test]
    fn test_sections_do_not_merge_words() {
        let p = post(vec![group("One", &["alpha"]), group("Two", &["beta", "gamma"])]);
        assert_eq!(p.plain_text(), "One alpha Two beta gamma");
        assert_eq!(p.word_count(), 5);
    }

    #[test]
    fn test_summary() {
        let p = post(Vec::new());
        let s = p.summary();
        assert_eq!(s.id, "hello");
        assert_eq!(s.author, "Ana");
        assert_eq!(p.reading_time(200), 0);
    }
}
