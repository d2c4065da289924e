//! Show a single post

use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::helpers::Helpers;
use crate::i18n::I18n;
use crate::source::ContentSource;
use crate::Blog;

/// Print one post from the configured Prismic repository
pub async fn run(blog: &Blog, uid: &str) -> Result<()> {
    let source = blog.source()?;
    run_with(blog, &source, uid, io::stdout().lock()).await
}

/// Print metadata, reading time and plain text of the post `uid`
pub async fn run_with<S, W>(blog: &Blog, source: &S, uid: &str, mut out: W) -> Result<()>
where
    S: ContentSource + ?Sized,
    W: Write,
{
    let post = source
        .get_by_uid(&blog.config.prismic.document_type, uid)
        .await
        .with_context(|| format!("Failed to load post {}", uid))?;

    let helpers = Helpers::new(blog.config.clone());
    let i18n = I18n::new(&blog.config.language);
    let minutes = helpers.reading_time(post.word_count());

    writeln!(out, "{}", post.title)?;
    if !post.subtitle.is_empty() {
        writeln!(out, "{}", post.subtitle)?;
    }
    writeln!(out)?;
    writeln!(out, "  Author:  {}", post.author)?;
    let date = helpers.date(post.published_at.as_ref());
    if !date.is_empty() {
        writeln!(out, "  Date:    {}", date)?;
    }
    writeln!(out, "  Reading: {}", i18n.get_count("reading_time", minutes))?;
    writeln!(out, "  Path:    {}", helpers.post_path(&post.id))?;

    for group in &post.content {
        writeln!(out)?;
        writeln!(out, "## {}", group.heading)?;
        writeln!(out, "{}", group.body.as_text("\n"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Banner, Block, BlockKind, ContentGroup, Post, RichText};
    use crate::source::InMemorySource;

    #[tokio::test]
    async fn test_show_post() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();

        let post = Post {
            id: "hello".to_string(),
            published_at: None,
            title: "Hello".to_string(),
            subtitle: "World".to_string(),
            author: "Ana".to_string(),
            banner: Banner::default(),
            content: vec![ContentGroup {
                heading: "First".to_string(),
                body: RichText(vec![
                    Block::new(BlockKind::Paragraph, "one two"),
                    Block::new(BlockKind::Paragraph, "three"),
                ]),
            }],
        };
        let source = InMemorySource::from_posts(vec![post], 4);

        let mut out = Vec::new();
        run_with(&blog, &source, "hello", &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Hello\nWorld\n"));
        assert!(text.contains("Reading: 1 min"));
        assert!(text.contains("Path:    /post/hello/"));
        assert!(text.contains("## First\none two\nthree\n"));
        assert!(!text.contains("Date:"));
    }

    #[tokio::test]
    async fn test_show_missing_post() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let source = InMemorySource::from_posts(Vec::new(), 4);

        let err = run_with(&blog, &source, "nope", io::sink()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Document not found: posts/nope"));
    }
}
