//! List posts in the terminal, loading more pages on demand

use anyhow::Result;
use std::io::{self, BufRead, Write};

use crate::feed::FeedAccumulator;
use crate::helpers::Helpers;
use crate::i18n::I18n;
use crate::source::{ContentSource, Query};
use crate::Blog;

/// List posts from the configured Prismic repository.
///
/// With `all`, every page is loaded without prompting.
pub async fn run(blog: &Blog, all: bool) -> Result<()> {
    let source = blog.source()?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with(blog, source, all, stdin.lock(), stdout.lock()).await
}

/// List posts from `source`, reading answers from `input`
pub async fn run_with<S, R, W>(blog: &Blog, source: S, all: bool, mut input: R, mut out: W) -> Result<()>
where
    S: ContentSource,
    R: BufRead,
    W: Write,
{
    let prismic = &blog.config.prismic;
    let helpers = Helpers::new(blog.config.clone());
    let i18n = I18n::new(&blog.config.language);

    let query = Query::from_config(prismic);
    let feed = FeedAccumulator::start(source, &query, prismic.timeout()).await?;

    let mut shown = 0;
    loop {
        let state = feed.snapshot();
        for (i, post) in state.items().iter().enumerate().skip(shown) {
            let date = helpers.date(post.published_at.as_ref());
            writeln!(
                out,
                "{:>4}. {:<12} {} ({}) [{}]",
                i + 1,
                if date.is_empty() { "-" } else { date.as_str() },
                post.title,
                post.author,
                post.id
            )?;
        }
        shown = state.len();

        if !state.has_more() {
            break;
        }

        if !all {
            write!(out, "{} [Y/n] ", i18n.get("load_more"))?;
            out.flush()?;

            let mut answer = String::new();
            if input.read_line(&mut answer)? == 0 {
                writeln!(out)?;
                break;
            }
            let answer = answer.trim().to_lowercase();
            if !(answer.is_empty() || answer.starts_with('y') || answer.starts_with('s')) {
                break;
            }
        }

        feed.load_more().await?;
    }

    let state = feed.snapshot();
    writeln!(
        out,
        "Posts ({}){}",
        state.len(),
        if state.has_more() { ", more available" } else { "" }
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostSummary;
    use crate::source::{InMemorySource, Page};

    fn source() -> InMemorySource {
        let summary = |id: &str| PostSummary::new(id, None, format!("Title {}", id), "", "Ana");
        InMemorySource::from_pages(
            Page::new(
                vec![summary("a"), summary("b")],
                Some("page-2".to_string()),
            ),
            vec![("page-2".to_string(), Page::new(vec![summary("c")], None))],
        )
    }

    fn blog() -> (tempfile::TempDir, Blog) {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        (dir, blog)
    }

    #[tokio::test]
    async fn test_list_all() {
        let (_dir, blog) = blog();
        let mut out = Vec::new();
        run_with(&blog, source(), true, io::empty(), &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1. -"));
        assert!(text.contains("Title a (Ana) [a]"));
        assert!(text.contains("Title c (Ana) [c]"));
        assert!(text.contains("Posts (3)\n"));
        assert!(!text.contains("[Y/n]"));
    }

    #[tokio::test]
    async fn test_list_prompts_before_loading() {
        let (_dir, blog) = blog();
        let mut out = Vec::new();
        run_with(&blog, source(), false, "n\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[Y/n]"));
        assert!(!text.contains("[c]"));
        assert!(text.contains("Posts (2), more available"));
    }

    #[tokio::test]
    async fn test_list_loads_on_enter() {
        let (_dir, blog) = blog();
        let mut out = Vec::new();
        run_with(&blog, source(), false, "\n".as_bytes(), &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("[a]").count(), 1);
        assert!(text.contains("[c]"));
        assert!(text.contains("Posts (3)\n"));
    }
}
