//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateReport, Generator};
use crate::source::ContentSource;
use crate::Blog;

/// Generate the site from the configured Prismic repository
pub async fn run(blog: &Blog) -> Result<GenerateReport> {
    let source = blog.source()?;
    run_with_source(blog, source).await
}

/// Generate the site from any content source
pub async fn run_with_source<S: ContentSource>(blog: &Blog, source: S) -> Result<GenerateReport> {
    let start = std::time::Instant::now();

    let generator = Generator::new(blog)?;
    let report = generator.generate(source).await?;

    if !report.missing.is_empty() {
        tracing::warn!(
            "{} listed posts were not found: {}",
            report.missing.len(),
            report.missing.join(", ")
        );
    }

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} listing pages and {} posts in {:.2}s",
        report.listing_pages,
        report.posts,
        duration.as_secs_f64()
    );

    Ok(report)
}
