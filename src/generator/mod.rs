//! Generator module - renders the static site from a content source
//!
//! Output layout:
//! - `index.html`: the first page of posts
//! - `page/<n>/index.html`: the listing after n-1 "load more" steps,
//!   holding every post loaded so far
//! - `post/<slug>/index.html`: one page per post

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tera::Context;
use walkdir::WalkDir;

use crate::content::{Post, PostSummary};
use crate::error::{FeedError, SourceError};
use crate::feed::{FeedAccumulator, FeedState};
use crate::helpers::{self, date_xml, Helpers};
use crate::i18n::I18n;
use crate::source::{ContentSource, Query};
use crate::templates::{
    ConfigData, PaginationData, PostCardData, PostPageData, SectionData, TemplateRenderer, LOGO,
    STYLESHEET,
};
use crate::Blog;

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateReport {
    /// Listing pages written, home page included
    pub listing_pages: usize,
    /// Post pages written
    pub posts: usize,
    /// Listed posts whose document could not be found
    pub missing: Vec<String>,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    renderer: TemplateRenderer,
    helpers: Helpers,
    i18n: I18n,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;
        let helpers = Helpers::new(blog.config.clone());

        let mut i18n = I18n::new(&blog.config.language);
        i18n.load_languages(blog.base_dir.join(&blog.config.i18n_dir))?;

        Ok(Self {
            blog: blog.clone(),
            renderer,
            helpers,
            i18n,
        })
    }

    /// Generate the entire site
    pub async fn generate<S: ContentSource>(&self, source: S) -> Result<GenerateReport> {
        let public_dir = &self.blog.public_dir;
        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        self.write_default_assets()?;
        self.copy_static_assets()?;

        let prismic = &self.blog.config.prismic;
        let query = Query::from_config(prismic);
        let feed = FeedAccumulator::start(source, &query, prismic.timeout())
            .await
            .context("Failed to query the first page of posts")?;

        let mut listings = vec![feed.snapshot()];
        listings.extend(
            feed.load_all()
                .await
                .context("Failed to load the remaining listing pages")?,
        );

        let mut report = GenerateReport::default();

        // Post pages first, so listings only link to pages that exist.
        // A source may list the same post twice.
        let final_state = feed.snapshot();
        let mut seen = HashSet::new();
        for summary in final_state.items() {
            if !seen.insert(summary.id.as_str()) {
                tracing::debug!("Skipping duplicate listing entry {}", summary.id);
                continue;
            }

            match feed
                .source()
                .get_by_uid(&prismic.document_type, &summary.id)
                .await
            {
                Ok(post) => {
                    self.write_post(&post)?;
                    report.posts += 1;
                }
                Err(SourceError::NotFound { .. }) => {
                    tracing::warn!("Post {} is listed but could not be fetched", summary.id);
                    report.missing.push(summary.id.clone());
                }
                Err(e) => {
                    return Err(FeedError::from(e))
                        .with_context(|| format!("Failed to fetch post {}", summary.id));
                }
            }
        }

        // Home page, then one cumulative listing per "load more"
        let missing: HashSet<&str> = report.missing.iter().map(String::as_str).collect();
        for (i, state) in listings.iter().enumerate() {
            self.write_listing(state, i + 1, &missing)?;
        }
        report.listing_pages = listings.len();

        tracing::info!(
            "Generated {} listing pages ({} posts)",
            report.listing_pages,
            final_state.len()
        );
        tracing::info!("Generated {} post pages", report.posts);
        Ok(report)
    }

    fn build_config_data(&self) -> ConfigData {
        let config = &self.blog.config;
        ConfigData {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            root: self.helpers.url_for(""),
            logo: helpers::image_tag(config, "images/logo.svg", Some("logo")),
        }
    }

    /// Create a base context with common variables
    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("config", &self.build_config_data());
        context.insert("strings", &self.i18n.get_all_translations());
        context.insert("meta_generator", &helpers::meta_generator());
        context.insert("stylesheet", &helpers::css(&self.blog.config, "style"));
        context
    }

    /// Card for the listing; posts without a page get no link
    fn post_card(&self, summary: &PostSummary, missing: &HashSet<&str>) -> PostCardData {
        let path = if missing.contains(summary.id.as_str()) {
            String::new()
        } else {
            self.helpers.post_path(&summary.id)
        };

        PostCardData {
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: self.helpers.date(summary.published_at.as_ref()),
            date_xml: summary.published_at.map(|d| date_xml(&d)).unwrap_or_default(),
            path,
        }
    }

    fn post_page(&self, post: &Post) -> PostPageData {
        let minutes = self.helpers.reading_time(post.word_count());
        PostPageData {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            date: self.helpers.date(post.published_at.as_ref()),
            date_xml: post.published_at.map(|d| date_xml(&d)).unwrap_or_default(),
            reading_time: self.i18n.get_count("reading_time", minutes),
            banner_url: post.banner.url.clone(),
            banner_alt: post.banner.alt.clone().unwrap_or_else(|| post.title.clone()),
            sections: post
                .content
                .iter()
                .map(|group| SectionData {
                    heading: group.heading.clone(),
                    html: group.body.as_html(),
                })
                .collect(),
        }
    }

    /// Render the listing for `state`, the feed after `page - 1` loads
    fn write_listing(&self, state: &FeedState, page: usize, missing: &HashSet<&str>) -> Result<()> {
        let posts: Vec<PostCardData> = state
            .items()
            .iter()
            .map(|p| self.post_card(p, missing))
            .collect();

        let pagination = PaginationData {
            has_more: state.has_more(),
            next_link: if state.has_more() {
                self.helpers.listing_path(page + 1)
            } else {
                String::new()
            },
            anchor: posts.len() + 1,
        };

        let relative = if page == 1 {
            String::new()
        } else {
            format!("page/{}/", page)
        };

        let mut context = self.create_base_context();
        context.insert("canonical", &self.helpers.full_url_for(&relative));
        context.insert("posts", &posts);
        context.insert("pagination", &pagination);

        let html = self.renderer.render("index.html", &context)?;

        let output_path = self.blog.public_dir.join(relative).join("index.html");
        write_file(&output_path, &html)?;
        tracing::debug!("Generated: {:?}", output_path);

        Ok(())
    }

    fn write_post(&self, post: &Post) -> Result<()> {
        let mut context = self.create_base_context();
        let slug = helpers::post_slug(&post.id);
        context.insert(
            "canonical",
            &self.helpers.full_url_for(&format!("post/{}/", slug)),
        );
        context.insert("post", &self.post_page(post));

        let html = self.renderer.render("post.html", &context)?;

        let output_path = self
            .blog
            .public_dir
            .join("post")
            .join(slug)
            .join("index.html");
        write_file(&output_path, &html)?;
        tracing::debug!("Generated post: {:?}", output_path);

        Ok(())
    }

    /// Built-in stylesheet and logo; the site's static files may replace them
    fn write_default_assets(&self) -> Result<()> {
        let public_dir = &self.blog.public_dir;
        write_file(&public_dir.join("css/style.css"), STYLESHEET)?;
        write_file(&public_dir.join("images/logo.svg"), LOGO)?;
        Ok(())
    }

    /// Copy the static directory (images, css, ...) to the public directory
    fn copy_static_assets(&self) -> Result<()> {
        let static_dir = &self.blog.static_dir;
        if !static_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = self.blog.public_dir.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
        }

        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}
