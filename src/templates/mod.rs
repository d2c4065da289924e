//! Built-in theme using the Tera template engine
//!
//! Templates and default assets are embedded in the binary.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::helpers::html_escape;

/// Default stylesheet, written to `css/style.css`
pub const STYLESHEET: &str = include_str!("theme/style.css");

/// Default logo, written to `images/logo.svg`
pub const LOGO: &str = include_str!("theme/logo.svg");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Values are escaped explicitly with `html_escape`; URLs must stay intact
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
        ])?;

        tera.register_filter("html_escape", html_escape_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: escape HTML special characters
fn html_escape_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("html_escape", "value", String, value);
    Ok(tera::Value::String(html_escape(&s)))
}

// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub url: String,
    pub root: String,
    /// Logo `<img>` tag
    pub logo: String,
}

/// A post in the listing
#[derive(Debug, Clone, Serialize)]
pub struct PostCardData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Formatted publication date, empty when unpublished
    pub date: String,
    pub date_xml: String,
    /// Site path of the post page, empty when the page was not written
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationData {
    pub has_more: bool,
    pub next_link: String,
    /// Position of the first post the next listing adds
    pub anchor: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    /// Rendered rich text
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub date_xml: String,
    /// Localized label such as "4 min"
    pub reading_time: String,
    pub banner_url: String,
    pub banner_alt: String,
    pub sections: Vec<SectionData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConfigData {
        ConfigData {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),
            logo: r#"<img src="/images/logo.svg" alt="logo">"#.to_string(),
        }
    }

    fn strings() -> HashMap<String, String> {
        crate::i18n::I18n::new("pt-BR").get_all_translations()
    }

    fn card(id: &str, title: &str) -> PostCardData {
        PostCardData {
            title: title.to_string(),
            subtitle: "Sub".to_string(),
            author: "Ana".to_string(),
            date: "15 mar 2021".to_string(),
            date_xml: "2021-03-15T19:25:28.000+00:00".to_string(),
            path: format!("/post/{}/", id),
        }
    }

    #[test]
    fn test_render_index_with_more() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("config", &config());
        context.insert("strings", &strings());
        context.insert("meta_generator", "");
        context.insert("stylesheet", "");
        context.insert("posts", &vec![card("a", "Tom & Jerry")]);
        context.insert(
            "pagination",
            &PaginationData {
                has_more: true,
                next_link: "/page/2/".to_string(),
                anchor: 2,
            },
        );

        let html = renderer.render("index.html", &context).unwrap();
        assert!(html.contains("<title>Home | spacetraveling</title>"));
        assert!(html.contains(r#"href="/post/a/""#));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(html.contains("15 mar 2021"));
        assert!(html.contains(r#"href="/page/2/#post-2""#));
        assert!(html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_render_index_full_subtitle_and_unlinked_card() {
        let renderer = TemplateRenderer::new().unwrap();
        let subtitle = "word ".repeat(60);
        let mut unlinked = card("b", "Unlinked");
        unlinked.path = String::new();
        unlinked.subtitle = subtitle.clone();

        let mut context = Context::new();
        context.insert("config", &config());
        context.insert("strings", &strings());
        context.insert("meta_generator", "");
        context.insert("stylesheet", "");
        context.insert("posts", &vec![card("a", "Linked"), unlinked]);
        context.insert(
            "pagination",
            &PaginationData {
                has_more: false,
                next_link: String::new(),
                anchor: 3,
            },
        );

        let html = renderer.render("index.html", &context).unwrap();
        assert!(html.contains(subtitle.as_str()));
        assert!(!html.contains("..."));
        assert!(html.contains(r#"<a class="post" id="post-1" href="/post/a/">"#));
        assert!(html.contains(r#"<div class="post" id="post-2">"#));
        assert_eq!(html.matches(r#"href="/post/"#).count(), 1);
    }

    #[test]
    fn test_render_index_last_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut context = Context::new();
        context.insert("config", &config());
        context.insert("strings", &strings());
        context.insert("meta_generator", "");
        context.insert("stylesheet", "");
        context.insert("posts", &Vec::<PostCardData>::new());
        context.insert(
            "pagination",
            &PaginationData {
                has_more: false,
                next_link: String::new(),
                anchor: 1,
            },
        );

        let html = renderer.render("index.html", &context).unwrap();
        assert!(!html.contains("load-more"));
        assert!(html.contains("Nenhum post publicado ainda."));
    }
}
