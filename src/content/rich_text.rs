//! Prismic structured text
//!
//! A rich-text field is a list of blocks. Each block carries its plain
//! text plus a list of spans (character ranges) marking inline formatting.

use serde::{Deserialize, Serialize};

use crate::helpers::html_escape;

/// A rich-text field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<Block>);

/// Block-level element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Embed blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over `[start, end)` characters of the block text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

impl Block {
    /// Build a block with no spans
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }

    pub fn with_span(mut self, kind: SpanKind, start: usize, end: usize) -> Self {
        self.spans.push(Span {
            start,
            end,
            kind,
            data: None,
        });
        self
    }
}

impl RichText {
    /// Plain text of every block, joined with `separator`
    pub fn as_text(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Render to HTML
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<BlockKind> = None;

        for block in &self.0 {
            let list_kind = match block.kind {
                BlockKind::ListItem | BlockKind::OListItem => Some(block.kind),
                _ => None,
            };

            if open_list != list_kind {
                if let Some(kind) = open_list {
                    html.push_str(list_close_tag(kind));
                }
                if let Some(kind) = list_kind {
                    html.push_str(list_open_tag(kind));
                }
                open_list = list_kind;
            }

            render_block(block, &mut html);
        }

        if let Some(kind) = open_list {
            html.push_str(list_close_tag(kind));
        }

        html
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn list_open_tag(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OListItem {
        "<ol>"
    } else {
        "<ul>"
    }
}

fn list_close_tag(kind: BlockKind) -> &'static str {
    if kind == BlockKind::OListItem {
        "</ol>"
    } else {
        "</ul>"
    }
}

fn render_block(block: &Block, out: &mut String) {
    let tag = match block.kind {
        BlockKind::Paragraph => "p",
        BlockKind::Heading1 => "h1",
        BlockKind::Heading2 => "h2",
        BlockKind::Heading3 => "h3",
        BlockKind::Heading4 => "h4",
        BlockKind::Heading5 => "h5",
        BlockKind::Heading6 => "h6",
        BlockKind::Preformatted => "pre",
        BlockKind::ListItem | BlockKind::OListItem => "li",
        BlockKind::Image => {
            if let Some(url) = &block.url {
                out.push_str(&format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    html_escape(url),
                    html_escape(block.alt.as_deref().unwrap_or(""))
                ));
            }
            return;
        }
        BlockKind::Embed => {
            if let Some(embed) = &block.oembed {
                let html = embed.get("html").and_then(|v| v.as_str()).unwrap_or("");
                let kind = embed.get("type").and_then(|v| v.as_str()).unwrap_or("");
                out.push_str(&format!(
                    r#"<div data-oembed-type="{}">{}</div>"#,
                    html_escape(kind),
                    html
                ));
            }
            return;
        }
        BlockKind::Unknown => {
            tracing::debug!("Skipping unknown rich text block");
            return;
        }
    };

    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&render_spans(&block.text, &block.spans));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Apply spans to `text`, producing properly nested tags.
///
/// Overlapping spans that cannot nest are closed and reopened at the
/// boundary.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len && s.kind != SpanKind::Unknown)
        .collect();

    let mut bounds: Vec<usize> = vec![0, len];
    for span in &spans {
        bounds.push(span.start);
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut out = String::new();
    let mut stack: Vec<&Span> = Vec::new();

    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);

        // Outermost first: earlier start, then longer span
        let mut active: Vec<&Span> = spans
            .iter()
            .copied()
            .filter(|s| s.start <= from && s.end >= to)
            .collect();
        active.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let common = stack
            .iter()
            .zip(active.iter())
            .take_while(|(open, wanted)| std::ptr::eq(**open, **wanted))
            .count();

        while stack.len() > common {
            if let Some(span) = stack.pop() {
                out.push_str(close_tag(span));
            }
        }
        for span in &active[common..] {
            out.push_str(&open_tag(span));
            stack.push(span);
        }

        let segment: String = chars[from..to].iter().collect();
        out.push_str(&html_escape(&segment).replace('\n', "<br />"));
    }

    while let Some(span) = stack.pop() {
        out.push_str(close_tag(span));
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let data = span.data.as_ref();
            let url = data
                .and_then(|d| d.get("url"))
                .and_then(|v| v.as_str())
                .unwrap_or("#");
            let target = data
                .and_then(|d| d.get("target"))
                .and_then(|v| v.as_str())
                .map(|t| format!(r#" target="{}" rel="noopener""#, html_escape(t)))
                .unwrap_or_default();
            format!(r#"<a href="{}"{}>"#, html_escape(url), target)
        }
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(|v| v.as_str())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        SpanKind::Unknown => String::new(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label => "</span>",
        SpanKind::Unknown => "",
    }
}
