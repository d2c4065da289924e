//! Prismic REST API client
//!
//! Talks to the v2 document API:
//! - `GET {endpoint}` lists refs; the master ref pins every query
//! - `GET {endpoint}/documents/search` runs predicate queries
//!
//! Pagination cursors are the `next_page` URLs returned by the API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::{ContentSource, Page, Query};
use crate::config::PrismicConfig;
use crate::content::{Banner, ContentGroup, Post, PostSummary, RichText};
use crate::error::SourceError;

/// HTTP client for a Prismic repository
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    timeout: Duration,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Create a client from the site's Prismic settings
    pub fn new(config: &PrismicConfig) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            anyhow::bail!(
                "No Prismic endpoint configured. Set prismic.endpoint in _config.yml or PRISMIC_API_ENDPOINT."
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            timeout: config.timeout(),
            master_ref: OnceCell::new(),
        })
    }

    /// Master ref of the repository, fetched once per client
    async fn master_ref(&self) -> Result<&str, SourceError> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let mut url = parse_url(&self.endpoint)?;
                self.authorize(&mut url);
                let info: ApiInfo = self.get_json(url).await?;
                info.refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or(SourceError::NoMasterRef)
            })
            .await?;
        Ok(reference.as_str())
    }

    /// Build a search URL for the given predicate
    async fn search_url(
        &self,
        predicate: &str,
        fetch: Option<String>,
        page_size: usize,
    ) -> Result<Url, SourceError> {
        let reference = self.master_ref().await?.to_string();
        let mut url = parse_url(&format!("{}/documents/search", self.endpoint))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", &reference);
            pairs.append_pair("q", &format!("[{}]", predicate));
            if let Some(fetch) = fetch.filter(|f| !f.is_empty()) {
                pairs.append_pair("fetch", &fetch);
            }
            pairs.append_pair("pageSize", &page_size.max(1).to_string());
        }
        self.authorize(&mut url);
        Ok(url)
    }

    /// Append the access token unless the URL already carries one
    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(k, _)| k == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
    }

    async fn search(&self, url: Url) -> Result<SearchResponse, SourceError> {
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        tracing::debug!("GET {}", redact(&url));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.request_error(e))?;

        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: api_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| SourceError::Deserialization(e.to_string()))
    }

    fn request_error(&self, e: reqwest::Error) -> SourceError {
        if e.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else {
            SourceError::Request(e)
        }
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn query_first_page(&self, query: &Query) -> Result<Page, SourceError> {
        let predicate = format!(r#"[at(document.type,"{}")]"#, query.doc_type);
        let fetch = query
            .fields
            .iter()
            .map(|f| format!("{}.{}", query.doc_type, f))
            .collect::<Vec<_>>()
            .join(",");

        let url = self.search_url(&predicate, Some(fetch), query.page_size).await?;
        let response = self.search(url).await?;
        tracing::debug!(
            "Fetched {} {} (next page: {})",
            response.results.len(),
            query.doc_type,
            response.next_page.is_some()
        );
        Ok(response.into_page())
    }

    async fn fetch_page(&self, token: &str) -> Result<Page, SourceError> {
        let mut url = parse_url(token)?;
        self.authorize(&mut url);
        Ok(self.search(url).await?.into_page())
    }

    async fn get_by_uid(&self, doc_type: &str, uid: &str) -> Result<Post, SourceError> {
        if uid.is_empty() || uid.contains(['"', '\\']) {
            return Err(SourceError::InvalidUid(uid.to_string()));
        }

        let predicate = format!(r#"[at(my.{}.uid,"{}")]"#, doc_type, uid);
        let url = self.search_url(&predicate, None, 1).await?;
        let response = self.search(url).await?;

        response
            .results
            .into_iter()
            .next()
            .map(Document::into_post)
            .ok_or_else(|| SourceError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}

fn parse_url(raw: &str) -> Result<Url, SourceError> {
    Url::parse(raw).map_err(|e| SourceError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// URL for logging, without the access token
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "access_token")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    clean.set_query(None);
    if !pairs.is_empty() {
        clean.query_pairs_mut().extend_pairs(pairs);
    }
    clean.to_string()
}

/// Pull the human-readable message out of an error body
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Parse Prismic timestamps such as `2021-03-15T19:25:28+0000`
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|d| d.with_timezone(&Utc))
        .ok()
}

/// Key text fields are plain strings; title fields are rich text
fn field_text(data: &serde_json::Value, key: &str) -> String {
    data.get(key).map(value_text).unwrap_or_default()
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(_) => serde_json::from_value::<RichText>(value.clone())
            .map(|rt| rt.as_text(" "))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// One `content` slice; a broken slice is skipped, not the whole post
fn content_group(uid: &str, index: usize, value: &serde_json::Value) -> Option<ContentGroup> {
    let body = match value.get("body") {
        None | Some(serde_json::Value::Null) => RichText::default(),
        Some(body) => match serde_json::from_value::<RichText>(body.clone()) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Skipping content section {} of {}: {}", index, uid, e);
                return None;
            }
        },
    };

    Some(ContentGroup {
        heading: field_text(value, "heading"),
        body,
    })
}

#[derive(Debug, Deserialize)]
struct ApiInfo {
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    next_page: Option<String>,
    #[serde(default)]
    results: Vec<Document>,
}

impl SearchResponse {
    fn into_page(self) -> Page {
        Page {
            items: self
                .results
                .into_iter()
                .filter_map(Document::into_summary)
                .collect(),
            next_page: self.next_page.filter(|n| !n.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    id: String,
    uid: Option<String>,
    first_publication_date: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

impl Document {
    fn published_at(&self) -> Option<DateTime<Utc>> {
        self.first_publication_date
            .as_deref()
            .and_then(parse_timestamp)
    }

    fn into_summary(self) -> Option<PostSummary> {
        let Some(uid) = self.uid.clone().filter(|u| !u.is_empty()) else {
            tracing::warn!("Leaving document {} out of the listing: it has no UID", self.id);
            return None;
        };

        Some(PostSummary {
            id: uid,
            published_at: self.published_at(),
            title: field_text(&self.data, "title"),
            subtitle: field_text(&self.data, "subtitle"),
            author: field_text(&self.data, "author"),
        })
    }

    fn into_post(self) -> Post {
        let banner = self
            .data
            .get("banner")
            .map(|b| Banner {
                url: b
                    .get("url")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string(),
                alt: b.get("alt").and_then(|v| v.as_str()).map(str::to_string),
            })
            .unwrap_or_default();

        let id = self.uid.clone().unwrap_or_else(|| self.id.clone());

        let content = match self.data.get("content") {
            Some(serde_json::Value::Array(groups)) => groups
                .iter()
                .enumerate()
                .filter_map(|(i, group)| content_group(&id, i, group))
                .collect(),
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(other) => {
                tracing::warn!("Ignoring content of {}: expected a list, got {}", id, other);
                Vec::new()
            }
        };

        Post {
            id,
            published_at: self.published_at(),
            title: field_text(&self.data, "title"),
            subtitle: field_text(&self.data, "subtitle"),
            author: field_text(&self.data, "author"),
            banner,
            content,
        }
    }
}
