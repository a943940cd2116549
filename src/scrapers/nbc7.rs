//! NBC 7 San Diego traffic feed adapter.
//!
//! NBC 7 serves its traffic section as a WordPress JSON template. Stories
//! sit under `template_items.items`; summaries arrive as HTML fragments.

use super::{SourceAdapter, get_text};
use crate::error::FetchError;
use crate::models::{Article, Source};
use crate::utils::{collapse_whitespace, html_to_text, parse_timestamp};
use serde::Deserialize;
use tracing::{info, instrument};

pub const FEED_URL: &str =
    "https://www.nbcsandiego.com/wp-json/nbc/v1/template/term/1:13:461?page=1";

#[derive(Debug, Clone)]
pub struct Nbc7 {
    client: reqwest::Client,
}

impl Nbc7 {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SourceAdapter for Nbc7 {
    fn source(&self) -> Source {
        Source::Nbc7
    }

    #[instrument(level = "info", skip_all, fields(source = "NBC7"))]
    async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        let body = get_text(&self.client, Source::Nbc7, FEED_URL).await?;
        let articles = parse_feed(&body)?;
        info!(count = articles.len(), "Fetched articles from NBC7");
        Ok(articles)
    }
}

#[derive(Debug, Deserialize)]
struct Feed {
    template_items: TemplateItems,
}

#[derive(Debug, Deserialize)]
struct TemplateItems {
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    title: String,
    summary: String,
    date_time: String,
    post_noid: serde_json::Value,
    link: String,
}

/// Parse one page of the JSON feed into articles.
pub fn parse_feed(body: &str) -> Result<Vec<Article>, FetchError> {
    let feed: Feed = serde_json::from_str(body).map_err(|e| FetchError::Malformed {
        source_name: Source::Nbc7,
        message: e.to_string(),
    })?;

    feed.template_items
        .items
        .into_iter()
        .map(|item| {
            let web_id = match &item.post_noid {
                serde_json::Value::String(s) => s.trim().to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                other => {
                    return Err(FetchError::Malformed {
                        source_name: Source::Nbc7,
                        message: format!("post_noid is neither a string nor a number: {other}"),
                    });
                }
            };
            let date_posted = parse_timestamp(Source::Nbc7, &item.date_time)?;

            Ok(Article::new(
                Source::Nbc7,
                web_id,
                collapse_whitespace(&item.title),
                item.link.trim(),
                Some(date_posted),
                Some(html_to_text(&item.summary)),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "template_items": {
            "items": [
                {
                    "title": "  Pedestrian, 63, seriously injured in El Cajon hit-and-run ",
                    "summary": "<p>The driver fled the scene on <b>Main Street</b>.</p>",
                    "date_time": "2025-08-12T06:15:00-0700",
                    "post_noid": "3921202",
                    "link": "https://www.nbcsandiego.com/news/local/pedestrian-63-seriously-injured-in-el-cajon-hit-and-run/3921202/"
                },
                {
                    "title": "City council meeting",
                    "summary": "",
                    "date_time": "2025-08-12T09:00:00-07:00",
                    "post_noid": 3921300,
                    "link": "https://www.nbcsandiego.com/news/local/city-council/3921300/"
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_feed_normalizes_items() {
        let articles = parse_feed(FEED).unwrap();
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.source, Source::Nbc7);
        assert_eq!(first.web_id, "3921202");
        assert_eq!(first.title, "Pedestrian, 63, seriously injured in El Cajon hit-and-run");
        assert_eq!(
            first.summary.as_deref(),
            Some("The driver fled the scene on Main Street.")
        );
        assert_eq!(
            first.date_posted.map(|d| d.to_rfc3339()),
            Some("2025-08-12T06:15:00-07:00".to_string())
        );
        assert!(first.text.is_none());
    }

    #[test]
    fn test_numeric_ids_and_empty_summaries() {
        let articles = parse_feed(FEED).unwrap();
        assert_eq!(articles[1].web_id, "3921300");
        assert!(articles[1].summary.is_none());
    }

    #[test]
    fn test_missing_items_is_malformed() {
        let err = parse_feed(r#"{"template_items": {}}"#).unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn test_item_missing_field_is_malformed() {
        let body = r#"{"template_items": {"items": [{"title": "x", "summary": "", "post_noid": "1", "link": "l"}]}}"#;
        assert!(matches!(
            parse_feed(body).unwrap_err(),
            FetchError::Malformed { .. }
        ));
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let body = r#"{"template_items": {"items": [{"title": "x", "summary": "", "date_time": "Tuesday", "post_noid": "1", "link": "l"}]}}"#;
        assert!(matches!(
            parse_feed(body).unwrap_err(),
            FetchError::Timestamp { .. }
        ));
    }
}
