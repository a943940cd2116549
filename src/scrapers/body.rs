//! Body-text fetch: follow an article's link and pull its paragraphs.

use super::get_text;
use crate::error::{FetchError, MissingLinkError, PipelineError};
use crate::models::{Article, Source};
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{info, instrument};

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Populates an article's body text.
pub trait BodyFetch {
    async fn fetch_body(&self, article: Article) -> Result<Article, PipelineError>;
}

#[derive(Debug, Clone)]
pub struct BodyFetcher {
    client: reqwest::Client,
}

impl BodyFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl BodyFetch for BodyFetcher {
    #[instrument(level = "info", skip_all, fields(source = %article.source, web_id = %article.web_id))]
    async fn fetch_body(&self, article: Article) -> Result<Article, PipelineError> {
        if article.link.trim().is_empty() {
            return Err(MissingLinkError {
                title: article.title,
            }
            .into());
        }

        info!(link = %article.link, "Fetching article text");
        let html = get_text(&self.client, article.source, &article.link).await?;
        let text = extract_body_text(&html, article.source)?;
        info!(chars = text.len(), "Parsed article text");
        Ok(article.with_text(text))
    }
}

/// Join the trimmed text of every paragraph inside the source's article
/// container with single spaces.
pub fn extract_body_text(html: &str, source: Source) -> Result<String, FetchError> {
    let container_selector =
        Selector::parse(source.body_container()).map_err(|e| FetchError::Malformed {
            source_name: source,
            message: e.to_string(),
        })?;

    let document = Html::parse_document(html);
    let container = document
        .select(&container_selector)
        .next()
        .ok_or(FetchError::MissingElement {
            source_name: source,
            element: source.body_container(),
        })?;

    let paragraphs = container
        .select(&PARAGRAPH_SELECTOR)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>();
    Ok(paragraphs.join(" "))
}
