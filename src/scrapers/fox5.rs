//! FOX 5 San Diego traffic listing scraper.
//!
//! FOX 5 renders its traffic page server-side, so the listing is scraped
//! straight out of the HTML: one `article` element per story inside
//! `div.article-list__content`, carrying the native id in
//! `data-article-id`, the link and headline in
//! `a.article-list__article-link`, and an optional `time[datetime]`.

use super::{SourceAdapter, get_text};
use crate::error::FetchError;
use crate::models::{Article, Source};
use crate::utils::{collapse_whitespace, parse_timestamp};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

pub const TRAFFIC_PAGE_URL: &str = "https://fox5sandiego.com/traffic/";

const CONTAINER: &str = "div.article-list__content";
const ARTICLE_LINK: &str = "a.article-list__article-link";

static CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(CONTAINER).unwrap());
static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(ARTICLE_LINK).unwrap());
static TIME_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("time").unwrap());
static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse(TRAFFIC_PAGE_URL).unwrap());

#[derive(Debug, Clone)]
pub struct Fox5 {
    client: reqwest::Client,
}

impl Fox5 {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl SourceAdapter for Fox5 {
    fn source(&self) -> Source {
        Source::Fox5
    }

    #[instrument(level = "info", skip_all, fields(source = "FOX5"))]
    async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        let html = get_text(&self.client, Source::Fox5, TRAFFIC_PAGE_URL).await?;
        let articles = parse_listing(&html)?;
        info!(count = articles.len(), "Fetched articles from FOX5");
        Ok(articles)
    }
}

/// Parse the traffic listing page into articles.
pub fn parse_listing(html: &str) -> Result<Vec<Article>, FetchError> {
    let document = Html::parse_document(html);
    let container = document
        .select(&CONTAINER_SELECTOR)
        .next()
        .ok_or(missing(CONTAINER))?;

    let articles = container
        .select(&ARTICLE_SELECTOR)
        .map(parse_entry)
        .collect::<Result<Vec<_>, _>>()?;
    debug!(count = articles.len(), "Parsed FOX5 listing");
    Ok(articles)
}

fn parse_entry(entry: ElementRef<'_>) -> Result<Article, FetchError> {
    let anchor = entry
        .select(&LINK_SELECTOR)
        .next()
        .ok_or(missing(ARTICLE_LINK))?;
    let href = anchor
        .value()
        .attr("href")
        .ok_or(missing("href on the article link"))?;
    let link = BASE_URL
        .join(href.trim())
        .map_err(|e| FetchError::Malformed {
            source_name: Source::Fox5,
            message: format!("article link `{href}`: {e}"),
        })?;

    let title = collapse_whitespace(&anchor.text().collect::<String>());
    let web_id = entry
        .value()
        .attr("data-article-id")
        .ok_or(missing("data-article-id"))?
        .trim();

    let date_posted = match entry.select(&TIME_SELECTOR).next() {
        Some(time) => {
            let raw = time
                .value()
                .attr("datetime")
                .ok_or(missing("datetime on the time element"))?;
            Some(parse_timestamp(Source::Fox5, raw)?)
        }
        None => None,
    };

    Ok(Article::new(
        Source::Fox5,
        web_id,
        title,
        link.to_string(),
        date_posted,
        None,
    ))
}

fn missing(element: &'static str) -> FetchError {
    FetchError::MissingElement {
        source_name: Source::Fox5,
        element,
    }
}
