//! News source adapters and the per-article body fetch.
//!
//! Every adapter turns one upstream listing into normalized [`Article`]
//! records with no body text. The body text is fetched afterwards, the same
//! way for every source, by [`body::BodyFetcher`] following each record's
//! link.
//!
//! # Supported Sources
//!
//! | Source | Module | Method |
//! |--------|--------|--------|
//! | FOX 5 San Diego | [`fox5`] | Server-rendered traffic listing, HTML scraping |
//! | NBC 7 San Diego | [`nbc7`] | WordPress JSON template feed |
//!
//! A listing that no longer has the containers or fields an adapter expects
//! is a hard [`FetchError`], never a partial result.

pub mod body;
pub mod fox5;
pub mod nbc7;

use crate::error::FetchError;
use crate::models::{Article, Source};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use tracing::{debug, instrument};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// A news source that can list its current articles.
pub trait SourceAdapter {
    fn source(&self) -> Source;

    /// Fetch the source's listing and normalize every entry.
    async fn fetch(&self) -> Result<Vec<Article>, FetchError>;
}

/// The concrete adapters, selectable at runtime.
#[derive(Debug, Clone)]
pub enum NewsSource {
    Fox5(fox5::Fox5),
    Nbc7(nbc7::Nbc7),
}

impl NewsSource {
    pub fn new(source: Source, client: reqwest::Client) -> Self {
        match source {
            Source::Fox5 => NewsSource::Fox5(fox5::Fox5::new(client)),
            Source::Nbc7 => NewsSource::Nbc7(nbc7::Nbc7::new(client)),
        }
    }
}

impl SourceAdapter for NewsSource {
    fn source(&self) -> Source {
        match self {
            NewsSource::Fox5(a) => a.source(),
            NewsSource::Nbc7(a) => a.source(),
        }
    }

    async fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        match self {
            NewsSource::Fox5(a) => a.fetch().await,
            NewsSource::Nbc7(a) => a.fetch().await,
        }
    }
}

/// Request headers each site expects from a browser.
pub fn request_headers(source: Source) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    match source {
        Source::Fox5 => {
            headers.insert(
                ACCEPT,
                HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
            );
        }
        Source::Nbc7 => {
            headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/html;q=0.8"));
            headers.insert(
                REFERER,
                HeaderValue::from_static("https://www.nbcsandiego.com/news/local/"),
            );
        }
    }
    headers
}

/// GET `url` with the source's headers and return the body, failing on any
/// non-success status.
#[instrument(level = "debug", skip(client))]
pub(crate) async fn get_text(
    client: &reqwest::Client,
    source: Source,
    url: &str,
) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .headers(request_headers(source))
        .send()
        .await
        .map_err(|e| FetchError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            source_name: source,
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::network(url, e))?;
    debug!(bytes = body.len(), "Fetched page");
    Ok(body)
}
