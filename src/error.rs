//! Error taxonomy for a collector run.
//!
//! Every failure that can end a run is one of three kinds:
//! - [`FetchError`]: a news source could not be read, or its response no
//!   longer has the shape the adapter expects
//! - [`MissingLinkError`]: a record has no link to follow for its body text
//! - [`ClassificationError`]: the relevance engine could not produce a
//!   schema-conforming answer
//!
//! [`PipelineError`] unions them for the collector's callers. Storage
//! failures are absent: reads recover to an empty dataset and
//! writes report a boolean (see [`crate::store`]).

use crate::models::Source;
use std::path::PathBuf;
use thiserror::Error;

/// A source adapter or body fetch failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("{source_name} returned HTTP {status} for {url}")]
    Status {
        source_name: Source,
        url: String,
        status: u16,
    },

    #[error("{source_name}: expected {element} was not found in the response")]
    MissingElement {
        source_name: Source,
        element: &'static str,
    },

    #[error("{source_name}: response did not match the feed schema: {message}")]
    Malformed { source_name: Source, message: String },

    #[error("{source_name}: could not parse timestamp `{value}`")]
    Timestamp { source_name: Source, value: String },
}

impl FetchError {
    pub(crate) fn network(url: &str, err: reqwest::Error) -> Self {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// A record reached the body-text step without a link to follow.
#[derive(Debug, Error)]
#[error("article `{title}` has no link to fetch its text from")]
pub struct MissingLinkError {
    pub title: String,
}

/// The text-generation call failed or returned something unusable.
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("transport error talking to the model: {0}")]
    Transport(String),

    #[error("model API error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("model returned no candidate text")]
    EmptyResponse,

    #[error("model response does not match the collision schema: {0}")]
    Schema(#[from] serde_json::Error),
}

impl ClassificationError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassificationError::Transport(_) => true,
            ClassificationError::Status { status, .. } => *status == 429 || *status >= 500,
            ClassificationError::EmptyResponse | ClassificationError::Schema(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClassificationError {
    fn from(err: reqwest::Error) -> Self {
        ClassificationError::Transport(err.to_string())
    }
}

/// A configuration file named on the command line could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    MissingLink(#[from] MissingLinkError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),
}
