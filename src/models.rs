//! Data models for collected articles and their stored representation.
//!
//! - [`Article`]: the normalized record produced by a source adapter and
//!   carried through every pipeline stage
//! - [`Relevance`]: the tri-state outcome of the relevance engine, with the
//!   extracted [`Collision`] details when the engine provides them
//! - [`ArticleRow`]: one row of the stored dataset, the shape written to CSV
//!   and served as JSON by the read service
//!
//! An [`Article`] moves through the pipeline by value. Each stage consumes
//! the record and hands back a new one carrying that stage's additions
//! ([`Article::with_text`], [`Article::with_relevance`]).

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use uuid::Uuid;

/// The upstream news providers the collector knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "FOX5")]
    Fox5,
    #[serde(rename = "NBC7")]
    Nbc7,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Fox5, Source::Nbc7];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Fox5 => "FOX5",
            Source::Nbc7 => "NBC7",
        }
    }

    /// CSS selector of the element holding an article's paragraphs on this
    /// source's article pages.
    pub fn body_container(&self) -> &'static str {
        match self {
            Source::Fox5 => "div.article-content",
            Source::Nbc7 => "div.article-content, div.article-body",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of a logical article across runs: `(source, native id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub source: String,
    pub web_id: String,
}

/// Structured collision details extracted from a relevant article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub description: String,
    pub location: String,
    pub date: String,
}

/// Outcome of the relevance engine for one article.
///
/// Collision details only exist on the `Relevant` arm; the keyword engine
/// decides relevance without extracting them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Relevance {
    #[default]
    Unknown,
    Irrelevant,
    Relevant { collision: Option<Collision> },
}

impl Relevance {
    pub fn is_relevant(&self) -> Option<bool> {
        match self {
            Relevance::Unknown => None,
            Relevance::Irrelevant => Some(false),
            Relevance::Relevant { .. } => Some(true),
        }
    }

    pub fn collision(&self) -> Option<&Collision> {
        match self {
            Relevance::Relevant { collision } => collision.as_ref(),
            _ => None,
        }
    }
}

/// A normalized news article.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Surrogate key, generated at creation and independent of the source.
    pub id: Uuid,
    pub source: Source,
    /// The source's own identifier for the article.
    pub web_id: String,
    pub title: String,
    pub link: String,
    pub summary: Option<String>,
    /// Body text, absent until the body-fetch stage follows `link`.
    pub text: Option<String>,
    pub date_posted: Option<DateTime<FixedOffset>>,
    pub relevance: Relevance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Create an unclassified record with no body text.
    ///
    /// # Arguments
    ///
    /// * `source` - The provider the record came from
    /// * `web_id` - The provider's own identifier for the article
    /// * `title` - Headline as listed by the provider
    /// * `link` - Absolute URL of the article page
    /// * `date_posted` - Publication time, if the listing carries one
    /// * `summary` - Listing summary; an empty string is stored as absent
    ///
    /// A fresh surrogate `id` is generated and both audit timestamps are set
    /// to now.
    pub fn new(
        source: Source,
        web_id: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        date_posted: Option<DateTime<FixedOffset>>,
        summary: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source,
            web_id: web_id.into(),
            title: title.into(),
            link: link.into(),
            summary: summary.filter(|s| !s.is_empty()),
            text: None,
            date_posted,
            relevance: Relevance::Unknown,
            created_at: now,
            updated_at: now,
        }
    }

    /// Layer the body text onto the record.
    pub fn with_text(self, text: String) -> Self {
        Self {
            text: Some(text),
            updated_at: Utc::now(),
            ..self
        }
    }

    /// Layer the relevance outcome onto the record.
    pub fn with_relevance(self, relevance: Relevance) -> Self {
        Self {
            relevance,
            updated_at: Utc::now(),
            ..self
        }
    }
}

/// Column order of the stored dataset.
///
/// The first fourteen columns are the fixed contract the read service
/// depends on; `collision_description` trails so older readers that only
/// know the fixed set keep working.
pub const COLUMNS: [&str; 15] = [
    "id",
    "web_id",
    "title",
    "link",
    "date_posted",
    "summary",
    "source",
    "text",
    "unique_id",
    "created_at",
    "updated_at",
    "is_relevant",
    "collision_location",
    "collision_date",
    "collision_description",
];

/// One stored article. Field order matches [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRow {
    pub id: Uuid,
    pub web_id: String,
    pub title: String,
    pub link: String,
    pub date_posted: Option<DateTime<FixedOffset>>,
    pub summary: Option<String>,
    pub source: String,
    pub text: Option<String>,
    pub unique_id: String,
    #[serde(deserialize_with = "deserialize_audit_time")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_audit_time")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_tri_state")]
    pub is_relevant: Option<bool>,
    pub collision_location: Option<String>,
    pub collision_date: Option<String>,
    #[serde(default)]
    pub collision_description: Option<String>,
}

impl ArticleRow {
    pub fn identity(&self) -> Identity {
        Identity {
            source: self.source.clone(),
            web_id: self.web_id.clone(),
        }
    }
}

impl From<&Article> for ArticleRow {
    fn from(article: &Article) -> Self {
        let collision = article.relevance.collision();
        Self {
            id: article.id,
            web_id: article.web_id.clone(),
            title: article.title.clone(),
            link: article.link.clone(),
            date_posted: article.date_posted,
            summary: article.summary.clone(),
            source: article.source.to_string(),
            text: article.text.clone(),
            unique_id: format!("{}:{}", article.source, article.web_id),
            created_at: article.created_at,
            updated_at: article.updated_at,
            is_relevant: article.relevance.is_relevant(),
            collision_location: collision.and_then(|c| non_empty(&c.location)),
            collision_date: collision.and_then(|c| non_empty(&c.date)),
            collision_description: collision.and_then(|c| non_empty(&c.description)),
        }
    }
}

/// A blank CSV cell reads back as `None`, so blank fields are written as
/// absent in the first place.
fn non_empty(value: &str) -> Option<String> {
    Some(value.to_string()).filter(|v| !v.is_empty())
}

/// Offset-less timestamp layouts found in older stores, read as UTC.
const NAIVE_AUDIT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse an audit timestamp: RFC 3339 (or with a space separator), or a
/// naive `YYYY-MM-DD HH:MM:SS[.ffffff]` taken as UTC.
fn parse_audit_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(aware) = raw.parse::<DateTime<FixedOffset>>() {
        return Some(aware.with_timezone(&Utc));
    }
    NAIVE_AUDIT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_audit_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_audit_time(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid audit timestamp `{raw}`")))
}

/// Accepts `true`/`false` in any case, and a blank cell as unknown.
fn deserialize_tri_state<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(de::Error::custom(format!(
            "invalid is_relevant value `{other}`"
        ))),
    }
}
