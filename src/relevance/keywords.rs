//! Keyword-heuristic relevance.
//!
//! An article is relevant when any keyword stem of its source occurs in the
//! lowercased `title + " " + summary`. A source with no stems lets every
//! article through, which is how a source whose listing is already
//! traffic-only is configured.

use super::RelevanceEngine;
use crate::error::{ClassificationError, ConfigError};
use crate::models::{Article, Relevance, Source};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const FOX5_STEMS: &[&str] = &[
    "kill",
    "injur",
    "cyclist",
    "pedestrian",
    "bike",
    "fatal",
    "crash",
    "collision",
    "strike",
    "driver",
    "bicycle",
    "dead",
    "vehicle",
];

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordClassifier {
    keywords: HashMap<Source, Vec<String>>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(HashMap::from([
            (Source::Fox5, FOX5_STEMS.iter().map(|s| s.to_string()).collect()),
            (Source::Nbc7, Vec::new()),
        ]))
    }
}

impl KeywordClassifier {
    /// Build from a source-to-stems table. Stems are trimmed and lowercased;
    /// blank stems are dropped.
    pub fn new(keywords: HashMap<Source, Vec<String>>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(|(source, stems)| {
                let stems = stems
                    .iter()
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                (source, stems)
            })
            .collect();
        Self { keywords }
    }

    /// Load the table from YAML, e.g.
    ///
    /// ```yaml
    /// FOX5: [crash, collision, pedestrian]
    /// NBC7: []
    /// ```
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        let table: HashMap<Source, Vec<String>> = serde_yaml::from_str(raw)?;
        Ok(Self::new(table))
    }

    /// Sources missing from the table behave like sources with no stems.
    pub fn is_relevant(&self, article: &Article) -> bool {
        let stems = match self.keywords.get(&article.source) {
            Some(stems) if !stems.is_empty() => stems,
            _ => return true,
        };

        let haystack = format!(
            "{} {}",
            article.title.to_lowercase(),
            article.summary.as_deref().unwrap_or_default().to_lowercase()
        );
        let hit = stems.iter().find(|stem| haystack.contains(stem.as_str()));
        debug!(source = %article.source, title = %article.title, keyword = ?hit, "Keyword check");
        hit.is_some()
    }
}

impl RelevanceEngine for KeywordClassifier {
    async fn evaluate(&self, article: &Article) -> Result<Relevance, ClassificationError> {
        Ok(if self.is_relevant(article) {
            Relevance::Relevant { collision: None }
        } else {
            Relevance::Irrelevant
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(source: Source, title: &str, summary: Option<&str>) -> Article {
        Article::new(source, "1", title, "https://example.com/1", None, summary.map(String::from))
    }

    fn crash_only() -> KeywordClassifier {
        KeywordClassifier::new(HashMap::from([
            (Source::Fox5, vec!["crash".to_string()]),
            (Source::Nbc7, vec![]),
        ]))
    }

    #[test]
    fn test_keyword_in_title_is_relevant() {
        let engine = crash_only();
        assert!(engine.is_relevant(&article(Source::Fox5, "Local crash closes highway", None)));
    }

    #[test]
    fn test_no_keyword_is_not_relevant() {
        let engine = crash_only();
        assert!(!engine.is_relevant(&article(Source::Fox5, "Local event", Some(""))));
        assert!(!engine.is_relevant(&article(Source::Fox5, "Local event", None)));
    }

    #[test]
    fn test_keyword_in_summary_counts() {
        let engine = crash_only();
        let a = article(Source::Fox5, "Morning update", Some("A CRASH on the I-8 ramp"));
        assert!(engine.is_relevant(&a));
    }

    #[test]
    fn test_empty_keyword_set_is_always_relevant() {
        let engine = crash_only();
        assert!(engine.is_relevant(&article(Source::Nbc7, "City council meeting", None)));
    }

    #[test]
    fn test_stems_match_substrings() {
        let engine = KeywordClassifier::default();
        assert!(engine.is_relevant(&article(Source::Fox5, "Two injured on SR-94", None)));
        assert!(engine.is_relevant(&article(Source::Fox5, "Driver strikes cyclist", None)));
        assert!(!engine.is_relevant(&article(Source::Fox5, "Lane closures this weekend", None)));
    }

    #[test]
    fn test_blank_stems_are_ignored() {
        let engine = KeywordClassifier::new(HashMap::from([(
            Source::Fox5,
            vec!["  ".to_string(), "Collision ".to_string()],
        )]));
        assert!(!engine.is_relevant(&article(Source::Fox5, "Weather", None)));
        assert!(engine.is_relevant(&article(Source::Fox5, "Collision on I-15", None)));
    }

    #[test]
    fn test_yaml_table() {
        let engine = KeywordClassifier::from_yaml_str("FOX5: [Crash]\nNBC7: []\n").unwrap();
        assert_eq!(engine, crash_only());
        assert!(KeywordClassifier::from_yaml_str("KPBS: [crash]").is_err());
    }

    #[tokio::test]
    async fn test_evaluate_never_extracts_collision_details() {
        let engine = crash_only();
        let outcome = engine
            .evaluate(&article(Source::Fox5, "Crash on I-5", None))
            .await
            .unwrap();
        assert_eq!(outcome, Relevance::Relevant { collision: None });

        let outcome = engine
            .evaluate(&article(Source::Fox5, "Local event", None))
            .await
            .unwrap();
        assert_eq!(outcome, Relevance::Irrelevant);
    }
}
