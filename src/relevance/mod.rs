//! Relevance & enrichment engines.
//!
//! Both strategies answer the same question for one article: is it about a
//! traffic collision, and if so, what happened where and when.
//!
//! - [`keywords::KeywordClassifier`]: per-source keyword stems matched
//!   against title and summary; never extracts collision details
//! - [`llm::LlmClassifier`]: schema-constrained text generation over the
//!   headline, body text and publication date
//!
//! The batch processor only sees [`RelevanceEngine`], so it does not care
//! which strategy is active.

pub mod keywords;
pub mod llm;

use crate::api::TextGeneration;
use crate::error::ClassificationError;
use crate::models::{Article, Relevance};

pub use keywords::KeywordClassifier;
pub use llm::LlmClassifier;

pub trait RelevanceEngine {
    /// Decide relevance for one article without modifying it.
    async fn evaluate(&self, article: &Article) -> Result<Relevance, ClassificationError>;
}

/// The active strategy, chosen at startup.
#[derive(Debug)]
pub enum RelevanceStrategy<G> {
    Keywords(KeywordClassifier),
    Llm(LlmClassifier<G>),
}

impl<G> RelevanceEngine for RelevanceStrategy<G>
where
    G: TextGeneration,
{
    async fn evaluate(&self, article: &Article) -> Result<Relevance, ClassificationError> {
        match self {
            RelevanceStrategy::Keywords(engine) => engine.evaluate(article).await,
            RelevanceStrategy::Llm(engine) => engine.evaluate(article).await,
        }
    }
}
