//! One collector run: fetch → body text → classify → merge → persist.
//!
//! Every stage runs sequentially and fails fast; the only failure that does
//! not end the run is a storage write, which is reported in [`RunReport`].

use crate::batch::BatchProcessor;
use crate::error::PipelineError;
use crate::models::Article;
use crate::relevance::RelevanceEngine;
use crate::scrapers::SourceAdapter;
use crate::scrapers::body::BodyFetch;
use crate::store::ArticleStore;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{error, info, instrument};

/// What a persisted merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistReport {
    pub rows: usize,
    pub duplicates: usize,
    pub written: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub fetched: usize,
    pub relevant: usize,
    pub articles: Vec<Article>,
    /// `None` for a dry run.
    pub persisted: Option<PersistReport>,
}

pub struct Collector<A, F, E, S> {
    adapters: Vec<A>,
    bodies: F,
    processor: BatchProcessor<E>,
    store: S,
}

impl<A, F, E, S> Collector<A, F, E, S>
where
    A: SourceAdapter,
    F: BodyFetch,
    E: RelevanceEngine,
    S: ArticleStore,
{
    /// Assemble a collector. Adapters are fetched in the order given.
    pub fn new(adapters: Vec<A>, bodies: F, processor: BatchProcessor<E>, store: S) -> Self {
        Self {
            adapters,
            bodies,
            processor,
            store,
        }
    }

    /// Fetch every source in order, then every article's body text.
    #[instrument(level = "info", skip_all)]
    pub async fn fetch(&self) -> Result<Vec<Article>, PipelineError> {
        let mut articles = Vec::new();
        for adapter in &self.adapters {
            let batch = adapter.fetch().await?;
            info!(source = %adapter.source(), count = batch.len(), "Source fetched");
            articles.extend(batch);
        }

        let bodies = &self.bodies;
        let articles = stream::iter(articles)
            .then(move |article| bodies.fetch_body(article))
            .try_collect::<Vec<_>>()
            .await?;
        info!(count = articles.len(), "Fetched article text");
        Ok(articles)
    }

    /// Merge classified articles into the stored dataset and write it back.
    #[instrument(level = "info", skip_all, fields(incoming = articles.len()))]
    pub async fn persist(&self, articles: &[Article]) -> PersistReport {
        let existing = self.store.read().await;
        if existing.is_empty() {
            info!("No stored articles yet; starting a new dataset");
        }
        let outcome = existing.merge(articles, Utc::now());
        info!(duplicates = outcome.duplicates, "Found duplicates");
        info!(rows = outcome.dataset.len(), "Saving articles");

        let written = self.store.write(&outcome.dataset).await;
        if !written {
            error!("Articles were classified but could not be saved");
        }
        PersistReport {
            rows: outcome.dataset.len(),
            duplicates: outcome.duplicates,
            written,
        }
    }

    /// Run the whole pipeline. With `save == false` nothing is written.
    pub async fn run(&mut self, save: bool) -> Result<RunReport, PipelineError> {
        let fetched = self.fetch().await?;
        let count = fetched.len();

        let articles = self.processor.process(fetched).await?;
        let relevant = articles
            .iter()
            .filter(|a| a.relevance.is_relevant() == Some(true))
            .count();
        info!(fetched = count, relevant, "Classified batch");

        let persisted = if save {
            Some(self.persist(&articles).await)
        } else {
            None
        };

        Ok(RunReport {
            fetched: count,
            relevant,
            articles,
            persisted,
        })
    }
}
