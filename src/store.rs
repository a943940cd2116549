//! The stored dataset and its backing store.
//!
//! - [`Dataset`]: ordered rows, unique by identity after every merge
//! - [`ArticleStore`]: get/put contract over one file-like key
//! - [`CsvFileStore`]: local CSV file, written through a temporary sibling
//!   and renamed into place
//!
//! # Merge policy
//!
//! Existing rows come first, incoming rows after, and the first row seen for
//! an identity wins. Already stored (and already classified) articles are
//! therefore never overwritten by a later run.
//!
//! # Failure policy
//!
//! A read that fails for any reason yields an empty dataset so a first-ever
//! run succeeds. A write that fails reports `false` and leaves retrying to
//! the caller.

use crate::models::{Article, ArticleRow, COLUMNS};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<ArticleRow>,
}

/// Result of merging a batch into a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub dataset: Dataset,
    /// Rows before de-duplication (existing + incoming).
    pub total_before: usize,
    /// `total_before - dataset.len()`.
    pub duplicates: usize,
}

impl Dataset {
    #[cfg(test)]
    pub fn rows(&self) -> &[ArticleRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append `incoming` after the existing rows and drop later duplicates.
    ///
    /// Incoming rows that survive are stamped with `merged_at` as their
    /// `updated_at`.
    pub fn merge(self, incoming: &[Article], merged_at: DateTime<Utc>) -> MergeOutcome {
        let incoming = incoming.iter().map(|article| ArticleRow {
            updated_at: merged_at,
            ..ArticleRow::from(article)
        });

        let concatenated = self.rows.into_iter().chain(incoming).collect::<Vec<_>>();
        let total_before = concatenated.len();
        let rows = concatenated
            .into_iter()
            .unique_by(ArticleRow::identity)
            .collect::<Vec<_>>();
        let duplicates = total_before - rows.len();

        MergeOutcome {
            dataset: Dataset { rows },
            total_before,
            duplicates,
        }
    }

    /// Relevant rows only, newest first; rows without a publication time
    /// sort last.
    pub fn relevant_by_date(&self) -> Vec<ArticleRow> {
        let mut relevant = self
            .rows
            .iter()
            .filter(|row| row.is_relevant == Some(true))
            .cloned()
            .collect::<Vec<_>>();
        relevant.sort_by(|a, b| b.date_posted.cmp(&a.date_posted));
        relevant
    }

    /// Serialize as CSV, header row first, even when empty.
    pub fn to_csv(&self) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(COLUMNS)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))
    }

    /// Parse a stored dataset. Cells may come from older writers: boolean
    /// flags in any case, naive audit timestamps (read as UTC), and no
    /// `collision_description` column.
    pub fn from_csv(bytes: &[u8]) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
        let rows = reader
            .deserialize::<ArticleRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }
}

/// Get/put access to the stored dataset.
pub trait ArticleStore {
    /// The stored dataset, or an empty one if it is absent or unreadable.
    async fn read(&self) -> Dataset;

    /// Replace the stored dataset. Returns `false` if the write failed.
    async fn write(&self, dataset: &Dataset) -> bool;
}

/// A dataset kept as one CSV file on the local filesystem.
#[derive(Debug, Clone)]
pub struct CsvFileStore {
    path: PathBuf,
}

impl CsvFileStore {
    /// Store backed by the CSV file at `path`. Nothing is touched until the
    /// first read or write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored dataset.
    ///
    /// # Returns
    ///
    /// The parsed rows, or an empty dataset (with a warning) when the file
    /// is missing or does not parse.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Dataset {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Could not read stored articles; starting from an empty dataset");
                return Dataset::default();
            }
        };

        match Dataset::from_csv(&bytes) {
            Ok(dataset) => {
                info!(rows = dataset.len(), "Loaded stored articles");
                dataset
            }
            Err(e) => {
                warn!(error = %e, "Stored articles are malformed; starting from an empty dataset");
                Dataset::default()
            }
        }
    }

    /// Replace the stored file with `dataset`.
    ///
    /// # Returns
    ///
    /// `false` if serializing, creating the parent directory, writing the
    /// temporary file or renaming it failed. The error is logged.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), rows = dataset.len()))]
    pub async fn save(&self, dataset: &Dataset) -> bool {
        match self.try_save(dataset).await {
            Ok(()) => {
                info!("Saved articles");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to save articles");
                false
            }
        }
    }

    async fn try_save(&self, dataset: &Dataset) -> Result<(), Box<dyn std::error::Error>> {
        let body = dataset.to_csv()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, body).await?;
        if let Err(e) = fs::rename(&tmp_path, &self.path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

impl ArticleStore for CsvFileStore {
    async fn read(&self) -> Dataset {
        self.load().await
    }

    async fn write(&self, dataset: &Dataset) -> bool {
        self.save(dataset).await
    }
}
