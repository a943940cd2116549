//! LLM classification and collision extraction.
//!
//! The model is asked for a JSON object conforming to [`CollisionReport`]'s
//! schema and the reply is parsed directly into that type. A reply that does
//! not parse is a [`ClassificationError::Schema`]; the article is left
//! untouched by the caller in that case.
//!
//! The field names use camelCase to match the schema given to the model,
//! hence the `#[allow(non_snake_case)]`.

use super::RelevanceEngine;
use crate::api::{TextGeneration, response_schema};
use crate::error::ClassificationError;
use crate::models::{Article, Collision, Relevance};
use crate::utils::truncate_for_log;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

pub const BASE_PROMPT: &str = "Please extract the information from the article.";

/// Structured answer expected from the model.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct CollisionReport {
    /// Determine if the article is reporting on a single, specific, recent
    /// traffic collision that occurred at a named location.
    pub aboutTrafficCollision: bool,
    /// A brief description of the collision (if aboutTrafficCollision is true).
    pub collisionDesc: String,
    /// The location where the collision occurred.
    pub location: String,
    /// The date when the collision occurred.
    pub date: String,
}

impl From<CollisionReport> for Relevance {
    fn from(report: CollisionReport) -> Self {
        if !report.aboutTrafficCollision {
            return Relevance::Irrelevant;
        }
        Relevance::Relevant {
            collision: Some(Collision {
                description: report.collisionDesc.trim().to_string(),
                location: report.location.trim().to_string(),
                date: report.date.trim().to_string(),
            }),
        }
    }
}

/// Prompt embedding the headline, body text and publication date.
pub fn build_prompt(article: &Article) -> String {
    let published = article
        .date_posted
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "{BASE_PROMPT} Article headline: {} | Article Text: {} | Article publication date: {}.",
        article.title,
        article.text.as_deref().unwrap_or_default(),
        published
    )
}

#[derive(Debug)]
pub struct LlmClassifier<G> {
    generator: G,
    schema: Value,
}

impl<G> LlmClassifier<G>
where
    G: TextGeneration,
{
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            schema: response_schema::<CollisionReport>(),
        }
    }
}

impl<G> RelevanceEngine for LlmClassifier<G>
where
    G: TextGeneration,
{
    #[instrument(level = "info", skip_all, fields(source = %article.source, web_id = %article.web_id))]
    async fn evaluate(&self, article: &Article) -> Result<Relevance, ClassificationError> {
        info!(title = %article.title, "Classifying article");
        let prompt = build_prompt(article);
        let response = self.generator.generate(&prompt, &self.schema).await?;
        debug!(response_preview = %truncate_for_log(&response, 300), "Model response");

        let report: CollisionReport = serde_json::from_str(&response)?;
        Ok(report.into())
    }
}
