//! Read-only HTTP surface over the stored dataset.
//!
//! `GET /articles` returns the relevant rows, newest first, as a JSON array
//! whose field names match the stored columns. The store is re-read on every
//! request so a collector run is visible without a restart.

use crate::models::ArticleRow;
use crate::store::CsvFileStore;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, instrument};

pub fn router(store: Arc<CsvFileStore>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/articles", get(list_articles))
        .layer(CorsLayer::very_permissive())
        .with_state(store)
}

#[instrument(level = "info", skip_all)]
async fn list_articles(State(store): State<Arc<CsvFileStore>>) -> Json<Vec<ArticleRow>> {
    let relevant = store.load().await.relevant_by_date();
    info!(count = relevant.len(), "Serving relevant articles");
    Json(relevant)
}

pub async fn serve(addr: SocketAddr, store: CsvFileStore) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, path = %store.path().display(), "Read service listening");
    axum::serve(listener, router(Arc::new(store))).await
}
