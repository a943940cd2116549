//! Rate-limited, strictly sequential batch classification.
//!
//! [`RateLimiter`] is a fixed-window counter: once `max_requests` calls have
//! gone out, the next call waits until `window` has passed since the first
//! call of the window, then a new window starts. The wait blocks the whole
//! pipeline; there is nothing else to run meanwhile.
//!
//! [`BatchProcessor`] runs every article through a [`RelevanceEngine`] one
//! at a time behind the limiter. The first classification error aborts the
//! batch.

use crate::error::ClassificationError;
use crate::models::Article;
use crate::relevance::RelevanceEngine;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{info, instrument, warn};

pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 20;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    requests_sent: u32,
    window_start: Option<Instant>,
}

impl RateLimiter {
    /// `max_requests` below one is treated as one.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            requests_sent: 0,
            window_start: None,
        }
    }

    /// A limiter over the default 60-second window.
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, DEFAULT_WINDOW)
    }

    /// Account for one call, first waiting out the window if it is full.
    ///
    /// Returns how long the call was held back, if at all.
    pub async fn acquire(&mut self) -> Option<Duration> {
        let mut halted = None;

        if self.requests_sent >= self.max_requests {
            let elapsed = self
                .window_start
                .map(|start| start.elapsed())
                .unwrap_or(self.window);
            if elapsed < self.window {
                let halt = self.window - elapsed;
                warn!(
                    requests_sent = self.requests_sent,
                    elapsed_secs = elapsed.as_secs_f64(),
                    halt_secs = halt.as_secs_f64(),
                    "Rate limit reached; sleeping"
                );
                sleep(halt).await;
                halted = Some(halt);
            }
            self.requests_sent = 0;
            self.window_start = None;
        }

        if self.window_start.is_none() {
            self.window_start = Some(Instant::now());
        }
        self.requests_sent += 1;
        halted
    }
}

/// Drives a relevance engine over a batch of articles.
#[derive(Debug)]
pub struct BatchProcessor<E> {
    engine: E,
    limiter: RateLimiter,
}

impl<E> BatchProcessor<E>
where
    E: RelevanceEngine,
{
    /// Wrap `engine` so every call first goes through `limiter`.
    pub fn new(engine: E, limiter: RateLimiter) -> Self {
        Self { engine, limiter }
    }

    /// Classify every article in order.
    ///
    /// Each returned article carries its relevance outcome. On error nothing
    /// is returned; partial enrichment of a batch is not attempted.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn process(&mut self, articles: Vec<Article>) -> Result<Vec<Article>, ClassificationError> {
        let mut processed = Vec::with_capacity(articles.len());

        for article in articles {
            self.limiter.acquire().await;
            let relevance = self.engine.evaluate(&article).await?;
            info!(
                source = %article.source,
                web_id = %article.web_id,
                is_relevant = ?relevance.is_relevant(),
                "Classified article"
            );
            processed.push(article.with_relevance(relevance));
        }

        Ok(processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Relevance, Source};
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct Recording {
        calls: RefCell<Vec<Instant>>,
        fail_on: Option<usize>,
    }

    impl RelevanceEngine for Recording {
        async fn evaluate(&self, _: &Article) -> Result<Relevance, ClassificationError> {
            let mut calls = self.calls.borrow_mut();
            calls.push(Instant::now());
            if self.fail_on == Some(calls.len()) {
                return Err(ClassificationError::EmptyResponse);
            }
            Ok(Relevance::Relevant { collision: None })
        }
    }

    struct Counting(Cell<usize>);

    impl RelevanceEngine for Counting {
        async fn evaluate(&self, _: &Article) -> Result<Relevance, ClassificationError> {
            self.0.set(self.0.get() + 1);
            Ok(Relevance::Irrelevant)
        }
    }

    fn batch(n: usize) -> Vec<Article> {
        (0..n)
            .map(|i| Article::new(Source::Fox5, i.to_string(), format!("t{i}"), "l", None, None))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_suspends_when_window_is_full() {
        let mut limiter = RateLimiter::per_minute(2);
        let t0 = Instant::now();

        assert_eq!(limiter.acquire().await, None);
        assert_eq!(limiter.acquire().await, None);
        assert_eq!(limiter.acquire().await, Some(Duration::from_secs(60)));
        assert!(t0.elapsed() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_only_waits_for_the_rest_of_the_window() {
        let mut limiter = RateLimiter::per_minute(2);

        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(45)).await;
        limiter.acquire().await;

        assert_eq!(limiter.acquire().await, Some(Duration::from_secs(15)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_does_not_suspend_after_window_elapsed() {
        let mut limiter = RateLimiter::per_minute(2);

        limiter.acquire().await;
        limiter.acquire().await;
        tokio::time::advance(Duration::from_secs(60)).await;

        let t0 = Instant::now();
        assert_eq!(limiter.acquire().await, None);
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_starts_a_fresh_window_after_waiting() {
        let mut limiter = RateLimiter::per_minute(2);
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.acquire().await, None);
        assert_eq!(limiter.acquire().await, Some(Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_limit_is_clamped() {
        let mut limiter = RateLimiter::per_minute(0);
        assert_eq!(limiter.acquire().await, None);
        assert!(limiter.acquire().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_processor_throttles_third_call() {
        let mut processor = BatchProcessor::new(Recording::default(), RateLimiter::per_minute(2));

        let out = processor.process(batch(3)).await.unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|a| a.relevance.is_relevant() == Some(true)));

        let calls = processor.engine.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::ZERO);
        assert!(calls[2] - calls[0] >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_processor_keeps_order() {
        let mut processor =
            BatchProcessor::new(Counting(Cell::new(0)), RateLimiter::per_minute(20));
        let out = processor.process(batch(5)).await.unwrap();

        let ids: Vec<&str> = out.iter().map(|a| a.web_id.as_str()).collect();
        assert_eq!(ids, ["0", "1", "2", "3", "4"]);
        assert_eq!(processor.engine.0.get(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_processor_aborts_on_first_error() {
        let engine = Recording {
            fail_on: Some(2),
            ..Default::default()
        };
        let mut processor = BatchProcessor::new(engine, RateLimiter::per_minute(20));

        let err = processor.process(batch(4)).await.unwrap_err();
        assert!(matches!(err, ClassificationError::EmptyResponse));
        assert_eq!(processor.engine.calls.borrow().len(), 2);
    }
}
