//! Web search and content extraction abstraction.
//!
//! Both operations fail closed: a provider hiccup yields an empty result
//! set (logged), never an error the research pipeline has to unwind.

pub mod tavily;

pub use tavily::TavilyClient;

use async_trait::async_trait;
use std::collections::HashMap;

/// A raw search hit. The `score` is an opaque relevance ordinal (higher is
/// better) valid only within the task that produced it.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

/// Search and batch content extraction.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search query. Returns an empty list on transient failure.
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit>;

    /// Extract full page content for up to 10 URLs in one call.
    /// Returns url -> full text; missing entries mean extraction failed.
    async fn extract(&self, urls: &[String]) -> HashMap<String, String>;
}
