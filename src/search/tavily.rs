//! Tavily search and extract client.

use crate::search::{SearchHit, SearchProvider};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Extract API accepts at most this many URLs per call.
const MAX_EXTRACT_URLS: usize = 10;

pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    api_key: &'a str,
    urls: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractResult>,
}

#[derive(Debug, Deserialize)]
struct ExtractResult {
    url: String,
    #[serde(default)]
    raw_content: String,
}

impl TavilyClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: "basic",
        };

        let response: SearchResponse = self
            .http
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Tavily search request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Search(format!("Tavily search returned an error: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Tavily search response malformed: {e}")))?;

        Ok(response
            .results
            .into_iter()
            .map(|r| SearchHit {
                url: r.url,
                title: r.title,
                snippet: r.content,
                score: r.score,
            })
            .collect())
    }

    async fn try_extract(&self, urls: &[String]) -> Result<HashMap<String, String>> {
        let request = ExtractRequest {
            api_key: &self.api_key,
            urls: &urls[..urls.len().min(MAX_EXTRACT_URLS)],
        };

        let response: ExtractResponse = self
            .http
            .post(format!("{}/extract", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Tavily extract request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::Search(format!("Tavily extract returned an error: {e}")))?
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Tavily extract response malformed: {e}")))?;

        Ok(response
            .results
            .into_iter()
            .filter(|r| !r.raw_content.is_empty())
            .map(|r| (r.url, r.raw_content))
            .collect())
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        match self.try_search(query, max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(query, error = %e, "search failed, returning no hits");
                Vec::new()
            }
        }
    }

    async fn extract(&self, urls: &[String]) -> HashMap<String, String> {
        if urls.is_empty() {
            return HashMap::new();
        }

        match self.try_extract(urls).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(url_count = urls.len(), error = %e, "extraction failed, returning no content");
                HashMap::new()
            }
        }
    }
}
