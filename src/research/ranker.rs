//! Candidate ranking: deduplicate raw search hits by URL and keep the best.
//!
//! This is the single source-selection gate before content extraction, so
//! extraction volume stays constant no matter how many queries ran upstream.

use crate::search::SearchHit;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Extraction budget per question.
pub const MAX_SOURCES_PER_QUESTION: usize = 10;

/// Deduplicate hits by URL (keeping the strictly higher score per URL),
/// sort the survivors by score descending with stable input order on ties,
/// and truncate to `k`.
///
/// Deterministic for a fixed input order; empty input yields empty output.
pub fn rank_candidates(hits: Vec<SearchHit>, k: usize) -> Vec<SearchHit> {
    let mut best: HashMap<String, (usize, SearchHit)> = HashMap::new();

    for (index, hit) in hits.into_iter().enumerate() {
        match best.get(&hit.url) {
            Some((_, kept)) if hit.score <= kept.score => {}
            _ => {
                best.insert(hit.url.clone(), (index, hit));
            }
        }
    }

    let mut survivors: Vec<(usize, SearchHit)> = best.into_values().collect();
    survivors.sort_by(|a, b| {
        b.1.score
            .partial_cmp(&a.1.score)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    survivors.into_iter().take(k).map(|(_, hit)| hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str, score: f64) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            title: format!("title for {url}"),
            snippet: String::new(),
            score,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(rank_candidates(Vec::new(), 10).is_empty());
    }

    #[test]
    fn keeps_best_score_per_url() {
        let ranked = rank_candidates(
            vec![
                hit("https://a.com", 0.3),
                hit("https://b.com", 0.5),
                hit("https://a.com", 0.9),
                hit("https://a.com", 0.4),
            ],
            10,
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].url, "https://a.com");
        assert_eq!(ranked[0].score, 0.9);
        assert_eq!(ranked[1].url, "https://b.com");
    }

    #[test]
    fn equal_score_keeps_first_seen() {
        let first = hit("https://a.com", 0.5);
        let ranked = rank_candidates(vec![first.clone(), hit("https://a.com", 0.5)], 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].title, first.title);
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let ranked = rank_candidates(
            vec![
                hit("https://low.com", 0.1),
                hit("https://high.com", 0.9),
                hit("https://mid.com", 0.5),
            ],
            2,
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].url, "https://high.com");
        assert_eq!(ranked[1].url, "https://mid.com");
    }

    #[test]
    fn ties_retain_input_order() {
        let ranked = rank_candidates(
            vec![
                hit("https://first.com", 0.5),
                hit("https://second.com", 0.5),
                hit("https://third.com", 0.5),
            ],
            10,
        );

        let urls: Vec<&str> = ranked.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://first.com", "https://second.com", "https://third.com"]
        );
    }

    #[test]
    fn ranking_is_idempotent() {
        let ranked = rank_candidates(
            vec![
                hit("https://a.com", 0.9),
                hit("https://b.com", 0.7),
                hit("https://c.com", 0.7),
                hit("https://d.com", 0.2),
            ],
            10,
        );

        let reranked = rank_candidates(ranked.clone(), 10);
        let before: Vec<&str> = ranked.iter().map(|h| h.url.as_str()).collect();
        let after: Vec<&str> = reranked.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(before, after);
    }
}
