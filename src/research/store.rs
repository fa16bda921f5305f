//! Shared result store for per-question answers and compressed findings.
//!
//! Writers within one dispatch round are partitioned by `question_id`, so a
//! plain mutex-guarded insert is all the synchronization needed. Entries are
//! last-writer-wins per key and only ever added or replaced, never removed.

use crate::types::{QuestionAnswer, SourceMetadata};
use parking_lot::Mutex;
use std::collections::HashMap;

/// One settled research task's contribution to the store.
#[derive(Debug, Clone)]
pub struct QuestionUpdate {
    pub question_id: String,
    pub answer: QuestionAnswer,
    pub compressed: String,
}

#[derive(Debug, Default)]
pub struct ResultStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    answers: HashMap<String, QuestionAnswer>,
    compressed: HashMap<String, String>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one task's result, replacing any prior round's entries for
    /// the same question.
    pub fn record(&self, update: QuestionUpdate) {
        let mut inner = self.inner.lock();
        inner
            .answers
            .insert(update.question_id.clone(), update.answer);
        inner.compressed.insert(update.question_id, update.compressed);
    }

    pub fn answer(&self, question_id: &str) -> Option<QuestionAnswer> {
        self.inner.lock().answers.get(question_id).cloned()
    }

    /// Snapshot of all answers. Only meaningful between rounds, after the
    /// dispatcher's fan-in barrier.
    pub fn answers(&self) -> HashMap<String, QuestionAnswer> {
        self.inner.lock().answers.clone()
    }

    /// Snapshot of all compressed findings.
    pub fn compressed(&self) -> HashMap<String, String> {
        self.inner.lock().compressed.clone()
    }

    pub fn answered_count(&self) -> usize {
        self.inner.lock().answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().answers.is_empty()
    }

    /// All sources across answers, deduplicated by URL, first seen wins.
    /// `question_order` fixes the iteration order so the catalogue is
    /// deterministic across runs with identical answers.
    pub fn source_catalogue(&self, question_order: &[String]) -> Vec<SourceMetadata> {
        let inner = self.inner.lock();
        let mut seen = std::collections::HashSet::new();
        let mut catalogue = Vec::new();

        for question_id in question_order {
            let Some(answer) = inner.answers.get(question_id) else {
                continue;
            };
            for source in &answer.sources {
                if !source.url.is_empty() && seen.insert(source.url.clone()) {
                    catalogue.push(source.clone());
                }
            }
        }

        catalogue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Completeness, Confidence, Importance, SubQuestion};

    fn sub_question(id: &str) -> SubQuestion {
        SubQuestion {
            id: id.to_string(),
            question: format!("question {id}"),
            search_strategy: String::new(),
            importance: Importance::Important,
        }
    }

    fn answer_with_sources(id: &str, urls: &[&str]) -> QuestionAnswer {
        let mut answer = QuestionAnswer::insufficient(&sub_question(id));
        answer.answer = format!("answer for {id}");
        answer.confidence = Confidence::Medium;
        answer.completeness = Completeness::Partial;
        answer.sources = urls
            .iter()
            .map(|url| SourceMetadata::new(*url, "title", "content"))
            .collect();
        answer
    }

    fn update(id: &str, urls: &[&str]) -> QuestionUpdate {
        QuestionUpdate {
            question_id: id.to_string(),
            answer: answer_with_sources(id, urls),
            compressed: format!("compressed {id}"),
        }
    }

    #[test]
    fn record_fills_both_maps() {
        let store = ResultStore::new();
        store.record(update("q1", &["https://a.com"]));

        assert_eq!(store.answered_count(), 1);
        assert!(store.answer("q1").is_some());
        assert_eq!(store.compressed().get("q1").unwrap(), "compressed q1");
    }

    #[test]
    fn later_write_replaces_earlier_one() {
        let store = ResultStore::new();
        store.record(update("q1", &["https://old.com"]));
        store.record(update("q1", &["https://new.com"]));

        let answer = store.answer("q1").unwrap();
        assert_eq!(answer.sources.len(), 1);
        assert_eq!(answer.sources[0].url, "https://new.com");
        assert_eq!(store.answered_count(), 1);
    }

    #[test]
    fn catalogue_dedups_by_url_first_seen() {
        let store = ResultStore::new();
        store.record(update("q1", &["https://a.com", "https://b.com"]));
        store.record(update("q2", &["https://b.com", "https://c.com"]));

        let order = vec!["q1".to_string(), "q2".to_string()];
        let catalogue = store.source_catalogue(&order);
        let urls: Vec<&str> = catalogue.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);

        // The q1 copy of b.com wins.
        let q1_sources = store.answer("q1").unwrap().sources;
        assert!(catalogue.iter().any(|s| s.id == q1_sources[1].id));
    }

    #[test]
    fn catalogue_skips_unanswered_questions() {
        let store = ResultStore::new();
        store.record(update("q2", &["https://a.com"]));

        let order = vec!["q1".to_string(), "q2".to_string()];
        assert_eq!(store.source_catalogue(&order).len(), 1);
    }

    #[test]
    fn concurrent_writers_on_distinct_keys_all_land() {
        let store = std::sync::Arc::new(ResultStore::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let id = format!("q{i}");
                store.record(update(&id, &[&format!("https://site{i}.com")]));
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.answered_count(), 16);
        assert_eq!(store.compressed().len(), 16);
    }
}
