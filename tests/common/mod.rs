//! Scripted provider doubles for integration tests.
//!
//! The completion mock dispatches on prompt markers that are stable parts
//! of the production prompts, so the orchestrator exercises its real code
//! paths against deterministic replies.

use async_trait::async_trait;
use parking_lot::Mutex;
use scout::llm::CompletionClient;
use scout::search::{SearchHit, SearchProvider};
use scout::types::{AppError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Questions containing this marker get no search hits.
pub const NO_HITS_MARKER: &str = "nohits";
/// Questions containing this marker make the completion provider fail
/// during query generation, failing the whole task.
pub const FAIL_MARKER: &str = "failnow";

pub fn preferences_json(question: &str) -> String {
    format!(
        r#"{{"research_question": "{question}", "style": "general", "focus_areas": [], "audience": "general", "constraints": ""}}"#
    )
}

pub fn plan_json(main: &str, questions: &[(&str, &str)]) -> String {
    let subs = questions
        .iter()
        .map(|(id, question)| {
            format!(
                r#"{{"id": "{id}", "question": "{question}", "search_strategy": "search for {id}", "importance": "important"}}"#
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(r#"{{"main_question": "{main}", "sub_questions": [{subs}]}}"#)
}

pub fn strong_assessment() -> String {
    r#"{"overall_assessment": "strong", "weak_answers": [], "reasoning": "broad coverage"}"#
        .to_string()
}

pub fn weak_assessment(question_id: &str) -> String {
    format!(
        r#"{{"overall_assessment": "needs_improvement",
            "weak_answers": [{{"question_id": "{question_id}", "issue": "too thin", "suggestion": "dig deeper"}}],
            "suggested_searches": ["deeper statistics"],
            "reasoning": "one answer lacks depth"}}"#
    )
}

pub struct MockCompletion {
    preferences: String,
    plan: String,
    assessments: Mutex<VecDeque<String>>,
    pub research_calls: AtomicUsize,
    pub improve_calls: AtomicUsize,
}

impl MockCompletion {
    pub fn new(preferences: String, plan: String, assessments: Vec<String>) -> Self {
        Self {
            preferences,
            plan,
            assessments: Mutex::new(assessments.into()),
            research_calls: AtomicUsize::new(0),
            improve_calls: AtomicUsize::new(0),
        }
    }

    fn respond(&self, prompt: &str) -> Result<String> {
        if prompt.contains("Parse this user request") {
            return Ok(self.preferences.clone());
        }
        if prompt.contains("Create a research plan for:") {
            return Ok(self.plan.clone());
        }
        if prompt.contains("Generate 3-4 specific search queries") {
            let question = question_line(prompt);
            if question.contains(FAIL_MARKER) {
                return Err(AppError::Completion("scripted provider failure".to_string()));
            }
            self.research_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(format!("{question} alpha\n{question} beta"));
        }
        if prompt.contains("Extract key findings:") {
            let id = find_source_id(prompt).unwrap_or_else(|| "src_unknown0".to_string());
            let findings: Vec<String> = (1..=4)
                .map(|n| {
                    format!(
                        "CLAIM: concrete fact {n}\nEVIDENCE: supporting data {n}\nSOURCE: [{id}]\nCONFIDENCE: high"
                    )
                })
                .collect();
            return Ok(findings.join("\n\n"));
        }
        if prompt.contains("Improve this answer") {
            self.improve_calls.fetch_add(1, Ordering::SeqCst);
            let id = find_source_id(prompt).unwrap_or_else(|| "src_unknown0".to_string());
            return Ok(long_answer("An improved and deepened answer", &id));
        }
        if prompt.contains("Write a COMPLETE, COMPREHENSIVE answer")
            || prompt.contains("Write a FULL answer")
        {
            let id = find_source_id(prompt).unwrap_or_else(|| "src_unknown0".to_string());
            return Ok(long_answer("A thorough synthesized answer", &id));
        }
        if prompt.starts_with("## Research Question:") {
            let id = find_source_id(prompt).unwrap_or_else(|| "src_unknown0".to_string());
            return Ok(format!(
                "## Executive Summary\n\nOrganized findings with citation [{id}]."
            ));
        }
        if prompt.ends_with("Assess the research quality:") {
            let scripted = self.assessments.lock().pop_front();
            return Ok(scripted.unwrap_or_else(strong_assessment));
        }
        if prompt.contains("Create 4-7 sections") {
            return Ok(r#"{"title": "Research Report", "sections": [
                {"title": "Overview", "focus": "the big picture", "key_points": [], "word_target": 400},
                {"title": "Details", "focus": "specific findings", "key_points": [], "word_target": 400}
            ]}"#
                .to_string());
        }
        if prompt.contains("Write the section now") {
            let title = prompt
                .split("Start with \"## ")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .unwrap_or("Section");
            let id = find_source_id(prompt).unwrap_or_else(|| "src_unknown0".to_string());
            return Ok(format!("## {title}\n\nSection content with citation [{id}]."));
        }

        Err(AppError::Completion(format!(
            "mock has no reply for prompt: {}",
            &prompt[..prompt.len().min(120)]
        )))
    }
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.respond(prompt)
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.respond(prompt)
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

fn question_line(prompt: &str) -> String {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Research Question: "))
        .unwrap_or("topic")
        .to_string()
}

fn find_source_id(text: &str) -> Option<String> {
    let start = text.find("src_")?;
    let id: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    Some(id)
}

fn long_answer(lead: &str, id: &str) -> String {
    format!(
        "{lead} [{id}]. {} The evidence base supports this conclusion [{id}].",
        "It covers the quantitative picture and the qualitative context in detail. ".repeat(6)
    )
}

/// Deterministic search double. Hits are derived from the query text so
/// distinct queries yield distinct URLs.
pub struct MockSearch;

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        if query.contains(NO_HITS_MARKER) {
            return Vec::new();
        }
        let slug: String = query
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        (0..max_results)
            .map(|i| SearchHit {
                url: format!("https://example.com/{slug}/{i}"),
                title: format!("Result {i} for {query}"),
                snippet: format!("snippet {i}"),
                score: 0.9 - (i as f64) * 0.1,
            })
            .collect()
    }

    async fn extract(&self, urls: &[String]) -> HashMap<String, String> {
        urls.iter()
            .map(|url| (url.clone(), format!("Full extracted content for {url}.")))
            .collect()
    }
}
