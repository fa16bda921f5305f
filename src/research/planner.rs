//! Planner: parse the user's request and decompose it into a research plan.

use crate::config::RunConfig;
use crate::llm::{generate_structured, CompletionClient};
use crate::prompts::{date_context, PLANNER_SYSTEM_PROMPT};
use crate::types::{AppError, Importance, ReportPreferences, ResearchPlan, Result, SubQuestion};
use std::collections::HashSet;
use std::sync::Arc;

pub struct Planner {
    llm: Arc<dyn CompletionClient>,
    config: RunConfig,
}

impl Planner {
    pub fn new(llm: Arc<dyn CompletionClient>, config: RunConfig) -> Self {
        Self { llm, config }
    }

    /// Parse a natural language request into the core research question and
    /// report preferences. Failure here is fatal: nothing can be researched
    /// without a question.
    pub async fn parse_request(&self, user_input: &str) -> Result<ReportPreferences> {
        let prompt = format!(
            r#"Parse this user request and extract the research details.

USER REQUEST:
{user_input}

Extract:
1. research_question: the core question to research (clean, focused)
2. style: one of academic, technical, executive, comparative, general
3. focus_areas: specific topics to emphasize (as a list)
4. audience: one of student, professional, general, expert
5. constraints: any mentioned constraints (deadline, length, format)

If something isn't specified, use sensible defaults based on context.

Respond with a single JSON object:
{{"research_question": "...", "style": "...", "focus_areas": ["..."], "audience": "...", "constraints": "..."}}"#
        );

        let preferences: ReportPreferences = generate_structured(
            self.llm.as_ref(),
            "You extract structured information from natural language requests.",
            &prompt,
        )
        .await
        .map_err(|e| AppError::Planning(format!("could not parse the request: {e}")))?;

        if preferences.research_question.trim().is_empty() {
            return Err(AppError::Planning(
                "no research question could be extracted from the input".to_string(),
            ));
        }

        tracing::info!(question = %preferences.research_question, "parsed request");
        Ok(preferences)
    }

    /// Decompose the parsed request into sub-questions, capped at
    /// `max_questions` with critical questions kept first.
    pub async fn plan(&self, preferences: &ReportPreferences) -> Result<ResearchPlan> {
        let mut focus_context = String::new();
        if !preferences.focus_areas.is_empty() {
            focus_context = format!(
                "\n\nIMPORTANT FOCUS AREAS (prioritize these):\n{}",
                preferences
                    .focus_areas
                    .iter()
                    .map(|area| format!("- {area}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
        }

        let system = format!("{PLANNER_SYSTEM_PROMPT}\n\nCONTEXT: {}", date_context());
        let prompt = format!(
            r#"Create a research plan for: {question}{focus_context}
TARGET AUDIENCE: {audience}

Respond with a single JSON object:
{{"main_question": "...", "sub_questions": [{{"id": "q1", "question": "...", "search_strategy": "...", "importance": "critical"}}]}}"#,
            question = preferences.research_question,
            audience = preferences.audience,
        );

        let mut plan: ResearchPlan = generate_structured(self.llm.as_ref(), &system, &prompt)
            .await
            .map_err(|e| AppError::Planning(format!("could not create a research plan: {e}")))?;

        normalize_question_ids(&mut plan.sub_questions);
        plan.sub_questions = cap_sub_questions(plan.sub_questions, self.config.max_questions);

        tracing::info!(
            sub_questions = plan.sub_questions.len(),
            "created research plan"
        );
        Ok(plan)
    }
}

/// Question ids are the join key for all per-question state; replace empty
/// or duplicated ids so every task writes to its own key.
fn normalize_question_ids(sub_questions: &mut [SubQuestion]) {
    let mut seen = HashSet::new();
    for (index, sq) in sub_questions.iter_mut().enumerate() {
        let id = sq.id.trim().to_string();
        if !id.is_empty() && seen.insert(id.clone()) {
            sq.id = id;
            continue;
        }

        // The positional fallback can itself collide with an id the model
        // already used; bump until the id is free.
        let mut counter = index + 1;
        let mut fallback = format!("q{counter}");
        while !seen.insert(fallback.clone()) {
            counter += 1;
            fallback = format!("q{counter}");
        }
        tracing::debug!(original = %sq.id, assigned = %fallback, "normalized question id");
        sq.id = fallback;
    }
}

/// Keep at most `max` questions, prioritizing critical, then important,
/// then supporting. Plans already within the cap are left untouched.
fn cap_sub_questions(sub_questions: Vec<SubQuestion>, max: usize) -> Vec<SubQuestion> {
    if sub_questions.len() <= max {
        return sub_questions;
    }

    let mut ordered: Vec<SubQuestion> = Vec::with_capacity(sub_questions.len());
    for importance in [
        Importance::Critical,
        Importance::Important,
        Importance::Supporting,
    ] {
        ordered.extend(
            sub_questions
                .iter()
                .filter(|sq| sq.importance == importance)
                .cloned(),
        );
    }

    ordered.truncate(max);
    ordered
}
