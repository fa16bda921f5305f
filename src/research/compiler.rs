//! Final report compilation: outline planning, section generation, and
//! citation normalization.

use crate::llm::{generate_structured, CompletionClient};
use crate::prompts::REPORT_PLANNER_SYSTEM_PROMPT;
use crate::research::citations::normalize_citations;
use crate::research::truncate_chars;
use crate::types::{QuestionAnswer, ReportPreferences, ResearchPlan, SourceMetadata};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Findings context per section prompt.
const SECTION_FINDINGS_CHARS: usize = 20000;
/// Source list context per section prompt.
const SECTION_SOURCES_CHARS: usize = 3000;
/// Tail of the already-written report shown for continuity.
const PREVIOUS_CONTENT_CHARS: usize = 2000;

fn default_word_target() -> usize {
    750
}

/// One planned report section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionPlan {
    pub title: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default = "default_word_target")]
    pub word_target: usize,
}

/// The report outline, planned from the research before writing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPlan {
    pub title: String,
    pub sections: Vec<SectionPlan>,
}

pub struct ReportCompiler {
    llm: Arc<dyn CompletionClient>,
}

impl ReportCompiler {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Compile the final cited report from everything the run collected.
    /// Degrades section by section: a failed section becomes a stub rather
    /// than failing the report.
    pub async fn compile(
        &self,
        plan: &ResearchPlan,
        sources: &[SourceMetadata],
        compressed: &HashMap<String, String>,
        answers: &HashMap<String, QuestionAnswer>,
        preferences: &ReportPreferences,
    ) -> String {
        let findings = build_findings_documents(plan, compressed, answers);
        if findings.is_empty() {
            tracing::warn!("no findings collected, emitting a minimal report");
            return format!(
                "# {}\n\nNo research findings were collected for this question.\n",
                plan.main_question
            );
        }

        let findings_text = findings.join("\n\n---\n\n");
        let report_plan = self.plan_report(plan, preferences, &findings_text).await;
        tracing::info!(sections = report_plan.sections.len(), "planned report outline");

        let source_list = sources
            .iter()
            .map(|s| format!("[{}] {}: {}", s.id, s.title, s.url))
            .collect::<Vec<_>>()
            .join("\n");

        let mut report = format!("# {}\n", report_plan.title);
        for section in &report_plan.sections {
            let content = self
                .write_section(section, preferences, &findings_text, &source_list, &report)
                .await;
            report.push_str("\n\n");
            report.push_str(&content);
        }

        normalize_citations(&report, sources)
    }

    /// Plan the report outline. Planning failure falls back to a fixed
    /// four-section outline.
    async fn plan_report(
        &self,
        plan: &ResearchPlan,
        preferences: &ReportPreferences,
        findings_text: &str,
    ) -> ReportPlan {
        let prompt = format!(
            r#"Plan a {style} report for a {audience} audience.

RESEARCH QUESTION: {question}

RESEARCH FINDINGS (overview):
{overview}

Create 4-7 sections that cover the findings without repetition.

Respond with a single JSON object:
{{"title": "...", "sections": [{{"title": "...", "focus": "...", "key_points": ["..."], "word_target": 750}}]}}"#,
            style = preferences.style,
            audience = preferences.audience,
            question = plan.main_question,
            overview = truncate_chars(findings_text, 8000),
        );

        match generate_structured::<ReportPlan>(
            self.llm.as_ref(),
            REPORT_PLANNER_SYSTEM_PROMPT,
            &prompt,
        )
        .await
        {
            Ok(report_plan) if !report_plan.sections.is_empty() => report_plan,
            Ok(_) => fallback_report_plan(plan),
            Err(e) => {
                tracing::warn!(error = %e, "report planning failed, using the fallback outline");
                fallback_report_plan(plan)
            }
        }
    }

    /// Write one section. The tail of the report so far is passed for
    /// continuity and to discourage repetition.
    async fn write_section(
        &self,
        section: &SectionPlan,
        preferences: &ReportPreferences,
        findings_text: &str,
        source_list: &str,
        report_so_far: &str,
    ) -> String {
        let system = format!(
            "You are writing one section of a research report.\n\n\
             STYLE: {style}\nAUDIENCE: {audience}\n\n\
             Cite sources with [source_id] markers for every factual claim. \
             Do not repeat content already covered in previous sections.",
            style = style_guidance(&preferences.style),
            audience = audience_guidance(&preferences.audience),
        );

        let key_points = section
            .key_points
            .iter()
            .map(|point| format!("- {point}"))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r###"SECTION: {title}
FOCUS: {focus}
KEY POINTS:
{key_points}
TARGET LENGTH: about {word_target} words

PREVIOUS SECTIONS (end of report so far):
{previous}

RESEARCH FINDINGS:
{findings}

AVAILABLE SOURCES:
{sources}

Write the section now. Start with "## {title}":"###,
            title = section.title,
            focus = section.focus,
            word_target = section.word_target,
            previous = tail_chars(report_so_far, PREVIOUS_CONTENT_CHARS),
            findings = truncate_chars(findings_text, SECTION_FINDINGS_CHARS),
            sources = truncate_chars(source_list, SECTION_SOURCES_CHARS),
        );

        match self.llm.generate_with_system(&system, &prompt).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(section = %section.title, error = %e, "section generation failed");
                format!(
                    "## {}\n\nThis section could not be generated.\n",
                    section.title
                )
            }
        }
    }
}

/// One findings document per answered question, in plan order. Compressed
/// research is preferred; the raw answer stands in when compression is
/// missing for a question.
fn build_findings_documents(
    plan: &ResearchPlan,
    compressed: &HashMap<String, String>,
    answers: &HashMap<String, QuestionAnswer>,
) -> Vec<String> {
    plan.sub_questions
        .iter()
        .filter_map(|sq| {
            if let Some(document) = compressed.get(&sq.id) {
                Some(document.clone())
            } else {
                answers
                    .get(&sq.id)
                    .map(|answer| format!("## {}\n\n{}", sq.question, answer.answer))
            }
        })
        .collect()
}

fn fallback_report_plan(plan: &ResearchPlan) -> ReportPlan {
    let middle: Vec<SectionPlan> = plan
        .sub_questions
        .iter()
        .take(4)
        .map(|sq| SectionPlan {
            title: sq.question.clone(),
            focus: sq.search_strategy.clone(),
            key_points: Vec::new(),
            word_target: default_word_target(),
        })
        .collect();

    let mut sections = vec![SectionPlan {
        title: "Introduction".to_string(),
        focus: format!("Frame the question: {}", plan.main_question),
        key_points: Vec::new(),
        word_target: 300,
    }];
    sections.extend(middle);
    sections.push(SectionPlan {
        title: "Conclusion".to_string(),
        focus: "Synthesize the findings into an evidence-based conclusion".to_string(),
        key_points: Vec::new(),
        word_target: 300,
    });

    ReportPlan {
        title: plan.main_question.clone(),
        sections,
    }
}

fn style_guidance(style: &str) -> &'static str {
    match style {
        "academic" => "formal academic prose with precise terminology and careful hedging",
        "technical" => "technical depth with concrete specifics, written for practitioners",
        "executive" => "concise and decision-oriented, leading with conclusions",
        "comparative" => "structured comparison weighing alternatives against each other",
        _ => "clear, accessible prose for a general readership",
    }
}

fn audience_guidance(audience: &str) -> &'static str {
    match audience {
        "student" => "explain concepts from first principles, defining terms on first use",
        "professional" => "assume working familiarity with the field",
        "expert" => "assume deep domain expertise, skip the basics",
        _ => "assume an interested reader with no special background",
    }
}

/// Char-boundary-safe suffix.
fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((index, _)) => &text[index..],
        None => text,
    }
}
