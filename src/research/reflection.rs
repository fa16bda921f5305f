//! Quality assessment of a settled research round.
//!
//! Assessment is advisory: any completion or parse failure degrades to an
//! "adequate" verdict so a flaky judge never blocks report compilation.

use crate::llm::{generate_structured, CompletionClient};
use crate::prompts::REFLECTION_SYSTEM_PROMPT;
use crate::research::truncate_chars;
use crate::types::{
    Completeness, Confidence, QualityAssessment, QuestionAnswer, ResearchPlan,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Answer preview length in the summary shown to the judge.
const SUMMARY_PREVIEW_CHARS: usize = 6000;

pub struct ReflectionAnalyzer {
    llm: Arc<dyn CompletionClient>,
}

impl ReflectionAnalyzer {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Assess the current round's answers against the plan. Never fails:
    /// an unavailable judge yields an adequate assessment with no weak
    /// answers, ending the improvement loop.
    pub async fn analyze(
        &self,
        plan: &ResearchPlan,
        answers: &HashMap<String, QuestionAnswer>,
    ) -> QualityAssessment {
        let summary = format_research_summary(plan, answers);
        let prompt = format!(
            "MAIN RESEARCH QUESTION: {main}\n\n{summary}\n\nAssess the research quality:",
            main = plan.main_question,
        );

        let mut assessment: QualityAssessment =
            match generate_structured(self.llm.as_ref(), REFLECTION_SYSTEM_PROMPT, &prompt).await {
                Ok(assessment) => assessment,
                Err(e) => {
                    tracing::warn!(error = %e, "quality assessment failed, treating round as adequate");
                    return QualityAssessment::adequate(format!(
                        "Assessment unavailable: {e}. Proceeding with the current answers."
                    ));
                }
            };

        filter_weak_answers(&mut assessment, plan, answers);

        tracing::info!(
            overall = ?assessment.overall_assessment,
            weak = assessment.weak_answers.len(),
            "assessed research round"
        );
        assessment
    }
}

/// Keep only actionable weak-answer entries: the id must exist in the plan,
/// and an answer the heuristics already grade complete and high-confidence
/// is only retried when the judge names a concrete issue.
fn filter_weak_answers(
    assessment: &mut QualityAssessment,
    plan: &ResearchPlan,
    answers: &HashMap<String, QuestionAnswer>,
) {
    assessment.weak_answers.retain(|weak| {
        let known = plan.sub_questions.iter().any(|sq| sq.id == weak.question_id);
        if !known {
            tracing::debug!(question_id = %weak.question_id, "dropping weak answer with unknown id");
            return false;
        }
        if let Some(answer) = answers.get(&weak.question_id) {
            if answer.completeness == Completeness::Complete
                && answer.confidence == Confidence::High
                && weak.issue.trim().is_empty()
            {
                return false;
            }
        }
        true
    });
}

/// Per-question digest of the round for the judge prompt.
pub(crate) fn format_research_summary(
    plan: &ResearchPlan,
    answers: &HashMap<String, QuestionAnswer>,
) -> String {
    let mut sections = Vec::with_capacity(plan.sub_questions.len());

    for sq in &plan.sub_questions {
        let section = match answers.get(&sq.id) {
            Some(answer) => format!(
                "QUESTION [{id}] ({importance:?}): {question}\n\
                 CONFIDENCE: {confidence:?} | COMPLETENESS: {completeness:?} | SOURCES: {sources}\n\
                 ANSWER:\n{preview}",
                id = sq.id,
                importance = sq.importance,
                question = sq.question,
                confidence = answer.confidence,
                completeness = answer.completeness,
                sources = answer.sources.len(),
                preview = truncate_chars(&answer.answer, SUMMARY_PREVIEW_CHARS),
            ),
            None => format!(
                "QUESTION [{id}] ({importance:?}): {question}\nANSWER: not yet researched",
                id = sq.id,
                importance = sq.importance,
                question = sq.question,
            ),
        };
        sections.push(section);
    }

    sections.join("\n\n---\n\n")
}

/// Human-readable rendering of an assessment for CLI output.
pub fn render_analysis(assessment: &QualityAssessment) -> String {
    let mut lines = vec![
        format!("Overall: {:?}", assessment.overall_assessment),
        format!("Reasoning: {}", assessment.reasoning),
    ];

    if !assessment.weak_answers.is_empty() {
        lines.push(String::new());
        lines.push("Weak answers:".to_string());
        for weak in &assessment.weak_answers {
            lines.push(format!("  [{}] {}", weak.question_id, weak.issue));
            if !weak.suggestion.is_empty() {
                lines.push(format!("      suggestion: {}", weak.suggestion));
            }
        }
    }

    if !assessment.knowledge_gaps.is_empty() {
        lines.push(String::new());
        lines.push("Knowledge gaps:".to_string());
        for gap in &assessment.knowledge_gaps {
            lines.push(format!("  - {gap}"));
        }
    }

    if !assessment.suggested_searches.is_empty() {
        lines.push(String::new());
        lines.push("Suggested searches:".to_string());
        for query in &assessment.suggested_searches {
            lines.push(format!("  - {query}"));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Importance, OverallAssessment, SubQuestion, WeakAnswer};

    fn plan_with(ids: &[&str]) -> ResearchPlan {
        ResearchPlan {
            main_question: "main".to_string(),
            sub_questions: ids
                .iter()
                .map(|id| SubQuestion {
                    id: id.to_string(),
                    question: format!("question {id}"),
                    search_strategy: String::new(),
                    importance: Importance::Important,
                })
                .collect(),
        }
    }

    fn weak(id: &str, issue: &str) -> WeakAnswer {
        WeakAnswer {
            question_id: id.to_string(),
            issue: issue.to_string(),
            suggestion: "look harder".to_string(),
        }
    }

    fn needs_improvement(weak_answers: Vec<WeakAnswer>) -> QualityAssessment {
        let mut assessment = QualityAssessment::adequate("");
        assessment.overall_assessment = OverallAssessment::NeedsImprovement;
        assessment.weak_answers = weak_answers;
        assessment
    }

    fn answer(id: &str, confidence: Confidence, completeness: Completeness) -> QuestionAnswer {
        let sq = SubQuestion {
            id: id.to_string(),
            question: format!("question {id}"),
            search_strategy: String::new(),
            importance: Importance::Important,
        };
        let mut answer = QuestionAnswer::insufficient(&sq);
        answer.confidence = confidence;
        answer.completeness = completeness;
        answer
    }

    #[test]
    fn unknown_ids_are_dropped_from_weak_answers() {
        let plan = plan_with(&["q1"]);
        let answers = HashMap::new();
        let mut assessment =
            needs_improvement(vec![weak("q1", "thin"), weak("q9", "bogus")]);

        filter_weak_answers(&mut assessment, &plan, &answers);
        assert_eq!(assessment.weak_answers.len(), 1);
        assert_eq!(assessment.weak_answers[0].question_id, "q1");
    }

    #[test]
    fn strong_answer_without_named_issue_is_not_retried() {
        let plan = plan_with(&["q1", "q2"]);
        let mut answers = HashMap::new();
        answers.insert(
            "q1".to_string(),
            answer("q1", Confidence::High, Completeness::Complete),
        );
        answers.insert(
            "q2".to_string(),
            answer("q2", Confidence::High, Completeness::Complete),
        );
        let mut assessment =
            needs_improvement(vec![weak("q1", ""), weak("q2", "missing recent data")]);

        filter_weak_answers(&mut assessment, &plan, &answers);
        let ids: Vec<&str> = assessment
            .weak_answers
            .iter()
            .map(|w| w.question_id.as_str())
            .collect();
        assert_eq!(ids, vec!["q2"]);
    }

    #[test]
    fn summary_marks_unresearched_questions() {
        let plan = plan_with(&["q1", "q2"]);
        let mut answers = HashMap::new();
        answers.insert(
            "q1".to_string(),
            answer("q1", Confidence::Low, Completeness::Partial),
        );

        let summary = format_research_summary(&plan, &answers);
        assert!(summary.contains("QUESTION [q1]"));
        assert!(summary.contains("CONFIDENCE: Low"));
        assert!(summary.contains("QUESTION [q2]"));
        assert!(summary.contains("not yet researched"));
    }

    #[test]
    fn rendered_analysis_lists_weak_answers() {
        let mut assessment = needs_improvement(vec![weak("q2", "too shallow")]);
        assessment.reasoning = "q2 lacks depth".to_string();
        assessment.suggested_searches = vec!["q2 latest statistics".to_string()];

        let rendered = render_analysis(&assessment);
        assert!(rendered.contains("NeedsImprovement"));
        assert!(rendered.contains("[q2] too shallow"));
        assert!(rendered.contains("suggestion: look harder"));
        assert!(rendered.contains("q2 latest statistics"));
    }
}
