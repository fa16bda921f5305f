//! Shared data model and error types for the research agent.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============= Research Plan Types =============

/// How much a sub-question matters to the overall answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Critical,
    Important,
    Supporting,
}

/// One atomic, independently-researchable decomposition of the main question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubQuestion {
    /// Unique within a plan; the join key across all per-question state.
    pub id: String,
    pub question: String,
    pub search_strategy: String,
    pub importance: Importance,
}

/// Question decomposition. Created once by planning, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub main_question: String,
    pub sub_questions: Vec<SubQuestion>,
}

/// Report preferences parsed from the user's natural language request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPreferences {
    pub research_question: String,
    /// academic, technical, executive, comparative, general
    #[serde(default = "default_general")]
    pub style: String,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    /// student, professional, general, expert
    #[serde(default = "default_general")]
    pub audience: String,
    #[serde(default)]
    pub constraints: String,
}

fn default_general() -> String {
    "general".to_string()
}

// ============= Research Finding Types =============

/// A retrieved source with metadata and extracted content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub id: String,
    pub url: String,
    pub title: String,
    pub full_content: String,
    pub timestamp: String,
}

impl SourceMetadata {
    /// Create a source with a fresh `src_xxxxxxxx` identifier.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let id = format!("src_{}", &Uuid::new_v4().simple().to_string()[..8]);
        Self {
            id,
            url: url.into(),
            title: title.into(),
            full_content: content.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// A research finding with supporting evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub claim: String,
    pub evidence: String,
    /// Weak references into the question's source set, not ownership.
    pub source_ids: Vec<String>,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Completeness {
    Complete,
    Partial,
    Insufficient,
}

/// Structured answer to a sub-question. A later re-research round replaces
/// the whole value for its `question_id`, never merges field-by-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    pub key_findings: Vec<Finding>,
    pub sources: Vec<SourceMetadata>,
    pub confidence: Confidence,
    pub completeness: Completeness,
}

impl QuestionAnswer {
    /// The explicit answer used when searching turned up nothing usable.
    pub fn insufficient(sub_question: &SubQuestion) -> Self {
        Self {
            question_id: sub_question.id.clone(),
            question: sub_question.question.clone(),
            answer: "Insufficient information found to answer this question.".to_string(),
            key_findings: Vec::new(),
            sources: Vec::new(),
            confidence: Confidence::Low,
            completeness: Completeness::Insufficient,
        }
    }
}

// ============= Quality Assessment Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallAssessment {
    Strong,
    Adequate,
    NeedsImprovement,
}

/// A weak answer flagged for another research round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakAnswer {
    pub question_id: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default)]
    pub suggestion: String,
}

/// One round's critique of the research so far. Produced fresh each
/// assess stage; prior rounds are kept only as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub overall_assessment: OverallAssessment,
    #[serde(default)]
    pub weak_answers: Vec<WeakAnswer>,
    #[serde(default)]
    pub knowledge_gaps: Vec<String>,
    #[serde(default)]
    pub conflicting_info: Vec<String>,
    #[serde(default)]
    pub suggested_searches: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

impl QualityAssessment {
    /// Fallback used when the assessment call itself degrades: proceed to
    /// compile with whatever we have.
    pub fn adequate(reasoning: impl Into<String>) -> Self {
        Self {
            overall_assessment: OverallAssessment::Adequate,
            weak_answers: Vec::new(),
            knowledge_gaps: Vec::new(),
            conflicting_info: Vec::new(),
            suggested_searches: Vec::new(),
            reasoning: reasoning.into(),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Planning error: {0}")]
    Planning(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
