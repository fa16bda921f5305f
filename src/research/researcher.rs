//! Researcher: the per-question search → extract → synthesize pipeline.
//!
//! Each research task runs these phases sequentially; tasks for different
//! questions are fully independent and run in parallel (see
//! [`dispatcher`](super::dispatcher)).

use crate::config::RunConfig;
use crate::llm::CompletionClient;
use crate::prompts::{
    date_context, ANSWER_SYNTHESIS_PROMPT, COMPRESS_RESEARCH_PROMPT, RESEARCHER_SYSTEM_PROMPT,
};
use crate::research::ranker::{rank_candidates, MAX_SOURCES_PER_QUESTION};
use crate::research::store::QuestionUpdate;
use crate::research::truncate_chars;
use crate::search::SearchProvider;
use crate::types::{
    Completeness, Confidence, Finding, QuestionAnswer, Result, SourceMetadata, SubQuestion,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Queries issued per question per round.
const MAX_QUERIES_PER_QUESTION: usize = 4;
/// Content slice per source fed to finding extraction.
const EXTRACTION_CONTENT_CHARS: usize = 4000;
/// An answer shorter than this is treated as truncated and retried once.
const MIN_ANSWER_CHARS: usize = 300;

/// Context carried by a targeted re-research task.
#[derive(Debug, Clone)]
pub struct RetryContext {
    pub previous_answer: String,
    pub previous_sources: Vec<SourceMetadata>,
    pub suggestion: String,
    /// Used verbatim as the query set, skipping query generation.
    pub suggested_searches: Vec<String>,
}

/// Everything one research task needs; tasks never read each other's state.
#[derive(Debug, Clone)]
pub struct ResearchTask {
    pub sub_question: SubQuestion,
    pub main_query: String,
    pub retry: Option<RetryContext>,
}

#[derive(Clone)]
pub struct Researcher {
    llm: Arc<dyn CompletionClient>,
    search: Arc<dyn SearchProvider>,
    config: RunConfig,
}

impl Researcher {
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        search: Arc<dyn SearchProvider>,
        config: RunConfig,
    ) -> Self {
        Self {
            llm,
            search,
            config,
        }
    }

    /// Run one task to completion and produce its store update.
    pub async fn execute(&self, task: &ResearchTask) -> Result<QuestionUpdate> {
        let answer = match &task.retry {
            Some(retry) => self.improve_research(&task.sub_question, retry).await?,
            None => {
                self.research_question(&task.sub_question, &task.main_query)
                    .await?
            }
        };

        let compressed = self.compress_research(&answer, &task.sub_question).await;

        Ok(QuestionUpdate {
            question_id: task.sub_question.id.clone(),
            answer,
            compressed,
        })
    }

    /// Initial research: cheap searches to collect candidate URLs, one
    /// extraction call for the survivors, then findings and synthesis.
    async fn research_question(
        &self,
        sub_question: &SubQuestion,
        main_query: &str,
    ) -> Result<QuestionAnswer> {
        let queries = self.generate_search_queries(sub_question, main_query).await?;
        let sources = self.gather_sources(&queries).await;

        if sources.is_empty() {
            tracing::info!(question_id = %sub_question.id, "no search results");
            return Ok(QuestionAnswer::insufficient(sub_question));
        }

        let findings = self.extract_findings(&sources, sub_question).await;
        tracing::info!(
            question_id = %sub_question.id,
            findings = findings.len(),
            sources = sources.len(),
            "research complete"
        );

        self.synthesize_answer(sub_question, findings, sources).await
    }

    /// Targeted re-research using the assessment's suggested searches
    /// verbatim. Finding nothing new falls back to the previous answer.
    async fn improve_research(
        &self,
        sub_question: &SubQuestion,
        retry: &RetryContext,
    ) -> Result<QuestionAnswer> {
        let queries: Vec<String> = if retry.suggested_searches.is_empty() {
            vec![retry.suggestion.clone()]
        } else {
            retry
                .suggested_searches
                .iter()
                .take(MAX_QUERIES_PER_QUESTION)
                .cloned()
                .collect()
        };

        tracing::info!(
            question_id = %sub_question.id,
            queries = queries.len(),
            "re-researching"
        );

        let sources = self.gather_sources(&queries).await;
        if sources.is_empty() {
            return Ok(previous_round_answer(sub_question, retry));
        }

        let findings = self.extract_findings(&sources, sub_question).await;
        if findings.is_empty() {
            return Ok(previous_round_answer(sub_question, retry));
        }

        let answer_text = self
            .synthesize_improved(sub_question, retry, &findings)
            .await?;
        let merged_sources = merge_sources(sources, &retry.previous_sources);

        Ok(QuestionAnswer {
            question_id: sub_question.id.clone(),
            question: sub_question.question.clone(),
            answer: answer_text,
            confidence: assess_confidence(&findings, &merged_sources),
            completeness: assess_completeness(&findings, &merged_sources),
            sources: merged_sources,
            key_findings: findings,
        })
    }

    /// Generate up to 4 targeted search queries for a sub-question.
    async fn generate_search_queries(
        &self,
        sub_question: &SubQuestion,
        main_query: &str,
    ) -> Result<Vec<String>> {
        let prompt = format!(
            r#"Generate 3-4 specific search queries to answer this question.

Research Question: {question}
Search Strategy: {strategy}
Main Topic Context: {main_query}

Return ONLY the search queries, one per line, no numbering or formatting."#,
            question = sub_question.question,
            strategy = sub_question.search_strategy,
        );

        let response = self.llm.generate(&prompt).await?;

        Ok(response
            .lines()
            .map(|line| {
                line.trim()
                    .trim_start_matches(|c: char| c.is_numeric() || c == '.' || c == ')')
                    .trim()
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .take(MAX_QUERIES_PER_QUESTION)
            .collect())
    }

    /// Search all queries concurrently, rank the combined hits to the
    /// extraction budget, and fetch full content for the survivors in one
    /// call. Hits keep query order so ranking ties stay deterministic.
    async fn gather_sources(&self, queries: &[String]) -> Vec<SourceMetadata> {
        let per_query = futures::future::join_all(
            queries
                .iter()
                .map(|query| self.search.search(query, self.config.max_search_results)),
        )
        .await;
        let all_hits: Vec<_> = per_query.into_iter().flatten().collect();

        if all_hits.is_empty() {
            return Vec::new();
        }

        let ranked = rank_candidates(all_hits, MAX_SOURCES_PER_QUESTION);
        let urls: Vec<String> = ranked.iter().map(|hit| hit.url.clone()).collect();
        let mut extracted = self.search.extract(&urls).await;

        ranked
            .into_iter()
            .map(|hit| {
                let content = extracted.remove(&hit.url).unwrap_or(hit.snippet);
                SourceMetadata::new(hit.url, hit.title, content)
            })
            .collect()
    }

    /// Extract structured findings from all sources in one completion call.
    /// A completion failure degrades to basic findings built from the raw
    /// sources rather than failing the task.
    async fn extract_findings(
        &self,
        sources: &[SourceMetadata],
        sub_question: &SubQuestion,
    ) -> Vec<Finding> {
        let formatted: Vec<String> = sources
            .iter()
            .filter(|s| !s.full_content.is_empty())
            .map(|s| {
                format!(
                    "[{}] {}\n{}",
                    s.id,
                    s.title,
                    truncate_chars(&s.full_content, EXTRACTION_CONTENT_CHARS)
                )
            })
            .collect();

        if formatted.is_empty() {
            return Vec::new();
        }

        let system = format!(
            r#"You are a research analyst extracting key findings from sources.

For the question: {question}

Extract 3-6 SPECIFIC, FACTUAL findings from the sources below. Each finding should:
1. Be a concrete claim with specific data (numbers, names, dates, statistics)
2. Include supporting evidence (quote or paraphrase from source)
3. Reference the source ID [src_xxx]

Format each finding as:
CLAIM: [specific factual claim]
EVIDENCE: [supporting quote or data from source]
SOURCE: [source_id]
CONFIDENCE: [high/medium/low]"#,
            question = sub_question.question,
        );
        let prompt = format!(
            "Sources:\n{}\n\nExtract key findings:",
            formatted.join("\n\n")
        );

        match self.llm.generate_with_system(&system, &prompt).await {
            Ok(response) => parse_findings(&response),
            Err(e) => {
                tracing::warn!(
                    question_id = %sub_question.id,
                    error = %e,
                    "finding extraction failed, building basic findings from sources"
                );
                sources
                    .iter()
                    .filter(|s| !s.full_content.is_empty())
                    .take(5)
                    .map(|s| Finding {
                        claim: s.title.clone(),
                        evidence: truncate_chars(&s.full_content, 500).to_string(),
                        source_ids: vec![s.id.clone()],
                        confidence: Confidence::Low,
                    })
                    .collect()
            }
        }
    }

    /// Synthesize a comprehensive cited answer from the findings.
    async fn synthesize_answer(
        &self,
        sub_question: &SubQuestion,
        findings: Vec<Finding>,
        sources: Vec<SourceMetadata>,
    ) -> Result<QuestionAnswer> {
        if findings.is_empty() {
            return Ok(QuestionAnswer::insufficient(sub_question));
        }

        let findings_text = format_findings_block(&findings);
        let prompt = format!(
            "Question: {question}\n\n\
             Research Findings ({count} total) - USE THESE [source_id] FOR CITATIONS:\n{findings_text}\n\n\
             Write a COMPLETE, COMPREHENSIVE answer (500-1000 words) using ALL relevant findings above. \
             **CRITICAL: Include [source_id] citations for EVERY factual claim.**",
            question = sub_question.question,
            count = findings.len(),
        );

        let mut answer_text = self
            .llm
            .generate_with_system(ANSWER_SYNTHESIS_PROMPT, &prompt)
            .await?;

        if looks_truncated(&answer_text) {
            let retry_prompt = format!(
                "Question: {question}\n\n\
                 Research Findings ({count} total):\n{findings_text}\n\n\
                 IMPORTANT: Your previous response was too short or incomplete. \
                 Write a FULL answer of at least 500 words covering ALL the findings. Do not stop early.",
                question = sub_question.question,
                count = findings.len(),
            );
            answer_text = self
                .llm
                .generate_with_system(ANSWER_SYNTHESIS_PROMPT, &retry_prompt)
                .await?;
        }

        Ok(QuestionAnswer {
            question_id: sub_question.id.clone(),
            question: sub_question.question.clone(),
            answer: answer_text,
            confidence: assess_confidence(&findings, &sources),
            completeness: assess_completeness(&findings, &sources),
            key_findings: findings,
            sources,
        })
    }

    /// Rewrite the previous answer to address the assessed gap.
    async fn synthesize_improved(
        &self,
        sub_question: &SubQuestion,
        retry: &RetryContext,
        findings: &[Finding],
    ) -> Result<String> {
        let findings_lines: Vec<String> = findings
            .iter()
            .take(15)
            .map(|f| {
                let source_ref = f.source_ids.first().map(String::as_str).unwrap_or("?");
                format!(
                    "- [{source_ref}] {}: {}",
                    f.claim,
                    truncate_chars(&f.evidence, 200)
                )
            })
            .collect();

        let prompt = format!(
            r#"Improve this answer by addressing the gap.

QUESTION: {question}
GAP TO ADDRESS: {gap}

PREVIOUS ANSWER:
{previous}

NEW FINDINGS:
{findings}

Write a complete, improved answer that addresses the gap. Include [source_id] citations:"#,
            question = sub_question.question,
            gap = retry.suggestion,
            previous = truncate_chars(&retry.previous_answer, 2000),
            findings = findings_lines.join("\n"),
        );

        let system = format!("{RESEARCHER_SYSTEM_PROMPT}\n\nCONTEXT: {}", date_context());
        self.llm.generate_with_system(&system, &prompt).await
    }

    /// Compress a settled answer into the document the compiler consumes.
    /// Compression failure falls back to the raw answer.
    async fn compress_research(
        &self,
        answer: &QuestionAnswer,
        sub_question: &SubQuestion,
    ) -> String {
        if answer.sources.is_empty() {
            return format!("## {}\n\nNo sources found.\n", sub_question.question);
        }

        let source_texts: Vec<String> = answer
            .sources
            .iter()
            .map(|source| {
                format!(
                    "### [{}] {}\nURL: {}\n\n{}\n",
                    source.id,
                    source.title,
                    source.url,
                    truncate_chars(&source.full_content, self.config.chars_per_source)
                )
            })
            .collect();

        let context = format!(
            "## Research Question: {}\n\n## Synthesized Answer:\n{}\n\n## Source Materials:\n{}",
            sub_question.question,
            answer.answer,
            source_texts.join("")
        );

        match self
            .llm
            .generate_with_system(COMPRESS_RESEARCH_PROMPT, &context)
            .await
        {
            Ok(content) => format!("# Research: {}\n\n{}", sub_question.question, content),
            Err(e) => {
                tracing::warn!(
                    question_id = %sub_question.id,
                    error = %e,
                    "compression failed, using the raw answer"
                );
                format!("# Research: {}\n\n{}", sub_question.question, answer.answer)
            }
        }
    }
}

/// Fallback answer for a re-research round that found nothing new: the
/// previous round's text and sources, graded medium/partial.
fn previous_round_answer(sub_question: &SubQuestion, retry: &RetryContext) -> QuestionAnswer {
    QuestionAnswer {
        question_id: sub_question.id.clone(),
        question: sub_question.question.clone(),
        answer: retry.previous_answer.clone(),
        key_findings: Vec::new(),
        sources: retry.previous_sources.clone(),
        confidence: Confidence::Medium,
        completeness: Completeness::Partial,
    }
}

/// Parse CLAIM/EVIDENCE/SOURCE/CONFIDENCE line blocks from a model reply,
/// tolerating missing fields and stray text between blocks.
pub(crate) fn parse_findings(text: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut current: Option<Finding> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(claim) = line.strip_prefix("CLAIM:") {
            if let Some(finding) = current.take() {
                if !finding.claim.is_empty() {
                    findings.push(finding);
                }
            }
            current = Some(Finding {
                claim: claim.trim().to_string(),
                evidence: String::new(),
                source_ids: Vec::new(),
                confidence: Confidence::Medium,
            });
        } else if let Some(evidence) = line.strip_prefix("EVIDENCE:") {
            if let Some(finding) = current.as_mut() {
                finding.evidence = evidence.trim().to_string();
            }
        } else if let Some(source) = line.strip_prefix("SOURCE:") {
            if let Some(finding) = current.as_mut() {
                let id = source.trim().trim_matches(['[', ']']).trim();
                if !id.is_empty() {
                    finding.source_ids = vec![id.to_string()];
                }
            }
        } else if let Some(confidence) = line.strip_prefix("CONFIDENCE:") {
            if let Some(finding) = current.as_mut() {
                finding.confidence = match confidence.trim().trim_matches(['[', ']']).to_lowercase().as_str()
                {
                    "high" => Confidence::High,
                    "low" => Confidence::Low,
                    _ => Confidence::Medium,
                };
            }
        }
    }

    if let Some(finding) = current {
        if !finding.claim.is_empty() {
            findings.push(finding);
        }
    }

    findings
}

fn format_findings_block(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| {
            let source_ref = f.source_ids.first().map(String::as_str).unwrap_or("unknown");
            format!(
                "[{source_ref}] Finding: {}\nEvidence: {}\nConfidence: {:?}",
                f.claim, f.evidence, f.confidence
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn looks_truncated(answer: &str) -> bool {
    let trimmed = answer.trim_end();
    trimmed.chars().count() < MIN_ANSWER_CHARS
        || trimmed.ends_with("...")
        || trimmed.ends_with('—')
        || trimmed.ends_with('–')
}

/// Merge new sources with the previous round's, deduplicated by URL with
/// the new round winning.
fn merge_sources(
    new: Vec<SourceMetadata>,
    previous: &[SourceMetadata],
) -> Vec<SourceMetadata> {
    let mut merged = new;
    let mut seen: HashSet<String> = merged.iter().map(|s| s.url.clone()).collect();

    for source in previous {
        if seen.insert(source.url.clone()) {
            merged.push(source.clone());
        }
    }

    merged
}

fn assess_confidence(findings: &[Finding], sources: &[SourceMetadata]) -> Confidence {
    if sources.len() >= 5 && findings.len() >= 4 {
        Confidence::High
    } else if sources.len() >= 3 && findings.len() >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn assess_completeness(findings: &[Finding], sources: &[SourceMetadata]) -> Completeness {
    if findings.len() >= 3 && sources.len() >= 3 {
        Completeness::Complete
    } else if findings.len() >= 2 {
        Completeness::Partial
    } else {
        Completeness::Insufficient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> SourceMetadata {
        SourceMetadata::new(url, "title", "content")
    }

    fn finding(claim: &str) -> Finding {
        Finding {
            claim: claim.to_string(),
            evidence: String::new(),
            source_ids: Vec::new(),
            confidence: Confidence::Medium,
        }
    }

    #[test]
    fn parses_structured_findings() {
        let text = r#"Here are the findings:

CLAIM: X grew 40% in 2025
EVIDENCE: "revenue rose from $10M to $14M"
SOURCE: [src_abc12345]
CONFIDENCE: high

CLAIM: Experts disagree on Y
EVIDENCE: two analysts quoted with opposing views
SOURCE: src_def67890
CONFIDENCE: low"#;

        let findings = parse_findings(text);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].claim, "X grew 40% in 2025");
        assert_eq!(findings[0].source_ids, vec!["src_abc12345"]);
        assert_eq!(findings[0].confidence, Confidence::High);
        assert_eq!(findings[1].source_ids, vec!["src_def67890"]);
        assert_eq!(findings[1].confidence, Confidence::Low);
    }

    #[test]
    fn tolerates_missing_fields_and_junk() {
        let text = "CLAIM: only a claim\nunrelated prose\nCONFIDENCE: nonsense";
        let findings = parse_findings(text);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].evidence.is_empty());
        assert!(findings[0].source_ids.is_empty());
        assert_eq!(findings[0].confidence, Confidence::Medium);
    }

    #[test]
    fn empty_reply_yields_no_findings() {
        assert!(parse_findings("").is_empty());
        assert!(parse_findings("no structure at all").is_empty());
    }

    #[test]
    fn merge_prefers_new_round_per_url() {
        let new = vec![source("https://a.com"), source("https://b.com")];
        let new_a_id = new[0].id.clone();
        let previous = vec![source("https://a.com"), source("https://c.com")];

        let merged = merge_sources(new, &previous);
        let urls: Vec<&str> = merged.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com", "https://b.com", "https://c.com"]);
        assert_eq!(merged[0].id, new_a_id);
    }

    #[test]
    fn grading_thresholds() {
        let five_sources: Vec<SourceMetadata> =
            (0..5).map(|i| source(&format!("https://s{i}.com"))).collect();
        let four_findings: Vec<Finding> = (0..4).map(|i| finding(&format!("c{i}"))).collect();
        assert_eq!(
            assess_confidence(&four_findings, &five_sources),
            Confidence::High
        );
        assert_eq!(
            assess_completeness(&four_findings, &five_sources),
            Completeness::Complete
        );

        let two_findings = &four_findings[..2];
        let three_sources = &five_sources[..3];
        assert_eq!(
            assess_confidence(two_findings, three_sources),
            Confidence::Medium
        );
        assert_eq!(
            assess_completeness(two_findings, three_sources),
            Completeness::Partial
        );

        assert_eq!(assess_confidence(&[], &[]), Confidence::Low);
        assert_eq!(assess_completeness(&[], &[]), Completeness::Insufficient);
    }

    #[test]
    fn truncation_detection() {
        assert!(looks_truncated("short"));
        assert!(looks_truncated(&format!("{} ...", "w".repeat(400))));
        let full = "w".repeat(400);
        assert!(!looks_truncated(&full));
    }
}
