//! The top-level run state machine.
//!
//! A run moves through a fixed stage sequence: plan, research all questions
//! in parallel, assess, optionally re-research the flagged answers under a
//! bounded iteration budget, then compile. The improvement loop repeats
//! assess/re-research until the judge is satisfied, nothing actionable
//! remains, or the budget is spent.

use crate::config::RunConfig;
use crate::llm::CompletionClient;
use crate::research::compiler::ReportCompiler;
use crate::research::dispatcher::TaskDispatcher;
use crate::research::planner::Planner;
use crate::research::reflection::ReflectionAnalyzer;
use crate::research::researcher::{ResearchTask, Researcher, RetryContext};
use crate::research::store::ResultStore;
use crate::search::SearchProvider;
use crate::types::{
    AppError, OverallAssessment, QualityAssessment, ReportPreferences, ResearchPlan, Result,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Researching,
    Assessing,
    ReResearching,
    Compiling,
}

/// Everything a finished run hands back to the caller.
#[derive(Debug)]
pub struct RunReport {
    pub final_report: String,
    pub plan: ResearchPlan,
    pub preferences: ReportPreferences,
    /// Re-research rounds actually taken.
    pub iterations: u32,
    /// One assessment per assess stage, in order.
    pub assessments: Vec<QualityAssessment>,
    pub answered: usize,
}

pub struct Orchestrator {
    llm: Arc<dyn CompletionClient>,
    search: Arc<dyn SearchProvider>,
    config: RunConfig,
}

impl Orchestrator {
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

    /// Run the full pipeline for one user request.
    pub async fn run(&self, query: &str) -> Result<RunReport> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "the research query is empty".to_string(),
            ));
        }

        let planner = Planner::new(self.llm.clone(), self.config.clone());
        let researcher = Researcher::new(
            self.llm.clone(),
            self.search.clone(),
            self.config.clone(),
        );
        let dispatcher = TaskDispatcher::new(researcher);
        let reflection = ReflectionAnalyzer::new(self.llm.clone());
        let compiler = ReportCompiler::new(self.llm.clone());

        tracing::info!(model = self.llm.model_name(), "starting research run");
        let preferences = planner.parse_request(query).await?;
        let plan = planner.plan(&preferences).await?;

        let store = ResultStore::new();
        let mut assessments: Vec<QualityAssessment> = Vec::new();
        let mut iteration: u32 = 0;

        // An empty plan skips straight to compilation; the compiler emits
        // its minimal report when there is nothing to write from.
        let mut stage = if plan.sub_questions.is_empty() {
            tracing::warn!("plan contains no sub-questions");
            Stage::Compiling
        } else {
            Stage::Researching
        };

        loop {
            tracing::debug!(?stage, iteration, "stage transition");
            match stage {
                Stage::Researching => {
                    let tasks: Vec<ResearchTask> = plan
                        .sub_questions
                        .iter()
                        .map(|sq| ResearchTask {
                            sub_question: sq.clone(),
                            main_query: plan.main_question.clone(),
                            retry: None,
                        })
                        .collect();
                    dispatcher.run_round(tasks, &store).await;
                    stage = Stage::Assessing;
                }
                Stage::Assessing => {
                    let answers = store.answers();
                    let assessment = reflection.analyze(&plan, &answers).await;
                    let retry_worthwhile = assessment.overall_assessment
                        == OverallAssessment::NeedsImprovement
                        && !assessment.weak_answers.is_empty()
                        && iteration < self.config.max_iterations;
                    assessments.push(assessment);

                    stage = if retry_worthwhile {
                        Stage::ReResearching
                    } else {
                        Stage::Compiling
                    };
                }
                Stage::ReResearching => {
                    let assessment = assessments
                        .last()
                        .ok_or_else(|| {
                            AppError::Internal("re-research without an assessment".to_string())
                        })?;
                    let tasks = self.retry_tasks(&plan, assessment, &store);
                    if tasks.is_empty() {
                        stage = Stage::Compiling;
                        continue;
                    }

                    iteration += 1;
                    tracing::info!(
                        iteration,
                        tasks = tasks.len(),
                        "re-researching weak answers"
                    );
                    dispatcher.run_round(tasks, &store).await;
                    stage = Stage::Assessing;
                }
                Stage::Compiling => {
                    let question_order: Vec<String> = plan
                        .sub_questions
                        .iter()
                        .map(|sq| sq.id.clone())
                        .collect();
                    let sources = store.source_catalogue(&question_order);
                    let final_report = compiler
                        .compile(
                            &plan,
                            &sources,
                            &store.compressed(),
                            &store.answers(),
                            &preferences,
                        )
                        .await;

                    tracing::info!(
                        iterations = iteration,
                        answered = store.answered_count(),
                        sources = sources.len(),
                        "research run complete"
                    );
                    return Ok(RunReport {
                        final_report,
                        answered: store.answered_count(),
                        plan,
                        preferences,
                        iterations: iteration,
                        assessments,
                    });
                }
            }
        }
    }

    /// One targeted task per flagged answer, carrying the previous round's
    /// answer and the judge's suggested searches.
    fn retry_tasks(
        &self,
        plan: &ResearchPlan,
        assessment: &QualityAssessment,
        store: &ResultStore,
    ) -> Vec<ResearchTask> {
        assessment
            .weak_answers
            .iter()
            .filter_map(|weak| {
                let sub_question = plan
                    .sub_questions
                    .iter()
                    .find(|sq| sq.id == weak.question_id)?;

                let (previous_answer, previous_sources) = match store.answer(&weak.question_id) {
                    Some(previous) => (previous.answer, previous.sources),
                    None => (String::new(), Vec::new()),
                };
                let suggestion = if weak.suggestion.trim().is_empty() {
                    weak.issue.clone()
                } else {
                    weak.suggestion.clone()
                };

                Some(ResearchTask {
                    sub_question: sub_question.clone(),
                    main_query: plan.main_question.clone(),
                    retry: Some(RetryContext {
                        previous_answer,
                        previous_sources,
                        suggestion,
                        suggested_searches: assessment.suggested_searches.clone(),
                    }),
                })
            })
            .collect()
    }
}
