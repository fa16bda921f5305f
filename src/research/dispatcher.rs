//! Fan-out/fan-in dispatch of research tasks.
//!
//! Each round spawns one task per question, waits for every task to settle,
//! then returns. Task failures are absorbed at the boundary: a failed task
//! is logged and its question keeps whatever answer the prior round stored.

use crate::research::researcher::{ResearchTask, Researcher};
use crate::research::store::ResultStore;
use std::collections::HashSet;
use tokio::task::JoinSet;

/// What happened in one dispatch round, for logging and run reporting.
#[derive(Debug, Default)]
pub struct RoundOutcome {
    pub dispatched: usize,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
}

pub struct TaskDispatcher {
    researcher: Researcher,
}

impl TaskDispatcher {
    pub fn new(researcher: Researcher) -> Self {
        Self { researcher }
    }

    /// Run one round of tasks in parallel and record the results. Returns
    /// only after every spawned task has settled, so callers see a fully
    /// aggregated store.
    pub async fn run_round(&self, tasks: Vec<ResearchTask>, store: &ResultStore) -> RoundOutcome {
        let mut outcome = RoundOutcome::default();
        let mut join_set = JoinSet::new();
        let mut seen_ids = HashSet::new();

        for task in tasks {
            let question_id = task.sub_question.id.clone();
            if !seen_ids.insert(question_id.clone()) {
                tracing::warn!(%question_id, "duplicate task in round, keeping the first");
                continue;
            }

            let researcher = self.researcher.clone();
            join_set.spawn(async move {
                let result = researcher.execute(&task).await;
                (question_id, result)
            });
            outcome.dispatched += 1;
        }

        tracing::info!(tasks = outcome.dispatched, "dispatched research round");

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((question_id, Ok(update))) => {
                    store.record(update);
                    outcome.completed.push(question_id);
                }
                Ok((question_id, Err(e))) => {
                    tracing::warn!(
                        %question_id,
                        error = %e,
                        "research task failed, keeping the prior round's answer"
                    );
                    outcome.failed.push(question_id);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "research task panicked");
                }
            }
        }

        tracing::info!(
            completed = outcome.completed.len(),
            failed = outcome.failed.len(),
            "research round settled"
        );
        outcome
    }
}
