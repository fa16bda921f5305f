//! The research orchestration core.
//!
//! A run flows through a fixed stage sequence: plan, fan research tasks out
//! in parallel, aggregate, assess quality, optionally re-research weak
//! answers under a bounded retry budget, then compile a cited report.
//!
//! - [`planner`] - request parsing and question decomposition
//! - [`dispatcher`] - fan-out/fan-in of independent research tasks
//! - [`researcher`] - the per-question search/extract/synthesize pipeline
//! - [`ranker`] - URL deduplication and top-K selection of search hits
//! - [`store`] - the shared per-question result store
//! - [`reflection`] - quality assessment of a settled round
//! - [`citations`] - deterministic citation renumbering
//! - [`compiler`] - final report planning and generation
//! - [`orchestrator`] - the top-level state machine

pub mod citations;
pub mod compiler;
pub mod dispatcher;
pub mod orchestrator;
pub mod planner;
pub mod ranker;
pub mod reflection;
pub mod researcher;
pub mod store;

/// Char-boundary-safe prefix, used wherever prompt context gets sliced.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
