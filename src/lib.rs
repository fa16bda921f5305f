//! Scout - a deep research agent.
//!
//! Given a natural language research question, Scout plans a set of
//! independent sub-questions, researches them in parallel against a web
//! search provider, assesses answer quality, re-researches weak answers
//! under a bounded retry budget, and compiles a cited markdown report.
//!
//! The orchestration core is provider-agnostic: completions go through
//! [`llm::CompletionClient`] and search through [`search::SearchProvider`],
//! so both can be replaced in tests or swapped for other backends.

pub mod cli;
pub mod config;
pub mod llm;
pub mod prompts;
pub mod research;
pub mod search;
pub mod types;

pub use config::{ProviderConfig, RunConfig};
pub use research::orchestrator::{Orchestrator, RunReport};
pub use types::{AppError, Result};
