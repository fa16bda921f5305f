//! Command-line interface for the research agent.

pub mod output;

use crate::config::RunConfig;
use clap::Parser;

/// Scout - deep research agent. Plans, researches in parallel, and
/// compiles a cited report for a research question.
#[derive(Debug, Parser)]
#[command(name = "scout-agent", version, about)]
pub struct Cli {
    /// The research question (quotes optional; all arguments are joined)
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Chat model to use
    #[arg(long, env = "SCOUT_MODEL")]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Search results requested per query
    #[arg(long)]
    pub max_search_results: Option<usize>,

    /// Cap on sub-questions in the research plan
    #[arg(long)]
    pub max_questions: Option<usize>,

    /// Re-research rounds allowed after the initial one
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Source content budget for compression prompts
    #[arg(long)]
    pub chars_per_source: Option<usize>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// The full question, joined from the positional arguments.
    pub fn question(&self) -> String {
        self.question.join(" ")
    }

    /// Run configuration: environment defaults overridden by flags.
    pub fn run_config(&self) -> RunConfig {
        let mut config = RunConfig::from_env();
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(max_search_results) = self.max_search_results {
            config.max_search_results = max_search_results;
        }
        if let Some(max_questions) = self.max_questions {
            config.max_questions = max_questions;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if let Some(chars_per_source) = self.chars_per_source {
            config.chars_per_source = chars_per_source;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_words_are_joined() {
        let cli = Cli::parse_from(["scout-agent", "impact", "of", "rust", "adoption"]);
        assert_eq!(cli.question(), "impact of rust adoption");
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "scout-agent",
            "--model",
            "gpt-4o-mini",
            "--max-iterations",
            "3",
            "question",
        ]);
        let config = cli.run_config();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_iterations, 3);
    }

    #[test]
    fn defaults_hold_without_flags() {
        let cli = Cli::parse_from(["scout-agent", "question"]);
        let config = cli.run_config();
        assert_eq!(config.max_iterations, 2);
        assert!(!cli.verbose);
        assert!(!cli.no_color);
    }
}
