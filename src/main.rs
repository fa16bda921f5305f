use anyhow::Context;
use clap::Parser;
use scout::cli::output::Output;
use scout::cli::Cli;
use scout::config::ProviderConfig;
use scout::llm::OpenAIClient;
use scout::research::orchestrator::Orchestrator;
use scout::research::reflection::render_analysis;
use scout::search::TavilyClient;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let default_filter = if cli.verbose { "scout=debug" } else { "scout=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(&cli, &output).await {
        output.error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, output: &Output) -> anyhow::Result<()> {
    output.banner();

    let config = cli.run_config();
    let providers = ProviderConfig::from_env().context("provider configuration")?;

    let llm = Arc::new(OpenAIClient::new(
        providers.openai_api_key,
        providers.openai_api_base,
        config.model.clone(),
        config.temperature,
    ));
    let search = Arc::new(TavilyClient::new(
        providers.tavily_api_key,
        providers.tavily_api_base,
    ));

    let question = cli.question();
    output.info(&format!("Researching: {question}"));
    output.kv("model", &config.model);
    output.kv("max iterations", &config.max_iterations.to_string());
    output.newline();

    let orchestrator = Orchestrator::new(llm, search, config);
    let report = orchestrator.run(&question).await?;

    output.header("Research Plan");
    for sq in &report.plan.sub_questions {
        output.list_item(&format!("[{}] {}", sq.id, sq.question));
    }

    if let Some(assessment) = report.assessments.last() {
        output.header("Quality Assessment");
        for line in render_analysis(assessment).lines() {
            output.info(line);
        }
        if !assessment.weak_answers.is_empty() {
            output.warning("some answers remained weak after the iteration budget");
        }
    }

    output.header("Report");
    output.newline();
    println!("{}", report.final_report);

    output.newline();
    output.success(&format!(
        "done: {} of {} questions answered, {} re-research round(s)",
        report.answered,
        report.plan.sub_questions.len(),
        report.iterations,
    ));
    Ok(())
}
