mod cli;
mod config;
mod dataset;
mod extract;
mod handlers;
mod llm;
mod prompt;
mod render;
mod results;
mod sandbox;

use std::io::{self, Read};

use anyhow::Result;
use config::Config;
use is_terminal::IsTerminal;
use render::Renderer;
use tracing::debug;

const DEFAULT_QUESTION: &str =
    "Can you compare the average cost of the two people across categories?";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = cli::Cli::parse();

    let mut cfg = Config::load();
    if let Some(key) = args.llm_key.clone() {
        cfg.set("LLM_API_KEY", key);
    }
    if let Some(key) = args.sandbox_key.clone() {
        cfg.set("SANDBOX_API_KEY", key);
    }

    // Resolve model: CLI overrides config; config carries the default.
    let model = args
        .model
        .clone()
        .or_else(|| cfg.get("DEFAULT_MODEL"))
        .unwrap_or_else(|| "Qwen/Qwen2.5-7B-Instruct".to_string());

    // Question: positional argument, then piped stdin, then the stock question.
    let mut question = args.question.clone().unwrap_or_default();
    if question.is_empty() && !io::stdin().is_terminal() {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        question = buf.trim().to_string();
    }
    if question.is_empty() {
        question = DEFAULT_QUESTION.to_string();
    }

    let markdown = if args.no_md { false } else { cfg.get_bool("PRETTIFY_MARKDOWN") };
    let show_full = args.full || cfg.get_bool("SHOW_FULL_DATASET");

    let ds = dataset::load(&args.dataset)?;
    let renderer = Renderer::new(args.out_dir.clone(), markdown);

    if show_full {
        renderer.section(&format!("Dataset ({} rows)", ds.rows.len()));
        renderer.table(&ds.table(None));
    } else {
        renderer.section("Dataset preview (first 5 rows)");
        renderer.table(&ds.table(Some(dataset::PREVIEW_ROWS)));
    }
    renderer.section("Question");
    renderer.text(&question);

    let outcome = handlers::analyze::run(&cfg, &ds, &question, &model, &renderer).await?;
    debug!(?outcome, "analyse action finished");

    Ok(())
}
