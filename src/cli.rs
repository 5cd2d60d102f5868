use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "dviz", about = "AI data visualisation agent", version)]
pub struct Cli {
    /// CSV dataset to analyse.
    #[arg(value_name = "DATASET")]
    pub dataset: PathBuf,

    /// Question to ask about the dataset. Falls back to piped stdin, then to a
    /// stock question.
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Large language model to use.
    #[arg(long)]
    pub model: Option<String>,

    /// Show the full dataset instead of a five-row preview.
    #[arg(long)]
    pub full: bool,

    /// Directory where image and chart artifacts are written.
    #[arg(long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,

    /// LLM provider API key (overrides environment and config file).
    #[arg(long = "llm-key")]
    pub llm_key: Option<String>,

    /// Sandbox provider API key (overrides environment and config file).
    #[arg(long = "sandbox-key")]
    pub sandbox_key: Option<String>,

    /// Print the code and explanation panes without Markdown rendering.
    #[arg(long = "no-md")]
    pub no_md: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
