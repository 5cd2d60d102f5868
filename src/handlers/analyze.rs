//! The analyse action: upload, generate code, execute, render, explain.
//!
//! One strictly linear pass per invocation. Every early exit is a terminal
//! [`Outcome`]; the sandbox session is closed on every path out of the body.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::dataset::Dataset;
use crate::extract;
use crate::llm::LlmClient;
use crate::prompt;
use crate::render::Renderer;
use crate::results::{classify, ResultKind};
use crate::sandbox::{SandboxClient, SandboxSession};

/// Terminal state of one analyse action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Full pipeline ran: code, execution, rendered results, explanation.
    Explained,
    /// The code-generation chat call failed; nothing was executed.
    ChatFailed,
    /// The model answered without a fenced code block.
    NoCode,
    /// The sandbox reported an execution error; no usable results.
    ExecutionFailed,
    /// Execution succeeded but produced nothing to render or explain.
    NoResults,
    /// Results were rendered but the explanation chat call failed.
    NoExplanation,
}

pub async fn run(
    cfg: &Config,
    dataset: &Dataset,
    question: &str,
    model: &str,
    renderer: &Renderer,
) -> Result<Outcome> {
    // Both credentials are preconditions; nothing goes on the wire without them.
    let has_key = |key: &str| {
        cfg.get(key)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    };
    if !has_key("LLM_API_KEY") || !has_key("SANDBOX_API_KEY") {
        bail!(
            "both LLM_API_KEY and SANDBOX_API_KEY are required; set them in the \
             environment, in {}, or via --llm-key/--sandbox-key",
            cfg.config_path.display()
        );
    }

    let llm = LlmClient::from_config(cfg)?;
    let sandbox = SandboxClient::from_config(cfg)?;

    let session = sandbox
        .create()
        .await
        .map_err(|e| anyhow::anyhow!("cannot create sandbox: {e}"))?;
    let outcome = run_in_session(&session, &llm, dataset, question, model, renderer).await;
    session.close().await;
    outcome
}

async fn run_in_session(
    session: &SandboxSession,
    llm: &LlmClient,
    dataset: &Dataset,
    question: &str,
    model: &str,
    renderer: &Renderer,
) -> Result<Outcome> {
    session
        .write_file(&dataset.sandbox_path(), dataset.bytes.clone())
        .await
        .map_err(|e| anyhow::anyhow!("dataset upload failed: {e}"))?;

    let messages = prompt::code_only(&dataset.sandbox_path(), question);
    let response = match llm.complete(&messages, &prompt::code_options(model)).await {
        Ok(text) => text,
        Err(e) => {
            // Error text stays out of the model-output channel; it is never
            // handed to the code extractor.
            renderer.error(&format!("model request failed: {e}"));
            return Ok(Outcome::ChatFailed);
        }
    };

    let Some(code) = extract::first_code_block(&response) else {
        renderer.warning("the model response contained no Python code block");
        return Ok(Outcome::NoCode);
    };

    renderer.section("Generated analysis code");
    renderer.code(&code);

    // Execution is attempted at most once per action.
    let exec = session
        .run_code(&code)
        .await
        .map_err(|e| anyhow::anyhow!("code execution request failed: {e}"))?;
    if !exec.logs.is_empty() {
        renderer.diagnostics(&exec.logs);
    }
    if let Some(err) = &exec.error {
        renderer.warning(&format!("execution failed: {}", err.summary()));
        if !err.traceback.is_empty() {
            renderer.dim(&err.traceback);
        }
        return Ok(Outcome::ExecutionFailed);
    }
    if exec.results.is_empty() {
        renderer.warning("execution returned no results; skipping explanation");
        return Ok(Outcome::NoResults);
    }

    renderer.section("Results");
    let kinds: Vec<ResultKind> = exec.results.iter().map(classify).collect();
    for (i, kind) in kinds.iter().enumerate() {
        renderer.result(i + 1, kind)?;
    }

    // At least one result exists, so the explanation step may run.
    let exec_text = if kinds.len() == 1 {
        kinds[0].text_form()
    } else {
        kinds
            .iter()
            .map(ResultKind::text_form)
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    renderer.section("Explanation");
    match llm
        .complete(&prompt::explain(question, &exec_text), &prompt::explain_options(model))
        .await
    {
        Ok(text) => {
            renderer.explanation(&text);
            Ok(Outcome::Explained)
        }
        Err(e) => {
            renderer.error(&format!("explanation request failed: {e}"));
            Ok(Outcome::NoExplanation)
        }
    }
}
