//! CLI execution runner.
//!
//! Every user action that changes what is on screen runs as one output round:
//! a fresh event channel, the action itself, then the resulting view.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::FsmcError;
use crate::input::{ManualFile, ACCEPTED_EXTENSION};
use crate::runtime::{CliRuntime, RuntimeEvent};
use crate::session::SessionState;
use crate::view::{self, OutputPanel};

use super::bootstrap::CliContext;
use super::output::run_event_loop;

/// How a compile round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Succeeded,
    /// Remote failure, committed to the session
    Failed,
    /// Rejected locally; nothing was sent
    Rejected,
}

/// Compile the current input and present the result.
pub async fn execute_once(ctx: &mut CliContext) -> Result<CompileOutcome> {
    let output_handle = begin_round(ctx);

    let payload = ctx.input.current_payload();
    tracing::debug!("Compiling {}", payload.describe());

    let outcome = match ctx.session.compile(payload).await {
        Ok(SessionState::Succeeded(_)) => {
            ctx.last_rejection = None;
            CompileOutcome::Succeeded
        }
        Ok(_) => {
            ctx.last_rejection = None;
            CompileOutcome::Failed
        }
        Err(FsmcError::InputValidation(reason)) => {
            ctx.last_rejection = Some(reason);
            CompileOutcome::Rejected
        }
        Err(FsmcError::CompileInFlight) => {
            ctx.last_rejection = Some("A compile is already running".to_string());
            CompileOutcome::Rejected
        }
        Err(e) => return Err(e).context("Compile failed unexpectedly"),
    };

    finish_round(ctx, output_handle).await?;
    Ok(outcome)
}

/// Present the current view without changing anything.
pub async fn show(ctx: &CliContext) -> Result<()> {
    let output_handle = begin_round(ctx);
    finish_round(ctx, output_handle).await
}

/// Reset input and session to their initial state and present the result.
pub async fn reset(ctx: &mut CliContext) -> Result<()> {
    let output_handle = begin_round(ctx);
    ctx.session.reset();
    ctx.input.reset();
    ctx.last_rejection = None;
    finish_round(ctx, output_handle).await
}

/// Check that the compiler service root answers.
pub async fn check_health(ctx: &CliContext) -> Result<()> {
    let health = ctx.client.health().await.with_context(|| {
        format!(
            "Compiler service at {} is not reachable",
            ctx.client.base_url()
        )
    })?;

    if ctx.json_mode {
        let report = serde_json::json!({
            "backend": ctx.client.base_url().as_str(),
            "message": health.message,
        });
        println!("{}", report);
    } else {
        println!("{} - {}", ctx.client.base_url(), health.message);
    }
    Ok(())
}

/// File picker: accept an existing `.txt` file.
pub async fn select_file(path: &Path) -> Result<ManualFile> {
    let file = ManualFile::from_path(path)?;

    if !file.has_accepted_extension() {
        anyhow::bail!(
            "'{}' is not a .{} file",
            file.name(),
            ACCEPTED_EXTENSION
        );
    }

    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot open '{}'", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("'{}' is not a regular file", path.display());
    }

    Ok(file)
}

/// Point the runtime at a fresh channel and start rendering from it.
fn begin_round(ctx: &CliContext) -> JoinHandle<Result<()>> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    // We need to downcast to CliRuntime to access replace_event_tx
    if let Some(cli_runtime) = ctx.runtime.as_any().downcast_ref::<CliRuntime>() {
        cli_runtime.replace_event_tx(event_tx);
    } else {
        tracing::warn!("Runtime is not CliRuntime, events may not be received");
    }

    let json_mode = ctx.json_mode;
    let quiet_mode = ctx.quiet_mode;
    tokio::spawn(async move { run_event_loop(event_rx, json_mode, quiet_mode).await })
}

/// Emit the current view, wait for the output loop, then write DOT output.
///
/// The view is always presented; a failed DOT write is reported afterwards.
async fn finish_round(ctx: &CliContext, output_handle: JoinHandle<Result<()>>) -> Result<()> {
    let view = view::render(
        &ctx.session.state(),
        &ctx.input,
        ctx.last_rejection.as_deref(),
    );

    let dot_source = match &view.output {
        OutputPanel::Graph(graph) => Some(graph.dot_source.clone()),
        _ => None,
    };

    let emitted = ctx.runtime.emit(RuntimeEvent::View(Box::new(view)));
    if let Err(e) = &emitted {
        // Nobody will end the loop for us
        tracing::warn!("Failed to emit view: {}", e);
        output_handle.abort();
    }

    match output_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!("Output handler error: {}", e);
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => {
            tracing::warn!("Output handler panicked: {}", e);
        }
    }

    if let (Some(dot_source), Some(path)) = (dot_source, &ctx.dot_path) {
        tokio::fs::write(path, dot_source)
            .await
            .with_context(|| format!("Failed to write DOT output to {}", path.display()))?;
        tracing::info!("Wrote DOT source to {}", path.display());
        if !ctx.quiet_mode && !ctx.json_mode {
            eprintln!("[output] DOT written to {}", path.display());
        }
    }

    emitted?;
    Ok(())
}
