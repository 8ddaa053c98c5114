//! CLI output handling - Event receiver loop.
//!
//! Receives runtime events from the session and renders them according to
//! output mode (terminal, JSON, or quiet). One loop serves one round and
//! exits after the round's `View` event.

use std::io::{self, Write};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::events::SessionEvent;
use crate::runtime::RuntimeEvent;
use crate::view::{render_text, OutputPanel, ViewModel, COMPILING_LABEL};

/// Run the event loop until a `View` event arrives or the channel closes.
///
/// # Arguments
///
/// * `event_rx` - Channel receiver for runtime events
/// * `json_mode` - If true, output events as JSON lines
/// * `quiet_mode` - If true, only output the DOT source (and errors on stderr)
pub async fn run_event_loop(
    mut event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    json_mode: bool,
    quiet_mode: bool,
) -> Result<()> {
    while let Some(event) = event_rx.recv().await {
        if json_mode {
            println!("{}", serde_json::to_string(&event)?);
            io::stdout().flush()?;
        }

        match event {
            RuntimeEvent::Session(session_event) => {
                if !json_mode && !quiet_mode {
                    handle_session_event_terminal(&session_event);
                }
            }
            RuntimeEvent::View(view) => {
                if !json_mode {
                    present_view(&view, quiet_mode)?;
                }
                break;
            }
        }
    }

    Ok(())
}

/// Progress lines on stderr; the view itself carries the outcome.
fn handle_session_event_terminal(event: &SessionEvent) {
    match event {
        SessionEvent::CompileStarted { request_id, .. } => {
            eprintln!("[compile #{}] {}", request_id, COMPILING_LABEL);
        }
        SessionEvent::CompileSucceeded {
            request_id,
            duration_ms: Some(ms),
            ..
        } => {
            eprintln!("[compile #{}] done in {}ms", request_id, ms);
        }
        SessionEvent::CompileFailed { kind, .. } => {
            tracing::debug!("Compile failed: {:?}", kind);
        }
        _ => {}
    }
}

fn present_view(view: &ViewModel, quiet_mode: bool) -> Result<()> {
    if !quiet_mode {
        print!("{}", render_text(view));
        io::stdout().flush()?;
        return Ok(());
    }

    // Quiet mode: DOT on stdout, problems on stderr
    if let Some(error) = &view.input.inline_error {
        eprintln!("{}", error);
    }
    match &view.output {
        OutputPanel::Graph(graph) => println!("{}", graph.dot_source.trim_end()),
        OutputPanel::Error { message } => eprintln!("{}", message),
        OutputPanel::Placeholder { .. } | OutputPanel::Loading => {}
    }
    Ok(())
}
