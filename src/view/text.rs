//! Plain-text rendering of a [`ViewModel`] for terminals.

use std::fmt::Write;

use super::{OutputPanel, ViewModel};

/// Render the view as terminal text.
///
/// The graph itself is emitted as its DOT source; turning it into an image is
/// left to Graphviz.
pub fn render_text(view: &ViewModel) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Input: {}", view.input.source);
    if view.input.text_locked {
        let _ = writeln!(out, "  (text input disabled while a file is selected)");
    }
    if let Some(error) = &view.input.inline_error {
        let _ = writeln!(out, "  ! {}", error);
    }

    match &view.output {
        OutputPanel::Placeholder { message } => {
            let _ = writeln!(out, "{}", message);
        }
        OutputPanel::Loading => {
            let _ = writeln!(out, "{}", view.input.button_label);
        }
        OutputPanel::Error { message } => {
            let _ = writeln!(out, "Error: {}", message);
        }
        OutputPanel::Graph(graph) => {
            let _ = writeln!(out, "States: {}", graph.stats.states);
            let _ = writeln!(out, "Transitions: {}", graph.stats.transitions);
            for warning in &graph.warnings {
                let _ = writeln!(out, "warning: {}", warning);
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", graph.dot_source.trim_end());
        }
    }

    out
}
