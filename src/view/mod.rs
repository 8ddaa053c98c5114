//! Maps session and input state to what the user should see.
//!
//! The view is a pure function of its inputs: `Loading` always wins over a
//! stale result, and a failure shows the error banner instead of the previous
//! graph.

mod text;

use fsm_compiler_client::FsmStats;
use serde::Serialize;

use crate::input::InputController;
use crate::session::SessionState;

pub use text::render_text;

pub const PLACEHOLDER_MESSAGE: &str = "FSM will appear here...";
pub const COMPILE_LABEL: &str = "Generate FSM";
pub const COMPILING_LABEL: &str = "Compiling...";

/// Complete description of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub input: InputPanel,
    pub output: OutputPanel,
}

/// Manual input card
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputPanel {
    /// Which source a compile would use
    pub source: String,
    /// Name shown next to the file picker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Text area is read-only while a file is selected
    pub text_locked: bool,
    pub button_label: &'static str,
    pub button_enabled: bool,
    /// Local validation message shown under the button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_error: Option<String>,
}

/// Visualization card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputPanel {
    Placeholder { message: String },
    Loading,
    Error { message: String },
    Graph(GraphView),
}

/// Input for the graph renderer plus the stats card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub dot_source: String,
    /// Pan/zoom enabled
    pub zoom: bool,
    /// Fit graph to the viewport
    pub fit: bool,
    pub stats: FsmStats,
    pub warnings: Vec<String>,
}

/// Build the view for the current state.
///
/// `validation_error` is the message of the last locally rejected compile, if
/// the user has not changed anything since.
pub fn render(
    state: &SessionState,
    input: &InputController,
    validation_error: Option<&str>,
) -> ViewModel {
    let loading = state.is_loading();

    let input_panel = InputPanel {
        source: input.current_payload().describe(),
        file_name: input.file().map(|f| f.name().to_string()),
        text_locked: input.is_text_locked(),
        button_label: if loading { COMPILING_LABEL } else { COMPILE_LABEL },
        button_enabled: !loading,
        inline_error: validation_error.map(str::to_string),
    };

    let output = match state {
        SessionState::Idle => OutputPanel::Placeholder {
            message: PLACEHOLDER_MESSAGE.to_string(),
        },
        SessionState::Loading => OutputPanel::Loading,
        SessionState::Failed(failure) => OutputPanel::Error {
            message: failure.message.clone(),
        },
        SessionState::Succeeded(result) => OutputPanel::Graph(GraphView {
            dot_source: result.dot_source.clone(),
            zoom: true,
            fit: true,
            stats: result.stats,
            warnings: result.validation_errors.clone(),
        }),
    };

    ViewModel {
        input: input_panel,
        output,
    }
}
