//! Manual input state: typed text versus an uploaded file.
//!
//! The two sources are mutually exclusive. Selecting a file makes it the
//! authoritative source and locks the text area; the typed text is kept in
//! storage so clearing the file brings it back untouched.

mod file;

pub use file::{ManualFile, ACCEPTED_EXTENSION};

/// Manual pre-filled in the text area on startup
pub const SAMPLE_MANUAL: &str = "If the light is red, stop.\nOtherwise, go.";

/// The single input source a compile would use right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPayload {
    Text(String),
    File(ManualFile),
}

impl InputPayload {
    /// Short human-readable description of the source.
    pub fn describe(&self) -> String {
        match self {
            InputPayload::Text(text) => format!("text ({} chars)", text.chars().count()),
            InputPayload::File(file) => format!("file '{}'", file.name()),
        }
    }
}

/// Outcome of a text edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEdit {
    Applied,
    /// A file is active and the text area is read-only
    Locked,
}

/// Owns the (text, file) input pair and answers which payload is active.
#[derive(Debug, Clone)]
pub struct InputController {
    text: String,
    file: Option<ManualFile>,
    initial_text: String,
}

impl InputController {
    /// Controller pre-filled with [`SAMPLE_MANUAL`].
    pub fn new() -> Self {
        Self::with_text(SAMPLE_MANUAL)
    }

    /// Controller whose text area starts with (and resets to) `initial_text`.
    pub fn with_text(initial_text: impl Into<String>) -> Self {
        let initial_text = initial_text.into();
        Self {
            text: initial_text.clone(),
            file: None,
            initial_text,
        }
    }

    /// Replace the typed text. Any string is accepted, including an empty one.
    pub fn set_text(&mut self, text: impl Into<String>) -> TextEdit {
        if let Some(file) = &self.file {
            tracing::debug!(file = file.name(), "Text edit ignored while a file is selected");
            return TextEdit::Locked;
        }

        self.text = text.into();
        TextEdit::Applied
    }

    /// Take the first entry of a file selection as the active source.
    ///
    /// An empty selection leaves the state unchanged. Returns whether a file
    /// was taken.
    pub fn set_file<I>(&mut self, selection: I) -> bool
    where
        I: IntoIterator<Item = ManualFile>,
    {
        match selection.into_iter().next() {
            Some(file) => {
                tracing::debug!(file = file.name(), "Manual file selected");
                self.file = Some(file);
                true
            }
            None => false,
        }
    }

    /// Drop the selected file and unlock the text area.
    pub fn clear_file(&mut self) -> Option<ManualFile> {
        self.file.take()
    }

    /// The payload a compile would send. A selected file always wins.
    pub fn current_payload(&self) -> InputPayload {
        match &self.file {
            Some(file) => InputPayload::File(file.clone()),
            None => InputPayload::Text(self.text.clone()),
        }
    }

    /// Whether the text area should be presented read-only.
    pub fn is_text_locked(&self) -> bool {
        self.file.is_some()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file(&self) -> Option<&ManualFile> {
        self.file.as_ref()
    }

    /// Back to the initial text with no file selected.
    pub fn reset(&mut self) {
        self.text = self.initial_text.clone();
        self.file = None;
    }
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}
