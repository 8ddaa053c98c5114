//! Lightweight REPL (Read-Eval-Print-Loop) for fsmc-cli.
//!
//! Provides an interactive mode when no manual is given via `-t` or `-f`.
//! Supports commands:
//! - `/text <line>` - Replace the manual text
//! - `/append <line>` - Append a line to the manual text (`\n` starts a new line)
//! - `/file <path>` - Select a `.txt` manual file (locks the text)
//! - `/clear-file` - Drop the selected file
//! - `/compile`, `/c` - Send the active input to the compiler service
//! - `/show` - Show the current view again
//! - `/health` - Check the compiler service
//! - `/reset` - Back to the initial text, no file, no result
//! - `/config <key> [value]` - Read or write a setting
//! - `/quit`, `/exit`, `/q` - Exit the REPL
//!
//! Any other input is appended to the manual text.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;

use crate::input::TextEdit;

use super::bootstrap::CliContext;
use super::runner::{check_health, execute_once, reset, select_file, show};

const HELP: &str = "\
Commands:
  /text <line>          replace the manual text
  /append <line>        append a line to the manual text
  /file <path>          select a .txt manual file
  /clear-file           drop the selected file
  /compile, /c          compile the active input
  /show                 show the current view
  /health               check the compiler service
  /reset                restore the initial text and clear the result
  /config <key> [value] read or write a setting
  /quit, /exit, /q      exit
Any other line is appended to the manual text.";

/// REPL command variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Exit the REPL
    Quit,
    /// Replace the manual text
    Text(String),
    /// Append a line to the manual text
    Append(String),
    File(PathBuf),
    ClearFile,
    Compile,
    Show,
    Health,
    Reset,
    Config { key: String, value: Option<String> },
    Help,
    /// Unknown command (will show help)
    Unknown(String),
    /// Empty input (skip)
    Empty,
}

impl ReplCommand {
    /// Parse user input into a REPL command.
    pub fn parse(input: &str) -> Self {
        let line = input.trim_end_matches(&['\r', '\n'][..]);
        let trimmed = line.trim();

        if trimmed.is_empty() {
            return ReplCommand::Empty;
        }

        if !trimmed.starts_with('/') {
            return ReplCommand::Append(line.to_string());
        }

        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim_start()),
            None => (trimmed, ""),
        };

        match command.to_lowercase().as_str() {
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            "/text" => ReplCommand::Text(unescape(rest)),
            "/append" => ReplCommand::Append(unescape(rest)),
            "/file" if !rest.is_empty() => ReplCommand::File(PathBuf::from(rest)),
            "/clear-file" => ReplCommand::ClearFile,
            "/compile" | "/c" => ReplCommand::Compile,
            "/show" => ReplCommand::Show,
            "/health" => ReplCommand::Health,
            "/reset" => ReplCommand::Reset,
            "/config" if !rest.is_empty() => {
                let (key, value) = match rest.split_once(char::is_whitespace) {
                    Some((key, value)) => (key, Some(value.trim().to_string())),
                    None => (rest, None),
                };
                ReplCommand::Config {
                    key: key.to_string(),
                    value,
                }
            }
            "/help" | "/?" => ReplCommand::Help,
            _ => ReplCommand::Unknown(trimmed.to_string()),
        }
    }
}

/// `\n` in a REPL line starts a new manual line.
fn unescape(line: &str) -> String {
    line.replace("\\n", "\n")
}

/// Run an interactive REPL session.
///
/// Returns when the user exits or on EOF (Ctrl+D).
pub async fn run_repl(ctx: &mut CliContext) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let interactive = ctx.runtime.is_interactive();

    if interactive {
        eprintln!("fsmc-cli interactive mode ({})", ctx.client.base_url());
        eprintln!("Type /help for commands, /quit to exit\n");
    }

    loop {
        if interactive {
            print!("> ");
            stdout.flush()?;
        }

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF (Ctrl+D)
            if interactive {
                eprintln!("\nGoodbye!");
            }
            break;
        }

        match ReplCommand::parse(&input) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => {
                if interactive {
                    eprintln!("Goodbye!");
                }
                break;
            }
            ReplCommand::Help => eprintln!("{}", HELP),
            ReplCommand::Unknown(cmd) => {
                eprintln!("Unknown command: {}", cmd);
                eprintln!("Type /help for commands");
            }
            ReplCommand::Text(text) => edit_text(ctx, text),
            ReplCommand::Append(line) => {
                let text = if ctx.input.text().is_empty() {
                    line
                } else {
                    format!("{}\n{}", ctx.input.text(), line)
                };
                edit_text(ctx, text);
            }
            ReplCommand::File(path) => match select_file(&path).await {
                Ok(file) => {
                    let name = file.name().to_string();
                    ctx.input.set_file([file]);
                    ctx.last_rejection = None;
                    eprintln!("Selected {} (text is locked until /clear-file)", name);
                }
                Err(e) => eprintln!("Error: {:#}", e),
            },
            ReplCommand::ClearFile => match ctx.input.clear_file() {
                Some(file) => {
                    ctx.last_rejection = None;
                    eprintln!("Cleared {}", file.name());
                }
                None => eprintln!("No file selected"),
            },
            ReplCommand::Compile => {
                if let Err(e) = execute_once(ctx).await {
                    eprintln!("Error: {:#}", e);
                }
                println!(); // Blank line between interactions
            }
            ReplCommand::Show => {
                if let Err(e) = show(ctx).await {
                    eprintln!("Error: {:#}", e);
                }
            }
            ReplCommand::Health => {
                if let Err(e) = check_health(ctx).await {
                    eprintln!("Error: {:#}", e);
                }
            }
            ReplCommand::Reset => {
                if let Err(e) = reset(ctx).await {
                    eprintln!("Error: {:#}", e);
                }
            }
            ReplCommand::Config { key, value } => {
                if let Err(e) = config(ctx, &key, value).await {
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }

    Ok(())
}

fn edit_text(ctx: &mut CliContext, text: String) {
    match ctx.input.set_text(text) {
        TextEdit::Applied => ctx.last_rejection = None,
        TextEdit::Locked => {
            eprintln!("A file is selected; use /clear-file before editing the text")
        }
    }
}

/// Read or persist a setting. Values parse as JSON, falling back to a string.
async fn config(ctx: &CliContext, key: &str, value: Option<String>) -> Result<()> {
    match value {
        None => {
            let current = ctx.settings_manager.get_value(key).await?;
            println!("{} = {}", key, current);
        }
        Some(raw) => {
            let parsed = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            ctx.settings_manager.set_value(key, parsed).await?;
            eprintln!("Saved {} (takes effect on next start)", key);
        }
    }
    Ok(())
}
