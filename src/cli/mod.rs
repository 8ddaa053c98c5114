//! CLI module for fsmc headless operation.
//!
//! The CLI drives the same input controller, compile session and view as any
//! other front end. Instead of pushing events to a window, the CLI runtime
//! sends them through a channel that is consumed by the output handler.
//!
//! ```text
//! +-----------------+     +-------------+     +---------------+
//! | CompileSession  | --> | CliRuntime  | --> | output.rs     |
//! | + view::render  |     | (emit())    |     | (print/JSON)  |
//! +-----------------+     +-------------+     +---------------+
//! ```
//!
//! # REPL Mode
//!
//! When no manual is provided via `-t` or `-f`, the CLI enters
//! interactive REPL mode. See `repl.rs` for details.

mod args;
mod bootstrap;
mod output;
mod repl;
mod runner;

pub use args::Args;
pub use bootstrap::{initialize, CliContext};
pub use output::run_event_loop;
pub use repl::{run_repl, ReplCommand};
pub use runner::{check_health, execute_once, reset, select_file, show, CompileOutcome};
