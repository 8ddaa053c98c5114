//! fsmc CLI - compile procedural manuals into finite-state machines
//!
//! # Usage
//!
//! ```bash
//! # Compile a manual given inline
//! ./target/debug/fsmc-cli -t "If the light is red, stop. If it is green, go."
//!
//! # Compile a manual file and keep the DOT source
//! ./target/debug/fsmc-cli -f manual.txt -o manual.dot
//!
//! # DOT only, for piping into graphviz
//! ./target/debug/fsmc-cli -f manual.txt --quiet | dot -Tsvg > manual.svg
//!
//! # JSON lines for scripting
//! ./target/debug/fsmc-cli -f manual.txt --json | jq .
//!
//! # Is the compiler service up?
//! ./target/debug/fsmc-cli --check -b http://localhost:8000
//!
//! # Interactive REPL mode (when no -t or -f provided)
//! ./target/debug/fsmc-cli
//! ```

use anyhow::Result;
use clap::Parser;

use fsmc_lib::cli::{
    check_health, execute_once, initialize, run_repl, select_file, Args, CompileOutcome,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut ctx = initialize(&args).await?;

    let result = if args.check {
        check_health(&ctx).await.map(|_| true)
    } else if args.is_one_shot() {
        one_shot(&mut ctx, &args).await
    } else {
        run_repl(&mut ctx).await.map(|_| true)
    };

    // Graceful shutdown
    ctx.shutdown().await?;

    if !result? {
        std::process::exit(1);
    }
    Ok(())
}

/// Compile the manual given on the command line. Returns whether it succeeded.
async fn one_shot(ctx: &mut fsmc_lib::cli::CliContext, args: &Args) -> Result<bool> {
    if let Some(ref text) = args.text {
        ctx.input.set_text(text.clone());
    } else if let Some(ref path) = args.file {
        let file = select_file(path).await?;
        ctx.input.set_file([file]);
    }

    Ok(execute_once(ctx).await? == CompileOutcome::Succeeded)
}
