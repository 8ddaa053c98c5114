//! HTTP client for the manual-to-FSM compiler service.
//!
//! The service turns a natural-language procedural manual into a finite-state
//! machine and answers with a Graphviz DOT description plus summary counts.
//!
//! # Example
//!
//! ```rust,no_run
//! use fsm_compiler_client::{Client, CompileRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:8000")?;
//!
//!     let response = client
//!         .compile(CompileRequest::text("If the light is red, stop.\nOtherwise, go."))
//!         .await?;
//!
//!     println!("{}", response.dot_source);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{Client, DEFAULT_BASE_URL};
pub use error::CompilerClientError;
pub use types::*;
