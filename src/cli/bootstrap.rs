//! CLI bootstrap - wire settings, logging, the compiler client and the session.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fsm_compiler_client::{Client, DEFAULT_BASE_URL};
use tokio::sync::mpsc;

use crate::input::InputController;
use crate::runtime::{CliRuntime, FsmcRuntime, RuntimeEvent};
use crate::session::CompileSession;
use crate::settings::{
    setting_or_env, FsmcSettings, OutputFormat, SettingsManager, BACKEND_URL_ENV,
};

use super::args::Args;

/// Crates whose log output the `--verbose` / `log_level` switch controls
const LOG_TARGETS: &[&str] = &["fsmc_lib", "fsmc_cli", "fsm_compiler_client"];

/// Everything a CLI invocation needs, owned for the duration of the run.
pub struct CliContext {
    /// Runtime abstraction for event emission
    pub runtime: Arc<dyn FsmcRuntime>,

    /// Compile request life cycle
    pub session: CompileSession,

    /// Typed text / selected file
    pub input: InputController,

    /// Compiler service client (shared with the session's transport)
    pub client: Client,

    /// Settings manager
    pub settings_manager: Arc<SettingsManager>,

    /// Where successful DOT output is written, if anywhere
    pub dot_path: Option<PathBuf>,

    pub json_mode: bool,
    pub quiet_mode: bool,

    /// Message of the last locally rejected compile; cleared on input changes
    pub last_rejection: Option<String>,

    /// Command-line arguments
    pub args: Args,
}

impl CliContext {
    /// Assemble a context around an existing client and settings.
    pub fn new(
        args: Args,
        settings: &FsmcSettings,
        settings_manager: Arc<SettingsManager>,
        client: Client,
    ) -> Self {
        // Replaced with a fresh sender at the start of every output round
        let (event_tx, _) = mpsc::unbounded_channel::<RuntimeEvent>();
        let runtime: Arc<dyn FsmcRuntime> = Arc::new(CliRuntime::new(event_tx));

        let session =
            CompileSession::new(Arc::new(client.clone())).with_runtime(runtime.clone());

        let dot_path = args
            .dot_out
            .clone()
            .or_else(|| settings.output.dot_path.as_ref().map(PathBuf::from));

        Self {
            runtime,
            session,
            input: InputController::with_text(settings.input.initial_text.clone()),
            client,
            settings_manager,
            dot_path,
            json_mode: args.json || settings.output.format == OutputFormat::Json,
            quiet_mode: args.quiet,
            last_rejection: None,
            args,
        }
    }

    /// Graceful shutdown.
    pub async fn shutdown(self) -> Result<()> {
        if let Some(orphaned) = self.session.in_flight() {
            tracing::warn!(request = %orphaned, "Shutting down with a compile request in flight");
        }

        if let Err(e) = self.runtime.shutdown().await {
            tracing::warn!("Runtime shutdown error: {}", e);
        }

        Ok(())
    }
}

/// Initialize the CLI context: `.env`, settings, logging, client and session.
pub async fn initialize(args: &Args) -> Result<CliContext> {
    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        // Only warn on errors other than file not found
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("[cli] Failed to load .env file: {}", e);
        }
    }

    let settings_manager = Arc::new(
        match &args.settings {
            Some(path) => SettingsManager::with_path(path).await,
            None => SettingsManager::new().await,
        }
        .context("Failed to initialize settings manager")?,
    );

    let settings = settings_manager.get().await;
    init_logging(args.verbose, &settings.advanced.log_level);

    // Ensure settings file exists (creates template on first run)
    if let Err(e) = settings_manager.ensure_settings_file().await {
        tracing::warn!("Failed to create settings template: {}", e);
    }

    let backend_url = resolve_backend_url(&settings, args);
    let timeout = resolve_timeout(&settings, args);

    if args.verbose {
        eprintln!(
            "[cli] Settings loaded from {}",
            settings_manager.path().display()
        );
        eprintln!("[cli] Backend: {}", backend_url);
        match timeout {
            Some(t) => eprintln!("[cli] Timeout: {}s", t.as_secs()),
            None => eprintln!("[cli] Timeout: none"),
        }
    }

    let client = Client::with_timeout(&backend_url, timeout)
        .with_context(|| format!("Invalid backend URL '{}'", backend_url))?;

    Ok(CliContext::new(
        args.clone(),
        &settings,
        settings_manager,
        client,
    ))
}

/// Install the tracing subscriber. `--verbose` forces debug level.
fn init_logging(verbose: bool, configured_level: &str) {
    let level = if verbose { "debug" } else { configured_level };

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => {
                eprintln!("[cli] Ignoring invalid log level '{}': {}", level, e);
                break;
            }
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve the backend URL: CLI arg > settings > $FSMC_BACKEND_URL > default.
fn resolve_backend_url(settings: &FsmcSettings, args: &Args) -> String {
    if let Some(ref url) = args.backend_url {
        return url.clone();
    }

    setting_or_env(settings.backend.url.as_deref(), &[BACKEND_URL_ENV])
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Resolve the request timeout: CLI arg > settings. Zero disables it.
fn resolve_timeout(settings: &FsmcSettings, args: &Args) -> Option<Duration> {
    let secs = args.timeout.unwrap_or(settings.backend.timeout_secs);
    (secs > 0).then(|| Duration::from_secs(secs))
}
