//! Compile request life cycle.
//!
//! A [`CompileSession`] drives `Idle → Loading → Succeeded | Failed` and owns
//! the only copy of that state. Every transition happens under one lock, so a
//! reader never sees a half-applied transition. The network call itself runs
//! outside the lock; input edits made meanwhile only affect the next submit.
//!
//! Each submit is tagged with a [`RequestId`]. A response is committed only
//! if its id is still the one the session is waiting for, so a response that
//! outlives a [`CompileSession::reset`] is dropped silently.

mod state;
mod transport;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fsm_compiler_client::CompileRequest;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{FsmcError, Result};
use crate::events::SessionEvent;
use crate::input::InputPayload;
use crate::runtime::{FsmcRuntime, RuntimeEvent};

pub use state::{
    CompileResult, Failure, FailureKind, RequestId, SessionState, COMPILE_FAILED_MESSAGE,
};
pub use transport::CompileTransport;

struct Inner {
    state: SessionState,
    /// Last request id handed out
    generation: u64,
    /// Request whose response may still be committed
    in_flight: Option<RequestId>,
    started_at: Option<DateTime<Utc>>,
    /// Most recent successful result, kept until overwritten or reset
    last_result: Option<CompileResult>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            in_flight: None,
            started_at: None,
            last_result: None,
        }
    }

    /// Whether a response tagged `id` may be committed right now.
    fn accepts(&self, id: RequestId) -> bool {
        self.state.is_loading() && self.in_flight == Some(id)
    }

    fn elapsed_ms(&self) -> Option<u64> {
        self.started_at
            .map(|started| (Utc::now() - started).num_milliseconds().max(0) as u64)
    }
}

/// Owns the compile state machine and issues compile requests.
pub struct CompileSession {
    id: Uuid,
    inner: Mutex<Inner>,
    transport: Arc<dyn CompileTransport>,
    runtime: Option<Arc<dyn FsmcRuntime>>,
}

impl CompileSession {
    /// Create an idle session that sends requests through `transport`.
    pub fn new(transport: Arc<dyn CompileTransport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(Inner::new()),
            transport,
            runtime: None,
        }
    }

    /// Emit lifecycle events through `runtime`.
    pub fn with_runtime(mut self, runtime: Arc<dyn FsmcRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    /// The request currently awaiting a response, if any.
    pub fn in_flight(&self) -> Option<RequestId> {
        self.inner.lock().in_flight
    }

    /// The most recent successful result, even while a newer request is loading.
    ///
    /// Renderers should prefer [`CompileSession::state`]: `Loading` and `Failed`
    /// take precedence over this value.
    pub fn last_result(&self) -> Option<CompileResult> {
        self.inner.lock().last_result.clone()
    }

    /// Enter `Loading` and hand out a fresh request id.
    ///
    /// Returns `None` without changing anything if a request is already in
    /// flight.
    pub fn submit(&self) -> Option<RequestId> {
        let mut inner = self.inner.lock();

        if inner.state.is_loading() {
            tracing::warn!(session = %self.id, "Submit ignored: a compile request is already in flight");
            return None;
        }

        inner.generation += 1;
        let id = RequestId(inner.generation);
        let started_at = Utc::now();

        inner.state = SessionState::Loading;
        inner.in_flight = Some(id);
        inner.started_at = Some(started_at);

        tracing::debug!(session = %self.id, request = %id, "Session -> loading");
        self.emit(SessionEvent::CompileStarted {
            session_id: self.id.to_string(),
            request_id: id.get(),
            started_at,
        });

        Some(id)
    }

    /// Commit a successful response for request `id`.
    ///
    /// Returns `false` (and leaves the state untouched) unless the session is
    /// loading and `id` is the request it is waiting for.
    pub fn on_success(&self, id: RequestId, result: CompileResult) -> bool {
        let mut inner = self.inner.lock();

        if !inner.accepts(id) {
            tracing::debug!(
                session = %self.id,
                request = %id,
                state = inner.state.name(),
                "Discarding stale compile result"
            );
            return false;
        }

        let duration_ms = inner.elapsed_ms();
        self.emit(SessionEvent::CompileSucceeded {
            session_id: self.id.to_string(),
            request_id: id.get(),
            states: result.stats.states,
            transitions: result.stats.transitions,
            warnings: result.validation_errors.len(),
            duration_ms,
        });

        inner.last_result = Some(result.clone());
        inner.state = SessionState::Succeeded(result);
        inner.in_flight = None;
        inner.started_at = None;

        tracing::debug!(session = %self.id, request = %id, "Session -> succeeded");
        true
    }

    /// Commit a failure for request `id`. Same acceptance rule as
    /// [`CompileSession::on_success`]; a previous result is not restored.
    pub fn on_failure(&self, id: RequestId, failure: Failure) -> bool {
        let mut inner = self.inner.lock();

        if !inner.accepts(id) {
            tracing::debug!(
                session = %self.id,
                request = %id,
                state = inner.state.name(),
                "Discarding stale compile failure"
            );
            return false;
        }

        let duration_ms = inner.elapsed_ms();
        self.emit(SessionEvent::CompileFailed {
            session_id: self.id.to_string(),
            request_id: id.get(),
            message: failure.message.clone(),
            kind: failure.kind,
            duration_ms,
        });

        inner.state = SessionState::Failed(failure);
        inner.in_flight = None;
        inner.started_at = None;

        tracing::debug!(session = %self.id, request = %id, "Session -> failed");
        true
    }

    /// Return to `Idle`, forget the last result and orphan any in-flight request.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();

        if let Some(orphaned) = inner.in_flight {
            tracing::info!(session = %self.id, request = %orphaned, "Reset while loading; response will be discarded");
        }

        let generation = inner.generation;
        *inner = Inner::new();
        inner.generation = generation;

        self.emit(SessionEvent::SessionReset {
            session_id: self.id.to_string(),
        });
    }

    /// Validate `payload`, send it, and commit the outcome.
    ///
    /// Local validation failures return [`FsmcError::InputValidation`] without
    /// entering `Loading`; a call made while another request is in flight
    /// returns [`FsmcError::CompileInFlight`] and sends nothing. Remote failures
    /// are not errors here: they are committed as `Failed` and the resulting
    /// state is returned.
    pub async fn compile(&self, payload: InputPayload) -> Result<SessionState> {
        // File bytes are only read once we know they can be sent
        if self.inner.lock().state.is_loading() {
            tracing::warn!(session = %self.id, "Compile ignored: a compile request is already in flight");
            return Err(FsmcError::CompileInFlight);
        }

        let request = match build_request(payload).await {
            Ok(request) => request,
            Err(err) => {
                tracing::info!(session = %self.id, "Compile rejected: {}", err);
                self.emit(SessionEvent::InputRejected {
                    session_id: self.id.to_string(),
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let id = self.submit().ok_or(FsmcError::CompileInFlight)?;

        tracing::info!(
            session = %self.id,
            request = %id,
            field = request.field_name(),
            bytes = request.len(),
            "Compile request dispatched"
        );

        match self.transport.compile(request).await {
            Ok(response) => {
                self.on_success(id, response.into());
            }
            Err(err) => {
                tracing::warn!(session = %self.id, request = %id, "Compile request failed: {}", err);
                self.on_failure(id, Failure::from_error(&err));
            }
        }

        Ok(self.state())
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(runtime) = &self.runtime {
            if let Err(e) = runtime.emit(RuntimeEvent::Session(event)) {
                tracing::warn!("Failed to emit session event: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for CompileSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileSession")
            .field("id", &self.id)
            .field("state", &self.inner.lock().state.name())
            .finish_non_exhaustive()
    }
}

/// Turn the active payload into a request, rejecting empty input.
///
/// Text that is empty or whitespace-only is rejected. Files are rejected when
/// they cannot be read or have zero bytes; their content is otherwise sent
/// as-is.
async fn build_request(payload: InputPayload) -> Result<CompileRequest> {
    match payload {
        InputPayload::Text(text) => {
            if text.trim().is_empty() {
                return Err(FsmcError::InputValidation(
                    "Manual text is empty".to_string(),
                ));
            }
            Ok(CompileRequest::Text(text))
        }
        InputPayload::File(file) => {
            let content = file.read().await.map_err(|e| {
                FsmcError::InputValidation(format!("Could not read '{}': {}", file.name(), e))
            })?;

            if content.is_empty() {
                return Err(FsmcError::InputValidation(format!(
                    "'{}' is empty",
                    file.name()
                )));
            }

            Ok(CompileRequest::file(file.name(), content))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputController, ManualFile};
    use crate::runtime::RuntimeError;
    use async_trait::async_trait;
    use fsm_compiler_client::{CompileResponse, FsmStats};
    use std::any::Any;
    use std::collections::VecDeque;
    use tokio::sync::oneshot;

    fn response(states: u64, transitions: u64) -> CompileResponse {
        CompileResponse {
            dot_source: "digraph{...}".to_string(),
            fsm_stats: FsmStats {
                states,
                transitions,
            },
            status: Some("success".to_string()),
            validation_errors: Vec::new(),
            fsm_data: None,
        }
    }

    fn result(states: u64, transitions: u64) -> CompileResult {
        response(states, transitions).into()
    }

    /// Answers from a script, recording every request it sees
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<CompileResponse>>>,
        requests: Mutex<Vec<CompileRequest>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<CompileResponse>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl CompileTransport for ScriptedTransport {
        async fn compile(&self, request: CompileRequest) -> Result<CompileResponse> {
            self.requests.lock().push(request);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(FsmcError::Transport("script exhausted".to_string())))
        }
    }

    /// Holds the response until the test releases it
    struct GatedTransport {
        entered: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<Result<CompileResponse>>>>,
        calls: Mutex<usize>,
    }

    impl GatedTransport {
        fn new() -> (
            Arc<Self>,
            oneshot::Receiver<()>,
            oneshot::Sender<Result<CompileResponse>>,
        ) {
            let (entered_tx, entered_rx) = oneshot::channel();
            let (release_tx, release_rx) = oneshot::channel();
            let transport = Arc::new(Self {
                entered: Mutex::new(Some(entered_tx)),
                release: Mutex::new(Some(release_rx)),
                calls: Mutex::new(0),
            });
            (transport, entered_rx, release_tx)
        }
    }

    #[async_trait]
    impl CompileTransport for GatedTransport {
        async fn compile(&self, _request: CompileRequest) -> Result<CompileResponse> {
            *self.calls.lock() += 1;
            let entered = self.entered.lock().take();
            if let Some(entered) = entered {
                let _ = entered.send(());
            }
            let release = self.release.lock().take();
            match release {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(FsmcError::Transport("gate dropped".to_string()))),
                None => Err(FsmcError::Transport("gate already used".to_string())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingRuntime {
        events: Mutex<Vec<SessionEvent>>,
    }

    #[async_trait]
    impl FsmcRuntime for RecordingRuntime {
        fn emit(&self, event: RuntimeEvent) -> std::result::Result<(), RuntimeError> {
            if let RuntimeEvent::Session(event) = event {
                self.events.lock().push(event);
            }
            Ok(())
        }

        fn is_interactive(&self) -> bool {
            false
        }

        async fn shutdown(&self) -> std::result::Result<(), RuntimeError> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[tokio::test]
    async fn test_text_compile_succeeds() {
        let transport = ScriptedTransport::new(vec![Ok(response(2, 2))]);
        let session = CompileSession::new(transport.clone());

        let mut input = InputController::new();
        input.set_text("If the light is red, stop.\nOtherwise, go.");

        let state = session.compile(input.current_payload()).await.unwrap();

        let result = state.result().expect("succeeded");
        assert_eq!(result.stats.states, 2);
        assert_eq!(result.dot_source, "digraph{...}");
        assert_eq!(session.state(), state);
        assert_eq!(
            transport.requests.lock()[0],
            CompileRequest::Text("If the light is red, stop.\nOtherwise, go.".to_string())
        );
    }

    #[tokio::test]
    async fn test_file_compile_sends_file_bytes() {
        let transport = ScriptedTransport::new(vec![Ok(response(1, 0))]);
        let session = CompileSession::new(transport.clone());

        let mut input = InputController::new();
        input.set_file(vec![ManualFile::from_bytes("manual.txt", "Step 1...")]);
        input.set_text("ignored");

        session.compile(input.current_payload()).await.unwrap();

        assert_eq!(
            transport.requests.lock()[0],
            CompileRequest::file("manual.txt", "Step 1...")
        );
    }

    #[tokio::test]
    async fn test_empty_text_never_reaches_network() {
        let transport = ScriptedTransport::new(vec![Ok(response(2, 2))]);
        let runtime = Arc::new(RecordingRuntime::default());
        let session = CompileSession::new(transport.clone()).with_runtime(runtime.clone());

        for text in ["", "   \n\t"] {
            let err = session
                .compile(InputPayload::Text(text.to_string()))
                .await
                .unwrap_err();
            assert!(matches!(err, FsmcError::InputValidation(_)));
        }

        assert_eq!(transport.calls(), 0);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(runtime
            .events
            .lock()
            .iter()
            .all(|e| matches!(e, SessionEvent::InputRejected { .. })));
    }

    #[tokio::test]
    async fn test_empty_or_unreadable_file_rejected() {
        let transport = ScriptedTransport::new(Vec::new());
        let session = CompileSession::new(transport.clone());

        let empty = InputPayload::File(ManualFile::from_bytes("empty.txt", ""));
        let err = session.compile(empty).await.unwrap_err();
        assert!(err.to_string().contains("'empty.txt' is empty"));

        let dir = tempfile::tempdir().unwrap();
        let missing = ManualFile::from_path(dir.path().join("missing.txt")).unwrap();
        let err = session.compile(InputPayload::File(missing)).await.unwrap_err();
        assert!(matches!(err, FsmcError::InputValidation(_)));

        assert_eq!(transport.calls(), 0);
        assert!(!session.state().is_loading());
    }

    #[tokio::test]
    async fn test_failure_then_recovery() {
        let transport = ScriptedTransport::new(vec![
            Err(FsmcError::Transport("connection refused".to_string())),
            Ok(response(2, 2)),
        ]);
        let session = CompileSession::new(transport.clone());
        let payload = InputPayload::Text("Step 1: start".to_string());

        let state = session.compile(payload.clone()).await.unwrap();
        assert_eq!(
            state,
            SessionState::Failed(Failure {
                message: "Failed to compile. Ensure backend is running.".to_string(),
                kind: FailureKind::Transport,
            })
        );

        let state = session.compile(payload).await.unwrap();
        assert!(state.failure().is_none());
        assert_eq!(state.result().map(|r| r.stats.states), Some(2));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_status_and_malformed_failures() {
        let transport = ScriptedTransport::new(vec![
            Err(FsmcError::Status {
                status: 500,
                message: "boom".to_string(),
            }),
            Err(FsmcError::MalformedResponse("missing field `dot_source`".to_string())),
        ]);
        let session = CompileSession::new(transport);
        let payload = InputPayload::Text("go".to_string());

        let state = session.compile(payload.clone()).await.unwrap();
        assert_eq!(state.failure().map(|f| f.kind), Some(FailureKind::Status(500)));
        assert_eq!(
            state.failure().map(|f| f.message.as_str()),
            Some(COMPILE_FAILED_MESSAGE)
        );

        let state = session.compile(payload).await.unwrap();
        assert_eq!(
            state.failure().map(|f| f.kind),
            Some(FailureKind::MalformedResponse)
        );
    }

    #[test]
    fn test_submit_while_loading_is_noop() {
        let session = CompileSession::new(ScriptedTransport::new(Vec::new()));

        let first = session.submit();
        assert_eq!(first, Some(RequestId(1)));
        assert_eq!(session.submit(), None);
        assert!(session.state().is_loading());
        assert_eq!(session.in_flight(), first);
    }

    #[test]
    fn test_request_ids_increase() {
        let session = CompileSession::new(ScriptedTransport::new(Vec::new()));

        let a = session.submit().unwrap();
        session.on_failure(a, Failure::new(FailureKind::Transport));
        let b = session.submit().unwrap();
        session.reset();
        let c = session.submit().unwrap();

        assert!(a < b && b < c);
    }

    #[test]
    fn test_transitions_require_loading_and_matching_id() {
        let session = CompileSession::new(ScriptedTransport::new(Vec::new()));

        // Not loading yet
        assert!(!session.on_success(RequestId(1), result(1, 1)));
        assert!(!session.on_failure(RequestId(1), Failure::new(FailureKind::Transport)));
        assert_eq!(session.state(), SessionState::Idle);

        let id = session.submit().unwrap();
        assert!(!session.on_success(RequestId(id.get() + 1), result(1, 1)));
        assert!(session.state().is_loading());

        assert!(session.on_success(id, result(3, 4)));
        assert_eq!(session.state().result().map(|r| r.stats.transitions), Some(4));
    }

    #[test]
    fn test_repeated_success_is_idempotent() {
        let session = CompileSession::new(ScriptedTransport::new(Vec::new()));
        let id = session.submit().unwrap();
        assert!(session.on_success(id, result(2, 2)));
        let before = session.state();

        assert!(!session.on_success(id, result(2, 2)));
        assert_eq!(session.state(), before);
    }

    #[test]
    fn test_failure_does_not_restore_previous_result() {
        let session = CompileSession::new(ScriptedTransport::new(Vec::new()));

        let id = session.submit().unwrap();
        session.on_success(id, result(2, 2));

        let id = session.submit().unwrap();
        assert!(session.state().is_loading());
        // Stale result stays in memory while loading
        assert_eq!(session.last_result().map(|r| r.stats.states), Some(2));

        session.on_failure(id, Failure::new(FailureKind::Transport));
        assert!(session.state().result().is_none());
        assert!(session.state().failure().is_some());
    }

    #[test]
    fn test_reset_clears_state() {
        let session = CompileSession::new(ScriptedTransport::new(Vec::new()));
        let id = session.submit().unwrap();
        session.on_success(id, result(2, 2));

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.last_result().is_none());
        assert!(session.in_flight().is_none());
    }

    #[tokio::test]
    async fn test_second_compile_while_loading_is_rejected() {
        let (transport, entered, release) = GatedTransport::new();
        let session = CompileSession::new(transport.clone());

        let first = session.compile(InputPayload::Text("first".to_string()));
        let second = async {
            entered.await.unwrap();
            assert!(session.state().is_loading());

            let err = session
                .compile(InputPayload::Text("second".to_string()))
                .await
                .unwrap_err();
            assert!(matches!(err, FsmcError::CompileInFlight));

            release.send(Ok(response(2, 2))).unwrap();
        };

        let (first, ()) = futures::join!(first, second);
        assert_eq!(first.unwrap().result().map(|r| r.stats.states), Some(2));
        assert_eq!(*transport.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_file_is_not_read_while_loading() {
        let (transport, entered, release) = GatedTransport::new();
        let session = CompileSession::new(transport.clone());
        let dir = tempfile::tempdir().unwrap();
        // Reading this would fail with InputValidation
        let missing = ManualFile::from_path(dir.path().join("missing.txt")).unwrap();

        let first = session.compile(InputPayload::Text("first".to_string()));
        let second = async {
            entered.await.unwrap();

            let err = session
                .compile(InputPayload::File(missing))
                .await
                .unwrap_err();
            assert!(matches!(err, FsmcError::CompileInFlight));

            release.send(Ok(response(1, 1))).unwrap();
        };

        let (first, ()) = futures::join!(first, second);
        assert!(first.unwrap().result().is_some());
        assert_eq!(*transport.calls.lock(), 1);
    }

    #[tokio::test]
    async fn test_response_after_reset_is_discarded() {
        let (transport, entered, release) = GatedTransport::new();
        let runtime = Arc::new(RecordingRuntime::default());
        let session = CompileSession::new(transport).with_runtime(runtime.clone());

        let compile = session.compile(InputPayload::Text("stale".to_string()));
        let interrupt = async {
            entered.await.unwrap();
            session.reset();
            release.send(Ok(response(9, 9))).unwrap();
        };

        let (state, ()) = futures::join!(compile, interrupt);
        assert_eq!(state.unwrap(), SessionState::Idle);
        assert!(session.last_result().is_none());

        let events = runtime.events.lock();
        assert!(matches!(events[0], SessionEvent::CompileStarted { request_id: 1, .. }));
        assert!(matches!(events[1], SessionEvent::SessionReset { .. }));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_events_follow_transitions() {
        let transport = ScriptedTransport::new(vec![Ok(response(2, 3))]);
        let runtime = Arc::new(RecordingRuntime::default());
        let session = CompileSession::new(transport).with_runtime(runtime.clone());

        session
            .compile(InputPayload::Text("go".to_string()))
            .await
            .unwrap();

        let events = runtime.events.lock();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SessionEvent::CompileStarted { request_id: 1, .. }));
        match &events[1] {
            SessionEvent::CompileSucceeded {
                request_id,
                states,
                transitions,
                ..
            } => {
                assert_eq!(*request_id, 1);
                assert_eq!(*states, 2);
                assert_eq!(*transitions, 3);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(events.iter().all(|e| e.session_id() == session.id().to_string()));
    }
}
