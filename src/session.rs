//! Session lifecycle controller
//!
//! Owns all mutable state for one logical test session and decides, at
//! session start, whether traffic is recorded, replayed, or passed through
//! untouched. All shared state (session log, key→mocks table, call counts)
//! lives here for the session's lifetime; no ambient globals, and no
//! concurrent session may be active against the same manifest path.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::{RunnerConfig, SessionOptions};
use crate::intercept::{
    HookRegistrar, InterceptHook, LiveRequest, PendingTracker, RawExchange, SyntheticResponse,
};
use crate::key::Key;
use crate::recording::InteractionRecorder;
use crate::replay::MockTable;
use crate::storage::{
    manifest_file_name, Manifest, NativeProbe, PathProbe, SessionStore, VersionTag,
};
use crate::{MimeoError, Result};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No active session; traffic passes through unmocked and unrecorded
    Idle,
    /// Every completed live exchange is captured into the session log
    Recording,
    /// Outgoing requests are intercepted and answered from the mock table
    Replaying,
}

/// How the host test run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Test passed; a recording session persists its log
    Passed,
    /// Test failed; the recording is discarded so a broken session never
    /// corrupts the fixture set
    Failed,
}

struct ActiveSession {
    name: String,
    version: VersionTag,
    options: SessionOptions,
    manifest_path: PathBuf,
    recorder: Option<InteractionRecorder>,
    table: Option<MockTable>,
}

/// Orchestrates the record/replay lifecycle for one session at a time
pub struct SessionController {
    config: RunnerConfig,
    store: SessionStore,
    probe: Box<dyn PathProbe + Send>,
    state: SessionState,
    session: Option<ActiveSession>,
    pending: Arc<PendingTracker>,
}

impl SessionController {
    /// Create a controller with the native filesystem probe
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_probe(config, Box::new(NativeProbe))
    }

    /// Create a controller with a host-supplied path probe
    #[must_use]
    pub fn with_probe(config: RunnerConfig, probe: Box<dyn PathProbe + Send>) -> Self {
        Self {
            config,
            store: SessionStore::new(),
            probe,
            state: SessionState::Idle,
            session: None,
            pending: Arc::new(PendingTracker::new()),
        }
    }

    /// Begin a session, deciding between replay, record, and passthrough.
    ///
    /// Replay is chosen when playback is allowed, a manifest exists at the
    /// session's path, and its version equals `version`; a version mismatch
    /// deletes the stale manifest and falls through as if it were absent.
    /// Recording is chosen when the manifest is absent (or was stale),
    /// recording is allowed, and the session is not a custom mock. Anything
    /// else leaves the session in passthrough.
    pub async fn begin_session(
        &mut self,
        name: &str,
        version: impl Into<VersionTag>,
        options: SessionOptions,
    ) -> Result<()> {
        if let Some(active) = &self.session {
            return Err(MimeoError::SessionActive(active.name.clone()));
        }
        validate_session_name(name)?;

        let version = version.into();
        let manifest_path = self.config.manifest_dir.join(manifest_file_name(name));
        let fixture_dir = self.config.fixture_dir.join(name);

        let mut session = ActiveSession {
            name: name.to_string(),
            version: version.clone(),
            options,
            manifest_path: manifest_path.clone(),
            recorder: None,
            table: None,
        };

        if self.config.playback && self.probe.exists(&manifest_path) {
            let mut manifest = self.store.load(&manifest_path).await?;
            if manifest.version == version {
                // Replay readiness gates on every fixture body being
                // attached; the resolver is never consulted before this
                // completes.
                self.store.attach_fixtures(&mut manifest).await?;
                let table =
                    MockTable::build(manifest.recordings, session.options.include_query);
                info!(
                    "Replaying session '{name}' version {version} ({} mocks)",
                    table.len()
                );
                session.table = Some(table);
                self.state = SessionState::Replaying;
                self.session = Some(session);
                return Ok(());
            }

            warn!(
                "Manifest for '{name}' has version {}, wanted {version}; discarding",
                manifest.version
            );
            self.store.delete(&manifest_path).await?;
        }

        if self.config.record && !session.options.is_custom_mock {
            info!("Recording session '{name}' version {version}");
            session.recorder = Some(InteractionRecorder::new(
                fixture_dir,
                session.options.include_query,
            ));
            self.state = SessionState::Recording;
        } else {
            info!("Session '{name}': passthrough (no recording, no mocks)");
            self.state = SessionState::Idle;
        }

        self.session = Some(session);
        Ok(())
    }

    /// End the active session.
    ///
    /// A recording session first drains in-flight captures, then persists
    /// the log. When the test failed, the recording is discarded instead.
    /// Calling this without an active session is a no-op.
    pub async fn end_session(&mut self, outcome: SessionOutcome) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        if self.state == SessionState::Recording {
            self.pending.wait().await;

            if outcome == SessionOutcome::Passed {
                if let Some(recorder) = session.recorder {
                    let manifest = Manifest {
                        version: session.version,
                        recordings: recorder.into_log(),
                    };
                    self.store.write(&session.manifest_path, &manifest).await?;
                }
            } else {
                info!("Test failed; discarding recording for '{}'", session.name);
            }
        }

        self.state = SessionState::Idle;
        Ok(())
    }

    /// Wire a shared controller into the host's interception mechanism
    pub fn install_interceptor(
        controller: &Arc<Mutex<Self>>,
        registrar: &mut dyn HookRegistrar,
    ) {
        registrar.install(Arc::clone(controller) as Arc<Mutex<dyn InterceptHook + Send>>);
    }

    /// Wait until all intercepted requests have completed
    pub async fn wait_for_pending_requests(&self) {
        self.pending.wait().await;
    }

    /// Tracker handle, for hosts that must wait without holding the
    /// controller lock
    #[must_use]
    pub fn pending_tracker(&self) -> Arc<PendingTracker> {
        Arc::clone(&self.pending)
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the active session is recording
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Whether the active session is replaying
    #[must_use]
    pub fn is_replaying(&self) -> bool {
        self.state == SessionState::Replaying
    }

    /// Name of the active session, if any
    #[must_use]
    pub fn session_name(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.name.as_str())
    }

    fn resolve(&mut self, request: &LiveRequest) -> Option<SyntheticResponse> {
        let session = self.session.as_mut()?;
        let table = session.table.as_mut()?;

        let default = table.resolve_default(request).cloned();
        let resolved = match &session.options.resolver {
            Some(strategy) => strategy.resolve(request, table.mocks(), default.as_ref()),
            None => default,
        };

        let mock = resolved?;
        let key = Key::for_request(request, session.options.include_query);
        if session.options.verbose {
            info!("Mocking {key} with recording #{}", mock.count);
        } else {
            debug!("Mocking {key} with recording #{}", mock.count);
        }
        SyntheticResponse::from_interaction(&mock)
    }
}

impl InterceptHook for SessionController {
    fn before_dispatch(&mut self, request: &LiveRequest) -> Option<SyntheticResponse> {
        if self.state == SessionState::Replaying {
            if let Some(response) = self.resolve(request) {
                return Some(response);
            }
            // Stale fixture set relative to the test: signal, not failure
            warn!(
                "No mock for {} {}; falling through to the network",
                request.method, request.url
            );
        }

        self.pending.start();
        None
    }

    fn on_complete(&mut self, exchange: RawExchange) {
        self.pending.finish();

        if self.state == SessionState::Recording {
            if let Some(recorder) = self.session.as_mut().and_then(|s| s.recorder.as_mut()) {
                recorder.capture(exchange);
            }
        }
    }
}

/// Validate a session name before it becomes a file name
fn validate_session_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MimeoError::InvalidSessionName(
            "Session name cannot be empty".to_string(),
        ));
    }

    if name.len() > 255 {
        return Err(MimeoError::InvalidSessionName(format!(
            "Session name too long: {} > 255",
            name.len()
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(MimeoError::InvalidSessionName(
            "Session name cannot contain path separators".to_string(),
        ));
    }

    if name.starts_with('.') {
        return Err(MimeoError::InvalidSessionName(
            "Session name cannot start with dot".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MimeoError::InvalidSessionName(
            "Session name cannot contain null bytes".to_string(),
        ));
    }

    if name.contains("..") {
        return Err(MimeoError::InvalidSessionName(
            "Session name cannot contain '..'".to_string(),
        ));
    }

    Ok(())
}
