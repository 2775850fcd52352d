//! Mimeo - Deterministic record-replay engine for end-to-end test traffic
//!
//! Record a test session's live request/response pairs once, persist them as
//! a JSON manifest plus per-interaction fixture files, and replay them
//! byte-for-byte on later runs without touching the live backend.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::multiple_crate_versions
)]

pub mod config;
pub mod error;
pub mod intercept;
pub mod key;
pub mod recording;
pub mod replay;
pub mod session;
pub mod storage;
pub mod url;

pub use error::{MimeoError, Result};
pub use session::{SessionController, SessionOutcome, SessionState};

/// Install a global tracing subscriber for diagnostic output.
///
/// Intended for host test harnesses; honors `RUST_LOG` when set, otherwise
/// filters to this crate at `debug` (verbose) or `info`. Calling it more
/// than once is harmless.
pub fn init_diagnostics(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let fallback = if verbose { "mimeo=debug" } else { "mimeo=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
