//! Ctrl+C handling.
//!
//! A single process-wide `AtomicBool` is flipped when SIGINT/SIGTERM arrives.
//! The walker, hasher, comparator and finder all poll a clone of it and stop
//! early; the finder then returns [`FinderError::Interrupted`], which `main`
//! maps to exit code 130.
//!
//! [`FinderError::Interrupted`]: crate::duplicates::FinderError::Interrupted
//!
//! ```rust,no_run
//! use dupfind::duplicates::FinderConfig;
//! use dupfind::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag, for handing to the finder and walker.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag so the handler can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: Mutex<Option<ShutdownHandler>> = Mutex::new(None);

/// Install the Ctrl+C hook, or reuse the one already installed.
///
/// `ctrlc` allows a single hook per process. Repeated calls (several
/// `run_app` invocations in one test binary) get the installed handler back
/// with its flag cleared. Installation is serialized, so concurrent first
/// calls all receive the same handler.
///
/// # Errors
///
/// Returns [`SignalError`] if the hook cannot be registered and no handler
/// was installed earlier by this module.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    let mut slot = GLOBAL_HANDLER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(handler) = slot.as_ref() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Stopping scan...");
        log::info!("Shutdown signal received");
    })?;

    *slot = Some(handler.clone());
    Ok(handler)
}
