//! Tracing initialization and phase logging helpers

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise defaults to `codeforge=info`, or
/// `codeforge=debug` when `verbose` is true. Safe to call more than once in
/// tests; later calls are ignored.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "codeforge=debug"
    } else {
        "codeforge=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// Logs the start of a pipeline phase with structured fields.
pub fn log_phase_start(request_id: &str, phase: &str) {
    tracing::info!(request_id, phase, "Phase started");
}

/// Logs successful completion of a pipeline phase.
pub fn log_phase_complete(request_id: &str, phase: &str, duration_ms: u64) {
    tracing::info!(request_id, phase, duration_ms, "Phase complete");
}

/// Logs a phase failure. The error is logged at the failure site; callers
/// still propagate it.
pub fn log_phase_error(request_id: &str, phase: &str, error: &str) {
    tracing::error!(request_id, phase, error, "Phase failed");
}
