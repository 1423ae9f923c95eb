use airgap_registry::CancelToken;
use tracing::warn;

/// Exit status after a second Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Route Ctrl-C to `token`. The first signal cancels the run so the current
/// step can stop its subprocess and clean up; a second one exits at once.
pub fn install_signal_handler(token: CancelToken) {
    let result = ctrlc::set_handler(move || {
        if token.is_cancelled() {
            std::process::exit(EXIT_INTERRUPTED);
        }
        token.cancel();
        eprintln!("\ninterrupt received, stopping current transfer...");
    });
    if let Err(e) = result {
        warn!("failed to install signal handler: {e}");
    }
}
