//! # OS termination signals for the watchdog.
//!
//! Only consulted when `ConveyorConfig::handle_os_signals` is set; the
//! watchdog then treats the first signal as a stop request, exactly like
//! `Conveyor::stop()`. Registration happens lazily on the worker runtime, so a
//! conveyor that leaves the option off never installs a handler.
//!
//! Unix listens for `SIGINT`, `SIGTERM` and `SIGQUIT`; other platforms for Ctrl-C.

/// Resolves on the first of `SIGINT`/`SIGTERM`/`SIGQUIT`.
///
/// `Err` means a handler could not be registered; the watchdog then keeps
/// running without signal support.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::debug!(signal = received, "watchdog: termination signal");
    Ok(())
}

/// Resolves on Ctrl-C.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
