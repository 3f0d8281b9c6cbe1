//! # Termination signals.
//!
//! [`wait_for_shutdown_signal`] resolves on the first termination signal and
//! returns its name for logging. Listeners are installed per call, so the
//! shutdown coordinator can keep listening after the first signal: a second
//! Ctrl-C while workers are closing is logged and ignored.
//!
//! | Platform | Signals                    |
//! |----------|----------------------------|
//! | Unix     | SIGINT, SIGTERM, SIGQUIT   |
//! | other    | Ctrl-C                     |

use std::io;

/// Waits for SIGINT, SIGTERM or SIGQUIT and returns the name of the one received.
///
/// Fails only if a listener cannot be registered.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for Ctrl-C.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
