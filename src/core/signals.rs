//! # Host stop signals.
//!
//! [`ShutdownSignal`] installs the listeners up front (so registration errors
//! surface before any worker is launched) and completes on the first signal.
//!
//! **Unix:** `SIGINT`, `SIGTERM` (systemd stop), `SIGQUIT`.
//! **Other platforms:** Ctrl-C / service stop via [`tokio::signal::ctrl_c`].

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Installed OS termination signal listeners.
pub(crate) struct ShutdownSignal {
    #[cfg(unix)]
    sigint: Signal,
    #[cfg(unix)]
    sigterm: Signal,
    #[cfg(unix)]
    sigquit: Signal,
}

impl ShutdownSignal {
    /// Registers the signal listeners.
    #[cfg(unix)]
    pub(crate) fn install() -> std::io::Result<Self> {
        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
            sigquit: signal(SignalKind::quit())?,
        })
    }

    #[cfg(not(unix))]
    pub(crate) fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Completes when any termination signal arrives.
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) -> std::io::Result<()> {
        tokio::select! {
            _ = self.sigint.recv() => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub(crate) async fn recv(&mut self) -> std::io::Result<()> {
        tokio::signal::ctrl_c().await
    }
}
